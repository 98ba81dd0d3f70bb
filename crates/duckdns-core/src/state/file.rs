// # File State Store
//
// Persists state records to a JSON file so the last known IP survives
// restarts.
//
// ## Crash Recovery
//
// - Writes go to `<file>.tmp` and are renamed over the real file
// - The previous good file is copied to `<file>.backup` before each rename
// - A file that fails to parse is replaced by its backup; if the backup is
//   unusable too, the store starts empty (the next cycle then publishes)
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "records": {
//     "myhome": {
//       "last_ip": "203.0.113.5",
//       "last_updated": "2026-01-09T12:00:00Z",
//       "last_outcome": { "current_ip": "203.0.113.5", ... },
//       "recent_log": [ { "timestamp": "...", "severity": "success", "message": "..." } ]
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateRecord, StateStore};

/// State file format version
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store with backup recovery
///
/// Every mutation is written through immediately.
///
/// # Example
///
/// ```rust,no_run
/// use duckdns_core::FileStateStore;
/// use duckdns_core::traits::{StateRecord, StateStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/duckdns/state.json").await?;
///
///     store.set_record("myhome", &StateRecord::new("203.0.113.5")).await?;
///     assert_eq!(store.get_last_ip("myhome").await?.as_deref(), Some("203.0.113.5"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    state: RwLock<FileState>,
}

#[derive(Debug, Default)]
struct FileState {
    records: HashMap<String, StateRecord>,
    dirty: bool,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    records: HashMap<String, StateRecord>,
}

/// Why a state file could not be loaded
#[derive(Debug)]
enum LoadFailure {
    /// The file exists but is not a valid state file
    Corrupt(String),
    /// The file could not be read at all
    Unreadable(Error),
}

impl FileStateStore {
    /// Open (or create) a state file
    ///
    /// Parent directories are created as needed. A corrupted file is
    /// recovered from its backup when possible.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let records = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: RwLock::new(FileState {
                records,
                dirty: false,
            }),
        })
    }

    /// Path of the primary state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, StateRecord>, Error> {
        let reason = match Self::load(path).await {
            Ok(records) => {
                tracing::debug!("Loaded state from {}: {} records", path.display(), records.len());
                return Ok(records);
            }
            Err(LoadFailure::Unreadable(e)) => return Err(e),
            Err(LoadFailure::Corrupt(reason)) => reason,
        };

        tracing::warn!(
            "State file {} is corrupted ({}). Attempting recovery from backup.",
            path.display(),
            reason
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup state file found. Starting with empty state.");
            return Ok(HashMap::new());
        }

        match Self::load(&backup_path).await {
            Ok(records) => {
                tracing::info!("Recovered state from backup: {} records", records.len());
                if let Err(e) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore state file from backup: {}", e);
                }
                Ok(records)
            }
            Err(e) => {
                tracing::error!("Backup state file is unusable too ({:?}). Starting with empty state.", e);
                Ok(HashMap::new())
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, StateRecord>, LoadFailure> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadFailure::Unreadable(Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: StateFileFormat =
            serde_json::from_str(&content).map_err(|e| LoadFailure::Corrupt(e.to_string()))?;

        if file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. Loading anyway.",
                STATE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.records)
    }

    /// Write the current records atomically
    async fn persist(&self) -> Result<(), Error> {
        let mut state = self.state.write().await;

        let file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            records: state.records.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.flush().await?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create state backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        state.dirty = false;
        tracing::trace!("State written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get_last_ip(&self, subdomain: &str) -> Result<Option<String>, Error> {
        let state = self.state.read().await;
        Ok(state.records.get(subdomain).map(|r| r.last_ip.clone()))
    }

    async fn get_record(&self, subdomain: &str) -> Result<Option<StateRecord>, Error> {
        Ok(self.state.read().await.records.get(subdomain).cloned())
    }

    async fn set_record(&self, subdomain: &str, record: &StateRecord) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            state.records.insert(subdomain.to_string(), record.clone());
            state.dirty = true;
        }
        self.persist().await
    }

    async fn delete_record(&self, subdomain: &str) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if state.records.remove(subdomain).is_none() {
                return Ok(());
            }
            state.dirty = true;
        }
        self.persist().await
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.state.read().await.records.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty { self.persist().await } else { Ok(()) }
    }
}
