// # Memory State Store
//
// Keeps state records in a map behind an async `RwLock`.
//
// Nothing survives a restart, so the first cycle afterwards sees an empty
// last known IP and publishes unconditionally. For DuckDNS that is harmless.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::state_store::{StateRecord, StateStore};

/// In-memory state store
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    records: Arc<RwLock<HashMap<String, StateRecord>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_last_ip(&self, subdomain: &str) -> Result<Option<String>, Error> {
        let records = self.records.read().await;
        Ok(records.get(subdomain).map(|r| r.last_ip.clone()))
    }

    async fn get_record(&self, subdomain: &str) -> Result<Option<StateRecord>, Error> {
        Ok(self.records.read().await.get(subdomain).cloned())
    }

    async fn set_record(&self, subdomain: &str, record: &StateRecord) -> Result<(), Error> {
        self.records
            .write()
            .await
            .insert(subdomain.to_string(), record.clone());
        Ok(())
    }

    async fn delete_record(&self, subdomain: &str) -> Result<(), Error> {
        self.records.write().await.remove(subdomain);
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.records.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
