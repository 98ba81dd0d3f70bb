// # State Store Trait
//
// Defines the interface for caller-side persistence between cycles.
//
// ## Purpose
//
// The orchestrator is stateless: the caller supplies the last known IP on
// every cycle. A state store is how a caller (the daemon, a UI) remembers:
// - The last known IP for each subdomain
// - The most recent outcome
// - A rolling window of recent log events
//
// Nothing older than the most recent outcome is kept.
//
// ## Usage
//
// ```rust,ignore
// use duckdns_core::{StateStore, traits::StateRecord};
//
// let last_ip = store.get_last_ip("myhome").await?.unwrap_or_default();
// let outcome = orchestrator.check_and_update("myhome", &token, &last_ip, mode, &value).await;
// store.set_record("myhome", &StateRecord::from_outcome(&outcome, feed.snapshot())).await?;
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::events::LogEvent;
use crate::outcome::UpdateOutcome;

/// Persisted state for one subdomain
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StateRecord {
    /// The last IP the provider confirmed (empty before the first success)
    pub last_ip: String,
    /// When this record was written
    pub last_updated: DateTime<Utc>,
    /// The most recent cycle outcome
    #[serde(default)]
    pub last_outcome: Option<UpdateOutcome>,
    /// Rolling window of recent log events
    #[serde(default)]
    pub recent_log: Vec<LogEvent>,
}

impl StateRecord {
    /// Create a record holding only a last known IP
    pub fn new(last_ip: impl Into<String>) -> Self {
        Self {
            last_ip: last_ip.into(),
            last_updated: Utc::now(),
            last_outcome: None,
            recent_log: Vec::new(),
        }
    }

    /// Create the record to store after a cycle
    ///
    /// The last known IP advances only if the outcome says so.
    pub fn from_outcome(outcome: &UpdateOutcome, recent_log: Vec<LogEvent>) -> Self {
        Self {
            last_ip: outcome.next_last_known_ip().to_string(),
            last_updated: Utc::now(),
            last_outcome: Some(outcome.clone()),
            recent_log,
        }
    }
}

/// Trait for state store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// ## Implementation Guidelines
///
/// - **Async I/O only**: Use async file operations, never blocking I/O
/// - **Explicit flush**: `flush()` must persist all pending changes
/// - **No business logic**: Deciding what the next last known IP is belongs
///   to the outcome, not the store
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the last known IP for a subdomain
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The last known IP
    /// - `Ok(None)`: No record found
    /// - `Err(Error)`: Storage error
    async fn get_last_ip(&self, subdomain: &str) -> Result<Option<String>, crate::Error>;

    /// Get the full state record
    async fn get_record(&self, subdomain: &str) -> Result<Option<StateRecord>, crate::Error>;

    /// Create or replace the state record
    async fn set_record(&self, subdomain: &str, record: &StateRecord) -> Result<(), crate::Error>;

    /// Delete a state record (no error if it didn't exist)
    async fn delete_record(&self, subdomain: &str) -> Result<(), crate::Error>;

    /// List all subdomains in the store
    async fn list_records(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
