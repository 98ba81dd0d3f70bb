//! Result of one orchestration cycle
//!
//! An `UpdateOutcome` is assembled while a cycle runs and handed to the
//! caller at the end. Its fields are read-only from the outside; the caller
//! threads [`UpdateOutcome::next_last_known_ip`] into the next cycle.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable outcome of `UpdateOrchestrator::check_and_update`
///
/// Invariants:
/// - `update_success` implies either `!ip_changed` (no-op success) or an
///   affirmative provider response
/// - `last_update_time` is set only on a successful change-triggered update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    current_ip: String,
    previous_ip: String,
    ip_changed: bool,
    update_success: bool,
    last_update_time: Option<DateTime<Utc>>,
    error_message: String,
    retry_count: u32,
    ip_source: String,
}

impl UpdateOutcome {
    /// The address resolved in the last attempt (empty if none resolved)
    pub fn current_ip(&self) -> &str {
        &self.current_ip
    }

    /// The last known IP the caller supplied
    pub fn previous_ip(&self) -> &str {
        &self.previous_ip
    }

    pub fn ip_changed(&self) -> bool {
        self.ip_changed
    }

    pub fn update_success(&self) -> bool {
        self.update_success
    }

    /// Time of the successful provider update, if one happened
    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.last_update_time
    }

    /// Last error, empty on success
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Number of failed outer attempts
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Where the current IP came from (endpoint URL, `local:<iface>`, ...)
    pub fn ip_source(&self) -> &str {
        &self.ip_source
    }

    /// The last known IP to feed into the next cycle
    ///
    /// Advances to `current_ip` only when the provider confirmed a change;
    /// otherwise the previous value is kept so a failed update is retried
    /// on the next cycle.
    pub fn next_last_known_ip(&self) -> &str {
        if self.update_success && self.ip_changed {
            &self.current_ip
        } else {
            &self.previous_ip
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last_update = self
            .last_update_time
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Never".to_string());

        write!(
            f,
            "IP: {}, Changed: {}, Success: {}, LastUpdate: {}",
            self.current_ip, self.ip_changed, self.update_success, last_update
        )
    }
}

/// Mutable draft of an outcome, owned by the orchestrator during a cycle
#[derive(Debug)]
pub(crate) struct OutcomeDraft {
    inner: UpdateOutcome,
}

impl OutcomeDraft {
    pub(crate) fn new(previous_ip: &str) -> Self {
        Self {
            inner: UpdateOutcome {
                current_ip: String::new(),
                previous_ip: previous_ip.to_string(),
                ip_changed: false,
                update_success: false,
                last_update_time: None,
                error_message: String::new(),
                retry_count: 0,
                ip_source: String::new(),
            },
        }
    }

    /// Record the address resolved in the current attempt
    pub(crate) fn resolved(&mut self, current_ip: String, ip_source: String, ip_changed: bool) {
        self.inner.current_ip = current_ip;
        self.inner.ip_source = ip_source;
        self.inner.ip_changed = ip_changed;
    }

    pub(crate) fn retry_count(&self) -> u32 {
        self.inner.retry_count
    }

    pub(crate) fn record_retry(&mut self) -> u32 {
        self.inner.retry_count += 1;
        self.inner.retry_count
    }

    /// Finish as a no-op success
    pub(crate) fn unchanged(mut self) -> UpdateOutcome {
        self.inner.update_success = true;
        self.inner.ip_changed = false;
        self.inner.error_message.clear();
        self.inner
    }

    /// Finish as a confirmed provider update
    pub(crate) fn published(mut self, at: DateTime<Utc>) -> UpdateOutcome {
        self.inner.update_success = true;
        self.inner.last_update_time = Some(at);
        self.inner.error_message.clear();
        self.inner
    }

    /// Finish as a failure
    pub(crate) fn failed(mut self, error_message: String) -> UpdateOutcome {
        self.inner.update_success = false;
        self.inner.last_update_time = None;
        self.inner.error_message = error_message;
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_outcome() {
        let mut draft = OutcomeDraft::new("10.0.0.1");
        draft.resolved("10.0.0.1".into(), "fixed".into(), false);
        let outcome = draft.unchanged();

        assert!(outcome.update_success());
        assert!(!outcome.ip_changed());
        assert!(outcome.last_update_time().is_none());
        assert_eq!(outcome.next_last_known_ip(), "10.0.0.1");
    }

    #[test]
    fn test_published_outcome_advances_last_known_ip() {
        let mut draft = OutcomeDraft::new("10.0.0.1");
        draft.resolved("10.0.0.2".into(), "https://api.ipify.org".into(), true);
        let outcome = draft.published(Utc::now());

        assert!(outcome.update_success());
        assert!(outcome.last_update_time().is_some());
        assert_eq!(outcome.next_last_known_ip(), "10.0.0.2");
    }

    #[test]
    fn test_failed_outcome_keeps_previous_ip() {
        let mut draft = OutcomeDraft::new("10.0.0.1");
        draft.resolved("10.0.0.2".into(), "fixed".into(), true);
        assert_eq!(draft.record_retry(), 1);
        let outcome = draft.failed("boom".into());

        assert!(!outcome.update_success());
        assert!(outcome.ip_changed());
        assert_eq!(outcome.retry_count(), 1);
        assert_eq!(outcome.error_message(), "boom");
        assert_eq!(outcome.next_last_known_ip(), "10.0.0.1");
    }

    #[test]
    fn test_display_without_update() {
        let mut draft = OutcomeDraft::new("");
        draft.resolved("198.51.100.9".into(), "fixed".into(), true);
        let outcome = draft.failed("KO".into());

        assert_eq!(
            outcome.to_string(),
            "IP: 198.51.100.9, Changed: true, Success: false, LastUpdate: Never"
        );
    }
}
