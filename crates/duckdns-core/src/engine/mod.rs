//! Update orchestration
//!
//! The `UpdateOrchestrator` runs one check-and-update cycle per call:
//! - Resolving the current IPv4 address under the configured mode
//! - Comparing it with the caller-supplied last known IP
//! - Publishing it to the provider when it changed
//! - Narrating every step on the log-event channel
//!
//! ## Retry Policy
//!
//! ```text
//! pre-checks ── fail ──────────────────────────────► outcome (retry_count 0)
//!     │
//!     ▼
//! ┌─ outer attempt n of max_attempts ─────────────────────────────┐
//! │  resolve ──► compare ──► unchanged ─────────────► outcome (ok)│
//! │                 │                                             │
//! │                 └──► publish (publish_attempts, fixed delay) ─┼─► outcome (ok)
//! └───────────────────────────────────────────────────────────────┘
//!     │ failure: retry_count += 1, wait retry_count * backoff_step
//!     ▼
//! after max_attempts ─────────────────────────────────► outcome (failed)
//! ```
//!
//! The orchestrator keeps no state between calls. Callers must not run
//! overlapping cycles for the same subdomain.

use chrono::Utc;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::debug;

use crate::config::{EngineConfig, ResolutionMode, UpdaterConfig};
use crate::error::{Error, PublishError, Result};
use crate::events::{EventLog, LogEvent};
use crate::outcome::{OutcomeDraft, UpdateOutcome};
use crate::resolver::ResolverSet;
use crate::traits::{DnsPublisher, IpResolver};

/// How a successful cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleEnd {
    Unchanged,
    Published,
}

/// Drives resolve → compare → publish with retries
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateOrchestrator::new()`], keeping the event receiver
/// 2. Call [`check_and_update()`](Self::check_and_update) once per scheduled cycle
/// 3. Feed [`UpdateOutcome::next_last_known_ip()`] into the next call
pub struct UpdateOrchestrator {
    resolvers: ResolverSet,
    publisher: Box<dyn DnsPublisher>,
    policy: EngineConfig,
    log: EventLog,
}

impl UpdateOrchestrator {
    /// Create an orchestrator with its own log-event channel
    ///
    /// # Returns
    ///
    /// A tuple of (orchestrator, event_receiver); the receiver yields every
    /// log event in emission order
    pub fn new(
        resolvers: ResolverSet,
        publisher: Box<dyn DnsPublisher>,
        policy: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<LogEvent>)> {
        policy.validate()?;

        let (log, rx) = EventLog::channel(policy.event_channel_capacity);
        let orchestrator = Self::with_event_log(resolvers, publisher, policy, log)?;

        Ok((orchestrator, rx))
    }

    /// Create an orchestrator that emits on an existing log
    pub fn with_event_log(
        resolvers: ResolverSet,
        publisher: Box<dyn DnsPublisher>,
        policy: EngineConfig,
        log: EventLog,
    ) -> Result<Self> {
        policy.validate()?;

        if resolvers.is_empty() {
            return Err(Error::config("At least one resolver must be registered"));
        }

        debug!(
            "Orchestrator ready: provider={}, modes={:?}",
            publisher.provider_name(),
            resolvers.modes()
        );

        Ok(Self {
            resolvers,
            publisher,
            policy,
            log,
        })
    }

    /// The retry policy in effect
    pub fn policy(&self) -> &EngineConfig {
        &self.policy
    }

    /// Run one cycle for a configuration snapshot
    pub async fn check_and_update_config(
        &self,
        config: &UpdaterConfig,
        last_known_ip: &str,
    ) -> UpdateOutcome {
        self.check_and_update(
            &config.subdomain,
            &config.token,
            last_known_ip,
            config.resolution_mode,
            &config.resolution_value,
        )
        .await
    }

    /// Run one check-and-update cycle
    ///
    /// # Parameters
    ///
    /// - `subdomain`, `token`: Provider credentials (must not be blank)
    /// - `last_known_ip`: Last successfully published IP; empty forces an update
    /// - `mode`, `value`: How to resolve the current IP
    ///
    /// # Returns
    ///
    /// Always an [`UpdateOutcome`]; failures are reported through
    /// `update_success` and `error_message`, never as an error.
    pub async fn check_and_update(
        &self,
        subdomain: &str,
        token: &str,
        last_known_ip: &str,
        mode: ResolutionMode,
        value: &str,
    ) -> UpdateOutcome {
        let subdomain = subdomain.trim();
        let token = token.trim();
        let value = value.trim();
        let mut draft = OutcomeDraft::new(last_known_ip);

        let resolver = match self.pre_check(subdomain, token, mode, value) {
            Ok(resolver) => resolver,
            Err(e) => {
                self.log.error(format!("✗ {}", e));
                return draft.failed(e.to_string());
            }
        };

        let max_attempts = self.policy.max_attempts;
        loop {
            let attempt = draft.retry_count() + 1;

            match self
                .run_cycle(resolver, subdomain, token, last_known_ip, value, attempt, &mut draft)
                .await
            {
                Ok(CycleEnd::Unchanged) => return draft.unchanged(),
                Ok(CycleEnd::Published) => return draft.published(Utc::now()),
                Err(e) => {
                    let retries = draft.record_retry();
                    self.log.error(format!("✗ Error (attempt {}): {}", retries, e));

                    if !e.is_retryable() {
                        self.log.error("✗ Configuration error, not retrying");
                        return draft.failed(e.to_string());
                    }

                    if retries >= max_attempts {
                        self.log.error(format!("✗ Failed after {} attempts", max_attempts));
                        return draft.failed(e.to_string());
                    }

                    let delay = self.policy.backoff_step_secs * u64::from(retries);
                    self.log.warn(format!("⚠ Retrying in {} seconds...", delay));
                    sleep(Duration::from_secs(delay)).await;
                }
            }
        }
    }

    /// Configuration checks that never touch the network
    fn pre_check(
        &self,
        subdomain: &str,
        token: &str,
        mode: ResolutionMode,
        value: &str,
    ) -> Result<&dyn IpResolver> {
        if subdomain.is_empty() || token.is_empty() {
            return Err(Error::config("Subdomain and token are required"));
        }

        let resolver = self.resolvers.get(mode)?;
        mode.validate_value(value)?;

        Ok(resolver)
    }

    /// One outer attempt: resolve, compare and publish if needed
    #[allow(clippy::too_many_arguments)]
    async fn run_cycle(
        &self,
        resolver: &dyn IpResolver,
        subdomain: &str,
        token: &str,
        last_known_ip: &str,
        value: &str,
        attempt: u32,
        draft: &mut OutcomeDraft,
    ) -> Result<CycleEnd> {
        self.log.info(format!(
            "Resolving IP address using {} method... (Attempt {}/{})",
            resolver.mode(),
            attempt,
            self.policy.max_attempts
        ));

        let resolved = resolver.resolve(value, &self.log).await?;
        let current_ip = resolved.ip.to_string();
        let changed = ip_changed(&current_ip, last_known_ip);
        draft.resolved(current_ip.clone(), resolved.source, changed);

        if !changed {
            self.log
                .info(format!("IP unchanged ({}), skipping update", current_ip));
            return Ok(CycleEnd::Unchanged);
        }

        self.log.info(format!(
            "IP changed from '{}' to '{}', updating DuckDNS...",
            last_known_ip.trim(),
            current_ip
        ));
        self.publish_with_retry(subdomain, token, resolved.ip).await?;

        Ok(CycleEnd::Published)
    }

    /// Inner publish retry with a fixed delay
    ///
    /// The last failure is returned to the outer loop.
    async fn publish_with_retry(
        &self,
        subdomain: &str,
        token: &str,
        ip: Ipv4Addr,
    ) -> std::result::Result<(), PublishError> {
        let attempts = self.policy.publish_attempts;
        let mut attempt = 1;

        loop {
            match self.publisher.publish(subdomain, token, ip, &self.log).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.log
                        .warn(format!("⚠ Update attempt {} failed: {}", attempt, e));

                    if !e.is_retryable() || attempt >= attempts {
                        return Err(e);
                    }

                    self.log.warn(format!(
                        "⚠ Update failed, retrying in {} seconds...",
                        self.policy.publish_retry_delay_secs
                    ));
                    sleep(Duration::from_secs(self.policy.publish_retry_delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Literal comparison after trimming; an empty last known IP always counts
/// as a change
pub(crate) fn ip_changed(current_ip: &str, last_known_ip: &str) -> bool {
    let last_known_ip = last_known_ip.trim();
    last_known_ip.is_empty() || current_ip.trim() != last_known_ip
}
