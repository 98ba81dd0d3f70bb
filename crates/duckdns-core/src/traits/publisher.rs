// # DNS Publisher Trait
//
// Defines the interface for pushing a new address to the DNS provider.
//
// ## Implementations
//
// - DuckDNS: `duckdns-provider` crate
//
// ## Usage
//
// ```rust,ignore
// use duckdns_core::{DnsPublisher, EventLog};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let publisher = /* DnsPublisher implementation */;
//
//     publisher
//         .publish("myhome", "token", "203.0.113.5".parse()?, &EventLog::disabled())
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::error::PublishError;
use crate::events::EventLog;

/// Trait for DNS provider update calls
///
/// # Single-shot
///
/// Each call performs exactly one update request. Returning an error is the
/// correct reaction to any failure; the `UpdateOrchestrator` owns the inner
/// (publish) and outer (cycle) retry policies.
///
/// ## Forbidden
/// - ❌ Retry, back off or sleep
/// - ❌ Cache state between calls
/// - ❌ Log the token (or a URL containing it)
#[async_trait]
pub trait DnsPublisher: Send + Sync {
    /// Point `subdomain` at `ip`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider affirmatively accepted the update
    /// - `Err(PublishError)`: Network failure, non-2xx status or a non-OK body
    async fn publish(
        &self,
        subdomain: &str,
        token: &str,
        ip: Ipv4Addr,
        log: &EventLog,
    ) -> Result<(), PublishError>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
