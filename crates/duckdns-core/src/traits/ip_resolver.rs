// # IP Resolver Trait
//
// Defines the interface for one IP resolution strategy.
//
// ## Implementations
//
// - `duckdns-ip` crate: WebService, Local, Fixed and Host resolvers
//
// ## Usage
//
// ```rust,ignore
// use duckdns_core::{EventLog, IpResolver};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let log = EventLog::disabled();
//
//     let resolved = resolver.resolve("", &log).await?;
//     println!("{} (from {})", resolved.ip, resolved.source);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::config::ResolutionMode;
use crate::error::ResolutionError;
use crate::events::EventLog;

/// An address produced by a resolver, with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIp {
    /// The resolved IPv4 address
    pub ip: Ipv4Addr,
    /// Where it came from (endpoint URL, `local:<iface>`, `fixed`, `host:<name>`)
    pub source: String,
}

impl ResolvedIp {
    pub fn new(ip: Ipv4Addr, source: impl Into<String>) -> Self {
        Self {
            ip,
            source: source.into(),
        }
    }
}

/// Trait for IP resolution strategies
///
/// One implementation serves exactly one [`ResolutionMode`].
///
/// # Responsibilities
///
/// ## Allowed
/// - ✅ Perform the I/O its strategy needs (HTTP, DNS lookup, interface enumeration)
/// - ✅ Try several sources in sequence within one call (e.g. echo endpoints)
/// - ✅ Emit log events describing each attempt and its source
///
/// ## Forbidden
/// - ❌ Retry the whole resolution or sleep between calls (owned by `UpdateOrchestrator`)
/// - ❌ Compare against the last known IP or decide whether to publish
/// - ❌ Query sources concurrently (sources are tried strictly in order)
/// - ❌ Return anything other than an IPv4 address
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// The mode this resolver serves
    fn mode(&self) -> ResolutionMode;

    /// Resolve the current IPv4 address
    ///
    /// # Parameters
    ///
    /// - `value`: Mode-specific value (fixed address, hostname); ignored by
    ///   modes that take none
    /// - `log`: Channel for per-attempt log events
    ///
    /// # Returns
    ///
    /// - `Ok(ResolvedIp)`: The address and its source
    /// - `Err(ResolutionError)`: Why no address could be produced
    async fn resolve(&self, value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError>;
}
