// # Host Resolver
//
// Forward-resolves a configured hostname and uses its first IPv4 record.
//
// Resolution goes through the system resolver (`getaddrinfo` via
// `tokio::net::lookup_host`), bounded by a timeout. IPv6 records are
// ignored.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tracing::debug;

use duckdns_core::{EventLog, IpResolver, ResolutionError, ResolutionMode, ResolvedIp};

/// Upper bound for one hostname lookup
pub const HOST_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolver for [`ResolutionMode::Host`]
#[derive(Debug, Clone)]
pub struct HostResolver {
    timeout: Duration,
}

impl Default for HostResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HostResolver {
    pub fn new() -> Self {
        Self::with_timeout(HOST_LOOKUP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl IpResolver for HostResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Host
    }

    async fn resolve(&self, value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
        let hostname = value.trim();
        if hostname.is_empty() {
            return Err(ResolutionError::EmptyValue(ResolutionMode::Host));
        }

        debug!("Looking up {}", hostname);
        let lookup = match timeout(self.timeout, lookup_host((hostname, 0))).await {
            Ok(Ok(addrs)) => addrs,
            Ok(Err(e)) => {
                log.warn(format!("⚠ Failed to resolve hostname {}: {}", hostname, e));
                return Err(ResolutionError::LookupFailed {
                    target: hostname.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                log.warn(format!(
                    "⚠ Lookup of {} timed out after {}s",
                    hostname,
                    self.timeout.as_secs()
                ));
                return Err(ResolutionError::LookupFailed {
                    target: hostname.to_string(),
                    reason: format!("timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        let first_v4 = lookup
            .filter_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(*v4.ip()),
                SocketAddr::V6(_) => None,
            })
            .next();

        match first_v4 {
            Some(ip) => {
                log.success(format!("✓ Host IP for {}: {}", hostname, ip));
                Ok(ResolvedIp::new(ip, format!("host:{}", hostname)))
            }
            None => {
                log.warn(format!("⚠ {} has no IPv4 address", hostname));
                Err(ResolutionError::NoAddressForHostname(hostname.to_string()))
            }
        }
    }
}
