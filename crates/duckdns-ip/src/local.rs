// # Local Interface Resolver
//
// Uses the first IPv4 address found on the host's own network interfaces.
//
// Loopback (127.0.0.0/8), link-local (169.254.0.0/16) and unspecified
// addresses are skipped. Behind NAT this yields a private address, which is
// what users selecting this mode on a LAN-only setup want.

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;

use duckdns_core::{EventLog, IpResolver, ResolutionError, ResolutionMode, ResolvedIp};

/// Resolver for [`ResolutionMode::Local`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

impl LocalResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Pick the first routable IPv4 address from `(interface, address)` pairs
///
/// Order is preserved: the first qualifying pair wins.
pub fn first_routable_ipv4<'a, I>(addresses: I) -> Option<(&'a str, Ipv4Addr)>
where
    I: IntoIterator<Item = (&'a str, IpAddr)>,
{
    addresses.into_iter().find_map(|(name, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified() => {
            Some((name, v4))
        }
        _ => None,
    })
}

#[async_trait]
impl IpResolver for LocalResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Local
    }

    async fn resolve(&self, _value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
        // Interface enumeration is a blocking syscall
        let interfaces = tokio::task::spawn_blocking(if_addrs::get_if_addrs)
            .await
            .map_err(|e| ResolutionError::LookupFailed {
                target: "local interfaces".to_string(),
                reason: e.to_string(),
            })?
            .map_err(|e| ResolutionError::LookupFailed {
                target: "local interfaces".to_string(),
                reason: e.to_string(),
            })?;

        debug!("Found {} interface addresses", interfaces.len());

        let pairs: Vec<(&str, IpAddr)> = interfaces
            .iter()
            .map(|iface| (iface.name.as_str(), iface.ip()))
            .collect();

        match first_routable_ipv4(pairs) {
            Some((name, ip)) => {
                log.success(format!("✓ Local IP found: {} ({})", ip, name));
                Ok(ResolvedIp::new(ip, format!("local:{}", name)))
            }
            None => {
                log.warn(format!(
                    "⚠ No suitable local IPv4 address among {} interface addresses",
                    interfaces.len()
                ));
                Err(ResolutionError::NoSuitableLocalAddress)
            }
        }
    }
}
