// # Fixed Resolver
//
// Returns the configured address after validating it. No I/O.

use async_trait::async_trait;

use duckdns_core::{EventLog, IpResolver, ResolutionError, ResolutionMode, ResolvedIp, parse_ipv4};

/// Resolver for [`ResolutionMode::Fixed`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedResolver;

impl FixedResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IpResolver for FixedResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Fixed
    }

    async fn resolve(&self, value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ResolutionError::EmptyValue(ResolutionMode::Fixed));
        }

        let ip = parse_ipv4(value)
            .ok_or_else(|| ResolutionError::InvalidFixedAddress(value.to_string()))?;

        log.success(format!("✓ Using fixed IP: {}", ip));
        Ok(ResolvedIp::new(ip, "fixed"))
    }
}
