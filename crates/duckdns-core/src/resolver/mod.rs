//! Resolver registry
//!
//! Maps each [`ResolutionMode`] to the strategy that serves it, so the
//! orchestrator dispatches by lookup instead of a hardcoded match.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duckdns_core::ResolverSet;
//!
//! let resolvers = ResolverSet::new()
//!     .with(WebServiceResolver::new(endpoints)?)
//!     .with(FixedResolver);
//!
//! assert!(resolvers.has(ResolutionMode::Fixed));
//! ```
//!
//! The `duckdns-ip` crate provides `standard_resolvers()`, which registers
//! all four built-in strategies.

use std::collections::HashMap;
use std::fmt;

use crate::config::ResolutionMode;
use crate::error::ResolutionError;
use crate::traits::IpResolver;

/// Registered resolution strategies, keyed by the mode each one serves
#[derive(Default)]
pub struct ResolverSet {
    resolvers: HashMap<ResolutionMode, Box<dyn IpResolver>>,
}

impl ResolverSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver under the mode it reports
    ///
    /// A resolver already registered for that mode is replaced and returned.
    pub fn register(&mut self, resolver: Box<dyn IpResolver>) -> Option<Box<dyn IpResolver>> {
        let mode = resolver.mode();
        tracing::debug!("Registering resolver for {} mode", mode);
        self.resolvers.insert(mode, resolver)
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, resolver: impl IpResolver + 'static) -> Self {
        self.register(Box::new(resolver));
        self
    }

    /// Look up the resolver for a mode
    ///
    /// # Returns
    ///
    /// - `Ok(&dyn IpResolver)`: The registered strategy
    /// - `Err(ResolutionError::UnsupportedResolutionMode)`: Nothing registered
    pub fn get(&self, mode: ResolutionMode) -> Result<&dyn IpResolver, ResolutionError> {
        self.resolvers
            .get(&mode)
            .map(|r| r.as_ref())
            .ok_or_else(|| ResolutionError::UnsupportedResolutionMode(mode.to_string()))
    }

    pub fn has(&self, mode: ResolutionMode) -> bool {
        self.resolvers.contains_key(&mode)
    }

    /// Registered modes, in display order
    pub fn modes(&self) -> Vec<ResolutionMode> {
        ResolutionMode::ALL
            .into_iter()
            .filter(|m| self.resolvers.contains_key(m))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for ResolverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverSet")
            .field("modes", &self.modes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::traits::ResolvedIp;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;

    struct StaticResolver {
        mode: ResolutionMode,
        ip: Ipv4Addr,
    }

    #[async_trait]
    impl IpResolver for StaticResolver {
        fn mode(&self) -> ResolutionMode {
            self.mode
        }

        async fn resolve(&self, _value: &str, _log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
            Ok(ResolvedIp::new(self.ip, "static"))
        }
    }

    #[test]
    fn test_empty_set_rejects_every_mode() {
        let set = ResolverSet::new();
        assert!(set.is_empty());

        for mode in ResolutionMode::ALL {
            assert!(!set.has(mode));
            assert_eq!(
                set.get(mode).err(),
                Some(ResolutionError::UnsupportedResolutionMode(mode.to_string()))
            );
        }
    }

    #[test]
    fn test_register_keys_by_reported_mode() {
        let set = ResolverSet::new()
            .with(StaticResolver {
                mode: ResolutionMode::Host,
                ip: Ipv4Addr::new(192, 0, 2, 1),
            })
            .with(StaticResolver {
                mode: ResolutionMode::WebService,
                ip: Ipv4Addr::new(192, 0, 2, 2),
            });

        assert_eq!(set.len(), 2);
        assert_eq!(set.modes(), vec![ResolutionMode::WebService, ResolutionMode::Host]);
        assert_eq!(set.get(ResolutionMode::Host).unwrap().mode(), ResolutionMode::Host);
        assert!(set.get(ResolutionMode::Local).is_err());
    }

    #[tokio::test]
    async fn test_register_replaces_existing() {
        let mut set = ResolverSet::new();
        assert!(
            set.register(Box::new(StaticResolver {
                mode: ResolutionMode::Fixed,
                ip: Ipv4Addr::new(192, 0, 2, 1),
            }))
            .is_none()
        );
        assert!(
            set.register(Box::new(StaticResolver {
                mode: ResolutionMode::Fixed,
                ip: Ipv4Addr::new(192, 0, 2, 9),
            }))
            .is_some()
        );

        let resolved = set
            .get(ResolutionMode::Fixed)
            .unwrap()
            .resolve("", &EventLog::disabled())
            .await
            .unwrap();
        assert_eq!(resolved.ip, Ipv4Addr::new(192, 0, 2, 9));
    }
}
