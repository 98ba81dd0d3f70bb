//! Core traits for the DuckDNS updater
//!
//! This module defines the seams between the orchestrator and its collaborators.
//!
//! - [`IpResolver`]: Determine the current IPv4 address under one strategy
//! - [`DnsPublisher`]: Push a new address to the DNS provider
//! - [`StateStore`]: Caller-side persistence of the last known IP

pub mod ip_resolver;
pub mod publisher;
pub mod state_store;

pub use ip_resolver::{IpResolver, ResolvedIp};
pub use publisher::DnsPublisher;
pub use state_store::{StateRecord, StateStore};
