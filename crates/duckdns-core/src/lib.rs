// # duckdns-core
//
// Core library for the DuckDNS updater.
//
// ## Architecture Overview
//
// This library keeps a DuckDNS record pointed at the host's current IPv4 address:
// - **IpResolver**: Trait for one IP resolution strategy (web service, local, fixed, host)
// - **ResolverSet**: Maps each `ResolutionMode` to the strategy that serves it
// - **DnsPublisher**: Trait for the single-shot provider update call
// - **UpdateOrchestrator**: Resolve → compare → publish, with retry/backoff
// - **UpdateOutcome**: Immutable result of one orchestration cycle
// - **EventLog**: Ordered log-event channel for UI or log sinks
// - **StateStore**: Caller-side persistence of the last known IP
//
// ## Design Principles
//
// 1. **Value passing**: Every cycle receives an explicit configuration snapshot
//    and last known IP; the orchestrator keeps no state across calls
// 2. **Strategy dispatch**: One resolver per mode, selected once per call
// 3. **Engine-owned retries**: Resolvers and publishers are single-shot
// 4. **No escaping faults**: Every failure is captured in the outcome

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ipv4;
pub mod outcome;
pub mod resolver;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{EngineConfig, ResolutionMode, UpdaterConfig};
pub use engine::UpdateOrchestrator;
pub use error::{Error, PublishError, RejectReason, ResolutionError, Result};
pub use events::{EventLog, LogEvent, LogFeed, Severity};
pub use ipv4::{is_valid_ipv4, parse_ipv4};
pub use outcome::UpdateOutcome;
pub use resolver::ResolverSet;
pub use state::{FileStateStore, MemoryStateStore};
pub use traits::{DnsPublisher, IpResolver, ResolvedIp, StateStore};
