//! Test doubles and common utilities for orchestrator contract tests
//!
//! The doubles follow a script of results and count their calls, so tests
//! can assert exactly how often the orchestrator reached each collaborator.

#![allow(dead_code)]

use async_trait::async_trait;
use duckdns_core::{
    DnsPublisher, EngineConfig, EventLog, IpResolver, LogEvent, PublishError, RejectReason,
    ResolutionError, ResolutionMode, ResolvedIp, ResolverSet, UpdateOrchestrator,
};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const SUBDOMAIN: &str = "myhome";
pub const TOKEN: &str = "a7c4d0ad-114e-40ef-ba1d-d217904a50f2";

/// Replays a fixed sequence of results; the last one repeats forever
struct Script<T: Clone> {
    steps: Mutex<VecDeque<T>>,
    last: T,
}

impl<T: Clone> Script<T> {
    fn new(steps: Vec<T>) -> Self {
        let mut steps: VecDeque<T> = steps.into();
        let last = steps.pop_back().expect("script needs at least one step");
        Self {
            steps: Mutex::new(steps),
            last,
        }
    }

    fn next(&self) -> T {
        self.steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.last.clone())
    }
}

/// An IpResolver that replays scripted results
pub struct ScriptedResolver {
    mode: ResolutionMode,
    script: Script<Result<ResolvedIp, ResolutionError>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new(mode: ResolutionMode, steps: Vec<Result<ResolvedIp, ResolutionError>>) -> Self {
        Self {
            mode,
            script: Script::new(steps),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always resolve to `ip`
    pub fn fixed_answer(mode: ResolutionMode, ip: &str) -> Self {
        Self::new(mode, vec![Ok(resolved(ip))])
    }

    /// Shared call counter; stays valid after the resolver is moved
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    fn mode(&self) -> ResolutionMode {
        self.mode
    }

    async fn resolve(&self, _value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.script.next();
        if let Ok(resolved) = &result {
            log.success(format!("✓ Public IP retrieved: {} (from {})", resolved.ip, resolved.source));
        }
        result
    }
}

/// A DnsPublisher that replays scripted results and records published IPs
pub struct ScriptedPublisher {
    script: Script<Result<(), PublishError>>,
    calls: Arc<AtomicUsize>,
    published: Arc<Mutex<Vec<Ipv4Addr>>>,
}

impl ScriptedPublisher {
    pub fn new(steps: Vec<Result<(), PublishError>>) -> Self {
        Self {
            script: Script::new(steps),
            calls: Arc::new(AtomicUsize::new(0)),
            published: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn accepting() -> Self {
        Self::new(vec![Ok(())])
    }

    /// Answers `KO` forever
    pub fn rejecting() -> Self {
        Self::new(vec![Err(ko())])
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// IPs successfully published, in order
    pub fn published(&self) -> Arc<Mutex<Vec<Ipv4Addr>>> {
        Arc::clone(&self.published)
    }
}

#[async_trait]
impl DnsPublisher for ScriptedPublisher {
    async fn publish(
        &self,
        subdomain: &str,
        _token: &str,
        ip: Ipv4Addr,
        log: &EventLog,
    ) -> Result<(), PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        log.info(format!("Updating DuckDNS: {}.duckdns.org -> {}", subdomain, ip));

        let result = self.script.next();
        if result.is_ok() {
            self.published.lock().unwrap().push(ip);
        }
        result
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn resolved(ip: &str) -> ResolvedIp {
    ResolvedIp::new(ip.parse().expect("test IP must be valid"), "https://echo.test")
}

pub fn ko() -> PublishError {
    PublishError::Rejected {
        reason: RejectReason::Ko,
        body: "KO".to_string(),
    }
}

pub fn timeout() -> PublishError {
    PublishError::Network("operation timed out".to_string())
}

pub fn all_services_failed() -> ResolutionError {
    ResolutionError::AllResolutionServicesFailed { attempted: 4 }
}

/// Build an orchestrator with the default retry policy
pub fn orchestrator(
    resolvers: ResolverSet,
    publisher: ScriptedPublisher,
) -> (UpdateOrchestrator, mpsc::Receiver<LogEvent>) {
    UpdateOrchestrator::new(resolvers, Box::new(publisher), EngineConfig::default())
        .expect("orchestrator construction succeeds")
}

/// Collect every event currently queued
pub fn drain(rx: &mut mpsc::Receiver<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}

/// Assert a paused-clock duration to the second
///
/// The timer wheel works in milliseconds, so allow a sub-second margin.
pub fn assert_elapsed_secs(elapsed: std::time::Duration, secs: u64) {
    let expected = std::time::Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + std::time::Duration::from_secs(1),
        "expected about {secs}s, got {elapsed:?}"
    );
}
