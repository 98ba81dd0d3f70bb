// # duckdnsd - DuckDNS Updater Daemon
//
// Thin integration layer: reads configuration, wires the resolvers, the
// DuckDNS publisher and a state store into an `UpdateOrchestrator`, and runs
// it on a fixed schedule. All resolution, change detection and retry logic
// lives in duckdns-core.
//
// ## Shutdown
//
// SIGTERM/SIGINT are honoured between cycles. A cycle that is already
// running (including its retries and backoff delays) completes first, so a
// fully retried cycle can delay shutdown by a few minutes.
//
// ## Configuration
//
// Environment variables, optionally seeded from a JSON configuration file:
//
// ### Account
// - `DUCKDNS_CONFIG_FILE`: JSON file with an `UpdaterConfig` (env overrides it)
// - `DUCKDNS_SUBDOMAIN`: Subdomain without `.duckdns.org`
// - `DUCKDNS_TOKEN`: Account token
//
// ### Resolution
// - `DUCKDNS_RESOLUTION_MODE`: webservice, local, fixed, host
// - `DUCKDNS_RESOLUTION_VALUE`: Address (fixed) or hostname (host)
// - `DUCKDNS_IP_CHECK_URLS`: Comma-separated echo endpoints (webservice)
//
// ### Schedule
// - `DUCKDNS_INTERVAL_MINUTES`: Minutes between cycles (1-1440, default 5)
// - `DUCKDNS_RUN_ONCE`: Run a single cycle and exit
//
// ### Provider
// - `DUCKDNS_UPDATE_URL`: Override of the update endpoint
//
// ### State Store
// - `DUCKDNS_STATE_STORE_TYPE`: file (default) or memory
// - `DUCKDNS_STATE_STORE_PATH`: State file (default `duckdns_state.json`)
//
// ### Logging
// - `DUCKDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export DUCKDNS_SUBDOMAIN=myhome
// export DUCKDNS_TOKEN=a7c4d0ad-114e-40ef-ba1d-d217904a50f2
// export DUCKDNS_STATE_STORE_PATH=/var/lib/duckdns/state.json
//
// duckdnsd
// ```

use anyhow::{Context, Result};
use std::env;
use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use duckdns_core::traits::StateRecord;
use duckdns_core::{
    FileStateStore, LogEvent, LogFeed, MemoryStateStore, ResolutionMode, StateStore,
    UpdateOrchestrator, UpdateOutcome, UpdaterConfig,
};
use duckdns_ip::standard_resolvers;
use duckdns_provider::DuckDnsPublisher;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const DEFAULT_STATE_STORE_PATH: &str = "duckdns_state.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or a successful single run
/// - 1: Configuration or startup error
/// - 2: Runtime error, or a failed single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
#[derive(Debug)]
struct DaemonConfig {
    updater: UpdaterConfig,
    state_store_type: String,
    state_store_path: String,
    run_once: bool,
    log_level: String,
}

impl DaemonConfig {
    /// Load configuration from the process environment
    async fn from_env() -> Result<Self> {
        let base = match env::var("DUCKDNS_CONFIG_FILE") {
            Ok(path) if !path.trim().is_empty() => UpdaterConfig::load(path.trim()).await?,
            _ => UpdaterConfig::default(),
        };

        Self::from_lookup(base, |key| env::var(key).ok())
    }

    /// Overlay `DUCKDNS_*` variables from `lookup` on top of `base`
    fn from_lookup(base: UpdaterConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut updater = base;

        if let Some(subdomain) = lookup("DUCKDNS_SUBDOMAIN") {
            updater.subdomain = subdomain.trim().to_string();
        }
        if let Some(token) = lookup("DUCKDNS_TOKEN") {
            updater.token = token.trim().to_string();
        }
        if let Some(minutes) = lookup("DUCKDNS_INTERVAL_MINUTES") {
            updater.update_interval_minutes = minutes.trim().parse().with_context(|| {
                format!("DUCKDNS_INTERVAL_MINUTES must be a whole number. Got: {}", minutes)
            })?;
        }
        if let Some(mode) = lookup("DUCKDNS_RESOLUTION_MODE") {
            updater.resolution_mode = mode.parse::<ResolutionMode>().with_context(|| {
                "DUCKDNS_RESOLUTION_MODE must be one of: webservice, local, fixed, host"
            })?;
        }
        if let Some(value) = lookup("DUCKDNS_RESOLUTION_VALUE") {
            updater.resolution_value = value.trim().to_string();
        }
        if let Some(url) = lookup("DUCKDNS_UPDATE_URL") {
            let url = url.trim();
            updater.update_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(urls) = lookup("DUCKDNS_IP_CHECK_URLS") {
            updater.ip_check_urls = urls
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        let run_once = match lookup("DUCKDNS_RUN_ONCE") {
            Some(flag) => parse_flag(&flag)
                .with_context(|| format!("DUCKDNS_RUN_ONCE must be true or false. Got: {}", flag))?,
            None => false,
        };

        Ok(Self {
            updater,
            state_store_type: lookup("DUCKDNS_STATE_STORE_TYPE")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|| "file".to_string()),
            state_store_path: lookup("DUCKDNS_STATE_STORE_PATH")
                .unwrap_or_else(|| DEFAULT_STATE_STORE_PATH.to_string()),
            run_once,
            log_level: lookup("DUCKDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.updater.subdomain.is_empty() {
            anyhow::bail!(
                "DUCKDNS_SUBDOMAIN is required. \
                Set it via: export DUCKDNS_SUBDOMAIN=myhome"
            );
        }

        if self.updater.token.is_empty() {
            anyhow::bail!(
                "DUCKDNS_TOKEN is required. \
                Set it via: export DUCKDNS_TOKEN=your_token"
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.updater.token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower == "token"
        {
            anyhow::bail!(
                "DUCKDNS_TOKEN appears to be a placeholder. \
                Use the token shown on your duckdns.org account page."
            );
        }

        if self.updater.subdomain.ends_with(".duckdns.org") {
            anyhow::bail!(
                "DUCKDNS_SUBDOMAIN must not include the domain. Got: {}",
                self.updater.subdomain
            );
        }

        self.updater.validate()?;

        if let Err(e) = self
            .updater
            .resolution_mode
            .validate_value(&self.updater.resolution_value)
        {
            anyhow::bail!("DUCKDNS_RESOLUTION_VALUE: {}", e);
        }

        match self.state_store_type.as_str() {
            "file" => {
                if self.state_store_path.trim().is_empty() {
                    anyhow::bail!(
                        "DUCKDNS_STATE_STORE_PATH cannot be empty when DUCKDNS_STATE_STORE_TYPE=file"
                    );
                }
            }
            "memory" => {}
            _ => anyhow::bail!(
                "DUCKDNS_STATE_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_store_type
            ),
        }

        if parse_log_level(&self.log_level).is_none() {
            anyhow::bail!(
                "DUCKDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.updater.update_interval_minutes) * 60)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    // Load configuration from environment
    let config = match rt.block_on(DaemonConfig::from_env()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting duckdnsd");
    info!(
        "Managing {}.duckdns.org using {} method",
        config.updater.subdomain, config.updater.resolution_mode
    );

    rt.block_on(async {
        match run_daemon(config).await {
            Ok(true) => DaemonExitCode::CleanShutdown,
            Ok(false) => DaemonExitCode::RuntimeError,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Run the daemon
///
/// # Returns
///
/// In single-run mode, whether the cycle succeeded; otherwise `true` after a
/// clean shutdown.
async fn run_daemon(config: DaemonConfig) -> Result<bool> {
    let resolvers = standard_resolvers(&config.updater.ip_check_urls)?;

    let publisher = match config.updater.update_url.as_deref() {
        Some(url) => DuckDnsPublisher::with_update_url(url)?,
        None => DuckDnsPublisher::new()?,
    };
    info!("Update endpoint: {}", publisher.update_url());

    let (orchestrator, events) =
        UpdateOrchestrator::new(resolvers, Box::new(publisher), config.updater.engine.clone())?;

    let store: Box<dyn StateStore> = match config.state_store_type.as_str() {
        "memory" => {
            info!("Using in-memory state store");
            Box::new(MemoryStateStore::new())
        }
        _ => {
            info!("Using file state store at {}", config.state_store_path);
            Box::new(FileStateStore::new(&config.state_store_path).await?)
        }
    };

    let policy = orchestrator.policy();
    info!(
        "Retry policy: {} attempt(s), {} publish attempt(s) per attempt, {}s backoff step",
        policy.max_attempts, policy.publish_attempts, policy.backoff_step_secs
    );

    let period = config.interval();
    let mut updater = Updater::new(orchestrator, events, store, config.updater);

    if config.run_once {
        let outcome = updater.run_cycle().await?;
        return Ok(outcome.update_success());
    }

    info!("Checking every {} minute(s)", period.as_secs() / 60);
    let received = schedule(&mut updater, period, wait_for_shutdown()).await?;
    info!("Received shutdown signal: {}", received);
    info!("Shutting down duckdnsd");

    Ok(true)
}

/// One orchestrator plus the caller-side state it needs between cycles
struct Updater {
    orchestrator: UpdateOrchestrator,
    events: mpsc::Receiver<LogEvent>,
    feed: LogFeed,
    store: Box<dyn StateStore>,
    config: UpdaterConfig,
    cycles: u64,
}

impl Updater {
    fn new(
        orchestrator: UpdateOrchestrator,
        events: mpsc::Receiver<LogEvent>,
        store: Box<dyn StateStore>,
        config: UpdaterConfig,
    ) -> Self {
        Self {
            orchestrator,
            events,
            feed: LogFeed::new(),
            store,
            config,
            cycles: 0,
        }
    }

    /// Run one cycle and persist its outcome
    ///
    /// A failed update is not an error here; only state store failures are.
    async fn run_cycle(&mut self) -> Result<UpdateOutcome> {
        let subdomain = self.config.subdomain.trim();
        let last_ip = self
            .store
            .get_last_ip(subdomain)
            .await?
            .unwrap_or_default();

        let outcome = self
            .orchestrator
            .check_and_update_config(&self.config, &last_ip)
            .await;
        self.cycles += 1;

        self.feed.drain(&mut self.events);
        let record = StateRecord::from_outcome(&outcome, self.feed.snapshot());
        self.store.set_record(subdomain, &record).await?;
        self.store.flush().await?;

        info!("Cycle {} finished: {}", self.cycles, outcome);
        Ok(outcome)
    }
}

/// Run a cycle immediately, then once per `period`, until `shutdown` resolves
///
/// Cycles never overlap: a tick that falls due while a cycle is still running
/// is delayed until it returns, and `shutdown` is only observed between
/// cycles. A cycle that fails to persist its state is logged and the schedule
/// continues.
async fn schedule<F>(updater: &mut Updater, period: Duration, shutdown: F) -> Result<&'static str>
where
    F: Future<Output = Result<&'static str>>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = updater.run_cycle().await {
                    error!("Cycle {} failed: {:#}", updater.cycles, e);
                }
            }
            received = &mut shutdown => return received,
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// The name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
