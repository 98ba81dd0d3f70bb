//! Configuration types for the DuckDNS updater
//!
//! The core only interprets what it needs (subdomain/token non-emptiness,
//! resolution mode and value, retry policy). The remaining fields are carried
//! for the UI/daemon collaborator that owns persistence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, ResolutionError};
use crate::ipv4::parse_ipv4;

/// Outer attempts per cycle (resolve + compare + publish)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Publish attempts inside one cycle
pub const DEFAULT_PUBLISH_ATTEMPTS: u32 = 2;

/// Fixed delay between publish attempts (seconds)
pub const DEFAULT_PUBLISH_RETRY_DELAY_SECS: u64 = 5;

/// Outer backoff step; the n-th failure waits `n * step` (seconds)
pub const DEFAULT_BACKOFF_STEP_SECS: u64 = 5;

/// Capacity of the log-event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Default update interval (minutes)
pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u32 = 5;

/// Accepted update interval range (minutes)
pub const UPDATE_INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 1..=1440;

/// Strategy used to determine "the current IP"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResolutionMode {
    /// Ask external IP echo services
    #[default]
    WebService,
    /// First routable IPv4 address of a local interface
    Local,
    /// A configured, fixed address
    Fixed,
    /// Forward lookup of a configured hostname
    Host,
}

impl ResolutionMode {
    /// All modes, in display order
    pub const ALL: [ResolutionMode; 4] = [Self::WebService, Self::Local, Self::Fixed, Self::Host];

    /// Whether this mode needs an accompanying value
    pub fn requires_value(&self) -> bool {
        matches!(self, Self::Fixed | Self::Host)
    }

    /// Check the accompanying value without touching the network
    ///
    /// Fixed values must be dotted-quad IPv4 addresses; Fixed and Host values
    /// must not be blank. WebService and Local ignore the value.
    pub fn validate_value(&self, value: &str) -> Result<(), ResolutionError> {
        if !self.requires_value() {
            return Ok(());
        }

        let value = value.trim();
        if value.is_empty() {
            return Err(ResolutionError::EmptyValue(*self));
        }

        if *self == Self::Fixed && parse_ipv4(value).is_none() {
            return Err(ResolutionError::InvalidFixedAddress(value.to_string()));
        }

        Ok(())
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WebService => "WebService",
            Self::Local => "Local",
            Self::Fixed => "Fixed",
            Self::Host => "Host",
        };
        f.write_str(name)
    }
}

impl FromStr for ResolutionMode {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webservice" | "web_service" | "web" => Ok(Self::WebService),
            "local" => Ok(Self::Local),
            "fixed" => Ok(Self::Fixed),
            "host" | "hostname" => Ok(Self::Host),
            _ => Err(ResolutionError::UnsupportedResolutionMode(s.trim().to_string())),
        }
    }
}

impl TryFrom<String> for ResolutionMode {
    type Error = ResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResolutionMode> for String {
    fn from(mode: ResolutionMode) -> Self {
        mode.to_string()
    }
}

/// Updater configuration snapshot
///
/// Owned by the caller and passed by value into every cycle.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// DuckDNS subdomain (without `.duckdns.org`)
    #[serde(default)]
    pub subdomain: String,

    /// DuckDNS account token
    /// ⚠️ NEVER log this value
    #[serde(default)]
    pub token: String,

    /// Minutes between scheduled cycles
    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: u32,

    /// How the current IP is determined
    #[serde(default)]
    pub resolution_mode: ResolutionMode,

    /// Value for Fixed (an address) or Host (a hostname) modes
    #[serde(default)]
    pub resolution_value: String,

    /// Start scheduled updates as soon as the application starts
    #[serde(default)]
    pub auto_start: bool,

    /// UI preference, carried through untouched
    #[serde(default)]
    pub minimize_to_tray: bool,

    /// Override of the provider update endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,

    /// Override of the IP echo endpoint list (empty = built-in list)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_check_urls: Vec<String>,

    /// Retry policy and channel sizing
    #[serde(default)]
    pub engine: EngineConfig,
}

// Custom Debug implementation that hides the token
impl fmt::Debug for UpdaterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdaterConfig")
            .field("subdomain", &self.subdomain)
            .field("token", &"<REDACTED>")
            .field("update_interval_minutes", &self.update_interval_minutes)
            .field("resolution_mode", &self.resolution_mode)
            .field("resolution_value", &self.resolution_value)
            .field("auto_start", &self.auto_start)
            .field("minimize_to_tray", &self.minimize_to_tray)
            .field("update_url", &self.update_url)
            .field("ip_check_urls", &self.ip_check_urls)
            .field("engine", &self.engine)
            .finish()
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            subdomain: String::new(),
            token: String::new(),
            update_interval_minutes: DEFAULT_UPDATE_INTERVAL_MINUTES,
            resolution_mode: ResolutionMode::default(),
            resolution_value: String::new(),
            auto_start: false,
            minimize_to_tray: false,
            update_url: None,
            ip_check_urls: Vec::new(),
            engine: EngineConfig::default(),
        }
    }
}

impl UpdaterConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Error> {
        if self.subdomain.trim().is_empty() {
            return Err(Error::config("Subdomain cannot be empty"));
        }
        if self.token.trim().is_empty() {
            return Err(Error::config("Token cannot be empty"));
        }
        if !UPDATE_INTERVAL_RANGE.contains(&self.update_interval_minutes) {
            return Err(Error::config(format!(
                "Update interval must be between {} and {} minutes. Got: {}",
                UPDATE_INTERVAL_RANGE.start(),
                UPDATE_INTERVAL_RANGE.end(),
                self.update_interval_minutes
            )));
        }

        self.engine.validate()?;

        Ok(())
    }

    /// Load a configuration file
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(
                "No configuration file found at {}, using default settings",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::config(format!(
                "Failed to read configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse configuration file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the configuration as pretty JSON (write-then-rename)
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;

        let mut temp_path = path.to_path_buf();
        temp_path.set_extension("tmp");

        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, path).await?;

        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Retry policy and channel sizing for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Outer attempts per cycle
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Publish attempts inside one outer attempt
    #[serde(default = "default_publish_attempts")]
    pub publish_attempts: u32,

    /// Delay between publish attempts (in seconds)
    #[serde(default = "default_publish_retry_delay_secs")]
    pub publish_retry_delay_secs: u64,

    /// Progressive outer backoff step (in seconds)
    ///
    /// After the n-th failed outer attempt the orchestrator waits
    /// `n * backoff_step_secs` before the next one.
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u64,

    /// Capacity of the log-event channel
    ///
    /// When full, new events are dropped (with a tracing warning).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            publish_attempts: default_publish_attempts(),
            publish_retry_delay_secs: default_publish_retry_delay_secs(),
            backoff_step_secs: default_backoff_step_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl EngineConfig {
    /// Validate the retry policy
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_attempts == 0 {
            return Err(Error::config("max_attempts must be at least 1"));
        }
        if self.publish_attempts == 0 {
            return Err(Error::config("publish_attempts must be at least 1"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("event_channel_capacity must be at least 1"));
        }
        Ok(())
    }
}

fn default_update_interval_minutes() -> u32 {
    DEFAULT_UPDATE_INTERVAL_MINUTES
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_publish_attempts() -> u32 {
    DEFAULT_PUBLISH_ATTEMPTS
}

fn default_publish_retry_delay_secs() -> u64 {
    DEFAULT_PUBLISH_RETRY_DELAY_SECS
}

fn default_backoff_step_secs() -> u64 {
    DEFAULT_BACKOFF_STEP_SECS
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}
