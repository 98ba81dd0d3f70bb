// # Web Service Resolver
//
// Determines the public IPv4 address by asking external echo services.
//
// ## Behaviour
//
// - Endpoints are tried strictly in order, never concurrently
// - Each request is bounded by a 10 second timeout
// - The body is trimmed and must be a dotted-quad IPv4 address; IPv6 or
//   anything malformed skips to the next endpoint with a warning
// - The first valid address wins
// - If every endpoint fails: `AllResolutionServicesFailed`
//
// The HTTP transport sits behind `EchoClient`, so the fallback logic can be
// exercised without a network.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use duckdns_core::{
    Error, EventLog, IpResolver, ResolutionError, ResolutionMode, ResolvedIp, parse_ipv4,
};

/// Built-in IP echo endpoints, in the order they are tried
pub const DEFAULT_IP_CHECK_URLS: [&str; 4] = [
    "https://api.ipify.org",
    "https://icanhazip.com",
    "https://checkip.amazonaws.com",
    "https://ipinfo.io/ip",
];

/// Per-request timeout for echo endpoints
pub const IP_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("DuckDNS-Updater/", env!("CARGO_PKG_VERSION"));

/// Failure fetching one echo endpoint
#[derive(Debug, thiserror::Error)]
pub enum EchoError {
    /// Connection, TLS, timeout or body read failure
    #[error("Request failed: {0}")]
    Request(String),

    /// Non-2xx response
    #[error("HTTP error: {0}")]
    Status(u16),
}

/// Transport used to fetch an echo endpoint's body
#[async_trait]
pub trait EchoClient: Send + Sync {
    /// GET `url` and return the raw response body
    async fn fetch(&self, url: &str) -> Result<String, EchoError>;
}

/// `EchoClient` backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestEchoClient {
    client: reqwest::Client,
}

impl ReqwestEchoClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl EchoClient for ReqwestEchoClient {
    async fn fetch(&self, url: &str) -> Result<String, EchoError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EchoError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EchoError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| EchoError::Request(format!("Failed to read response: {}", e)))
    }
}

/// Resolver for [`ResolutionMode::WebService`]
#[derive(Debug)]
pub struct WebServiceResolver<C = ReqwestEchoClient> {
    client: C,
    endpoints: Vec<String>,
}

impl WebServiceResolver<ReqwestEchoClient> {
    /// Create a resolver over the given endpoints
    ///
    /// An empty list falls back to [`DEFAULT_IP_CHECK_URLS`].
    pub fn new(endpoints: Vec<String>) -> Result<Self, Error> {
        Ok(Self::with_client(
            ReqwestEchoClient::new(IP_CHECK_TIMEOUT)?,
            endpoints,
        ))
    }
}

impl<C: EchoClient> WebServiceResolver<C> {
    /// Create a resolver with a custom transport
    pub fn with_client(client: C, endpoints: Vec<String>) -> Self {
        let endpoints: Vec<String> = endpoints
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        let endpoints = if endpoints.is_empty() {
            DEFAULT_IP_CHECK_URLS.iter().map(|s| s.to_string()).collect()
        } else {
            endpoints
        };

        Self { client, endpoints }
    }

    /// Endpoints in the order they are tried
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

#[async_trait]
impl<C: EchoClient> IpResolver for WebServiceResolver<C> {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::WebService
    }

    async fn resolve(&self, _value: &str, log: &EventLog) -> Result<ResolvedIp, ResolutionError> {
        for url in &self.endpoints {
            debug!("Querying IP echo endpoint {}", url);
            match self.client.fetch(url).await {
                Ok(body) => {
                    let candidate = body.trim();
                    match parse_ipv4(candidate) {
                        Some(ip) => {
                            log.success(format!("✓ Public IP retrieved: {} (from {})", ip, url));
                            return Ok(ResolvedIp::new(ip, url.clone()));
                        }
                        None => {
                            log.warn(format!("⚠ Invalid IP format from {}: {}", url, candidate));
                        }
                    }
                }
                Err(e) => {
                    log.warn(format!("⚠ Failed to get IP from {}: {}", url, e));
                }
            }
        }

        Err(ResolutionError::AllResolutionServicesFailed {
            attempted: self.endpoints.len(),
        })
    }
}
