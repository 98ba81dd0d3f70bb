// # DuckDNS Publisher
//
// Pushes a new IPv4 address to the DuckDNS update endpoint.
//
// ## Protocol
//
// One GET request per call:
//
// ```text
// GET https://www.duckdns.org/update?domains=<sub>&token=<token>&ip=<ipv4>
// ```
//
// - Non-2xx status: failure (`PublishError::Status`)
// - 2xx with a body that trims to `OK` (any case): success
// - 2xx with any other body (`KO`, `BAD`, ...): failure, body kept verbatim
//
// ## Responsibilities
//
// - ✅ Build the request URL with every parameter percent-encoded
// - ✅ Interpret the response and narrate it on the log-event channel
// - ❌ NO retry or backoff (owned by `UpdateOrchestrator`)
// - ❌ NO state between calls
//
// ## Security
//
// The token is part of the request URL, so the URL is never logged and
// transport errors are stripped of it before they are reported.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::debug;
use url::{Url, form_urlencoded};

use duckdns_core::{DnsPublisher, Error, EventLog, PublishError, RejectReason};

/// DuckDNS update endpoint
pub const DUCKDNS_UPDATE_URL: &str = "https://www.duckdns.org/update";

/// HTTP timeout for one update request
pub const UPDATE_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("DuckDNS-Updater/", env!("CARGO_PKG_VERSION"));

/// DuckDNS implementation of [`DnsPublisher`]
#[derive(Debug, Clone)]
pub struct DuckDnsPublisher {
    client: reqwest::Client,
    update_url: Url,
}

impl DuckDnsPublisher {
    /// Create a publisher for the public DuckDNS endpoint
    pub fn new() -> Result<Self, Error> {
        Self::with_update_url(DUCKDNS_UPDATE_URL)
    }

    /// Create a publisher for a custom update endpoint
    ///
    /// # Errors
    ///
    /// `Error::Config` if the URL does not parse or is not http(s).
    pub fn with_update_url(update_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(UPDATE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Other(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_client(client, update_url)
    }

    /// Create a publisher around a preconfigured HTTP client
    ///
    /// The caller is responsible for the client's timeout and proxy settings.
    pub fn with_client(client: reqwest::Client, update_url: &str) -> Result<Self, Error> {
        let update_url = Url::parse(update_url.trim())
            .map_err(|e| Error::config(format!("Invalid update URL '{}': {}", update_url, e)))?;

        if !matches!(update_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Update URL must use http or https, got '{}'",
                update_url.scheme()
            )));
        }

        Ok(Self { client, update_url })
    }

    /// The endpoint requests are sent to (without query parameters)
    pub fn update_url(&self) -> &Url {
        &self.update_url
    }
}

/// Percent-encode one query value; spaces become `%20`, never `+`
fn encode_component(value: &str) -> String {
    // byte_serialize escapes a literal '+' as %2B, so every remaining '+' is a space
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Append `domains`, `token` and `ip` to `base`, percent-encoding each value
pub fn build_update_url(base: &Url, subdomain: &str, token: &str, ip: Ipv4Addr) -> Url {
    let params = format!(
        "domains={}&token={}&ip={}",
        encode_component(subdomain),
        encode_component(token),
        ip
    );

    let mut url = base.clone();
    let query = match base.query() {
        Some(existing) if !existing.is_empty() => format!("{}&{}", existing, params),
        _ => params,
    };
    url.set_query(Some(&query));
    url
}

/// Map an HTTP status and body to the update result
pub fn interpret_response(status: StatusCode, body: &str) -> Result<(), PublishError> {
    if !status.is_success() {
        return Err(PublishError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let body = body.trim();
    if body.eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(PublishError::Rejected {
            reason: RejectReason::classify(body),
            body: body.to_string(),
        })
    }
}

/// Describe a transport error without the request URL
fn describe_transport_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out after {}s", UPDATE_TIMEOUT.as_secs())
    } else {
        e.without_url().to_string()
    }
}

fn validate_request(subdomain: &str, token: &str, ip: Ipv4Addr) -> Result<(), PublishError> {
    if subdomain.trim().is_empty() {
        return Err(PublishError::InvalidRequest("Subdomain cannot be empty".into()));
    }
    if token.trim().is_empty() {
        return Err(PublishError::InvalidRequest("Token cannot be empty".into()));
    }
    if ip.is_unspecified() {
        return Err(PublishError::InvalidRequest(format!("Invalid IP address: {}", ip)));
    }
    Ok(())
}

#[async_trait]
impl DnsPublisher for DuckDnsPublisher {
    async fn publish(
        &self,
        subdomain: &str,
        token: &str,
        ip: Ipv4Addr,
        log: &EventLog,
    ) -> Result<(), PublishError> {
        validate_request(subdomain, token, ip)?;
        let subdomain = subdomain.trim();

        let url = build_update_url(&self.update_url, subdomain, token.trim(), ip);
        log.info(format!("Updating DuckDNS: {}.duckdns.org -> {}", subdomain, ip));

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = describe_transport_error(e);
                log.error(format!("✗ Error updating DuckDNS: {}", reason));
                return Err(PublishError::Network(reason));
            }
        };

        let status = response.status();
        debug!("DuckDNS responded with status {}", status);
        if !status.is_success() {
            let err = interpret_response(status, "");
            log.error(format!(
                "✗ HTTP Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
            return err;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let reason = describe_transport_error(e);
                log.error(format!("✗ Error reading DuckDNS response: {}", reason));
                return Err(PublishError::Network(reason));
            }
        };

        match interpret_response(status, &body) {
            Ok(()) => {
                log.success(format!("✓ DuckDNS update successful for {}.duckdns.org", subdomain));
                Ok(())
            }
            Err(PublishError::Rejected { reason, body }) => {
                log.error(format!("✗ DuckDNS update failed. Response: '{}'", body));
                match reason {
                    RejectReason::Unexpected => {
                        log.error(format!("  → {}: {}", reason.hint(), body))
                    }
                    _ => log.error(format!("  → {}", reason.hint())),
                }
                Err(PublishError::Rejected { reason, body })
            }
            Err(e) => Err(e),
        }
    }

    fn provider_name(&self) -> &'static str {
        "duckdns"
    }
}
