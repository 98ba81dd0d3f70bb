// # duckdns-ip
//
// IP resolution strategies for the DuckDNS updater.
//
// ## Strategies
//
// | Mode         | Resolver              | Source label          |
// |--------------|-----------------------|-----------------------|
// | `WebService` | `WebServiceResolver`  | echo endpoint URL     |
// | `Local`      | `LocalResolver`       | `local:<interface>`   |
// | `Fixed`      | `FixedResolver`       | `fixed`               |
// | `Host`       | `HostResolver`        | `host:<hostname>`     |
//
// Each resolver is single-shot: it never retries or sleeps. Retries belong
// to the `UpdateOrchestrator` in `duckdns-core`.

pub mod fixed;
pub mod host;
pub mod local;
pub mod web;

pub use fixed::FixedResolver;
pub use host::HostResolver;
pub use local::LocalResolver;
pub use web::{
    DEFAULT_IP_CHECK_URLS, EchoClient, EchoError, ReqwestEchoClient, WebServiceResolver,
};

use duckdns_core::{ResolverSet, Result};

/// Register all four built-in strategies
///
/// # Parameters
///
/// - `ip_check_urls`: Echo endpoints for `WebService` mode, tried in order;
///   empty means [`DEFAULT_IP_CHECK_URLS`]
pub fn standard_resolvers(ip_check_urls: &[String]) -> Result<ResolverSet> {
    Ok(ResolverSet::new()
        .with(WebServiceResolver::new(ip_check_urls.to_vec())?)
        .with(LocalResolver::new())
        .with(FixedResolver::new())
        .with(HostResolver::new()))
}
