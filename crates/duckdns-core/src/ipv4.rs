//! IPv4 address validation
//!
//! Only dotted-quad IPv4 is accepted anywhere in the updater: IPv6 literals,
//! hostnames, short forms (`1.2.3`) and out-of-range octets are rejected.

use std::net::Ipv4Addr;

/// Parse a dotted-quad IPv4 address
///
/// The input is not trimmed; callers normalise before parsing.
pub fn parse_ipv4(candidate: &str) -> Option<Ipv4Addr> {
    candidate.parse::<Ipv4Addr>().ok()
}

/// Check whether a string is a well-formed dotted-quad IPv4 address
pub fn is_valid_ipv4(candidate: &str) -> bool {
    parse_ipv4(candidate).is_some()
}
