//! Contract Test: Log-Event Channel
//!
//! Constraints verified:
//! - Every cycle narrates itself as an ordered sequence of events
//! - Collaborator events (resolver, publisher) interleave in call order
//! - Severities match the step (progress, success, warning, failure)
//! - The token never appears in any event

mod common;

use common::*;
use duckdns_core::{LogFeed, ResolutionMode, ResolverSet, Severity};

#[tokio::test(start_paused = true)]
async fn successful_update_is_narrated_in_order() {
    let (orchestrator, mut rx) = orchestrator(
        ResolverSet::new().with(ScriptedResolver::fixed_answer(
            ResolutionMode::WebService,
            "203.0.113.5",
        )),
        ScriptedPublisher::accepting(),
    );

    orchestrator
        .check_and_update(SUBDOMAIN, TOKEN, "198.51.100.1", ResolutionMode::WebService, "")
        .await;

    let messages: Vec<String> = drain(&mut rx).into_iter().map(|e| e.message).collect();
    assert_eq!(
        messages,
        vec![
            "Resolving IP address using WebService method... (Attempt 1/3)".to_string(),
            "✓ Public IP retrieved: 203.0.113.5 (from https://echo.test)".to_string(),
            "IP changed from '198.51.100.1' to '203.0.113.5', updating DuckDNS...".to_string(),
            "Updating DuckDNS: myhome.duckdns.org -> 203.0.113.5".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unchanged_cycle_logs_skip() {
    let (orchestrator, mut rx) = orchestrator(
        ResolverSet::new().with(ScriptedResolver::fixed_answer(
            ResolutionMode::WebService,
            "203.0.113.5",
        )),
        ScriptedPublisher::accepting(),
    );

    orchestrator
        .check_and_update(SUBDOMAIN, TOKEN, "203.0.113.5", ResolutionMode::WebService, "")
        .await;

    let events = drain(&mut rx);
    let last = events.last().unwrap();
    assert_eq!(last.message, "IP unchanged (203.0.113.5), skipping update");
    assert_eq!(last.severity, Severity::Info);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_are_narrated() {
    let (orchestrator, mut rx) = orchestrator(
        ResolverSet::new().with(ScriptedResolver::fixed_answer(
            ResolutionMode::WebService,
            "203.0.113.5",
        )),
        ScriptedPublisher::rejecting(),
    );

    orchestrator
        .check_and_update(SUBDOMAIN, TOKEN, "", ResolutionMode::WebService, "")
        .await;

    let events = drain(&mut rx);
    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();

    for attempt in 1..=3 {
        let banner = format!("Resolving IP address using WebService method... (Attempt {attempt}/3)");
        assert!(messages.contains(&banner.as_str()), "missing {banner}");
    }
    assert!(messages.contains(&"⚠ Retrying in 5 seconds..."));
    assert!(messages.contains(&"⚠ Retrying in 10 seconds..."));
    assert!(!messages.contains(&"⚠ Retrying in 15 seconds..."));
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.starts_with("⚠ Update failed, retrying in 5 seconds"))
            .count(),
        3
    );
    assert_eq!(messages.last(), Some(&"✗ Failed after 3 attempts"));
    assert_eq!(events.last().unwrap().severity, Severity::Error);

    assert!(messages.iter().all(|m| !m.contains(TOKEN)));

    let timestamps: Vec<_> = events.iter().map(|e| e.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn feed_keeps_recent_window_across_cycles() {
    let (orchestrator, mut rx) = orchestrator(
        ResolverSet::new().with(ScriptedResolver::fixed_answer(
            ResolutionMode::WebService,
            "203.0.113.5",
        )),
        ScriptedPublisher::accepting(),
    );
    let mut feed = LogFeed::new();

    for _ in 0..60 {
        orchestrator
            .check_and_update(SUBDOMAIN, TOKEN, "203.0.113.5", ResolutionMode::WebService, "")
            .await;
        feed.drain(&mut rx);
    }

    // 3 events per unchanged cycle, 180 total, trimmed on overflow
    assert!(feed.len() <= duckdns_core::events::FEED_MAX_ENTRIES);
    assert!(feed.len() >= duckdns_core::events::FEED_TRIM_TO);
    assert_eq!(
        feed.entries().last().unwrap().message,
        "IP unchanged (203.0.113.5), skipping update"
    );
}
