// # Log Events
//
// The orchestrator narrates every cycle as an ordered sequence of
// (timestamp, severity, message) records. Consumers (a UI log pane, a file
// sink, stdout) receive them over a bounded channel and may keep a rolling
// window with `LogFeed`.
//
// Every event is mirrored to `tracing` at the matching level, so a daemon
// with a subscriber installed sees the same narrative without draining the
// channel.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Entries kept by a `LogFeed` before it trims
pub const FEED_MAX_ENTRIES: usize = 100;

/// Entries a `LogFeed` keeps after trimming
pub const FEED_TRIM_TO: usize = 50;

/// Severity of a log event, with a colour hint for UI consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress narration
    Info,
    /// A step completed successfully
    Success,
    /// Recoverable problem (endpoint skipped, attempt retried)
    Warning,
    /// A step or the whole cycle failed
    Error,
}

impl Severity {
    /// Suggested display colour
    pub fn color_hint(&self) -> &'static str {
        match self {
            Self::Info => "cyan",
            Self::Success => "green",
            Self::Warning => "yellow",
            Self::Error => "red",
        }
    }
}

/// A single log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
    /// How the consumer should present it
    pub severity: Severity,
    /// Human-readable text
    pub message: String,
}

impl LogEvent {
    /// Create an event stamped with the current time
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.with_timezone(&Local).format("%H:%M:%S"),
            self.message
        )
    }
}

/// Emitting side of the log-event channel
///
/// Cheap to clone; all clones feed the same receiver. Emitting never blocks:
/// when the channel is full the event is dropped and a tracing warning is
/// logged instead.
#[derive(Debug, Clone)]
pub struct EventLog {
    tx: Option<mpsc::Sender<LogEvent>>,
}

impl EventLog {
    /// Create a log and the receiver its events are delivered to
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LogEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A log that only mirrors to tracing
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(Severity::Success, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }

    /// Emit an event with an explicit severity
    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        let event = LogEvent::new(severity, message);

        match severity {
            Severity::Info | Severity::Success => info!("{}", event.message),
            Severity::Warning => warn!("{}", event.message),
            Severity::Error => error!("{}", event.message),
        }

        if let Some(tx) = &self.tx
            && tx.try_send(event).is_err()
        {
            warn!("Log event channel full or closed, dropping event");
        }
    }
}

/// Rolling window over the most recent log events
///
/// Keeps at most `max_entries`; once exceeded, only the newest `trim_to`
/// entries survive.
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEvent>,
    max_entries: usize,
    trim_to: usize,
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFeed {
    /// Create a feed with the default window (100, trimmed to 50)
    pub fn new() -> Self {
        Self::with_limits(FEED_MAX_ENTRIES, FEED_TRIM_TO)
    }

    /// Create a feed with a custom window
    pub fn with_limits(max_entries: usize, trim_to: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries + 1),
            max_entries,
            trim_to: trim_to.min(max_entries),
        }
    }

    /// Append an event, trimming when the window overflows
    pub fn push(&mut self, event: LogEvent) {
        self.entries.push_back(event);
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.trim_to;
            self.entries.drain(..excess);
        }
    }

    /// Move every event currently queued in `rx` into the feed
    ///
    /// Returns the number of events drained. Never waits.
    pub fn drain(&mut self, rx: &mut mpsc::Receiver<LogEvent>) -> usize {
        let mut drained = 0;
        while let Ok(event) = rx.try_recv() {
            self.push(event);
            drained += 1;
        }
        drained
    }

    /// Events in emission order
    pub fn entries(&self) -> impl Iterator<Item = &LogEvent> {
        self.entries.iter()
    }

    /// Owned copy of the current window
    pub fn snapshot(&self) -> Vec<LogEvent> {
        self.entries.iter().cloned().collect()
    }

    /// Rendered `[HH:MM:SS] message` lines
    pub fn render_lines(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (log, mut rx) = EventLog::channel(16);

        log.info("resolving");
        log.warn("endpoint skipped");
        log.success("updated");

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        let third = rx.recv().await.unwrap();

        assert_eq!(first.severity, Severity::Info);
        assert_eq!(first.message, "resolving");
        assert_eq!(second.severity, Severity::Warning);
        assert_eq!(third.severity, Severity::Success);
        assert!(first.timestamp <= third.timestamp);
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let (log, mut rx) = EventLog::channel(2);

        log.info("one");
        log.info("two");
        log.info("three");

        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disabled_log_is_silent() {
        let log = EventLog::disabled();
        log.error("nobody is listening");
    }

    #[test]
    fn test_feed_trims_to_newest_entries() {
        let mut feed = LogFeed::new();

        for i in 0..FEED_MAX_ENTRIES {
            feed.push(LogEvent::new(Severity::Info, format!("line {i}")));
        }
        assert_eq!(feed.len(), FEED_MAX_ENTRIES);

        feed.push(LogEvent::new(Severity::Info, "overflow"));
        assert_eq!(feed.len(), FEED_TRIM_TO);

        let messages: Vec<_> = feed.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.last(), Some(&"overflow"));
        assert_eq!(messages.first(), Some(&"line 51"));
    }

    #[test]
    fn test_feed_drain() {
        let (log, mut rx) = EventLog::channel(8);
        let mut feed = LogFeed::with_limits(4, 2);

        log.info("a");
        log.info("b");
        log.error("c");

        assert_eq!(feed.drain(&mut rx), 3);
        assert_eq!(feed.drain(&mut rx), 0);
        assert_eq!(feed.len(), 3);

        let lines = feed.render_lines();
        assert!(lines[2].starts_with('['));
        assert!(lines[2].ends_with("] c"));
    }

    #[test]
    fn test_color_hints() {
        assert_eq!(Severity::Success.color_hint(), "green");
        assert_eq!(Severity::Error.color_hint(), "red");
    }
}
