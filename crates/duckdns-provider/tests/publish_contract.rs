//! Contract Test: DuckDNS Update Request/Response
//!
//! Runs the publisher against a local one-shot HTTP responder.
//!
//! Constraints verified:
//! - Exactly one GET per call, with `domains`, `token` and `ip` parameters
//! - `OK` is success; `KO`/`BAD`/other bodies and non-2xx statuses are failures
//! - Failure bodies are logged verbatim with a hint
//! - The token never appears in any log event

use duckdns_core::{DnsPublisher, EventLog, LogEvent, PublishError, RejectReason, Severity};
use duckdns_provider::DuckDnsPublisher;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

const TOKEN: &str = "a7c4d0ad-114e-40ef-ba1d-d217904a50f2";

/// Serve one request with the given status line and body
///
/// Returns the update URL to use and a receiver for the request line.
async fn one_shot_server(status_line: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let request = String::from_utf8_lossy(&request).to_string();
        let request_line = request.lines().next().unwrap_or_default().to_string();
        let _ = tx.send(request_line);

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (format!("http://{}/update", addr), rx)
}

/// Publisher for a local endpoint, bypassing any system proxy
fn local_publisher(url: &str) -> DuckDnsPublisher {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    DuckDnsPublisher::with_client(client, url).unwrap()
}

fn drain(rx: &mut mpsc::Receiver<LogEvent>) -> Vec<LogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn ok_body_is_success() {
    let (url, request_line) = one_shot_server("200 OK", "OK").await;
    let publisher = local_publisher(&url);
    let (log, mut rx) = EventLog::channel(16);

    publisher
        .publish("myhome", TOKEN, Ipv4Addr::new(203, 0, 113, 5), &log)
        .await
        .unwrap();

    let request_line = request_line.await.unwrap();
    assert!(request_line.starts_with("GET /update?"));
    assert!(request_line.contains("domains=myhome"));
    assert!(request_line.contains(&format!("token={}", TOKEN)));
    assert!(request_line.contains("ip=203.0.113.5"));

    let events = drain(&mut rx);
    assert_eq!(events[0].message, "Updating DuckDNS: myhome.duckdns.org -> 203.0.113.5");
    assert_eq!(events.last().unwrap().severity, Severity::Success);
    assert!(events.iter().all(|e| !e.message.contains(TOKEN)));
}

#[tokio::test]
async fn ko_body_is_rejected_with_hint() {
    let (url, _) = one_shot_server("200 OK", "KO").await;
    let publisher = local_publisher(&url);
    let (log, mut rx) = EventLog::channel(16);

    let err = publisher
        .publish("myhome", TOKEN, Ipv4Addr::new(203, 0, 113, 5), &log)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PublishError::Rejected {
            reason: RejectReason::Ko,
            body: "KO".to_string()
        }
    );
    assert!(err.is_retryable());

    let messages: Vec<String> = drain(&mut rx).into_iter().map(|e| e.message).collect();
    assert!(messages.contains(&"✗ DuckDNS update failed. Response: 'KO'".to_string()));
    assert!(messages.contains(&"  → Invalid domain or token".to_string()));
    assert!(messages.iter().all(|m| !m.contains(TOKEN)));
}

#[tokio::test]
async fn server_error_status_is_a_failure() {
    let (url, _) = one_shot_server("502 Bad Gateway", "OK").await;
    let publisher = local_publisher(&url);
    let (log, mut rx) = EventLog::channel(16);

    let err = publisher
        .publish("myhome", TOKEN, Ipv4Addr::new(203, 0, 113, 5), &log)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PublishError::Status {
            status: 502,
            reason: "Bad Gateway".to_string()
        }
    );
    let events = drain(&mut rx);
    assert_eq!(events.last().unwrap().message, "✗ HTTP Error 502: Bad Gateway");
}

#[tokio::test]
async fn connection_refused_is_a_network_error_without_token() {
    // Bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let publisher = local_publisher(&format!("http://{}/update", addr));

    let err = publisher
        .publish("myhome", TOKEN, Ipv4Addr::new(203, 0, 113, 5), &EventLog::disabled())
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Network(_)));
    assert!(!err.to_string().contains(TOKEN));
}
