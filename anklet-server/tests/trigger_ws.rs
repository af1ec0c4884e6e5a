//! Integration tests for the trigger WebSocket.
//!
//! Each test starts the router on a random port backed by a scripted
//! orchestrator and talks to it through tokio-tungstenite.

use std::time::Duration;

use anklet_client::testing::{FakeOrchestrator, running_after};
use anklet_client::workflow::TriggerRequest;
use anklet_core::dto::session::SessionMessage;
use anklet_server::api::{AppState, create_router};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start the server on a random port, return the port.
async fn start_server(fake: FakeOrchestrator, wait: Duration) -> u16 {
    let request = TriggerRequest::new("symphony", "agent_A", wait);
    let app = create_router(AppState::new(fake, request, 4));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    port
}

async fn connect(port: u16) -> Client {
    let url = format!("ws://127.0.0.1:{}/ws/trigger-update", port);
    let (ws, _) = timeout(TEST_TIMEOUT, connect_async(&url))
        .await
        .expect("connect timed out")
        .expect("connect failed");
    ws
}

/// Reads messages until the server closes the socket.
async fn collect(ws: &mut Client) -> (Vec<SessionMessage>, bool) {
    let mut messages = Vec::new();
    loop {
        let next = timeout(TEST_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a message");

        match next {
            Some(Ok(Message::Text(text))) => {
                messages.push(serde_json::from_str(text.as_str()).expect("invalid message"));
            }
            Some(Ok(Message::Close(_))) => return (messages, true),
            Some(Ok(_)) => {}
            Some(Err(_)) | None => return (messages, false),
        }
    }
}

#[tokio::test]
async fn triggered_then_running_then_closed() {
    let fake = FakeOrchestrator::with_pending("symphony").with_states(running_after(2));
    let port = start_server(fake.clone(), Duration::from_secs(30)).await;

    let mut ws = connect(port).await;
    let (messages, closed) = collect(&mut ws).await;

    assert_eq!(
        messages,
        vec![
            SessionMessage::Triggered {
                instance: "symphony.7f3.agent_A".into()
            },
            SessionMessage::Running {
                instance: "symphony.7f3.agent_A".into()
            },
        ]
    );
    assert!(closed);
    assert_eq!(fake.applied().len(), 1);
}

#[tokio::test]
async fn wire_format_uses_status_tag() {
    let fake = FakeOrchestrator::with_pending("symphony").with_states(running_after(0));
    let port = start_server(fake, Duration::from_secs(30)).await;

    let mut ws = connect(port).await;
    let first = timeout(TEST_TIMEOUT, ws.next()).await.unwrap().unwrap().unwrap();
    let Message::Text(text) = first else {
        panic!("expected a text frame, got {:?}", first);
    };
    let value: Value = serde_json::from_str(text.as_str()).unwrap();

    assert_eq!(value["status"], "TRIGGERED");
    assert_eq!(value["instance"], "symphony.7f3.agent_A");
}

#[tokio::test]
async fn missing_workload_sends_single_error() {
    let fake = FakeOrchestrator::empty();
    let port = start_server(fake.clone(), Duration::from_secs(30)).await;

    let mut ws = connect(port).await;
    let (messages, closed) = collect(&mut ws).await;

    assert_eq!(messages.len(), 1);
    match &messages[0] {
        SessionMessage::Error { message } => {
            assert!(message.contains("No 'symphony' workload found"), "{}", message)
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert!(closed);
    assert_eq!(fake.observations(), 0);
}

#[tokio::test]
async fn timeout_is_reported_after_trigger() {
    let fake = FakeOrchestrator::with_pending("symphony").with_states(vec![None]);
    let port = start_server(fake, Duration::from_millis(200)).await;

    let mut ws = connect(port).await;
    let (messages, _) = collect(&mut ws).await;

    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[0], SessionMessage::Triggered { .. }));
    assert_eq!(
        messages[1],
        SessionMessage::Timeout {
            instance: "symphony.7f3.agent_A".into()
        }
    );
}

#[tokio::test]
async fn client_messages_are_ignored() {
    let fake = FakeOrchestrator::with_pending("symphony").with_states(running_after(5));
    let port = start_server(fake, Duration::from_secs(30)).await;

    let mut ws = connect(port).await;
    ws.send(Message::Text("hello".into())).await.unwrap();
    let (messages, _) = collect(&mut ws).await;

    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[1], SessionMessage::Running { .. }));
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let fake = FakeOrchestrator::with_pending("symphony").with_states(running_after(0));
    let port = start_server(fake.clone(), Duration::from_secs(30)).await;

    let mut first = connect(port).await;
    let mut second = connect(port).await;
    let (a, b) = tokio::join!(collect(&mut first), collect(&mut second));

    assert_eq!(a.0.len(), 2);
    assert_eq!(b.0.len(), 2);
    assert_eq!(fake.applied().len(), 2);
}

#[tokio::test]
async fn health_reports_target() {
    let fake = FakeOrchestrator::empty();
    let port = start_server(fake, Duration::from_secs(30)).await;

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    timeout(TEST_TIMEOUT, stream.read_to_string(&mut response))
        .await
        .unwrap()
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let value: Value = serde_json::from_str(body.trim()).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["workload"], "symphony");
    assert_eq!(value["agent"], "agent_A");
}

#[tokio::test]
async fn wait_failure_ends_with_single_error() {
    let fake = FakeOrchestrator::failing_after_apply();
    let port = start_server(fake.clone(), Duration::from_secs(30)).await;

    let mut ws = connect(port).await;
    let (messages, closed) = collect(&mut ws).await;

    assert_eq!(messages.len(), 2);
    assert!(matches!(messages[0], SessionMessage::Triggered { .. }));
    assert!(matches!(
        &messages[1],
        SessionMessage::Error { message } if message.starts_with("Waiting error")
    ));
    assert!(closed);
    assert_eq!(fake.sessions_released(), fake.sessions_opened());
}
