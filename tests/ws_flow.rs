use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use livedoc::{app, config::Config};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let config = Config::default();
    let app = app(&config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _response) = connect_async(format!("ws://{addr}/")).await.unwrap();
    ws
}

async fn send_json(ws: &mut WsClient, payload: &str) {
    ws.send(Message::Text(payload.into())).await.unwrap();
}

async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a broadcast")
            .expect("socket closed unexpectedly")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn http_surface_answers_liveness_and_health() {
    let addr = spawn_server().await;

    let body = reqwest::get(format!("http://{addr}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("WebSocket server is running"));

    let health: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let ready: Value = reqwest::get(format!("http://{addr}/api/ready"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ready["status"], "ok");

    let diagnostics: Value = reqwest::get(format!("http://{addr}/api/v1/diagnostics"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(diagnostics["n_conn"], 0);
    assert_eq!(diagnostics["n_users"], 0);
}

#[tokio::test]
async fn two_clients_share_presence_and_content() {
    let addr = spawn_server().await;

    // Alice connects and announces herself.
    let mut alice = connect(addr).await;
    send_json(&mut alice, r#"{"type":"userevent","username":"alice"}"#).await;

    let joined = next_json(&mut alice).await;
    assert_eq!(joined["type"], "userevent");
    let users = joined["data"]["users"].as_object().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users.values().next().unwrap()["username"], "alice");
    assert_eq!(
        joined["data"]["userActivity"],
        serde_json::json!(["alice joined to edit the document"])
    );

    // Bob connects and announces himself; both clients see the full state.
    let mut bob = connect(addr).await;
    send_json(&mut bob, r#"{"type":"userevent","username":"bob"}"#).await;

    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["type"], "userevent");
        assert_eq!(frame["data"]["users"].as_object().unwrap().len(), 2);
        assert_eq!(
            frame["data"]["userActivity"],
            serde_json::json!([
                "alice joined to edit the document",
                "bob joined to edit the document",
            ])
        );
    }

    // Alice edits, then Bob overwrites; the last write wins everywhere.
    send_json(&mut alice, r#"{"type":"contentchange","content":"hello"}"#).await;
    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["type"], "contentchange");
        assert_eq!(frame["data"]["editorContent"], "hello");
    }

    send_json(&mut bob, r#"{"type":"contentchange","content":"hello world"}"#).await;
    for ws in [&mut alice, &mut bob] {
        let frame = next_json(ws).await;
        assert_eq!(frame["data"]["editorContent"], "hello world");
    }

    // Bob leaves; Alice sees the departure.
    bob.close(None).await.unwrap();

    let departure = next_json(&mut alice).await;
    assert_eq!(departure["type"], "userevent");
    let remaining = departure["data"]["users"].as_object().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining.values().next().unwrap()["username"], "alice");
    assert_eq!(
        departure["data"]["userActivity"],
        serde_json::json!([
            "alice joined to edit the document",
            "bob joined to edit the document",
            "bob left the document",
        ])
    );
}

#[tokio::test]
async fn malformed_frames_do_not_disturb_the_session() {
    let addr = spawn_server().await;

    let mut alice = connect(addr).await;
    send_json(&mut alice, r#"{"type":"userevent","username":"alice"}"#).await;
    let _ = next_json(&mut alice).await;

    // Garbage and unknown types are absorbed with no broadcast and no
    // connection fallout.
    send_json(&mut alice, "not json").await;
    send_json(&mut alice, r#"{"type":"selection","offset":3}"#).await;

    // The connection still works: the next real event round-trips.
    send_json(&mut alice, r#"{"type":"contentchange","content":"still alive"}"#).await;
    let frame = next_json(&mut alice).await;
    assert_eq!(frame["type"], "contentchange");
    assert_eq!(frame["data"]["editorContent"], "still alive");
}
