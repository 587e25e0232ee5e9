mod common;

use async_trait::async_trait;
use common::MemoryStore;
use futures::{SinkExt, StreamExt};
use nylah::error::LiveError;
use nylah::live::{LiveConnector, LiveLink};
use nylah::server::{NylahState, nylah_router};
use nylah::store::Store;
use nylah_schema::{ClientMessage, ServerMessage, Setup};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

type RemoteHalf = (
    mpsc::Receiver<ClientMessage>,
    mpsc::Sender<Result<ServerMessage, LiveError>>,
);

/// Hands out links that stay open for the rest of the test.
#[derive(Default)]
struct HeldConnector {
    remotes: Mutex<Vec<RemoteHalf>>,
}

#[async_trait]
impl LiveConnector for HeldConnector {
    async fn connect(&self, _setup: Setup) -> Result<LiveLink, LiveError> {
        let (out_tx, out_rx) = mpsc::channel(64);
        let (in_tx, in_rx) = mpsc::channel(64);
        self.remotes.lock().unwrap().push((out_rx, in_tx));
        Ok(LiveLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}

async fn spawn_app() -> SocketAddr {
    let mut cfg = nylah::config::Config::default();
    cfg.admin.username = "admin".to_string();
    cfg.admin.password = "s3cret".to_string();
    cfg.live.api_key = "test-key".to_string();

    let state = NylahState::new(
        &cfg,
        Store::new(Arc::new(MemoryStore::default())),
        Arc::new(HeldConnector::default()),
    );
    let app = nylah_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    addr
}

async fn open(addr: SocketAddr) -> Socket {
    let (ws, _resp) = connect_async(format!("ws://{addr}/live/ws"))
        .await
        .expect("websocket connect");
    ws
}

async fn send(ws: &mut Socket, command: Value) {
    ws.send(Message::Text(command.to_string().into()))
        .await
        .expect("send command");
}

async fn next_event(ws: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for bridge event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("event is json");
        }
    }
}

/// Reads events until one matches; returns everything seen.
async fn until(ws: &mut Socket, matches: impl Fn(&Value) -> bool) -> Vec<Value> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(ws).await;
        let done = matches(&event);
        seen.push(event);
        if done {
            return seen;
        }
    }
}

fn is_state(state: &'static str) -> impl Fn(&Value) -> bool {
    move |event| event["type"] == "status" && event["state"] == state
}

fn is_type(kind: &'static str) -> impl Fn(&Value) -> bool {
    move |event| event["type"] == kind
}

async fn activate(ws: &mut Socket) {
    send(ws, json!({"type": "activate"})).await;
    until(ws, is_state("listening")).await;
}

#[tokio::test]
async fn admin_prompt_only_closes_the_prompting_browser() {
    let addr = spawn_app().await;
    let mut visitor = open(addr).await;
    let mut operator = open(addr).await;
    activate(&mut visitor).await;
    activate(&mut operator).await;

    for _ in 0..5 {
        send(&mut operator, json!({"type": "hiddenClick"})).await;
    }
    until(&mut operator, is_type("gateArmed")).await;
    send(
        &mut operator,
        json!({"type": "keyCombo", "ctrl": true, "shift": true, "key": "M"}),
    )
    .await;
    until(&mut operator, is_type("adminPrompt")).await;
    let seen = until(&mut operator, is_type("close")).await;
    assert!(seen.iter().any(is_state("closing")), "saw {seen:?}");
    assert!(seen.iter().any(is_state("offline")), "saw {seen:?}");

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/admin/login"))
        .json(&json!({"username": "admin", "password": "s3cret"}))
        .send()
        .await
        .expect("login request");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // The other browser hears nothing and is still live.
    let quiet = tokio::time::timeout(Duration::from_millis(300), visitor.next()).await;
    assert!(quiet.is_err(), "visitor got {quiet:?}");
    send(&mut visitor, json!({"type": "deactivate"})).await;
    let event = next_event(&mut visitor).await;
    assert!(is_state("closing")(&event), "visitor got {event:?}");
}

#[tokio::test]
async fn combo_without_clicks_leaves_the_session_running() {
    let addr = spawn_app().await;
    let mut ws = open(addr).await;
    activate(&mut ws).await;

    send(
        &mut ws,
        json!({"type": "keyCombo", "ctrl": true, "shift": true, "key": "m"}),
    )
    .await;
    let quiet = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(quiet.is_err(), "got {quiet:?}");
}
