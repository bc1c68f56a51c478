//! Integration tests for the HTTP gateway.
//!
//! Each test binds a fresh server on `127.0.0.1:0` and talks to it with
//! `reqwest`, the way a messaging platform adapter would.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use taskbot::assistant::ConfiguredAssistant;
use taskbot::clock::{Calendar, SystemClock};
use taskbot::confirm::ConfirmationRegistry;
use taskbot::store::MemoryTaskStore;
use taskbot::tasks::TaskService;
use taskbot::{BotSettings, TaskBot};
use taskbot_gateway::server::{GatewayState, start_server_with_state};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Harness {
    addr: SocketAddr,
    client: reqwest::Client,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Harness {
    async fn start() -> Self {
        let clock = Arc::new(SystemClock);
        let bot = TaskBot::new(
            TaskService::new(MemoryTaskStore::new(), clock.clone(), Calendar::utc()),
            ConfirmationRegistry::new(clock),
            ConfiguredAssistant::Disabled,
            BotSettings::default(),
        );
        let state = Arc::new(GatewayState::new(Arc::new(bot)));
        let (stop, stopped) = oneshot::channel::<()>();
        let (addr, handle) = start_server_with_state("127.0.0.1:0", state, async {
            let _ = stopped.await;
        })
        .await
        .expect("failed to start gateway");
        Self {
            addr,
            client: reqwest::Client::new(),
            stop,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn post(&self, owner: &str, text: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/messages"))
            .json(&json!({ "owner": owner, "destination": format!("dm:{owner}"), "text": text }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        resp.json().await.unwrap()
    }

    async fn shutdown(self) {
        let Self {
            client,
            stop,
            handle,
            ..
        } = self;
        drop(client);
        let _ = stop.send(());
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let h = Harness::start().await;
    let resp = h.client.get(h.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
    h.shutdown().await;
}

#[tokio::test]
async fn commands_round_trip_over_http() {
    let h = Harness::start().await;

    let added = h.post("alice", "!add Buy milk P1").await;
    assert_eq!(added["destination"], "dm:alice");
    assert_eq!(added["reply"], "⭕ Added: Buy milk (P1)");

    h.post("alice", "!add Clean desk").await;
    let listed = h.post("alice", "!list").await;
    assert_eq!(
        listed["reply"],
        "Today's tasks:\n⌛ [0] Buy milk (P1)\n⌛ [1] Clean desk (P4)"
    );

    let done = h.post("alice", "!done 0").await;
    assert_eq!(
        done["reply"],
        "✅ Done: Buy milk\n📝 Remaining:\n⌛ [0] Clean desk (P4)"
    );
    h.shutdown().await;
}

#[tokio::test]
async fn chatter_gets_a_null_reply() {
    let h = Harness::start().await;
    let body = h.post("alice", "lunch anyone?").await;
    assert_eq!(body["reply"], Value::Null);
    assert_eq!(body["destination"], "dm:alice");
    h.shutdown().await;
}

#[tokio::test]
async fn owners_are_isolated() {
    let h = Harness::start().await;
    h.post("alice", "!add Alice only").await;
    let bob = h.post("bob", "!list").await;
    assert_eq!(bob["reply"], "📭 No tasks registered.");
    h.shutdown().await;
}

#[tokio::test]
async fn blank_owner_is_unprocessable() {
    let h = Harness::start().await;
    let resp = h
        .client
        .post(h.url("/messages"))
        .json(&json!({ "owner": "  ", "destination": "dm", "text": "!list" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    h.shutdown().await;
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let h = Harness::start().await;
    let resp = h
        .client
        .post(h.url("/messages"))
        .json(&json!({ "owner": "alice" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error(), "{}", resp.status());
    h.shutdown().await;
}
