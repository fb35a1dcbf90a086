#![allow(dead_code)]

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request the mock backend received
#[derive(Debug, Clone, PartialEq)]
pub struct Received {
    pub path: String,
    pub body: Value,
}

#[derive(Clone)]
struct BackendState {
    received: Arc<Mutex<Vec<Received>>>,
    reply: Arc<Mutex<(u16, String)>>,
    health_status: Arc<Mutex<u16>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

/// In-process stand-in for the answer service, bound to an ephemeral port
pub struct MockBackend {
    pub base_url: String,
    state: BackendState,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = BackendState {
            received: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new((200, "{}".to_string()))),
            health_status: Arc::new(Mutex::new(200)),
            delay: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/api/cx/answer", post(answer))
            .route("/api/cx/policy-guidance", post(answer))
            .route("/api/cx/complaint-analysis", post(answer))
            .route("/api/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Status and body returned by every answer route from now on
    pub fn reply_with(&self, status: u16, body: &str) {
        *self.state.reply.lock().unwrap() = (status, body.to_string());
    }

    pub fn health_returns(&self, status: u16) {
        *self.state.health_status.lock().unwrap() = status;
    }

    pub fn delay_answers(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }

    pub fn received(&self) -> Vec<Received> {
        self.state.received.lock().unwrap().clone()
    }
}

async fn answer(
    State(state): State<BackendState>,
    uri: Uri,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state.received.lock().unwrap().push(Received {
        path: uri.path().to_string(),
        body,
    });

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = state.reply.lock().unwrap().clone();
    (StatusCode::from_u16(status).unwrap(), body)
}

async fn health(State(state): State<BackendState>) -> StatusCode {
    let status = *state.health_status.lock().unwrap();
    StatusCode::from_u16(status).unwrap()
}

/// Base URL of a port nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
