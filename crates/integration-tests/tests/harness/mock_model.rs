//! Mock OpenAI-compatible upstream for integration tests
//!
//! Serves one canned completion either as a native SSE delta stream or as
//! a single JSON body, and counts the requests it receives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// How the mock answers a completion request
#[derive(Clone, Copy)]
pub enum UpstreamMode {
    /// SSE delta stream ending in `[DONE]`
    Sse,
    /// One JSON completion body, ignoring `stream: true`
    Single,
}

/// A running mock model backend
pub struct MockModel {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    mode: UpstreamMode,
    content: String,
    request_count: AtomicU32,
}

impl MockModel {
    /// Start the mock server on a random port
    pub async fn start(mode: UpstreamMode, content: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            mode,
            content: content.to_owned(),
            request_count: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/chat/completions", routing::post(handle_completions))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    token.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            state,
        })
    }

    /// Base URL of the mock
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completion requests received so far
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }
}

impl Drop for MockModel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_completions(State(state): State<Arc<MockState>>) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);

    match state.mode {
        UpstreamMode::Single => Json(serde_json::json!({
            "choices": [{"message": {"content": state.content}}]
        }))
        .into_response(),
        UpstreamMode::Sse => {
            // Two deltas then the terminator; test content is ASCII
            let (first, second) = state.content.split_at(state.content.len() / 2);
            let body = format!(
                "data: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
                serde_json::json!({"choices": [{"delta": {"content": first}}]}),
                serde_json::json!({"choices": [{"delta": {"content": second}}]}),
            );
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
    }
}
