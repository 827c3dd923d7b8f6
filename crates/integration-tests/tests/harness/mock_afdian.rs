//! Mock Afdian open API for order-redemption tests
//!
//! Checks the request signature against the harness credentials and
//! answers with one canned order.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

const TOKEN: &str = "test-token";
const USER_ID: &str = "dev-1";

/// A running mock sponsorship platform
pub struct MockAfdian {
    addr: SocketAddr,
    shutdown: CancellationToken,
}

struct OrderState {
    owner: String,
    amount: String,
    status: i64,
}

impl MockAfdian {
    /// Start the mock with one order owned by `owner`
    pub async fn start(owner: &str, amount: &str, status: i64) -> anyhow::Result<Self> {
        let state = Arc::new(OrderState {
            owner: owner.to_owned(),
            amount: amount.to_owned(),
            status,
        });

        let app = Router::new()
            .route("/api/open/query-order", routing::post(handle_query_order))
            .with_state(state);

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

        Ok(Self { addr, shutdown })
    }

    /// Base URL of the mock
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockAfdian {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_query_order(
    State(state): State<Arc<OrderState>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let params = body["params"].as_str().unwrap_or_default();
    let ts = body["ts"].as_i64().unwrap_or_default();
    let expected = format!(
        "{:x}",
        md5::compute(format!("{TOKEN}params{params}ts{ts}user_id{USER_ID}"))
    );

    if body["user_id"] != USER_ID || body["sign"] != expected.as_str() {
        return Json(serde_json::json!({ "ec": 400_001, "em": "sign error" }));
    }

    let order_no = serde_json::from_str::<serde_json::Value>(params)
        .ok()
        .and_then(|p| p["out_trade_no"].as_str().map(ToOwned::to_owned))
        .unwrap_or_default();

    Json(serde_json::json!({
        "ec": 200,
        "em": "ok",
        "data": {
            "list": [{
                "out_trade_no": order_no,
                "user_id": state.owner,
                "total_amount": state.amount,
                "status": state.status,
            }]
        }
    }))
}
