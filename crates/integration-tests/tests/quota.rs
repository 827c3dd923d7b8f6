mod harness;

use harness::config::ConfigBuilder;
use harness::mock_model::{MockModel, UpstreamMode};
use harness::server::TestServer;
use ink_config::LimitsConfig;

const RESULT: &str = r#"{"overallScore": 60}"#;

fn analyze_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "articleText": text, "mode": "quick" })
}

#[tokio::test]
async fn guest_request_cap_returns_413() {
    let mock = MockModel::start(UpstreamMode::Single, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .with_limits(LimitsConfig {
            per_request_guest: 10,
            per_request_logged: 60_000,
            daily_cap_guest: 100_000,
        })
        .build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("eleven chars"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 413);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "request_too_large");
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn guest_daily_cap_returns_429() {
    let mock = MockModel::start(UpstreamMode::Single, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .with_limits(LimitsConfig {
            per_request_guest: 50,
            per_request_logged: 60_000,
            daily_cap_guest: 60,
        })
        .build();
    let server = TestServer::start(config).await.unwrap();

    let first = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("forty characters of perfectly fine text."))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);
    first.text().await.unwrap();

    // Different text so the cache cannot absorb the request
    let second = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("another forty characters of fresh text.."))
        .send()
        .await
        .unwrap();

    assert_eq!(second.status(), 429);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["error"]["type"], "daily_cap_exceeded");
}

#[tokio::test]
async fn premium_model_requires_login_and_balance() {
    let mock = MockModel::start(UpstreamMode::Single, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("premium", &mock.base_url(), true)
        .build();
    let server = TestServer::start(config).await.unwrap();

    // Guests cannot use premium models at all
    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("premium text"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Logged in but with no ledger record: no balance
    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-uid", "7")
        .header("x-fingerprint", "123456")
        .json(&analyze_body("premium text"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // After initialization the call goes through and costs one grant call
    server
        .client()
        .post(server.url("/api/billing/7/initialize"))
        .send()
        .await
        .unwrap();

    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-uid", "7")
        .header("x-fingerprint", "123456")
        .json(&analyze_body("premium text"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.text().await.unwrap();

    let body: serde_json::Value = server
        .client()
        .get(server.url("/api/billing/7"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["grantCallsBalance"], 9);
}
