mod harness;

use harness::config::ConfigBuilder;
use harness::mock_model::{MockModel, UpstreamMode};
use harness::server::TestServer;

const RESULT: &str = r#"{"overallScore": 88, "title": "Night Piece"}"#;

fn analyze_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "articleText": text, "mode": "professional" })
}

#[tokio::test]
async fn native_upstream_streams_with_native_marker() {
    let mock = MockModel::start(UpstreamMode::Sse, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("it was a dark and stormy night"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("x-stream-mode").unwrap(), "native");
    assert_eq!(resp.headers().get("x-response-mode").unwrap(), "native");

    let body = resp.text().await.unwrap();
    assert_eq!(body, format!("<!--STREAM_MODE:native-->{RESULT}"));
}

#[tokio::test]
async fn single_shot_upstream_replays_as_simulated() {
    let mock = MockModel::start(UpstreamMode::Single, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("a quiet essay about rivers"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("x-stream-mode").unwrap(), "simulated");

    let body = resp.text().await.unwrap();
    assert_eq!(body, format!("<!--STREAM_MODE:simulated-->{RESULT}"));
}

#[tokio::test]
async fn repeat_analysis_is_served_from_cache() {
    let mock = MockModel::start(UpstreamMode::Sse, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let first = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("the same article twice"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.headers().get("x-stream-mode").unwrap(), "native");
    // Draining the body guarantees the result is cached before the retry
    first.text().await.unwrap();

    let second = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("the same article twice"))
        .send()
        .await
        .unwrap();

    assert_eq!(second.headers().get("x-stream-mode").unwrap(), "cached");
    let body = second.text().await.unwrap();
    assert_eq!(body, format!("<!--STREAM_MODE:cached-->{RESULT}"));

    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn empty_article_is_rejected() {
    let mock = MockModel::start(UpstreamMode::Sse, RESULT).await.unwrap();
    let config = ConfigBuilder::new()
        .with_model("standard", &mock.base_url(), false)
        .build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .post(server.url("/api/analyze-stream"))
        .header("x-fingerprint", "123456")
        .json(&analyze_body("   "))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["type"], "empty_text");
    assert_eq!(mock.request_count(), 0);
}
