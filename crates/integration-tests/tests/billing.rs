mod harness;

use harness::config::ConfigBuilder;
use harness::mock_afdian::MockAfdian;
use harness::server::TestServer;

#[tokio::test]
async fn account_lifecycle_initialize_redeem_and_balances() {
    let afdian = MockAfdian::start("afd-9", "30.00", 2).await.unwrap();
    let config = ConfigBuilder::new().with_afdian(&afdian.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    // Explicit initialization seeds the monthly grant and signup bonus
    let resp = server
        .client()
        .post(server.url("/api/billing/7/initialize"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["created"], true);

    let body: serde_json::Value = server
        .client()
        .get(server.url("/api/billing/7"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["grantCallsBalance"], 10);
    assert_eq!(body["data"]["paidCallsBalance"], 20);
    assert_eq!(body["data"]["tier"]["name"], "Regular");

    // A 30 CNY order at the Regular tier: 20 paid calls at 1.5 each, and
    // the grant pool grows from 10 to 35
    let resp = server
        .client()
        .post(server.url("/api/billing/7/redeem"))
        .json(&serde_json::json!({ "afdId": "afd-9", "orderNo": "202608100001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["grantCallsAdded"], 25);
    assert_eq!(body["data"]["paidCallsAdded"], 20);

    // The cached billing view was invalidated by the redemption
    let body: serde_json::Value = server
        .client()
        .get(server.url("/api/billing/7"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["grantCallsBalance"], 35);
    assert_eq!(body["data"]["paidCallsBalance"], 40);
    assert_eq!(body["data"]["totalAmount"], 30.0);

    // Replaying the same order never credits twice
    let resp = server
        .client()
        .post(server.url("/api/billing/7/redeem"))
        .json(&serde_json::json!({ "afdId": "afd-9", "orderNo": "202608100001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);

    let body: serde_json::Value = server
        .client()
        .get(server.url("/api/billing/7/available"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["available"], true);
}

#[tokio::test]
async fn missing_account_reads_as_not_found() {
    let config = ConfigBuilder::new().build();
    let server = TestServer::start(config).await.unwrap();

    let resp = server
        .client()
        .get(server.url("/api/billing/404"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);

    // The availability probe treats a missing account as no balance
    let body: serde_json::Value = server
        .client()
        .get(server.url("/api/billing/404/available"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["available"], false);
}

#[tokio::test]
async fn redemption_without_platform_config_fails() {
    let config = ConfigBuilder::new().build();
    let server = TestServer::start(config).await.unwrap();

    server
        .client()
        .post(server.url("/api/billing/7/initialize"))
        .send()
        .await
        .unwrap();

    let resp = server
        .client()
        .post(server.url("/api/billing/7/redeem"))
        .json(&serde_json::json!({ "afdId": "afd-9", "orderNo": "202608100001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn foreign_order_is_rejected() {
    let afdian = MockAfdian::start("someone-else", "30.00", 2).await.unwrap();
    let config = ConfigBuilder::new().with_afdian(&afdian.base_url()).build();
    let server = TestServer::start(config).await.unwrap();

    server
        .client()
        .post(server.url("/api/billing/7/initialize"))
        .send()
        .await
        .unwrap();

    let resp = server
        .client()
        .post(server.url("/api/billing/7/redeem"))
        .json(&serde_json::json!({ "afdId": "afd-9", "orderNo": "202608100001" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}
