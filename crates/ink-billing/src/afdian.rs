//! Afdian open-API order client
//!
//! Requests are signed with `md5(token + "params" + params + "ts" + ts +
//! "user_id" + user_id)` per the platform's open-API contract. Only
//! completed orders (status 2) owned by the claiming account are accepted.

use async_trait::async_trait;
use ink_config::AfdianConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::error::BillingError;

/// Order status code for a completed trade
const STATUS_COMPLETED: i64 = 2;

/// A verified, completed order owned by the claiming account
#[derive(Debug, Clone, Copy)]
pub struct VerifiedOrder {
    /// Order amount in CNY
    pub amount: f64,
}

/// Verifies order ownership against the sponsorship platform
#[async_trait]
pub trait OrderVerifier: Send + Sync {
    /// Verify that `order_no` is a completed order owned by `afd_id`
    ///
    /// # Errors
    ///
    /// Returns an error when the order is missing, incomplete, owned by a
    /// different account, or the platform is unreachable
    async fn verify_order(&self, order_no: &str, afd_id: &str)
    -> Result<VerifiedOrder, BillingError>;
}

/// Async HTTP client for the Afdian open API
#[derive(Clone)]
pub struct AfdianClient {
    http: reqwest::Client,
    api_url: Url,
    user_id: String,
    token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ec: i64,
    em: String,
    data: Option<OrderList>,
}

#[derive(Debug, Deserialize)]
struct OrderList {
    list: Vec<OrderData>,
}

#[derive(Debug, Deserialize)]
struct OrderData {
    out_trade_no: String,
    user_id: String,
    total_amount: String,
    status: i64,
}

impl AfdianClient {
    /// Create a client from platform credentials
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &AfdianConfig) -> Result<Self, BillingError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(BillingError::Request)?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            user_id: config.user_id.clone(),
            token: config.token.clone(),
        })
    }

    /// Query order details by order number
    ///
    /// POST `open/query-order`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-200 `ec` code
    async fn order_details(&self, order_no: &str) -> Result<Option<OrderData>, BillingError> {
        let ts = jiff::Timestamp::now().as_second();
        let params = serde_json::json!({ "out_trade_no": order_no }).to_string();
        let sign = sign_request(self.token.expose_secret(), &params, ts, &self.user_id);

        let url = self
            .api_url
            .join("open/query-order")
            .map_err(|e| BillingError::Api {
                code: 0,
                message: format!("invalid URL: {e}"),
            })?;

        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "user_id": self.user_id,
                "params": params,
                "ts": ts,
                "sign": sign,
            }))
            .send()
            .await?;

        let body: ApiResponse = response.json().await?;
        if body.ec != 200 {
            return Err(BillingError::Api {
                code: body.ec,
                message: body.em,
            });
        }

        let orders = body.data.map(|d| d.list).unwrap_or_default();
        Ok(orders.into_iter().find(|o| o.out_trade_no == order_no))
    }
}

#[async_trait]
impl OrderVerifier for AfdianClient {
    async fn verify_order(
        &self,
        order_no: &str,
        afd_id: &str,
    ) -> Result<VerifiedOrder, BillingError> {
        let Some(order) = self.order_details(order_no).await? else {
            return Err(BillingError::OrderInvalid("order not found".to_owned()));
        };

        if order.status != STATUS_COMPLETED {
            return Err(BillingError::OrderInvalid(
                "order is not completed".to_owned(),
            ));
        }

        if order.user_id != afd_id {
            return Err(BillingError::OrderNotOwned);
        }

        let amount: f64 = order
            .total_amount
            .parse()
            .map_err(|_| BillingError::OrderInvalid("order amount is malformed".to_owned()))?;
        if amount <= 0.0 {
            return Err(BillingError::OrderInvalid(
                "order amount must be positive".to_owned(),
            ));
        }

        tracing::debug!(order_no, amount, "order verified");
        Ok(VerifiedOrder { amount })
    }
}

fn sign_request(token: &str, params: &str, ts: i64, user_id: &str) -> String {
    let digest = md5::compute(format!("{token}params{params}ts{ts}user_id{user_id}"));
    format!("{digest:x}")
}
