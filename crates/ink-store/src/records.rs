use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Per-user call-credit ledger record
///
/// Two pools: `grant_calls_balance` is replaced monthly from the user's
/// lifetime spend; `paid_calls_balance` accumulates from redeemed orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBilling {
    /// Stable numeric user id
    pub uid: u64,
    /// Lifetime spend in CNY, monotonically non-decreasing
    pub total_amount: f64,
    /// Remaining monthly grant calls
    pub grant_calls_balance: u32,
    /// Remaining purchased calls
    pub paid_calls_balance: u32,
    /// When the grant pool was last replaced
    pub last_grant_refresh: Timestamp,
    /// Record creation time
    pub created_at: Timestamp,
    /// Last mutation time
    pub updated_at: Timestamp,
}

/// A redeemed sponsorship order
///
/// `order_no` is the unique key; existence of a record is the at-most-once
/// redemption guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AfdOrder {
    /// Platform order number (`out_trade_no`)
    pub order_no: String,
    /// Redeeming user
    pub uid: u64,
    /// The user's sponsorship-platform id
    pub afd_id: String,
    /// Order amount in CNY
    pub amount: f64,
    /// When the order was redeemed
    pub redeemed_at: Timestamp,
    /// Grant calls credited by this redemption
    pub grant_calls_added: u32,
    /// Paid calls credited by this redemption
    pub paid_calls_added: u32,
}

/// Which credit pool a deduction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalancePool {
    /// Monthly grant pool
    Grant,
    /// Purchased pool
    Paid,
}

/// How a guest identity is keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Browser fingerprint (preferred)
    Fingerprint,
    /// Request IP (fallback)
    Ip,
}

/// Key for one guest's daily usage counter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsageKey {
    /// UTC date as `YYYY-MM-DD`
    pub day_key: String,
    /// Identity dimension
    pub kind: IdentityKind,
    /// Fingerprint or IP value
    pub value: String,
}

impl UsageKey {
    /// Build a key for `kind`/`value` on the given day
    #[must_use]
    pub fn new(day_key: impl Into<String>, kind: IdentityKind, value: impl Into<String>) -> Self {
        Self {
            day_key: day_key.into(),
            kind,
            value: value.into(),
        }
    }
}

/// A persisted analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    /// `sha256(normalized_text):mode:model`
    pub cache_key: String,
    /// Raw result text as produced by the model
    pub result_text: String,
    /// Parsed result, or the raw text wrapped when parsing failed
    pub parsed: serde_json::Value,
    /// Overall score when the result parsed cleanly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<f64>,
    /// Analysis mode requested by the client
    pub mode: String,
    /// Model id that produced the result
    pub model: String,
    /// Requesting user, when logged in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u64>,
    /// Requesting browser fingerprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// Requesting IP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// When the analysis completed
    pub created_at: Timestamp,
}
