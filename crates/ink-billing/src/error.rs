use http::StatusCode;
use ink_core::HttpError;
use ink_store::StoreError;

/// Errors returned by the billing subsystem
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// HTTP transport error talking to the order platform
    #[error("order platform request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Order platform returned an application-level error
    #[error("order platform error ({code}): {message}")]
    Api {
        /// `ec` code from the platform response
        code: i64,
        /// `em` message from the platform response
        message: String,
    },

    /// Order redemption requires platform credentials that are not configured
    #[error("order redemption is not configured")]
    NotConfigured,

    /// No ledger record exists for this uid
    #[error("billing account not found")]
    AccountNotFound,

    /// Both credit pools are empty
    #[error("no calls available")]
    NoBalance,

    /// The order number was already redeemed
    #[error("order already redeemed")]
    AlreadyRedeemed,

    /// The order failed verification
    #[error("invalid order: {0}")]
    OrderInvalid(String),

    /// The order belongs to a different platform account
    #[error("order does not belong to this account")]
    OrderNotOwned,

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HttpError for BillingError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Request(_) | Self::Api { .. } => StatusCode::BAD_GATEWAY,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::NoBalance | Self::OrderNotOwned => StatusCode::FORBIDDEN,
            Self::AlreadyRedeemed => StatusCode::CONFLICT,
            Self::OrderInvalid(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Request(_) | Self::Api { .. } => "upstream_error",
            Self::NotConfigured => "not_configured",
            Self::AccountNotFound => "account_not_found",
            Self::NoBalance => "no_balance",
            Self::AlreadyRedeemed => "duplicate_order",
            Self::OrderInvalid(_) => "invalid_order",
            Self::OrderNotOwned => "order_not_owned",
            Self::Store(_) => "store_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Request(_) | Self::Api { .. } => {
                "order platform is temporarily unavailable".to_owned()
            }
            Self::Store(_) => "internal storage error".to_owned(),
            other => other.to_string(),
        }
    }
}
