use http::StatusCode;
use ink_core::HttpError;
use ink_store::StoreError;

/// Errors returned by quota enforcement
#[derive(Debug, thiserror::Error)]
pub enum QuotaError {
    /// The input exceeds the per-request size cap
    #[error("input exceeds the {limit}-character per-request limit")]
    RequestTooLarge {
        /// The cap that was exceeded
        limit: u64,
    },

    /// The guest's daily cumulative cap is exhausted
    #[error("daily limit of {cap} characters reached, sign in to continue")]
    DailyCapExceeded {
        /// The daily cap
        cap: u64,
    },

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HttpError for QuotaError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::DailyCapExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::RequestTooLarge { .. } => "request_too_large",
            Self::DailyCapExceeded { .. } => "daily_cap_exceeded",
            Self::Store(_) => "store_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Store(_) => "internal storage error".to_owned(),
            other => other.to_string(),
        }
    }
}
