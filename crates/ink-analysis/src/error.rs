use http::StatusCode;
use ink_billing::BillingError;
use ink_core::HttpError;
use ink_quota::QuotaError;
use ink_store::StoreError;

/// Errors returned by the analysis orchestrator
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Empty or missing article text
    #[error("article text must not be empty")]
    EmptyText,

    /// The requested model id is not configured
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// Premium models require a logged-in user
    #[error("this model requires signing in")]
    PremiumRequiresLogin,

    /// Quota enforcement rejected the request
    #[error(transparent)]
    Quota(#[from] QuotaError),

    /// Billing rejected the request
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Upstream transport failure
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream returned a non-success status
    #[error("upstream returned {status}: {message}")]
    Upstream {
        /// HTTP status from the provider
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Stream decoding failure
    #[error("stream error: {0}")]
    Streaming(String),

    /// The model produced no content at all
    #[error("the model returned an empty completion")]
    EmptyCompletion,

    /// The upstream call exceeded a deadline
    #[error("upstream timed out")]
    Timeout,
}

impl HttpError for AnalysisError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyText | Self::UnknownModel(_) => StatusCode::BAD_REQUEST,
            Self::PremiumRequiresLogin => StatusCode::UNAUTHORIZED,
            Self::Quota(e) => e.status_code(),
            Self::Billing(e) => e.status_code(),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Request(_) | Self::Upstream { .. } | Self::Streaming(_) | Self::EmptyCompletion => {
                StatusCode::BAD_GATEWAY
            }
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::EmptyText => "empty_text",
            Self::UnknownModel(_) => "unknown_model",
            Self::PremiumRequiresLogin => "login_required",
            Self::Quota(e) => e.error_type(),
            Self::Billing(e) => e.error_type(),
            Self::Store(_) => "store_error",
            Self::Request(_) | Self::Upstream { .. } => "upstream_error",
            Self::Streaming(_) => "stream_error",
            Self::EmptyCompletion => "empty_completion",
            Self::Timeout => "upstream_timeout",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Quota(e) => e.client_message(),
            Self::Billing(e) => e.client_message(),
            Self::Store(_) => "internal storage error".to_owned(),
            Self::Request(_) | Self::Upstream { .. } => {
                "the model service is temporarily unavailable".to_owned()
            }
            other => other.to_string(),
        }
    }
}
