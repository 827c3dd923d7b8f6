use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Web-search enrichment endpoint
///
/// When configured, analysis requests with `needSearch` fetch a background
/// summary before the completion call. Enrichment is best-effort; failures
/// are logged and the analysis proceeds without it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Search service endpoint
    pub url: Url,
    /// Optional bearer token
    pub api_key: Option<SecretString>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

const fn default_timeout_seconds() -> u64 {
    15
}
