use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// A grading model entry
///
/// Each entry maps a client-visible model id to an OpenAI-compatible
/// upstream endpoint. Premium models require a logged-in user with call
/// balance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Display name shown to users
    pub name: String,
    /// Upstream model identifier sent in the completion request
    pub model: String,
    /// Base URL of the OpenAI-compatible API
    pub base_url: Url,
    /// API key for the upstream provider
    pub api_key: Option<SecretString>,
    /// Whether this model requires login and call balance
    #[serde(default)]
    pub premium: bool,
    /// Sampling temperature, defaults to 0.3
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

#[allow(clippy::missing_const_for_fn)]
fn default_temperature() -> f64 {
    0.3
}
