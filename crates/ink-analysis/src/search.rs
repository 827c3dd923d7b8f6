//! Best-effort web-search enrichment
//!
//! A failed or slow search never fails the analysis; the request just
//! proceeds without background material.

use std::time::Duration;

use ink_config::SearchConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Client for the search summarization service
#[derive(Clone)]
pub struct SearchClient {
    http: reqwest::Client,
    url: Url,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    summary: Option<String>,
}

impl SearchClient {
    /// Create a client from search configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch a background summary for the given keywords
    ///
    /// Returns `None` on any failure; the error is logged and swallowed.
    pub async fn summarize(&self, keywords: &str) -> Option<String> {
        let mut builder = self
            .http
            .post(self.url.clone())
            .json(&serde_json::json!({ "query": keywords }));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "search request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "search service returned error");
            return None;
        }

        match response.json::<SearchResponse>().await {
            Ok(body) => body.summary.filter(|s| !s.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "search response was malformed");
                None
            }
        }
    }
}
