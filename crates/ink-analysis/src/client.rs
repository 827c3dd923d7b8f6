//! OpenAI-compatible chat-completion client

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use ink_config::ModelConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::AnalysisError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk, ResponseFormat};

/// One decoded event from the upstream stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamEvent {
    /// Incremental content delta
    Delta(String),
    /// Full message content delivered in a single chunk
    Full(String),
    /// `[DONE]` terminator
    Done,
}

/// Decoded SSE event stream from the provider
pub type UpstreamStream = Pin<Box<dyn Stream<Item = Result<UpstreamEvent, AnalysisError>> + Send>>;

/// How the provider chose to answer a `stream: true` request
pub enum UpstreamResponse {
    /// A real SSE stream
    Events(UpstreamStream),
    /// The provider ignored streaming and answered with one completion body
    Single(String),
}

impl std::fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Events(_) => f.debug_tuple("Events").finish(),
            Self::Single(body) => f.debug_tuple("Single").field(body).finish(),
        }
    }
}

/// Async client for one configured grading model
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    base_url: Url,
    model: String,
    api_key: Option<SecretString>,
    temperature: f64,
}

impl ChatClient {
    /// Create a client from model configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &ModelConfig) -> Result<Self, AnalysisError> {
        let http = Client::builder().build().map_err(AnalysisError::Request)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    /// The model name sent to the provider
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Open a streaming completion
    ///
    /// Always requests `stream: true`. Providers that ignore the flag and
    /// answer with a JSON body are detected by content type and surfaced as
    /// [`UpstreamResponse::Single`].
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status
    pub async fn open_stream(
        &self,
        messages: Vec<ChatMessage>,
        seed: Option<u64>,
    ) -> Result<UpstreamResponse, AnalysisError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            stream: true,
            response_format: ResponseFormat::json_object(),
            seed,
        };

        let mut builder = self.http.post(self.completions_url()).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(model = %self.model, error = %e, "upstream request failed");
            AnalysisError::Request(e)
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, status, "upstream returned error");
            return Err(AnalysisError::Upstream { status, message });
        }

        let is_sse = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if !is_sse {
            let body: ChatResponse = response
                .json()
                .await
                .map_err(|e| AnalysisError::Streaming(format!("failed to parse response: {e}")))?;
            let content = body
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            return Ok(UpstreamResponse::Single(content));
        }

        let event_stream = response
            .bytes_stream()
            .eventsource()
            .map(|result| match result {
                Ok(event) => {
                    let data = event.data.trim().to_owned();
                    if data == "[DONE]" {
                        return vec![Ok(UpstreamEvent::Done)];
                    }

                    match serde_json::from_str::<ChatStreamChunk>(&data) {
                        Ok(chunk) => decode_chunk(&chunk).into_iter().map(Ok).collect(),
                        Err(e) => {
                            tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
                            vec![]
                        }
                    }
                }
                Err(e) => vec![Err(AnalysisError::Streaming(e.to_string()))],
            })
            .flat_map(futures_util::stream::iter);

        Ok(UpstreamResponse::Events(Box::pin(event_stream)))
    }
}

fn decode_chunk(chunk: &ChatStreamChunk) -> Vec<UpstreamEvent> {
    let Some(choice) = chunk.choices.first() else {
        return vec![];
    };

    if let Some(content) = choice.delta.as_ref().and_then(|d| d.content.clone()) {
        if content.is_empty() {
            return vec![];
        }
        return vec![UpstreamEvent::Delta(content)];
    }

    if let Some(content) = choice.message.as_ref().and_then(|m| m.content.clone()) {
        return vec![UpstreamEvent::Full(content)];
    }

    vec![]
}
