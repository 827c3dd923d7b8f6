use serde::{Deserialize, Serialize};

/// How the client-visible stream was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Upstream streamed incremental deltas and they were forwarded
    Native,
    /// Upstream returned one completion; the text is replayed in slices
    Simulated,
    /// Served from cache without contacting the upstream
    Cached,
}

impl StreamMode {
    /// Wire name used in the stream marker and response headers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Simulated => "simulated",
            Self::Cached => "cached",
        }
    }

    /// The marker prefixed to the body so non-header-aware clients can
    /// still see how the stream was produced
    #[must_use]
    pub fn marker(self) -> String {
        format!("<!--STREAM_MODE:{}-->", self.as_str())
    }
}

/// One chat message in the upstream request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// `system` or `user`
    pub role: &'static str,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A system-role message
    #[must_use]
    pub const fn system(content: String) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    /// A user-role message
    #[must_use]
    pub const fn user(content: String) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Chat-completion request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name as the provider knows it
    pub model: String,
    /// Conversation
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f64,
    /// Always `true`; some providers ignore it and answer in one shot
    pub stream: bool,
    /// Forces a JSON object completion
    pub response_format: ResponseFormat,
    /// Optional deterministic seed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// `response_format` field
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    /// Format type, always `json_object`
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    /// The forced-JSON format
    #[must_use]
    pub const fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

/// One SSE chunk from a streaming completion
#[derive(Debug, Deserialize)]
pub struct ChatStreamChunk {
    /// Choice list; only the first is used
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

/// One choice within a stream chunk
#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    /// Incremental delta, present on native streams
    #[serde(default)]
    pub delta: Option<ChunkContent>,
    /// Full message, present when a provider answers in one chunk
    #[serde(default)]
    pub message: Option<ChunkContent>,
}

/// Content carrier shared by deltas and full messages
#[derive(Debug, Deserialize)]
pub struct ChunkContent {
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
}

/// Non-streaming completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Choice list; only the first is used
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
}

/// One choice in a non-streaming response
#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    /// The completed message
    pub message: ChunkContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_names_the_mode() {
        assert_eq!(StreamMode::Native.marker(), "<!--STREAM_MODE:native-->");
        assert_eq!(StreamMode::Cached.marker(), "<!--STREAM_MODE:cached-->");
    }

    #[test]
    fn request_serializes_openai_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini".to_owned(),
            messages: vec![ChatMessage::system("sys".to_owned())],
            temperature: 0.3,
            stream: true,
            response_format: ResponseFormat::json_object(),
            seed: None,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json.get("seed").is_none());
    }

    #[test]
    fn chunk_parses_delta_and_message_shapes() {
        let delta: ChatStreamChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(
            delta.choices[0].delta.as_ref().unwrap().content.as_deref(),
            Some("hi")
        );

        let full: ChatStreamChunk =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"all"}}]}"#).unwrap();
        assert!(full.choices[0].delta.is_none());
        assert_eq!(
            full.choices[0].message.as_ref().unwrap().content.as_deref(),
            Some("all")
        );
    }
}
