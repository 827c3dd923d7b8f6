use serde::Serialize;

/// Uniform request/response envelope for billing and account actions
///
/// Every non-streaming API action answers with `{success, message, data?}`
/// so clients can branch on `success` without inspecting status codes.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the action succeeded
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
    /// Action-specific payload, omitted on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Failed response with a message only
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}
