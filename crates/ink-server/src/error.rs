use axum::Json;
use axum::response::{IntoResponse, Response};
use ink_core::{ApiResponse, HttpError};

/// Convert a pipeline error into a JSON error response
///
/// The streaming endpoint answers errors in the `{"error": {...}}` shape
/// its clients already parse from model providers.
pub fn analysis_error_response<E: HttpError>(error: &E) -> Response {
    let body = serde_json::json!({
        "error": {
            "message": error.client_message(),
            "type": error.error_type(),
        }
    });

    (error.status_code(), Json(body)).into_response()
}

/// Convert a domain error into an envelope failure response
pub fn envelope_error_response<E: HttpError>(error: &E) -> Response {
    let body: ApiResponse<serde_json::Value> = ApiResponse::fail(error.client_message());
    (error.status_code(), Json(body)).into_response()
}
