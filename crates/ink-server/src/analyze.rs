use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use http::{HeaderMap, StatusCode, header};
use ink_analysis::AnalysisRequest;
use ink_core::RequestIdentity;
use serde::Deserialize;

use crate::error::analysis_error_response;
use crate::state::AppState;

/// Request body for `POST /api/analyze-stream`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyzeBody {
    /// The article to analyze
    article_text: String,
    /// Analysis mode
    #[serde(default = "default_mode")]
    mode: String,
    /// Configured model id
    #[serde(default)]
    model_id: Option<String>,
    /// Whether to fold web-search background into the prompt
    #[serde(default)]
    need_search: bool,
    /// Keywords for the search service
    #[serde(default)]
    search_keywords: Option<String>,
}

fn default_mode() -> String {
    "professional".to_owned()
}

/// Handle `POST /api/analyze-stream`
///
/// Success is a `text/plain` stream whose first bytes are the stream-mode
/// marker; the mode is mirrored in `x-stream-mode` and `x-response-mode`
/// so clients can branch without sniffing the body.
pub async fn analyze_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeBody>,
) -> Response {
    let identity = RequestIdentity::from_headers(&headers);
    let request = AnalysisRequest {
        article_text: body.article_text,
        mode: body.mode,
        model_id: body.model_id,
        need_search: body.need_search,
        search_keywords: body.search_keywords,
    };

    match state.orchestrator.analyze(request, identity).await {
        Ok(reply) => {
            let mode = reply.mode.as_str();
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .header("x-stream-mode", mode)
                .header("x-response-mode", mode)
                .body(Body::from_stream(reply.body))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        Err(e) => analysis_error_response(&e),
    }
}
