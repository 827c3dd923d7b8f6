use axum::Json;
use axum::extract::State;
use http::StatusCode;
use ink_core::ApiResponse;

use crate::state::AppState;

const HOT_KEY_LIMIT: usize = 10;

/// Handle `GET /api/system/cache-stats`
pub async fn cache_stats(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let data = serde_json::json!({
        "analysis": {
            "stats": state.analysis_cache.stats(),
            "hotKeys": state.analysis_cache.hot_keys(HOT_KEY_LIMIT),
        },
        "session": {
            "stats": state.session_cache.stats(),
            "hotKeys": state.session_cache.hot_keys(HOT_KEY_LIMIT),
        },
    });

    (StatusCode::OK, Json(ApiResponse::ok("ok", data)))
}
