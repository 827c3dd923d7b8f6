/// Liveness probe, always 200
pub async fn health_handler() -> &'static str {
    "ok"
}
