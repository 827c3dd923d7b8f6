use http::StatusCode;

/// Domain errors that map onto HTTP responses
///
/// Each feature crate implements this for its error type; the server layer
/// turns the mapping into actual responses, so domain crates never depend
/// on axum.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Stable machine-readable tag (e.g. `daily_cap_exceeded`)
    fn error_type(&self) -> &str;

    /// Message safe to expose to API consumers
    ///
    /// Defaults to the `Display` rendering; override for errors whose
    /// `Display` carries internal detail.
    fn client_message(&self) -> String {
        self.to_string()
    }
}
