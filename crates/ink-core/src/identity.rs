use http::HeaderMap;

/// Caller identity extracted from request headers
///
/// Authentication itself happens upstream (session/OAuth layer); this
/// service trusts the identity headers that layer injects. Guests carry
/// no `uid` and are identified by browser fingerprint or client IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Numeric user id for logged-in users
    pub uid: Option<u64>,
    /// Browser fingerprint supplied by the client
    pub fingerprint: Option<String>,
    /// Client IP from forwarding headers
    pub ip: Option<String>,
}

impl RequestIdentity {
    /// Extract identity from `x-uid`, `x-fingerprint`, and the usual
    /// forwarding headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let uid = headers
            .get("x-uid")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let fingerprint = header_string(headers, "x-fingerprint");

        // First hop of x-forwarded-for, falling back to x-real-ip
        let ip = header_string(headers, "x-forwarded-for")
            .map(|v| v.split(',').next().unwrap_or(&v).trim().to_owned())
            .or_else(|| header_string(headers, "x-real-ip"));

        Self { uid, fingerprint, ip }
    }

    /// Whether the request comes from a logged-in user
    pub const fn is_logged_in(&self) -> bool {
        self.uid.is_some()
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && *v != "unknown")
        .map(str::to_owned)
}
