use serde::Deserialize;

/// Per-request and daily usage limits, in input characters
///
/// Members (any lifetime spend above zero) are exempt from both caps.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Single-request cap for guests
    #[serde(default = "default_per_request_guest")]
    pub per_request_guest: u64,
    /// Single-request cap for logged-in non-member users
    #[serde(default = "default_per_request_logged")]
    pub per_request_logged: u64,
    /// Daily cumulative cap for guests, per fingerprint or IP
    #[serde(default = "default_daily_cap_guest")]
    pub daily_cap_guest: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            per_request_guest: default_per_request_guest(),
            per_request_logged: default_per_request_logged(),
            daily_cap_guest: default_daily_cap_guest(),
        }
    }
}

const fn default_per_request_guest() -> u64 {
    5_000
}

const fn default_per_request_logged() -> u64 {
    60_000
}

const fn default_daily_cap_guest() -> u64 {
    100_000
}
