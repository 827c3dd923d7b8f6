use std::net::SocketAddr;

use serde::Deserialize;

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind, defaults to 0.0.0.0:3000
    #[serde(default)]
    pub listen_address: Option<SocketAddr>,
    /// Health endpoint path
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            health_path: default_health_path(),
        }
    }
}

fn default_health_path() -> String {
    "/health".to_owned()
}
