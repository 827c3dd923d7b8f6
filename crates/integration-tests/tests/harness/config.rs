//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use indexmap::IndexMap;
use ink_config::{
    AfdianConfig, BillingConfig, CacheConfig, Config, LimitsConfig, ModelConfig, ServerConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                models: IndexMap::new(),
                billing: BillingConfig::default(),
                limits: LimitsConfig::default(),
                cache: CacheConfig::default(),
                afdian: None,
                search: None,
            },
        }
    }

    /// Add a grading model pointed at a mock backend
    pub fn with_model(mut self, id: &str, base_url: &str, premium: bool) -> Self {
        self.config.models.insert(
            id.to_owned(),
            ModelConfig {
                name: id.to_owned(),
                model: format!("{id}-upstream"),
                base_url: base_url.parse().expect("valid URL"),
                api_key: Some(SecretString::from("test-key")),
                premium,
                temperature: 0.3,
            },
        );
        self
    }

    /// Set usage limits
    pub fn with_limits(mut self, limits: LimitsConfig) -> Self {
        self.config.limits = limits;
        self
    }

    /// Point order redemption at a mock sponsorship platform
    ///
    /// Credentials match what [`mock_afdian::MockAfdian`] expects.
    pub fn with_afdian(mut self, base_url: &str) -> Self {
        self.config.afdian = Some(AfdianConfig {
            api_url: format!("{base_url}/api/").parse().expect("valid URL"),
            user_id: "dev-1".to_owned(),
            token: SecretString::from("test-token"),
        });
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
