use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Afdian open API credentials for order verification
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AfdianConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: Url,
    /// Developer account user id
    pub user_id: String,
    /// API token used for request signing
    pub token: SecretString,
}

fn default_api_url() -> Url {
    Url::parse("https://afdian.com/api/").expect("valid default URL")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_with_default_url() {
        let toml = r#"
            user_id = "dev-123"
            token = "secret-token"
        "#;

        let config: AfdianConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api_url.host_str(), Some("afdian.com"));
        assert_eq!(config.user_id, "dev-123");
    }
}
