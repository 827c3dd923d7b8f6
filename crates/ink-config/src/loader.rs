use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded = crate::env::expand_env(&raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if no grading model is configured or the billing
    /// tier table is malformed
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.models.is_empty() {
            anyhow::bail!("at least one grading model must be configured");
        }

        self.billing
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid billing config: {e}"))?;

        if self.cache.analysis.max_items == 0 || self.cache.session.max_items == 0 {
            anyhow::bail!("cache max_items must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_validates() {
        let toml = r#"
            [models.default]
            name = "Default"
            model = "gpt-4o-mini"
            base_url = "https://api.openai.com/v1"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.daily_cap_guest, 100_000);
    }

    #[test]
    fn empty_model_table_rejected() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }
}
