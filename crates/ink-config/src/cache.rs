use serde::Deserialize;

/// Budgets for the two in-memory cache instances
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Analysis-result cache (larger values, longer TTL)
    #[serde(default = "default_analysis_budget")]
    pub analysis: CacheBudget,
    /// Session-like data cache (smaller values, shorter TTL)
    #[serde(default = "default_session_budget")]
    pub session: CacheBudget,
}

/// Size, item, and TTL budget for one cache instance
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheBudget {
    /// Maximum resident bytes
    pub max_size_bytes: usize,
    /// Maximum live entries
    pub max_items: usize,
    /// Default TTL in seconds
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            analysis: default_analysis_budget(),
            session: default_session_budget(),
        }
    }
}

const fn default_analysis_budget() -> CacheBudget {
    CacheBudget {
        max_size_bytes: 50 * 1024 * 1024,
        max_items: 500,
        ttl_seconds: 3600,
    }
}

const fn default_session_budget() -> CacheBudget {
    CacheBudget {
        max_size_bytes: 10 * 1024 * 1024,
        max_items: 1000,
        ttl_seconds: 1800,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_budgets() {
        let config = CacheConfig::default();
        assert_eq!(config.analysis.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.analysis.max_items, 500);
        assert_eq!(config.session.ttl_seconds, 1800);
    }
}
