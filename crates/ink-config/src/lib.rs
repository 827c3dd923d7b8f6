//! TOML configuration with `{{ env.VAR }}` expansion and validation

#![allow(clippy::must_use_candidate)]

pub mod afdian;
pub mod billing;
pub mod cache;
mod env;
pub mod limits;
mod loader;
pub mod models;
pub mod search;
pub mod server;

use serde::Deserialize;

pub use afdian::AfdianConfig;
pub use billing::{BillingConfig, TierConfig};
pub use cache::{CacheBudget, CacheConfig};
pub use limits::LimitsConfig;
pub use models::ModelConfig;
pub use search::SearchConfig;
pub use server::ServerConfig;

/// Top-level Ink Battles configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Grading model table keyed by model id
    #[serde(default)]
    pub models: indexmap::IndexMap<String, ModelConfig>,
    /// Billing constants and membership tiers
    #[serde(default)]
    pub billing: BillingConfig,
    /// Guest and per-request usage limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// In-memory cache budgets
    #[serde(default)]
    pub cache: CacheConfig,
    /// Afdian sponsor API credentials (order redemption)
    #[serde(default)]
    pub afdian: Option<AfdianConfig>,
    /// Web-search enrichment endpoint
    #[serde(default)]
    pub search: Option<SearchConfig>,
}
