use std::sync::Arc;

use ink_analysis::AnalysisOrchestrator;
use ink_billing::BillingLedger;
use ink_cache::MemoryCache;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Streaming analysis pipeline
    pub orchestrator: Arc<AnalysisOrchestrator>,
    /// Billing ledger for account endpoints
    pub ledger: Arc<BillingLedger>,
    /// Analysis-result cache, surfaced on the diagnostics endpoint
    pub analysis_cache: Arc<MemoryCache<String>>,
    /// Short-TTL cache for billing lookups and other session data
    pub session_cache: Arc<MemoryCache<serde_json::Value>>,
}
