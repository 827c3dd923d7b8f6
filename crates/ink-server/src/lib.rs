//! HTTP server wiring
//!
//! Assembles the axum router from configuration: the streaming analysis
//! endpoint, billing account actions, and cache diagnostics, with shared
//! state built once at startup.

#![allow(clippy::must_use_candidate)]

mod analyze;
mod billing;
mod error;
mod health;
mod state;
mod system;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use ink_analysis::{AnalysisOrchestrator, ResultPersister, SearchClient};
use ink_billing::{AfdianClient, BillingLedger, OrderVerifier};
use ink_cache::MemoryCache;
use ink_config::{CacheBudget, Config};
use ink_quota::QuotaTracker;
use ink_store::MemoryStore;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Assembled server with all routes and shared state
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    analysis_cache: Arc<MemoryCache<String>>,
    session_cache: Arc<MemoryCache<serde_json::Value>>,
}

fn build_cache<T: ink_cache::EstimateSize>(budget: &CacheBudget) -> Arc<MemoryCache<T>> {
    Arc::new(MemoryCache::new(
        budget.max_size_bytes,
        budget.max_items,
        Duration::from_secs(budget.ttl_seconds),
    ))
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client for the sponsorship platform or
    /// the search service cannot be built
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let store = Arc::new(MemoryStore::new());
        let analysis_cache: Arc<MemoryCache<String>> = build_cache(&config.cache.analysis);
        let session_cache: Arc<MemoryCache<serde_json::Value>> = build_cache(&config.cache.session);

        let verifier: Option<Arc<dyn OrderVerifier>> = match &config.afdian {
            Some(afdian) => Some(Arc::new(AfdianClient::new(afdian)?)),
            None => None,
        };
        let ledger = Arc::new(BillingLedger::new(
            store.clone(),
            store.clone(),
            verifier,
            config.billing.clone(),
        ));

        let quota = Arc::new(QuotaTracker::new(store.clone(), config.limits.clone()));
        let persister = ResultPersister::new(store.clone());

        let search = match &config.search {
            Some(search_config) => Some(SearchClient::new(search_config)?),
            None => None,
        };

        let orchestrator = Arc::new(AnalysisOrchestrator::new(
            Arc::clone(&analysis_cache),
            store,
            Arc::clone(&ledger),
            quota,
            persister,
            config.models,
            search,
        ));

        let app_state = AppState {
            orchestrator,
            ledger,
            analysis_cache: Arc::clone(&analysis_cache),
            session_cache: Arc::clone(&session_cache),
        };

        let router = Router::new()
            .route(&config.server.health_path, get(health::health_handler))
            .route("/api/analyze-stream", post(analyze::analyze_stream))
            .route("/api/billing/{uid}", get(billing::get_billing))
            .route("/api/billing/{uid}/initialize", post(billing::initialize_billing))
            .route("/api/billing/{uid}/redeem", post(billing::redeem_order))
            .route("/api/billing/{uid}/available", get(billing::available_calls))
            .route("/api/system/cache-stats", get(system::cache_stats))
            .with_state(app_state)
            .layer(TraceLayer::new_for_http());

        Ok(Self {
            router,
            listen_address,
            analysis_cache,
            session_cache,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener. Cache
    /// sweepers are not spawned on this path.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Spawns the periodic cache sweepers, then blocks until the
    /// cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let analysis_sweeper = self.analysis_cache.spawn_sweeper(shutdown.clone());
        let session_sweeper = self.session_cache.spawn_sweeper(shutdown.clone());

        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        let _ = tokio::join!(analysis_sweeper, session_sweeper);

        Ok(())
    }
}
