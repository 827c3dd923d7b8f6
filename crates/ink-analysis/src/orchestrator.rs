//! The streaming analysis orchestrator
//!
//! Normalizes three upstream behaviors into one client-visible byte
//! stream: native token streams are forwarded in batches, single-shot
//! completions are replayed in slices, and cache hits never touch the
//! upstream at all. The stream mode is committed before the response
//! starts, via the body marker and response headers.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use ink_billing::{BillingError, BillingLedger};
use ink_cache::MemoryCache;
use ink_config::ModelConfig;
use ink_core::RequestIdentity;
use ink_quota::{QuotaTracker, UserClass};
use ink_store::{AnalysisRecord, AnalysisStore};
use tokio::time::Instant;

use crate::client::{ChatClient, UpstreamEvent, UpstreamResponse, UpstreamStream};
use crate::error::AnalysisError;
use crate::persist::ResultPersister;
use crate::search::SearchClient;
use crate::stream::{BodyStream, StreamSender, body_channel};
use crate::types::{ChatMessage, StreamMode};
use crate::{prompt, text};

/// Upper bound on one whole upstream exchange
const OVERALL_TIMEOUT: Duration = Duration::from_secs(120);
/// Upper bound on one in-flight stream read
const STALL_TIMEOUT: Duration = Duration::from_secs(30);
/// Classification window for the first chunk; missing it only demotes the
/// stream to simulated, it cancels nothing
const FIRST_CHUNK_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwarded chunks per flush on the native path
const NATIVE_BATCH_SIZE: usize = 10;
/// Slice size when replaying a collected completion
const SIMULATED_SLICE_BYTES: usize = 50;
/// Slice size when replaying a cached result
const CACHED_SLICE_BYTES: usize = 100;

/// One analysis request, already authenticated
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// The article to grade
    pub article_text: String,
    /// Analysis mode
    pub mode: String,
    /// Configured model id; the first configured model when absent
    pub model_id: Option<String>,
    /// Whether to attempt search enrichment
    pub need_search: bool,
    /// Keywords for the search service
    pub search_keywords: Option<String>,
}

/// A committed response: mode plus the body stream
#[derive(Debug)]
pub struct AnalysisReply {
    /// How the body is produced
    pub mode: StreamMode,
    /// Body bytes, marker first
    pub body: BodyStream,
}

/// Orchestrates cache, quota, billing, and the upstream model
pub struct AnalysisOrchestrator {
    cache: Arc<MemoryCache<String>>,
    store: Arc<dyn AnalysisStore>,
    ledger: Arc<BillingLedger>,
    quota: Arc<QuotaTracker>,
    persister: ResultPersister,
    models: IndexMap<String, ModelConfig>,
    search: Option<SearchClient>,
}

impl AnalysisOrchestrator {
    /// Assemble the orchestrator from its collaborators
    pub fn new(
        cache: Arc<MemoryCache<String>>,
        store: Arc<dyn AnalysisStore>,
        ledger: Arc<BillingLedger>,
        quota: Arc<QuotaTracker>,
        persister: ResultPersister,
        models: IndexMap<String, ModelConfig>,
        search: Option<SearchClient>,
    ) -> Self {
        Self {
            cache,
            store,
            ledger,
            quota,
            persister,
            models,
            search,
        }
    }

    /// Run one analysis
    ///
    /// Validation and gate failures return an error before any body byte
    /// is produced; afterwards failures surface as stream error events.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid input, quota or billing rejection, or
    /// an upstream failure before the stream is committed
    pub async fn analyze(
        &self,
        request: AnalysisRequest,
        identity: RequestIdentity,
    ) -> Result<AnalysisReply, AnalysisError> {
        if request.article_text.trim().is_empty() {
            return Err(AnalysisError::EmptyText);
        }

        let model = self.resolve_model(request.model_id.as_deref())?;
        if model.premium && !identity.is_logged_in() {
            return Err(AnalysisError::PremiumRequiresLogin);
        }

        let cache_key = text::analysis_cache_key(&request.article_text, &request.mode, &model.model);

        // Cache probe comes before every gate: a hit consumes no quota and
        // no balance
        if let Some(result) = self.cache.get(&cache_key) {
            tracing::info!(cache_key, "analysis served from memory cache");
            return Ok(cached_reply((*result).clone()));
        }
        if let Some(record) = self.store.get_analysis(&cache_key).await? {
            tracing::info!(cache_key, "analysis served from store");
            self.cache.set(&cache_key, record.result_text.clone(), None);
            return Ok(cached_reply(record.result_text));
        }

        let class = self.classify(&identity).await?;
        #[allow(clippy::cast_possible_truncation)]
        let text_len = request.article_text.chars().count() as u64;
        self.quota.check_and_consume(&identity, class, text_len).await?;

        // Premium calls are deducted after a successful stream, but the
        // balance gate runs up front
        let deduct_uid = if model.premium {
            let uid = identity.uid.unwrap_or_default();
            let has_calls = match self.ledger.has_available_calls(uid).await {
                Ok(has) => has,
                Err(BillingError::AccountNotFound) => false,
                Err(e) => return Err(e.into()),
            };
            if !has_calls {
                return Err(AnalysisError::Billing(BillingError::NoBalance));
            }
            Some(uid)
        } else {
            None
        };

        let search_summary = self.enrich(&request).await;

        let mut messages = vec![ChatMessage::system(prompt::build_system_prompt(&request.mode))];
        if let Some(summary) = &search_summary {
            messages.push(ChatMessage::user(prompt::search_context_message(summary)));
        }
        messages.push(ChatMessage::user(request.article_text.clone()));

        let seed = identity.fingerprint.as_deref().and_then(|f| f.parse().ok());
        let client = ChatClient::new(model)?;

        let finalizer = Finalizer {
            cache: Arc::clone(&self.cache),
            persister: self.persister.clone(),
            ledger: Arc::clone(&self.ledger),
            cache_key,
            mode: request.mode.clone(),
            model: model.model.clone(),
            identity,
            deduct_uid,
        };

        let deadline = Instant::now() + OVERALL_TIMEOUT;
        let upstream = tokio::time::timeout_at(deadline, client.open_stream(messages, seed))
            .await
            .map_err(|_| AnalysisError::Timeout)??;

        match upstream {
            UpstreamResponse::Single(content) => {
                if content.trim().is_empty() {
                    return Err(AnalysisError::EmptyCompletion);
                }
                tracing::debug!(model = %client.model(), "provider answered in one shot");
                Ok(spawn_replay(StreamMode::Simulated, content, finalizer))
            }
            UpstreamResponse::Events(mut events) => {
                match tokio::time::timeout(FIRST_CHUNK_TIMEOUT, next_event(&mut events)).await {
                    Ok(Ok(Some(UpstreamEvent::Delta(first)))) => {
                        Ok(spawn_native(events, first, deadline, finalizer))
                    }
                    Ok(Ok(Some(UpstreamEvent::Full(content)))) => {
                        if content.trim().is_empty() {
                            return Err(AnalysisError::EmptyCompletion);
                        }
                        Ok(spawn_replay(StreamMode::Simulated, content, finalizer))
                    }
                    Ok(Ok(Some(UpstreamEvent::Done) | None)) => Err(AnalysisError::EmptyCompletion),
                    Ok(Err(e)) => Err(e),
                    // No first chunk inside the classification window:
                    // collect the rest quietly and replay it
                    Err(_) => Ok(spawn_collect_then_replay(events, deadline, finalizer)),
                }
            }
        }
    }

    fn resolve_model(&self, model_id: Option<&str>) -> Result<&ModelConfig, AnalysisError> {
        match model_id {
            Some(id) => self
                .models
                .get(id)
                .ok_or_else(|| AnalysisError::UnknownModel(id.to_owned())),
            None => self
                .models
                .values()
                .next()
                .ok_or_else(|| AnalysisError::UnknownModel("default".to_owned())),
        }
    }

    async fn classify(&self, identity: &RequestIdentity) -> Result<UserClass, AnalysisError> {
        let Some(uid) = identity.uid else {
            return Ok(UserClass::Guest);
        };

        let class = match self.ledger.get(uid).await? {
            Some(billing) if billing.total_amount > 0.0 => UserClass::Member,
            _ => UserClass::Regular,
        };
        Ok(class)
    }

    async fn enrich(&self, request: &AnalysisRequest) -> Option<String> {
        if !request.need_search {
            return None;
        }
        let client = self.search.as_ref()?;
        let keywords = request
            .search_keywords
            .as_deref()
            .filter(|k| !k.trim().is_empty())?;
        client.summarize(keywords).await
    }
}

/// One stream read, shared by the classification peek and the drivers
async fn next_event(events: &mut UpstreamStream) -> Result<Option<UpstreamEvent>, AnalysisError> {
    use futures_util::StreamExt;
    events.next().await.transpose()
}

/// Everything needed once the full result text is known
struct Finalizer {
    cache: Arc<MemoryCache<String>>,
    persister: ResultPersister,
    ledger: Arc<BillingLedger>,
    cache_key: String,
    mode: String,
    model: String,
    identity: RequestIdentity,
    deduct_uid: Option<u64>,
}

impl Finalizer {
    /// Cache, persist, and deduct for a completed stream
    async fn finalize(self, content: &str) {
        if content.trim().is_empty() {
            tracing::warn!(cache_key = self.cache_key, "empty completion, nothing to persist");
            return;
        }

        let extracted = text::extract_result(content);
        self.cache.set(&self.cache_key, extracted.json_text.clone(), None);

        self.persister.persist(AnalysisRecord {
            cache_key: self.cache_key,
            result_text: extracted.json_text,
            parsed: extracted.parsed,
            overall_score: extracted.overall_score,
            mode: self.mode,
            model: self.model,
            uid: self.identity.uid,
            fingerprint: self.identity.fingerprint,
            ip: self.identity.ip,
            created_at: jiff::Timestamp::now(),
        });

        if let Some(uid) = self.deduct_uid
            && let Err(e) = self.ledger.deduct_call(uid).await
        {
            tracing::warn!(uid, error = %e, "failed to deduct call after stream");
        }
    }
}

fn cached_reply(content: String) -> AnalysisReply {
    let (sender, body) = body_channel();

    tokio::spawn(async move {
        if sender.send_text(&StreamMode::Cached.marker()).is_err() {
            return;
        }
        let _ = sender.replay(&content, CACHED_SLICE_BYTES).await;
    });

    AnalysisReply {
        mode: StreamMode::Cached,
        body,
    }
}

fn spawn_replay(mode: StreamMode, content: String, finalizer: Finalizer) -> AnalysisReply {
    let (sender, body) = body_channel();

    tokio::spawn(async move {
        if sender.send_text(&mode.marker()).is_err() {
            tracing::debug!("client left before the stream started");
            return;
        }
        if sender.replay(&content, SIMULATED_SLICE_BYTES).await.is_err() {
            tracing::debug!("client left mid-replay, skipping persistence");
            return;
        }
        finalizer.finalize(&content).await;
    });

    AnalysisReply { mode, body }
}

fn spawn_native(
    events: UpstreamStream,
    first: String,
    deadline: Instant,
    finalizer: Finalizer,
) -> AnalysisReply {
    let (sender, body) = body_channel();

    tokio::spawn(async move {
        if sender.send_text(&StreamMode::Native.marker()).is_err() {
            return;
        }
        match forward_native(events, first, deadline, &sender).await {
            Ok(Some(content)) => finalizer.finalize(&content).await,
            Ok(None) => tracing::debug!("client left mid-stream, skipping persistence"),
            Err(e) => sender.send_error(&e.to_string()),
        }
    });

    AnalysisReply {
        mode: StreamMode::Native,
        body,
    }
}

fn spawn_collect_then_replay(
    events: UpstreamStream,
    deadline: Instant,
    finalizer: Finalizer,
) -> AnalysisReply {
    let (sender, body) = body_channel();

    tokio::spawn(async move {
        if sender.send_text(&StreamMode::Simulated.marker()).is_err() {
            return;
        }
        match collect_all(events, deadline).await {
            Ok(content) if content.trim().is_empty() => {
                sender.send_error("the model returned an empty completion");
            }
            Ok(content) => {
                if sender.replay(&content, SIMULATED_SLICE_BYTES).await.is_err() {
                    tracing::debug!("client left mid-replay, skipping persistence");
                    return;
                }
                finalizer.finalize(&content).await;
            }
            Err(e) => sender.send_error(&e.to_string()),
        }
    });

    AnalysisReply {
        mode: StreamMode::Simulated,
        body,
    }
}

/// Forward deltas in batches; `Ok(None)` means the client went away
async fn forward_native(
    mut events: UpstreamStream,
    first: String,
    deadline: Instant,
    sender: &StreamSender,
) -> Result<Option<String>, AnalysisError> {
    let mut content = first.clone();
    let mut batch = vec![first];

    loop {
        let next = read_with_deadlines(&mut events, deadline).await?;

        match next {
            Some(UpstreamEvent::Delta(delta)) => {
                content.push_str(&delta);
                batch.push(delta);
                if batch.len() >= NATIVE_BATCH_SIZE {
                    if sender.send_text(&batch.concat()).is_err() {
                        return Ok(None);
                    }
                    batch.clear();
                }
            }
            Some(UpstreamEvent::Full(full)) => {
                // A provider mixing shapes mid-stream; treat it as a delta
                content.push_str(&full);
                batch.push(full);
            }
            Some(UpstreamEvent::Done) | None => {
                if !batch.is_empty() && sender.send_text(&batch.concat()).is_err() {
                    return Ok(None);
                }
                if content.trim().is_empty() {
                    return Err(AnalysisError::EmptyCompletion);
                }
                return Ok(Some(content));
            }
        }
    }
}

/// Drain the whole stream into one string, honoring both deadlines
async fn collect_all(
    mut events: UpstreamStream,
    deadline: Instant,
) -> Result<String, AnalysisError> {
    let mut content = String::new();

    loop {
        match read_with_deadlines(&mut events, deadline).await? {
            Some(UpstreamEvent::Delta(delta)) => content.push_str(&delta),
            Some(UpstreamEvent::Full(full)) => content.push_str(&full),
            Some(UpstreamEvent::Done) | None => return Ok(content),
        }
    }
}

/// One stream read bounded by the stall timeout and the overall deadline
async fn read_with_deadlines(
    events: &mut UpstreamStream,
    deadline: Instant,
) -> Result<Option<UpstreamEvent>, AnalysisError> {
    let stall = Instant::now() + STALL_TIMEOUT;
    tokio::time::timeout_at(deadline.min(stall), next_event(events))
        .await
        .map_err(|_| AnalysisError::Timeout)?
}
