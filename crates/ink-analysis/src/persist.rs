//! Supervised background persistence of analysis results
//!
//! Results are enqueued on an unbounded channel and written by one
//! background task, so the response stream never waits on the store and
//! write failures land in the log instead of vanishing.

use std::sync::Arc;

use ink_store::{AnalysisRecord, AnalysisStore};
use tokio::sync::mpsc;

/// Async persister dispatching records to a background writer task
#[derive(Clone)]
pub struct ResultPersister {
    tx: mpsc::UnboundedSender<AnalysisRecord>,
}

impl ResultPersister {
    /// Create a persister and spawn its writer task
    ///
    /// The task runs until every sender is dropped.
    #[must_use]
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_records(rx, store));
        Self { tx }
    }

    /// Enqueue a record for background persistence
    ///
    /// Non-blocking; if the writer has stopped the record is dropped with
    /// a warning.
    pub fn persist(&self, record: AnalysisRecord) {
        if self.tx.send(record).is_err() {
            tracing::warn!("failed to enqueue analysis record, writer stopped");
        }
    }
}

impl std::fmt::Debug for ResultPersister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultPersister").finish_non_exhaustive()
    }
}

async fn write_records(
    mut rx: mpsc::UnboundedReceiver<AnalysisRecord>,
    store: Arc<dyn AnalysisStore>,
) {
    while let Some(record) = rx.recv().await {
        let cache_key = record.cache_key.clone();
        if let Err(e) = store.put_analysis(record).await {
            tracing::warn!(error = %e, cache_key, "failed to persist analysis record");
        } else {
            tracing::debug!(cache_key, "analysis record persisted");
        }
    }

    tracing::debug!("result persister shutting down");
}

#[cfg(test)]
mod tests {
    use ink_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn persists_enqueued_records() {
        let store = Arc::new(MemoryStore::new());
        let persister = ResultPersister::new(store.clone());

        persister.persist(AnalysisRecord {
            cache_key: "key-1".to_owned(),
            result_text: "{}".to_owned(),
            parsed: serde_json::json!({}),
            overall_score: None,
            mode: "full".to_owned(),
            model: "test".to_owned(),
            uid: None,
            fingerprint: None,
            ip: None,
            created_at: jiff::Timestamp::now(),
        });

        // Writer task runs on the same runtime; yield until it lands
        for _ in 0..50 {
            tokio::task::yield_now().await;
            if store.get_analysis("key-1").await.unwrap().is_some() {
                return;
            }
        }
        panic!("record never persisted");
    }
}
