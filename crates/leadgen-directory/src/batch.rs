//! Bounded-concurrency batch execution of directory lookups.
//!
//! Queries are partitioned into consecutive batches of the configured
//! concurrency. All lookups within a batch are issued together and joined
//! settle-all: one query's failure never aborts its siblings, it just
//! contributes zero records. A pacing delay separates consecutive batches to
//! respect upstream rate limits; no delay runs after the final batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use leadgen_core::record::BusinessRecord;

use crate::client::Directory;

/// Cooperative stop signal shared between a run and its observers.
///
/// Stopping is observed between batches only: in-flight lookups finish, no
/// new batch starts.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs search queries in fixed-size concurrent batches with inter-batch
/// pacing.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    inter_batch_delay_ms: u64,
}

impl BatchExecutor {
    #[must_use]
    pub fn new(inter_batch_delay_ms: u64) -> Self {
        Self {
            inter_batch_delay_ms,
        }
    }

    /// Executes `queries` against `directory`, `concurrency` at a time.
    ///
    /// Returns a flat, possibly-duplicate record sequence. Ordering follows
    /// batch submission order; within a batch, query submission order. A
    /// query that fails after retries is logged and contributes nothing.
    pub async fn execute<D: Directory>(
        self,
        directory: &D,
        queries: &[String],
        concurrency: usize,
        stop: &StopFlag,
    ) -> Vec<BusinessRecord> {
        let concurrency = concurrency.max(1);
        let batch_total = queries.len().div_ceil(concurrency);
        tracing::info!(
            queries = queries.len(),
            batch_total,
            concurrency,
            "starting batched directory lookups"
        );

        let mut records: Vec<BusinessRecord> = Vec::new();

        for (index, batch) in queries.chunks(concurrency).enumerate() {
            if stop.is_stopped() {
                tracing::info!(
                    completed_batches = index,
                    batch_total,
                    "stop requested, not starting further batches"
                );
                break;
            }

            if index > 0 && self.inter_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_batch_delay_ms)).await;
            }

            tracing::info!(
                batch = index + 1,
                batch_total,
                size = batch.len(),
                "processing query batch"
            );

            let lookups = batch.iter().map(|query| async move {
                match directory.search(query).await {
                    Ok(found) => found,
                    Err(err) => {
                        tracing::error!(query = %query, error = %err, "query failed, contributing zero records");
                        Vec::new()
                    }
                }
            });

            for found in join_all(lookups).await {
                records.extend(found);
            }
        }

        tracing::info!(found = records.len(), "batched lookups complete");
        records
    }
}
