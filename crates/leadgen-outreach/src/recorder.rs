//! Append-only lead log.
//!
//! Every processed business becomes one JSON line carrying the run id, the
//! record and the contact outcome, so a run's results survive a crash
//! mid-batch and can be grepped afterwards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use leadgen_core::record::BusinessRecord;

use crate::error::RecorderError;
use crate::outcome::ContactOutcome;

/// Persistence seam for processed leads.
#[async_trait]
pub trait LeadRecorder: Send + Sync {
    async fn record(
        &self,
        business: &BusinessRecord,
        outcome: &ContactOutcome,
    ) -> Result<(), RecorderError>;
}

#[derive(Debug, Serialize)]
struct LeadEntry<'a> {
    run_id: Uuid,
    recorded_at: DateTime<Utc>,
    business: &'a BusinessRecord,
    outcome: &'a ContactOutcome,
}

/// JSON-lines recorder. One file per deployment, one run id per process;
/// the mutex keeps concurrent batch workers from interleaving lines.
pub struct JsonlRecorder {
    path: std::path::PathBuf,
    run_id: Uuid,
    write_lock: Mutex<()>,
}

impl JsonlRecorder {
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_id: Uuid::new_v4(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

#[async_trait]
impl LeadRecorder for JsonlRecorder {
    async fn record(
        &self,
        business: &BusinessRecord,
        outcome: &ContactOutcome,
    ) -> Result<(), RecorderError> {
        let entry = LeadEntry {
            run_id: self.run_id,
            recorded_at: Utc::now(),
            business,
            outcome,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let io_error = |source: std::io::Error| RecorderError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_error)?;
        file.write_all(line.as_bytes()).await.map_err(io_error)?;
        file.flush().await.map_err(io_error)?;
        Ok(())
    }
}
