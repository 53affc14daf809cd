//! Result persistence
//!
//! Each processing outcome is written to
//! `<results_dir>/processing_results_<YYYYMMDD_HHMMSS>.json`. Artifacts are
//! diagnostic copies, never read back, so persistence is best-effort: every
//! failure is logged and swallowed. Two outcomes within the same second share
//! a name and the later one overwrites the earlier.

use rcp_common::time;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Final status of a processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// What gets persisted for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    /// ISO-8601 local time the outcome was recorded
    pub timestamp: String,
    pub status: OutcomeStatus,
    /// Collaborator result on success, error detail on failure
    pub processing_result: Value,
}

impl ProcessingOutcome {
    pub fn success(result: Value) -> Self {
        Self::at(OutcomeStatus::Success, result)
    }

    pub fn failure(detail: Value) -> Self {
        Self::at(OutcomeStatus::Error, detail)
    }

    fn at(status: OutcomeStatus, processing_result: Value) -> Self {
        Self {
            timestamp: time::iso8601(&time::now()),
            status,
            processing_result,
        }
    }
}

/// File name for an artifact stamped `YYYYMMDD_HHMMSS`
pub fn artifact_file_name(stamp: &str) -> String {
    format!("processing_results_{}.json", stamp)
}

/// Writes outcomes into a results directory
#[derive(Debug, Clone)]
pub struct ResultPersister {
    results_dir: PathBuf,
}

impl ResultPersister {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Persist an outcome; returns the artifact path, or `None` on failure
    pub async fn persist(&self, outcome: &ProcessingOutcome) -> Option<PathBuf> {
        match self.try_persist(outcome).await {
            Ok(path) => {
                info!(path = %path.display(), "Processing results saved");
                Some(path)
            }
            Err(e) => {
                warn!(
                    results_dir = %self.results_dir.display(),
                    error = %e,
                    "Failed to save processing results"
                );
                None
            }
        }
    }

    async fn try_persist(&self, outcome: &ProcessingOutcome) -> rcp_common::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.results_dir).await?;

        let file_name = artifact_file_name(&time::artifact_stamp(&time::now()));
        let path = self.results_dir.join(&file_name);

        // serde_json leaves non-ASCII characters unescaped
        let mut json = serde_json::to_vec_pretty(outcome)?;
        json.push(b'\n');

        // Concurrent writers each stage under their own name, then rename
        let staging = self
            .results_dir
            .join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));
        if let Err(e) = stage_and_rename(&staging, &path, &json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        Ok(path)
    }
}

async fn stage_and_rename(staging: &Path, path: &Path, contents: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(staging, contents).await?;
    tokio::fs::rename(staging, path).await
}
