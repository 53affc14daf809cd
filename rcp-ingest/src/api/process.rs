//! Recipe upload processing endpoint
//!
//! POST /api/process: buffer the multipart upload, decode every file, run the
//! processing collaborator, save the outcome and answer with JSON.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::ingest;
use crate::persist::ProcessingOutcome;
use crate::upload::extract_upload;
use crate::AppState;

/// Successful POST /api/process response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub status: String,
    pub message: String,
    /// Collaborator result, passed through untouched
    pub data: Value,
}

/// POST /api/process
///
/// Every failure, including a body that is not multipart at all, is answered
/// with the 500 `{error, traceback}` envelope.
#[tracing::instrument(skip_all, fields(request_id = %Uuid::new_v4()))]
pub async fn process_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let upload = extract_upload(multipart?).await?;

    let ingestion = ingest::ingest(upload.parts, upload.form);
    {
        let degraded = ingestion.degraded_fields();
        if !degraded.is_empty() {
            warn!(fields = ?degraded, "Some uploads fell back to raw text");
        }
    }
    info!(files = ingestion.files.len(), "Upload ingested, starting processing");

    let (files, form) = ingestion.into_payload();
    let processor = Arc::clone(&state.processor);
    let processed = tokio::task::spawn_blocking(move || processor.process(files, form))
        .await
        .map_err(|e| ApiError::Internal(format!("processing task failed: {}", e)))?;

    let result = match processed {
        Ok(result) => result,
        Err(err) => {
            let api_error = ApiError::processing(&err);
            error!(error = %api_error, "Recipe processing failed");

            // Detached so the error response is not held up by disk I/O
            let envelope = api_error.envelope();
            let outcome = ProcessingOutcome::failure(json!({
                "error": envelope.error,
                "traceback": envelope.traceback,
            }));
            let persister = state.persister.clone();
            tokio::spawn(async move {
                persister.persist(&outcome).await;
            });

            return Err(api_error);
        }
    };

    let outcome = ProcessingOutcome::success(result);
    if state.persister.persist(&outcome).await.is_none() {
        warn!("Continuing without a saved result artifact");
    }

    info!("Recipe processing completed");
    Ok(Json(ProcessResponse {
        status: "success".to_string(),
        message: "Files processed successfully".to_string(),
        data: outcome.processing_result,
    }))
}

/// Build processing routes
pub fn process_routes() -> Router<AppState> {
    Router::new().route("/api/process", post(process_upload))
}
