//! Error types for rcp-ingest
//!
//! Every failure that reaches the HTTP layer is rendered as the same
//! `500 {error, traceback}` envelope; the caller distinguishes failures by
//! message, not by status code.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Write as _;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request was not a readable multipart body
    #[error("Invalid multipart request: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    /// Multipart stream failed while being drained
    #[error("Failed to read multipart request: {0}")]
    Multipart(#[from] MultipartError),

    /// Processing collaborator reported an error
    #[error("{message}")]
    Processing { message: String, traceback: String },

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub traceback: String,
}

impl ApiError {
    /// Wrap a collaborator error, keeping its full debug rendering
    ///
    /// The message is the whole context chain on one line (`{:#}`); `{:?}`
    /// adds the multi-line chain and, when one was captured, the backtrace.
    pub fn processing(err: &anyhow::Error) -> Self {
        ApiError::Processing {
            message: format!("{:#}", err),
            traceback: format!("{:?}", err),
        }
    }

    /// Diagnostic trace reported alongside the message
    pub fn traceback(&self) -> String {
        match self {
            ApiError::Processing { traceback, .. } => traceback.clone(),
            other => render_chain(other),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
            traceback: self.traceback(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.envelope())).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Render an error and its sources in the same layout anyhow uses
fn render_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    if source.is_some() {
        out.push_str("\n\nCaused by:");
    }
    let mut index = 0;
    while let Some(cause) = source {
        let _ = write!(out, "\n    {}: {}", index, cause);
        index += 1;
        source = cause.source();
    }
    out
}

/// Convert a handler panic into the standard 500 envelope
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");

    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}
