//! Ingestion pipeline
//!
//! Turns buffered upload parts into decoded content: `.csv` parts become row
//! tables, everything else plain text. A part that fails to tabulate is kept
//! as lossy text so one bad upload never costs the others.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::normalizer::{self, TextEncoding};
use crate::tabulator::{self, RowTable, TabulateError};
use crate::upload::{FormFields, UploadedPart};

/// Decoded content of one uploaded file
///
/// Serializes untagged: a table is an array of string arrays, text is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileContent {
    Table(RowTable),
    Text(String),
}

/// One uploaded file after decoding
#[derive(Debug, Clone, Serialize)]
pub struct DecodedFile {
    pub field_name: String,
    pub filename: String,
    pub encoding: TextEncoding,
    pub content: FileContent,
    /// Why the part degraded to raw text, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// Payload handed to the processing collaborator
pub type FilesData = BTreeMap<String, FileContent>;

/// Everything ingested from one request
#[derive(Debug, Default)]
pub struct IngestionResult {
    pub files: BTreeMap<String, DecodedFile>,
    pub form: FormFields,
}

impl IngestionResult {
    /// Consume the result into the collaborator's `(files, form)` arguments
    pub fn into_payload(self) -> (FilesData, FormFields) {
        let files = self
            .files
            .into_iter()
            .map(|(name, decoded)| (name, decoded.content))
            .collect();
        (files, self.form)
    }

    /// Field names whose content fell back to raw text
    pub fn degraded_fields(&self) -> Vec<&str> {
        self.files
            .values()
            .filter(|f| f.fallback.is_some())
            .map(|f| f.field_name.as_str())
            .collect()
    }
}

/// Per-part failure that triggers the raw-text fallback
#[derive(Debug, Error)]
pub enum IngestFault {
    #[error("tabulation failed: {0}")]
    Tabulate(#[from] TabulateError),
}

/// Decode a single part according to its filename
pub fn decode_part(part: &UploadedPart) -> Result<DecodedFile, IngestFault> {
    let decoded = normalizer::decode(&part.raw_bytes);

    let content = if part.is_csv() {
        FileContent::Table(tabulator::tabulate(&decoded.text)?)
    } else {
        FileContent::Text(decoded.text)
    };

    Ok(DecodedFile {
        field_name: part.field_name.clone(),
        filename: part.filename.clone(),
        encoding: decoded.encoding,
        content,
        fallback: None,
    })
}

/// Lossy raw-text stand-in for a part that could not be decoded normally
fn raw_fallback(part: &UploadedPart, fault: &IngestFault) -> DecodedFile {
    DecodedFile {
        field_name: part.field_name.clone(),
        filename: part.filename.clone(),
        encoding: TextEncoding::LossyLatin1,
        content: FileContent::Text(normalizer::decode_lossy(&part.raw_bytes)),
        fallback: Some(fault.to_string()),
    }
}

/// Decode every part, isolating failures per part
///
/// When two parts share a field name the later one wins.
pub fn ingest(parts: Vec<UploadedPart>, form: FormFields) -> IngestionResult {
    let mut files = BTreeMap::new();

    for part in &parts {
        let decoded = match decode_part(part) {
            Ok(decoded) => {
                debug!(
                    field_name = %decoded.field_name,
                    filename = %decoded.filename,
                    encoding = %decoded.encoding,
                    "Decoded upload"
                );
                decoded
            }
            Err(fault) => {
                warn!(
                    field_name = %part.field_name,
                    filename = %part.filename,
                    error = %fault,
                    "Upload could not be processed, keeping raw text"
                );
                raw_fallback(part, &fault)
            }
        };

        if files.insert(part.field_name.clone(), decoded).is_some() {
            debug!(field_name = %part.field_name, "Duplicate file field, keeping last part");
        }
    }

    IngestionResult { files, form }
}
