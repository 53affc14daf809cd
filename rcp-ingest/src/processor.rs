//! Processing collaborator seam
//!
//! The domain routine that audits recipe data lives outside this crate. It is
//! injected into [`crate::AppState`] as a [`RecipeProcessor`] trait object and
//! invoked once per request with the ingested files and form fields.

use anyhow::{bail, Result};
use serde_json::{json, Map, Value};

use crate::ingest::{FileContent, FilesData};
use crate::upload::FormFields;

/// External processing routine
///
/// Implementations are synchronous and may be slow; the request handler runs
/// them on the blocking thread pool. Errors are reported to the HTTP caller
/// verbatim, so their messages should be meaningful to a person.
pub trait RecipeProcessor: Send + Sync {
    fn process(&self, files: FilesData, form: FormFields) -> Result<Value>;
}

impl<F> RecipeProcessor for F
where
    F: Fn(FilesData, FormFields) -> Result<Value> + Send + Sync,
{
    fn process(&self, files: FilesData, form: FormFields) -> Result<Value> {
        self(files, form)
    }
}

/// Built-in processor used when no domain routine is linked in
///
/// Reports the shape of every uploaded file and echoes the form.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryProcessor;

impl RecipeProcessor for SummaryProcessor {
    fn process(&self, files: FilesData, form: FormFields) -> Result<Value> {
        if files.is_empty() {
            bail!("No files were uploaded");
        }

        let mut summary = Map::new();
        for (field_name, content) in &files {
            let entry = match content {
                FileContent::Table(rows) => json!({
                    "kind": "table",
                    "rows": rows.len(),
                    "max_columns": rows.iter().map(Vec::len).max().unwrap_or(0),
                }),
                FileContent::Text(text) => json!({
                    "kind": "text",
                    "chars": text.chars().count(),
                }),
            };
            summary.insert(field_name.clone(), entry);
        }

        Ok(json!({
            "file_count": files.len(),
            "files": summary,
            "form": form,
        }))
    }
}
