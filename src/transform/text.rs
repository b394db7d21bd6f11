//! Plain-text adapter for documents that already are text (`.md`, `.txt`).

use super::cleanup::{clean_text, section_header};
use super::DocumentTransformer;
use crate::discovery::file_name_of;
use crate::error::TransformError;
use async_trait::async_trait;
use chrono::Local;
use std::path::Path;
use tracing::debug;

/// Extensions this adapter is meant for.
pub const TEXT_EXTENSIONS: &[&str] = &[".md", ".txt"];

/// Reads a UTF-8 file, cleans it and prefixes a section header.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextTransformer;

#[async_trait]
impl DocumentTransformer for PlainTextTransformer {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        let file = file_name_of(path);
        debug!("Reading {} as plain text", path.display());

        let bytes = tokio::fs::read(path).await.map_err(|e| TransformError::Read {
            file: file.clone(),
            detail: e.to_string(),
        })?;
        let body = String::from_utf8(bytes).map_err(|e| TransformError::Failed {
            file: file.clone(),
            detail: format!("not valid UTF-8: {e}"),
        })?;

        Ok(format!(
            "{}{}",
            section_header(path, &Local::now()),
            clean_text(&body)
        ))
    }
}
