//! Error types for the folder2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`BatchError`]: a run-level or folder-level condition. Discovery
//!   failures (missing input root, nothing to convert) stop the run before
//!   any folder is touched; output write failures abandon one folder; a
//!   report write failure is only a warning. None of them escape
//!   [`crate::orchestrator::run_batch`]: they are folded into
//!   [`crate::result::RunResult`].
//!
//! * [`TransformError`]: a single document failed conversion. Recorded in
//!   [`crate::result::RunResult::failed_files`] and the batch moves on to the
//!   next file.

use std::path::PathBuf;
use thiserror::Error;

/// Run-level and folder-level errors.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Discovery errors ──────────────────────────────────────────────────
    /// The input root does not exist.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// The input root exists but is a file.
    #[error("Input path is not a directory: '{path}'")]
    InputNotADirectory { path: PathBuf },

    /// Listing the input root or one of its subfolders failed.
    #[error("Failed to read directory '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither the input root nor any of its subfolders holds a supported file.
    #[error(
        "No supported files found in '{path}' or its subdirectories.\nSupported formats: {formats}"
    )]
    NoSupportedFiles { path: PathBuf, formats: String },

    /// A subfolder uses the name reserved for files in the input root.
    #[error(
        "Folder '{path}' uses the reserved name '{folder}' and was not converted.\nRename it to convert its documents."
    )]
    ReservedFolderName { folder: String, path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write a folder's combined Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two folders in the same run resolve to the same output file.
    #[error("Folder '{folder}' would overwrite '{path}', already claimed by folder '{claimed_by}'")]
    OutputCollision {
        folder: String,
        claimed_by: String,
        path: PathBuf,
    },

    /// The processing summary could not be written.
    #[error("Failed to write summary report '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Every variant names the offending file so the failure can be reported
/// without the surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TransformError {
    /// The converter ran but could not produce Markdown.
    #[error("{file}: conversion failed: {detail}")]
    Failed { file: String, detail: String },

    /// No converter is registered for this file type.
    #[error("{file}: no converter registered for '{extension}' files")]
    Unsupported { file: String, extension: String },

    /// The source document could not be read.
    #[error("{file}: could not read input: {detail}")]
    Read { file: String, detail: String },

    /// The converter did not finish in time.
    #[error("{file}: conversion timed out after {secs}s")]
    Timeout { file: String, secs: u64 },

    /// An external converter command exited unsuccessfully.
    #[error("{file}: converter command exited with {status}: {stderr}")]
    CommandFailed {
        file: String,
        status: String,
        stderr: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_supported_files_names_formats() {
        let e = BatchError::NoSupportedFiles {
            path: PathBuf::from("imports"),
            formats: ".md, .pdf".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".md, .pdf"), "got: {msg}");
        assert!(msg.contains("imports"), "got: {msg}");
    }

    #[test]
    fn timeout_names_file_and_limit() {
        let e = TransformError::Timeout {
            file: "b.pdf".into(),
            secs: 30,
        };
        let msg = e.to_string();
        assert!(msg.starts_with("b.pdf:"), "got: {msg}");
        assert!(msg.contains("30s"), "got: {msg}");
    }

    #[test]
    fn reserved_folder_names_the_folder() {
        let e = BatchError::ReservedFolderName {
            folder: "_root".into(),
            path: PathBuf::from("imports/_root"),
        };
        let msg = e.to_string();
        assert!(msg.contains("imports/_root"), "got: {msg}");
        assert!(msg.contains("rename"), "got: {msg}");
    }

    #[test]
    fn command_failed_display() {
        let e = TransformError::CommandFailed {
            file: "deck.pptx".into(),
            status: "exit status: 2".into(),
            stderr: "unknown format".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("deck.pptx"));
        assert!(msg.contains("unknown format"));
    }
}
