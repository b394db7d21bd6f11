//! Run results: what happened to every folder and file in one batch run.
//!
//! The orchestrator builds one [`FolderOutcome`] per folder group and folds
//! them, in discovery order, into a [`RunResult`] via [`RunResult::record`].
//! Because each outcome is self-contained, folders can be processed
//! concurrently and still produce the same `RunResult` as a sequential run.

use crate::error::TransformError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Converted and written to the folder artifact.
    Processed(String),
    /// The transformer failed; the file is absent from the artifact.
    Failed(String, TransformError),
}

/// What happened to one folder group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderOutcome {
    /// A prior artifact exists; no file was converted.
    Skipped {
        folder: String,
        files: Vec<String>,
        /// Newest existing artifact for the folder.
        artifact: Option<PathBuf>,
    },
    /// Every file was attempted and the artifact was written.
    Converted {
        folder: String,
        artifact: PathBuf,
        files: Vec<FileOutcome>,
    },
    /// The artifact could not be written; nothing from this folder counts.
    Abandoned { folder: String, error: String },
}

/// A failed file with the folder it belongs to and the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub folder: String,
    pub file: String,
    pub reason: String,
}

/// Statistics and artifacts of one batch run.
///
/// A file name appears in at most one of `processed_by_folder`,
/// `skipped_by_folder` and `failed_files` for a given folder.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// True iff at least one output artifact was produced or reused.
    pub success: bool,

    /// One entry per converted or skipped folder, in discovery order.
    pub output_artifacts: Vec<PathBuf>,

    /// Files converted in this run, per folder.
    pub processed_by_folder: BTreeMap<String, Vec<String>>,

    /// Files of folders detected as already converted, per folder.
    pub skipped_by_folder: BTreeMap<String, Vec<String>>,

    /// Files whose conversion failed.
    pub failed_files: Vec<String>,

    /// Folder and reason for every entry in `failed_files`.
    pub failure_details: Vec<FileFailure>,

    /// Non-fatal run conditions: name collisions, abandoned folders, report failures.
    pub warnings: Vec<String>,

    /// Wall-clock duration of the run.
    pub elapsed_seconds: f64,

    /// Set only when the run could not start (discovery failure, unusable output directory).
    pub error_message: Option<String>,

    /// Local time the run started.
    pub started_at: DateTime<Local>,

    /// Path of the processing summary, when one was written.
    pub summary_path: Option<PathBuf>,
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl RunResult {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            success: false,
            output_artifacts: Vec::new(),
            processed_by_folder: BTreeMap::new(),
            skipped_by_folder: BTreeMap::new(),
            failed_files: Vec::new(),
            failure_details: Vec::new(),
            warnings: Vec::new(),
            elapsed_seconds: 0.0,
            error_message: None,
            started_at,
            summary_path: None,
        }
    }

    /// Result of a run that could not start.
    pub fn fatal(started_at: DateTime<Local>, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::new(started_at)
        }
    }

    /// Fold one folder's outcome into the run totals.
    pub fn record(&mut self, outcome: FolderOutcome) {
        match outcome {
            FolderOutcome::Skipped {
                folder,
                files,
                artifact,
            } => {
                self.skipped_by_folder.insert(folder, files);
                if let Some(path) = artifact {
                    self.output_artifacts.push(path);
                }
            }
            FolderOutcome::Converted {
                folder,
                artifact,
                files,
            } => {
                for outcome in files {
                    match outcome {
                        FileOutcome::Processed(name) => self
                            .processed_by_folder
                            .entry(folder.clone())
                            .or_default()
                            .push(name),
                        FileOutcome::Failed(name, error) => {
                            self.failure_details.push(FileFailure {
                                folder: folder.clone(),
                                file: name.clone(),
                                reason: error.to_string(),
                            });
                            self.failed_files.push(name);
                        }
                    }
                }
                self.output_artifacts.push(artifact);
            }
            FolderOutcome::Abandoned { folder, error } => {
                self.warnings
                    .push(format!("Folder '{folder}' abandoned: {error}"));
            }
        }
    }

    /// Set the closing statistics once every folder was recorded.
    pub fn finish(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.success = !self.output_artifacts.is_empty();
    }

    pub fn processed_count(&self) -> usize {
        self.processed_by_folder.values().map(Vec::len).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_by_folder.values().map(Vec::len).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.failed_files.len()
    }
}
