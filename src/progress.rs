//! Progress-callback trait for per-folder and per-file batch events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the input tree. The CLI uses it
//! to drive a terminal progress bar; other hosts can forward events to a
//! channel or a log sink.
//!
//! # Example
//!
//! ```rust
//! use folder2md::{BatchConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, folder: &str, file: &str, markdown_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{folder}/{file}: {markdown_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//! let config = BatchConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::result::RunResult;
use std::sync::Arc;

/// Called by the orchestrator as it processes folders and files.
///
/// All methods have default no-op implementations. With
/// `folder_concurrency > 1`, events for different folders may interleave
/// and arrive from different threads; protect shared state accordingly.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after discovery, before any folder is handled.
    fn on_run_start(&self, total_folders: usize, total_files: usize) {
        let _ = (total_folders, total_files);
    }

    /// Called when a folder will be converted.
    fn on_folder_start(&self, folder: &str, file_count: usize) {
        let _ = (folder, file_count);
    }

    /// Called when a folder is skipped because it was already converted.
    fn on_folder_skipped(&self, folder: &str, file_count: usize) {
        let _ = (folder, file_count);
    }

    /// Called just before a file is handed to the transformer.
    fn on_file_start(&self, folder: &str, file: &str) {
        let _ = (folder, file);
    }

    /// Called after a file's Markdown was written to the folder artifact.
    fn on_file_complete(&self, folder: &str, file: &str, markdown_len: usize) {
        let _ = (folder, file, markdown_len);
    }

    /// Called when a file failed to convert.
    fn on_file_error(&self, folder: &str, file: &str, error: &str) {
        let _ = (folder, file, error);
    }

    /// Called after every file of a converted folder was attempted.
    fn on_folder_complete(&self, folder: &str, processed: usize, failed: usize) {
        let _ = (folder, processed, failed);
    }

    /// Called when a folder's artifact could not be written.
    fn on_folder_abandoned(&self, folder: &str, error: &str) {
        let _ = (folder, error);
    }

    /// Called once with the final result, after the summary was written.
    fn on_run_complete(&self, result: &RunResult) {
        let _ = result;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
