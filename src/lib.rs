//! # folder2md
//!
//! Batch-convert a tree of documents into one combined Markdown file per folder.
//!
//! ## Why this crate?
//!
//! Document converters work one file at a time. Feeding a whole archive of
//! reports, slide decks and spreadsheets into a knowledge base needs more:
//! grouping by folder, one artifact per group, a record of what was already
//! converted so reruns are cheap, and a per-file failure policy so one
//! corrupt PDF never costs the rest of the batch. This crate is that batch
//! layer. The conversion itself is pluggable through [`DocumentTransformer`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! imports/
//!  │
//!  ├─ 1. Discover   root files + one group per immediate subfolder
//!  ├─ 2. Plan       artifact name per group, collision checks
//!  ├─ 3. Ledger     skip groups whose artifact already exists
//!  ├─ 4. Transform  one file at a time through the DocumentTransformer
//!  ├─ 5. Write      header + sections + separators, appended incrementally
//!  └─ 6. Report     RunResult + processing_summary_<ts>.md
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folder2md::{run_batch, BatchConfig, PlainTextTransformer, RoutingTransformer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .input_dir("imports")
//!         .output_dir("exports")
//!         .build()?;
//!     let transformer = RoutingTransformer::new()
//!         .route([".md", ".txt"], Arc::new(PlainTextTransformer));
//!
//!     let result = run_batch(&config, Arc::new(transformer)).await;
//!     eprintln!(
//!         "{} processed, {} skipped, {} failed",
//!         result.processed_count(),
//!         result.skipped_count(),
//!         result.failed_count()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `folder2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! folder2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod progress;
pub mod result;
pub mod summary;
pub mod transform;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ArtifactNaming, BatchConfig, BatchConfigBuilder, SUPPORTED_FORMATS};
pub use discovery::{discover, discover_blocking, FolderGroup, FolderId};
pub use error::{BatchError, TransformError};
pub use ledger::{sanitize_name, ConversionLedger};
pub use orchestrator::{run_batch, run_batch_sync, Orchestrator};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use result::{FileFailure, FileOutcome, FolderOutcome, RunResult};
pub use summary::{render_summary, write_summary};
pub use transform::{
    CommandTransformer, DocumentTransformer, PlainTextTransformer, RoutingTransformer,
    TimeoutTransformer,
};
pub use validate::{validate_configuration, ValidationReport};
