//! Batch orchestration: discover, decide, convert, write, report.
//!
//! ```text
//! input dir ──▶ discover ──▶ plan outputs ──▶ per folder:
//!                                              ├─ reserved or
//!                                              │  collision?  → abandoned
//!                                              ├─ ledger hit? → skipped (reuse artifact)
//!                                              └─ convert files one by one,
//!                                                 appending to the artifact
//!           ──▶ RunResult ──▶ processing_summary_<ts>.md
//! ```
//!
//! Nothing escapes [`Orchestrator::run`]. A failed file is recorded and the
//! folder continues; a folder whose artifact cannot be written is abandoned
//! and the run continues; only a discovery failure or an unusable output
//! directory stops the run, and even then a [`RunResult`] is returned with
//! `error_message` set.

use crate::config::BatchConfig;
use crate::discovery::{discover_blocking, file_name_of, FolderGroup, FolderId, ROOT_SENTINEL};
use crate::error::BatchError;
use crate::ledger::{sanitize_name, ConversionLedger};
use crate::result::{FileOutcome, FolderOutcome, RunResult};
use crate::summary::write_summary;
use crate::transform::DocumentTransformer;
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Written after every converted document in a combined artifact.
pub const SECTION_SEPARATOR: &str = "\n\n----------------\n\n";

/// Drives one batch run over an input tree.
pub struct Orchestrator {
    config: BatchConfig,
    transformer: Arc<dyn DocumentTransformer>,
}

/// A folder group together with the artifact path it would write.
struct PlannedFolder {
    group: FolderGroup,
    output_path: PathBuf,
    /// Set when the folder must not be written: reserved name or output collision.
    blocked: Option<BatchError>,
}

impl Orchestrator {
    pub fn new(config: BatchConfig, transformer: Arc<dyn DocumentTransformer>) -> Self {
        Self {
            config,
            transformer,
        }
    }

    /// Run the whole batch and return its result.
    pub async fn run(&self) -> RunResult {
        let started_at = Local::now();
        let clock = Instant::now();
        let config = &self.config;

        info!("Scanning imports directory: {}", config.input_dir.display());
        let groups = match discover_blocking(&config.input_dir, &config.supported_formats).await {
            Ok(groups) => groups,
            Err(e) => return self.fatal(started_at, clock, e),
        };

        if let Err(source) = tokio::fs::create_dir_all(&config.output_dir).await {
            let e = BatchError::OutputDirFailed {
                path: config.output_dir.clone(),
                source,
            };
            return self.fatal(started_at, clock, e);
        }

        let ledger = ConversionLedger::new(&config.output_dir, &config.root_output_name);
        let (plan, warnings) = self.plan_outputs(groups, &ledger, &started_at);

        if let Some(ref cb) = config.progress_callback {
            let total_files = plan.iter().map(|p| p.group.files.len()).sum();
            cb.on_run_start(plan.len(), total_files);
        }

        // `buffered` yields in input order, so outcomes merge in discovery
        // order whatever the concurrency.
        let outcomes: Vec<FolderOutcome> = stream::iter(
            plan.into_iter()
                .map(|planned| self.process_folder(planned, &ledger)),
        )
        .buffered(config.folder_concurrency.max(1))
        .collect()
        .await;

        let mut result = RunResult::new(started_at);
        result.warnings.extend(warnings);
        for outcome in outcomes {
            result.record(outcome);
        }
        result.finish(clock.elapsed().as_secs_f64());

        info!(
            "Run complete: {} processed, {} skipped, {} failed, {} artifact(s) in {:.2}s",
            result.processed_count(),
            result.skipped_count(),
            result.failed_count(),
            result.output_artifacts.len(),
            result.elapsed_seconds
        );

        if config.write_summary {
            match write_summary(&result, &config.output_dir).await {
                Ok(path) => result.summary_path = Some(path),
                Err(e) => {
                    warn!("{}", e);
                    result.warnings.push(e.to_string());
                }
            }
        }

        if let Some(ref cb) = config.progress_callback {
            cb.on_run_complete(&result);
        }
        result
    }

    fn fatal(&self, started_at: DateTime<Local>, clock: Instant, e: BatchError) -> RunResult {
        error!("{}", e);
        let mut result = RunResult::fatal(started_at, e.to_string());
        result.finish(clock.elapsed().as_secs_f64());
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_run_complete(&result);
        }
        result
    }

    /// Assign output paths and detect name collisions before any work starts.
    fn plan_outputs(
        &self,
        groups: Vec<FolderGroup>,
        ledger: &ConversionLedger,
        started_at: &DateTime<Local>,
    ) -> (Vec<PlannedFolder>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut sanitized_owner: HashMap<String, String> = HashMap::new();
        let mut path_owner: HashMap<String, String> = HashMap::new();
        let mut plan = Vec::with_capacity(groups.len());

        for group in groups {
            let folder = group.id.as_str().to_string();

            // A subfolder literally named `_root` would share the root group's
            // identity in the report and the ledger.
            if matches!(&group.id, FolderId::Named(name) if name == ROOT_SENTINEL) {
                let blocked = BatchError::ReservedFolderName {
                    path: self.config.input_dir.join(&folder),
                    folder,
                };
                plan.push(PlannedFolder {
                    output_path: PathBuf::new(),
                    group,
                    blocked: Some(blocked),
                });
                continue;
            }

            let sanitized = sanitize_name(&folder);
            if let Some(first) = sanitized_owner.get(&sanitized) {
                let msg = format!(
                    "Folders '{first}' and '{folder}' both sanitize to '{sanitized}'; \
                     their prior artifacts cannot be told apart"
                );
                warn!("{}", msg);
                warnings.push(msg);
            } else {
                sanitized_owner.insert(sanitized, folder.clone());
            }

            let name = ledger.artifact_name(&group.id, self.config.artifact_naming, started_at);
            let output_path = self.config.output_dir.join(&name);
            let blocked = match path_owner.get(&name).cloned() {
                Some(claimed_by) => Some(BatchError::OutputCollision {
                    folder,
                    claimed_by,
                    path: output_path.clone(),
                }),
                None => {
                    path_owner.insert(name, folder);
                    None
                }
            };

            plan.push(PlannedFolder {
                output_path,
                group,
                blocked,
            });
        }
        (plan, warnings)
    }

    async fn process_folder(&self, planned: PlannedFolder, ledger: &ConversionLedger) -> FolderOutcome {
        let PlannedFolder {
            group,
            output_path,
            blocked,
        } = planned;
        let folder = group.id.as_str().to_string();
        let cb = self.config.progress_callback.as_ref();

        if let Some(e) = blocked {
            return self.abandon(folder, e);
        }

        if self.config.skip_already_converted {
            if let Some(newest) = ledger.existing_artifacts(&group.id).await.into_iter().next() {
                info!("Skipped '{}' – already converted", folder);
                if let Some(cb) = cb {
                    cb.on_folder_skipped(&folder, group.files.len());
                }
                return FolderOutcome::Skipped {
                    folder,
                    files: group.file_names(),
                    artifact: Some(newest),
                };
            }
        }

        info!(
            "Processing folder '{}' ({} files) -> {}",
            folder,
            group.files.len(),
            output_path.display()
        );
        if let Some(cb) = cb {
            cb.on_folder_start(&folder, group.files.len());
        }

        let file = match tokio::fs::File::create(&output_path).await {
            Ok(file) => file,
            Err(source) => {
                let e = BatchError::OutputWriteFailed {
                    path: output_path,
                    source,
                };
                return self.abandon(folder, e);
            }
        };

        match self.write_folder(file, &group, &output_path).await {
            Ok(files) => {
                let failed = files
                    .iter()
                    .filter(|f| matches!(f, FileOutcome::Failed(..)))
                    .count();
                info!(
                    "Wrote '{}' ({} converted, {} failed)",
                    output_path.display(),
                    files.len() - failed,
                    failed
                );
                if let Some(cb) = cb {
                    cb.on_folder_complete(&folder, files.len() - failed, failed);
                }
                FolderOutcome::Converted {
                    folder,
                    artifact: output_path,
                    files,
                }
            }
            Err(e) => {
                discard_partial(&output_path).await;
                self.abandon(folder, e)
            }
        }
    }

    /// Write the header, then each converted document followed by the separator.
    ///
    /// Stops at the first write error; transformer errors only mark the file.
    async fn write_folder<W>(
        &self,
        mut out: W,
        group: &FolderGroup,
        output_path: &Path,
    ) -> Result<Vec<FileOutcome>, BatchError>
    where
        W: AsyncWrite + Unpin,
    {
        let folder = group.id.as_str();
        let cb = self.config.progress_callback.as_ref();
        let write_failed = |source: std::io::Error| BatchError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source,
        };

        out.write_all(folder_header(&group.id, group.files.len()).as_bytes())
            .await
            .map_err(write_failed)?;

        let mut outcomes = Vec::with_capacity(group.files.len());
        for path in &group.files {
            let name = file_name_of(path);
            if let Some(cb) = cb {
                cb.on_file_start(folder, &name);
            }

            match self.transformer.transform(path).await {
                Ok(markdown) => {
                    out.write_all(markdown.as_bytes())
                        .await
                        .map_err(write_failed)?;
                    out.write_all(SECTION_SEPARATOR.as_bytes())
                        .await
                        .map_err(write_failed)?;
                    out.flush().await.map_err(write_failed)?;
                    debug!("Written {}", name);
                    if let Some(cb) = cb {
                        cb.on_file_complete(folder, &name, markdown.len());
                    }
                    outcomes.push(FileOutcome::Processed(name));
                }
                Err(e) => {
                    warn!("Failed converting {}: {}", path.display(), e);
                    if let Some(cb) = cb {
                        cb.on_file_error(folder, &name, &e.to_string());
                    }
                    outcomes.push(FileOutcome::Failed(name, e));
                }
            }
        }

        out.flush().await.map_err(write_failed)?;
        Ok(outcomes)
    }

    fn abandon(&self, folder: String, e: BatchError) -> FolderOutcome {
        error!("Abandoning folder '{}': {}", folder, e);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_folder_abandoned(&folder, &e.to_string());
        }
        FolderOutcome::Abandoned {
            folder,
            error: e.to_string(),
        }
    }
}

/// Remove an artifact left behind by a failed write.
///
/// A truncated artifact would satisfy the ledger on the next run.
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial artifact '{}'", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Could not remove partial artifact '{}': {}",
            path.display(),
            e
        ),
    }
}

/// Header at the top of every combined artifact.
pub fn folder_header(folder: &FolderId, file_count: usize) -> String {
    format!(
        "# Combined Documents – {}\n\n*Generated from {} document(s)*\n\n",
        folder.display_name(),
        file_count
    )
}

/// Run a batch with `config` and `transformer`.
///
/// Always returns a [`RunResult`]; inspect `success`, `failed_files` and
/// `error_message` to decide what to do next.
pub async fn run_batch(config: &BatchConfig, transformer: Arc<dyn DocumentTransformer>) -> RunResult {
    Orchestrator::new(config.clone(), transformer).run().await
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(config: &BatchConfig, transformer: Arc<dyn DocumentTransformer>) -> RunResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(run_batch(config, transformer)),
        Err(e) => {
            let e = BatchError::Internal(format!("Failed to create tokio runtime: {e}"));
            error!("{}", e);
            RunResult::fatal(Local::now(), e.to_string())
        }
    }
}
