//! Configuration pre-flight: check a [`BatchConfig`] against the filesystem
//! without converting anything.

use crate::config::BatchConfig;
use crate::discovery::{discover_blocking, FolderId, ROOT_SENTINEL};
use crate::error::BatchError;
use crate::ledger::ConversionLedger;
use serde::Serialize;
use tracing::debug;

/// Outcome of [`validate_configuration`].
///
/// `valid` is false only when a run could not produce output at all
/// (the output directory cannot be created). A missing or empty input tree is
/// a warning: the run itself would report it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub folders_found: usize,
    pub supported_files_found: usize,
    /// Folders the ledger would skip on the next run.
    pub folders_already_converted: usize,
}

/// Check the input tree, the output directory and the ledger state.
///
/// Creates the output directory if it is missing, like a real run would.
pub async fn validate_configuration(config: &BatchConfig) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        ..ValidationReport::default()
    };

    if !config.input_dir.exists() {
        report.warnings.push(format!(
            "Imports directory does not exist yet: {}",
            config.input_dir.display()
        ));
    }

    let groups = match discover_blocking(&config.input_dir, &config.supported_formats).await {
        Ok(groups) => groups,
        Err(BatchError::InputNotFound { .. } | BatchError::NoSupportedFiles { .. }) => Vec::new(),
        Err(e) => {
            report.warnings.push(e.to_string());
            Vec::new()
        }
    };
    if groups
        .iter()
        .any(|g| matches!(&g.id, FolderId::Named(name) if name == ROOT_SENTINEL))
    {
        report.warnings.push(format!(
            "Folder '{}' uses the reserved name '{ROOT_SENTINEL}' and will not be converted",
            config.input_dir.join(ROOT_SENTINEL).display()
        ));
    }
    report.folders_found = groups.len();
    report.supported_files_found = groups.iter().map(|g| g.files.len()).sum();
    if report.supported_files_found == 0 && config.input_dir.exists() {
        report.warnings.push(format!(
            "No supported documents found (supported: {})",
            config.formats_display()
        ));
    }

    match tokio::fs::create_dir_all(&config.output_dir).await {
        Ok(()) => {
            let ledger = ConversionLedger::new(&config.output_dir, &config.root_output_name);
            for group in &groups {
                if ledger.already_converted(&group.id).await {
                    report.folders_already_converted += 1;
                }
            }
        }
        Err(source) => {
            let e = BatchError::OutputDirFailed {
                path: config.output_dir.clone(),
                source,
            };
            report.errors.push(e.to_string());
            report.valid = false;
        }
    }

    debug!(
        "Validation: {} folder(s), {} file(s), {} error(s), {} warning(s)",
        report.folders_found,
        report.supported_files_found,
        report.errors.len(),
        report.warnings.len()
    );
    report
}
