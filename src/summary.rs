//! Summary reporter: render a [`RunResult`] as a Markdown report.
//!
//! Sections always appear in the same order: run metadata, processed
//! folders, skipped folders, failed files (if any), warnings (if any) and
//! finally the list of output artifacts.

use crate::discovery::ROOT_SENTINEL;
use crate::error::BatchError;
use crate::result::RunResult;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// `processing_summary_<unix seconds of run start>.md`
pub fn summary_file_name(result: &RunResult) -> String {
    format!("processing_summary_{}.md", result.started_at.timestamp())
}

/// Render the report body.
pub fn render_summary(result: &RunResult) -> String {
    let mut out = String::new();

    // `write!` into a String cannot fail.
    let _ = writeln!(out, "# Processing Summary\n");
    let _ = writeln!(
        out,
        "- **Run started:** {}",
        result.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "- **Runtime:** {:.2} s", result.elapsed_seconds);
    let _ = writeln!(out, "- **Output files:** {}", result.output_artifacts.len());
    let _ = writeln!(
        out,
        "- **Folders processed:** {}",
        result.processed_by_folder.len()
    );
    let _ = writeln!(
        out,
        "- **Folders skipped:** {}",
        result.skipped_by_folder.len()
    );
    let _ = writeln!(out, "- **Files processed:** {}", result.processed_count());
    let _ = writeln!(out, "- **Files skipped:** {}", result.skipped_count());
    let _ = writeln!(out, "- **Files failed:** {}", result.failed_count());
    out.push('\n');

    if !result.processed_by_folder.is_empty() {
        let _ = writeln!(out, "## Processed folders\n");
        for (folder, files) in &result.processed_by_folder {
            let _ = writeln!(out, "### {}\n", folder_label(folder));
            push_list(&mut out, files.iter().map(String::as_str));
        }
    }

    if !result.skipped_by_folder.is_empty() {
        let _ = writeln!(out, "## Skipped folders\n");
        for (folder, files) in &result.skipped_by_folder {
            let _ = writeln!(out, "### {}\n", folder_label(folder));
            let _ = writeln!(
                out,
                "*Already converted in a previous run; existing output reused.*\n"
            );
            push_list(&mut out, files.iter().map(String::as_str));
        }
    }

    if !result.failed_files.is_empty() {
        let _ = writeln!(out, "## Failed files\n");
        if result.failure_details.len() == result.failed_files.len() {
            for f in &result.failure_details {
                let _ = writeln!(out, "- {} ({}): {}", f.file, folder_label(&f.folder), f.reason);
            }
            out.push('\n');
        } else {
            push_list(&mut out, result.failed_files.iter().map(String::as_str));
        }
    }

    if !result.warnings.is_empty() {
        let _ = writeln!(out, "## Warnings\n");
        push_list(&mut out, result.warnings.iter().map(String::as_str));
    }

    let _ = writeln!(out, "## Output files\n");
    for path in &result.output_artifacts {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let _ = writeln!(out, "- {name}");
    }

    out
}

/// Write the report into `output_dir` and return its path.
///
/// # Errors
/// [`BatchError::ReportWriteFailed`] when the file cannot be written. Callers
/// treat this as a warning; it never changes `result.success`.
pub async fn write_summary(result: &RunResult, output_dir: &Path) -> Result<PathBuf, BatchError> {
    let path = output_dir.join(summary_file_name(result));
    tokio::fs::write(&path, render_summary(result))
        .await
        .map_err(|source| BatchError::ReportWriteFailed {
            path: path.clone(),
            source,
        })?;
    info!("Summary report generated: {}", path.display());
    Ok(path)
}

fn folder_label(folder: &str) -> &str {
    if folder == ROOT_SENTINEL {
        "Root Directory"
    } else {
        folder
    }
}

fn push_list<'a>(out: &mut String, items: impl Iterator<Item = &'a str>) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}
