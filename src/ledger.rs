//! Conversion ledger: decide whether a folder was converted by an earlier run.
//!
//! There is no database and no content hashing. A folder counts as converted
//! as soon as the output directory holds an artifact named after it:
//!
//! - `<sanitized folder>_<YYYY-MM-DD_HH-MM-SS>.md` (timestamped artifact), or
//! - the exact plain artifact name the orchestrator writes for that folder
//!   (`<folder>.md`, or the configured root output name).
//!
//! Adding or removing documents in a converted folder does not make it stale.
//! Delete the folder's artifact to force a reconversion.

use crate::config::ArtifactNaming;
use crate::discovery::FolderId;
use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Replacement used when a name sanitizes to nothing.
pub const UNTITLED: &str = "untitled";

/// `chrono` format of the timestamp embedded in artifact names.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static RE_SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_]+").unwrap());
static RE_ARTIFACT_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$").unwrap());

/// Reduce a name to word characters and hyphens.
///
/// Other characters become `_`, runs of whitespace/underscores collapse to a
/// single `_`, and leading/trailing underscores are stripped. An empty result
/// becomes [`UNTITLED`]. Applying it twice gives the same result as once.
pub fn sanitize_name(name: &str) -> String {
    let s = RE_UNSAFE_CHARS.replace_all(name, "_");
    let s = RE_SEPARATOR_RUNS.replace_all(&s, "_");
    let s = s.trim_matches('_');
    if s.is_empty() {
        UNTITLED.to_string()
    } else {
        s.to_string()
    }
}

/// `<sanitized name>_<timestamp>.md`
pub fn timestamped_artifact_name<Tz>(name: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}_{}.md",
        sanitize_name(name),
        at.format(ARTIFACT_TIMESTAMP_FORMAT)
    )
}

/// True when `file_name` is `<sanitized>_<timestamp>.md`.
pub fn is_timestamped_artifact(file_name: &str, sanitized: &str) -> bool {
    file_name
        .strip_prefix(sanitized)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.strip_suffix(".md"))
        .map(|ts| RE_ARTIFACT_TIMESTAMP.is_match(ts))
        .unwrap_or(false)
}

/// Looks up prior-run artifacts in one output directory.
#[derive(Debug, Clone)]
pub struct ConversionLedger {
    output_dir: PathBuf,
    root_output_name: String,
}

impl ConversionLedger {
    pub fn new(output_dir: impl Into<PathBuf>, root_output_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            root_output_name: root_output_name.into(),
        }
    }

    /// File name the orchestrator writes for `folder` under `naming`.
    pub fn artifact_name<Tz>(
        &self,
        folder: &FolderId,
        naming: ArtifactNaming,
        run_started: &DateTime<Tz>,
    ) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match (naming, folder) {
            (ArtifactNaming::Timestamped, FolderId::Named(name)) => {
                timestamped_artifact_name(name, run_started)
            }
            // The root group keeps its configured name in both modes.
            _ => self.plain_artifact_name(folder),
        }
    }

    /// `<folder>.md`, or the root output name for the root group.
    pub fn plain_artifact_name(&self, folder: &FolderId) -> String {
        match folder {
            FolderId::Root => self.root_output_name.clone(),
            FolderId::Named(name) => format!("{name}.md"),
        }
    }

    /// True iff at least one artifact for `folder` exists.
    pub async fn already_converted(&self, folder: &FolderId) -> bool {
        let existing = self.existing_artifacts(folder).await;
        if existing.is_empty() {
            return false;
        }
        info!(
            "Found {} existing export file(s) for folder '{}'",
            existing.len(),
            folder
        );
        true
    }

    /// All artifacts for `folder`, most recently modified first.
    ///
    /// Returns an empty list when the output directory does not exist or
    /// cannot be listed.
    pub async fn existing_artifacts(&self, folder: &FolderId) -> Vec<PathBuf> {
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    "Cannot list output directory '{}': {}",
                    self.output_dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let sanitized = sanitize_name(folder.as_str());
        let plain = self.plain_artifact_name(folder);

        let mut matches: Vec<(SystemTime, String, PathBuf)> = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(
                        "Stopped listing output directory '{}': {}",
                        self.output_dir.display(),
                        e
                    );
                    break;
                }
            };
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != plain && !is_timestamped_artifact(&name, &sanitized) {
                continue;
            }
            let modified = entry
                .metadata()
                .await
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            matches.push((modified, name, entry.path()));
        }

        matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        debug!(
            "Ledger lookup for '{}' ({}): {} match(es)",
            folder,
            sanitized,
            matches.len()
        );
        matches.into_iter().map(|(_, _, path)| path).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn sanitize_examples() {
        let cases = [
            ("reports", "reports"),
            ("My Reports!", "My_Reports"),
            ("file with spaces", "file_with_spaces"),
            ("special@#$%chars", "special_chars"),
            ("multiple___underscores", "multiple_underscores"),
            ("__edge__", "edge"),
            ("q1-2024", "q1-2024"),
            ("_root", "root"),
            ("", "untitled"),
            ("@@@", "untitled"),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_name(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Annual Report (2024)",
            "  spaced  out ",
            "a.b.c",
            "émigré files",
            "tab\tand\nnewline",
            "-dash-",
            "_",
            "",
            "résumé__v2!!",
        ] {
            let once = sanitize_name(input);
            assert_eq!(sanitize_name(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn timestamped_names_round_trip_through_matcher() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let name = timestamped_artifact_name("reports", &at);
        assert_eq!(name, "reports_2024-01-01_00-00-00.md");
        assert!(is_timestamped_artifact(&name, "reports"));
    }

    #[test]
    fn matcher_rejects_lookalikes() {
        assert!(!is_timestamped_artifact("reports.md", "reports"));
        assert!(!is_timestamped_artifact("reports_final.md", "reports"));
        assert!(!is_timestamped_artifact("reports_2024-01-01.md", "reports"));
        assert!(!is_timestamped_artifact(
            "reportsx_2024-01-01_00-00-00.md",
            "reports"
        ));
        assert!(!is_timestamped_artifact(
            "reports_2024-01-01_00-00-00.txt",
            "reports"
        ));
    }

    #[tokio::test]
    async fn missing_output_dir_means_nothing_converted() {
        let tmp = TempDir::new().unwrap();
        let ledger = ConversionLedger::new(tmp.path().join("absent"), "root.md");
        let folder = FolderId::Named("reports".into());
        assert!(!ledger.already_converted(&folder).await);
        assert!(ledger.existing_artifacts(&folder).await.is_empty());
    }

    #[tokio::test]
    async fn finds_timestamped_and_plain_artifacts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("reports_2024-01-01_00-00-00.md"), "old").unwrap();
        fs::write(tmp.path().join("other_2024-01-01_00-00-00.md"), "x").unwrap();
        fs::write(tmp.path().join("root.md"), "root").unwrap();

        let ledger = ConversionLedger::new(tmp.path(), "root.md");
        assert!(ledger.already_converted(&FolderId::Named("reports".into())).await);
        assert!(ledger.already_converted(&FolderId::Root).await);
        assert!(!ledger.already_converted(&FolderId::Named("memos".into())).await);
    }

    #[tokio::test]
    async fn sanitized_folder_names_match_artifacts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Q1_Reports_2024-03-31_12-00-00.md"), "x").unwrap();
        let ledger = ConversionLedger::new(tmp.path(), "root.md");
        assert!(ledger.already_converted(&FolderId::Named("Q1 Reports".into())).await);
    }

    #[tokio::test]
    async fn root_group_matches_sanitized_sentinel() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("root_2024-05-05_10-00-00.md"), "x").unwrap();
        let ledger = ConversionLedger::new(tmp.path(), "combined_documents.md");
        assert!(ledger.already_converted(&FolderId::Root).await);
    }

    #[tokio::test]
    async fn existing_artifacts_newest_first() {
        let tmp = TempDir::new().unwrap();
        let older = tmp.path().join("reports_2024-01-01_00-00-00.md");
        let newer = tmp.path().join("reports_2024-02-01_00-00-00.md");
        fs::write(&older, "old").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(&newer, "new").unwrap();

        let ledger = ConversionLedger::new(tmp.path(), "root.md");
        let found = ledger.existing_artifacts(&FolderId::Named("reports".into())).await;
        assert_eq!(found, vec![newer, older]);
    }

    #[test]
    fn plain_artifact_names() {
        let ledger = ConversionLedger::new("exports", "combined_root.md");
        assert_eq!(ledger.plain_artifact_name(&FolderId::Root), "combined_root.md");
        assert_eq!(
            ledger.plain_artifact_name(&FolderId::Named("reports".into())),
            "reports.md"
        );
    }

    #[test]
    fn timestamped_naming_keeps_root_output_name() {
        let ledger = ConversionLedger::new("exports", "combined_root.md");
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 5).unwrap();
        assert_eq!(
            ledger.artifact_name(&FolderId::Root, ArtifactNaming::Timestamped, &at),
            "combined_root.md"
        );
        assert_eq!(
            ledger.artifact_name(
                &FolderId::Named("Q1 Reports".into()),
                ArtifactNaming::Timestamped,
                &at
            ),
            "Q1_Reports_2024-06-01_08-30-05.md"
        );
    }
}
