//! Document discovery: find supported files and group them by folder.
//!
//! The input root is scanned one level deep. Files sitting directly in the
//! root form the synthetic [`FolderId::Root`] group; every visible
//! subdirectory with at least one supported file becomes its own group.
//! Nothing below the first level of subdirectories is looked at.
//!
//! Ordering is deterministic so reruns and tests see the same sequence:
//! the root group comes first, then subfolders by name, and files inside a
//! group are sorted by file name.

use crate::error::BatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reserved identifier for files that live directly in the input root.
pub const ROOT_SENTINEL: &str = "_root";

/// Identifies one folder group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FolderId {
    /// Files directly inside the input root.
    Root,
    /// Files inside the named immediate subdirectory.
    Named(String),
}

impl FolderId {
    /// String form used in run results and artifact names (`_root` for the root group).
    pub fn as_str(&self) -> &str {
        match self {
            FolderId::Root => ROOT_SENTINEL,
            FolderId::Named(name) => name,
        }
    }

    /// Human-readable label for headers and reports.
    pub fn display_name(&self) -> &str {
        match self {
            FolderId::Root => "Root Directory",
            FolderId::Named(name) => name,
        }
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The supported files belonging to one folder. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    pub id: FolderId,
    pub files: Vec<PathBuf>,
}

impl FolderGroup {
    /// File names (last path component) in group order.
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|p| file_name_of(p)).collect()
    }
}

/// Scan `input_root` and group supported files by owning folder.
///
/// # Errors
/// - [`BatchError::InputNotFound`] / [`BatchError::InputNotADirectory`] for a bad root
/// - [`BatchError::InputReadFailed`] when a directory cannot be listed
/// - [`BatchError::NoSupportedFiles`] when no group would be produced; the
///   message lists `supported_formats`
pub fn discover(
    input_root: &Path,
    supported_formats: &BTreeSet<String>,
) -> Result<Vec<FolderGroup>, BatchError> {
    if !input_root.exists() {
        return Err(BatchError::InputNotFound {
            path: input_root.to_path_buf(),
        });
    }
    if !input_root.is_dir() {
        return Err(BatchError::InputNotADirectory {
            path: input_root.to_path_buf(),
        });
    }

    let mut groups = Vec::new();

    let root_files = list_supported_files(input_root, supported_formats)?;
    if !root_files.is_empty() {
        info!(
            "Found {} supported files in root imports directory",
            root_files.len()
        );
        groups.push(FolderGroup {
            id: FolderId::Root,
            files: root_files,
        });
    }

    for dir in list_visible_subdirectories(input_root)? {
        let files = list_supported_files(&dir, supported_formats)?;
        if files.is_empty() {
            debug!("No supported files in '{}'", dir.display());
            continue;
        }
        let name = file_name_of(&dir);
        info!("Found {} supported files in folder '{}'", files.len(), name);
        groups.push(FolderGroup {
            id: FolderId::Named(name),
            files,
        });
    }

    if groups.is_empty() {
        let formats = supported_formats
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(BatchError::NoSupportedFiles {
            path: input_root.to_path_buf(),
            formats,
        });
    }

    let total: usize = groups.iter().map(|g| g.files.len()).sum();
    info!(
        "Discovered {} folders with {} total supported files",
        groups.len(),
        total
    );
    Ok(groups)
}

/// [`discover`] on tokio's blocking pool, for callers running on a runtime.
pub async fn discover_blocking(
    input_root: &Path,
    supported_formats: &BTreeSet<String>,
) -> Result<Vec<FolderGroup>, BatchError> {
    let root = input_root.to_path_buf();
    let formats = supported_formats.clone();
    tokio::task::spawn_blocking(move || discover(&root, &formats))
        .await
        .map_err(|e| BatchError::Internal(format!("Discovery task panicked: {e}")))?
}

/// True when `path` has an extension in `supported_formats` (case-insensitive).
pub fn is_supported(path: &Path, supported_formats: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| supported_formats.contains(&format!(".{}", e.to_ascii_lowercase())))
        .unwrap_or(false)
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let read_failed = |source: std::io::Error| BatchError::InputReadFailed {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        entries.push(entry.map_err(read_failed)?.path());
    }
    entries.sort_by_key(|p| p.file_name().map(|n| n.to_os_string()));
    Ok(entries)
}

fn list_supported_files(
    dir: &Path,
    supported_formats: &BTreeSet<String>,
) -> Result<Vec<PathBuf>, BatchError> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_file() && is_supported(p, supported_formats))
        .collect())
}

fn list_visible_subdirectories(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    Ok(read_dir_sorted(dir)?
        .into_iter()
        .filter(|p| p.is_dir() && !file_name_of(p).starts_with('.'))
        .collect())
}
