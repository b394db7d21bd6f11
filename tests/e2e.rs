//! End-to-end tests for folder2md.
//!
//! Each test builds a small imports tree in a temporary directory, runs a
//! whole batch through the public API and inspects the exports directory.
//! No external converter is needed; non-text formats are served by
//! in-test transformers.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use folder2md::{
    discover, run_batch, validate_configuration, BatchConfig, DocumentTransformer, PlainTextTransformer,
    RoutingTransformer, RunProgressCallback, RunResult, TransformError,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Stands in for a PDF/Office converter. Fails for any file whose name
/// contains "corrupt" and counts every call.
#[derive(Default)]
struct FakeOfficeConverter {
    calls: AtomicUsize,
}

#[async_trait]
impl DocumentTransformer for FakeOfficeConverter {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.contains("corrupt") {
            return Err(TransformError::Failed {
                file: name,
                detail: "unreadable cross-reference table".into(),
            });
        }
        Ok(format!("# {name}\n\nConverted body of {name}"))
    }
}

struct Workspace {
    _tmp: TempDir,
    imports: PathBuf,
    exports: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let imports = tmp.path().join("imports");
        let exports = tmp.path().join("exports");
        std::fs::create_dir_all(&imports).unwrap();
        Self {
            _tmp: tmp,
            imports,
            exports,
        }
    }

    fn add(&self, rel: &str, body: &str) -> &Self {
        let p = self.imports.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, body).unwrap();
        self
    }

    fn config(&self) -> folder2md::BatchConfigBuilder {
        BatchConfig::builder()
            .input_dir(&self.imports)
            .output_dir(&self.exports)
    }

    fn read_export(&self, name: &str) -> String {
        std::fs::read_to_string(self.exports.join(name))
            .unwrap_or_else(|e| panic!("missing export {name}: {e}"))
    }

    fn export_names(&self) -> BTreeSet<String> {
        std::fs::read_dir(&self.exports)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

fn transformer(office: Arc<FakeOfficeConverter>) -> Arc<dyn DocumentTransformer> {
    Arc::new(
        RoutingTransformer::new()
            .route([".md", ".txt"], Arc::new(PlainTextTransformer))
            .route([".pdf", ".docx", ".pptx", ".xlsx", ".html"], office),
    )
}

/// Every discovered file of a folder lands in exactly one of processed,
/// skipped or failed. Abandoned folders account for none of their files.
fn assert_partitioned(result: &RunResult, config: &BatchConfig) {
    let groups = discover(&config.input_dir, &config.supported_formats).unwrap();
    for group in &groups {
        let folder = group.id.as_str();
        let discovered: BTreeSet<String> = group.file_names().into_iter().collect();

        let mut seen: Vec<String> = Vec::new();
        seen.extend(result.processed_by_folder.get(folder).cloned().unwrap_or_default());
        seen.extend(result.skipped_by_folder.get(folder).cloned().unwrap_or_default());
        seen.extend(
            result
                .failure_details
                .iter()
                .filter(|f| f.folder == folder)
                .map(|f| f.file.clone()),
        );
        let accounted: BTreeSet<String> = seen.iter().cloned().collect();
        assert_eq!(seen.len(), accounted.len(), "{folder}: a file is counted twice: {seen:?}");

        let abandoned = result
            .warnings
            .iter()
            .any(|w| w.starts_with(&format!("Folder '{folder}' abandoned")));
        if abandoned {
            assert!(accounted.is_empty(), "{folder}: abandoned but reports {accounted:?}");
        } else {
            assert_eq!(accounted, discovered, "{folder}: files not accounted for");
        }
    }
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_mixed_tree_with_one_failure() {
    let ws = Workspace::new();
    ws.add("a.pdf", "%PDF")
        .add("b_corrupt.pdf", "%PDF")
        .add("notes.txt", "first line   with   spaces\r\n\n\n\nsecond para")
        .add("reports/q1.docx", "PK")
        .add("reports/readme.md", "# Readme\n\nhello")
        .add("reports/deep/ignored.pdf", "%PDF")
        .add("reports/setup.exe", "MZ")
        .add(".hidden/secret.pdf", "%PDF");

    let office = Arc::new(FakeOfficeConverter::default());
    let config = ws
        .config()
        .root_output_name("combined_root.md")
        .build()
        .unwrap();
    let result = run_batch(&config, transformer(office.clone())).await;

    assert!(result.success, "{:?}", result.error_message);
    assert_eq!(result.failed_files, vec!["b_corrupt.pdf"]);
    assert_eq!(
        result.processed_by_folder["_root"],
        vec!["a.pdf", "notes.txt"]
    );
    assert_eq!(
        result.processed_by_folder["reports"],
        vec!["q1.docx", "readme.md"]
    );
    assert_eq!(office.calls.load(Ordering::SeqCst), 3);
    assert_partitioned(&result, &config);

    let root = ws.read_export("combined_root.md");
    assert!(root.starts_with("# Combined Documents – Root Directory\n\n*Generated from 3 document(s)*\n\n"));
    assert!(root.contains("Converted body of a.pdf"));
    assert!(!root.contains("b_corrupt.pdf"));
    assert!(root.contains("*Source: notes.txt*"));
    assert!(root.contains("first line with spaces\n\nsecond para"));
    assert_eq!(root.matches("\n\n----------------\n\n").count(), 2);

    let reports = ws.read_export("reports.md");
    assert!(reports.starts_with("# Combined Documents – reports\n"));
    assert!(!reports.contains("ignored.pdf"));

    let summary = std::fs::read_to_string(result.summary_path.as_ref().unwrap()).unwrap();
    assert!(summary.contains("## Failed files"));
    assert!(summary.contains("b_corrupt.pdf"));
}

#[tokio::test]
async fn test_prior_artifact_skips_folder() {
    let ws = Workspace::new();
    ws.add("reports/q1.pdf", "%PDF").add("memos/m.txt", "memo");
    std::fs::create_dir_all(&ws.exports).unwrap();
    std::fs::write(ws.exports.join("reports_2024-01-01_00-00-00.md"), "earlier run").unwrap();
    // Looks similar but is not an artifact of "reports".
    std::fs::write(ws.exports.join("reports_final.md"), "unrelated").unwrap();

    let office = Arc::new(FakeOfficeConverter::default());
    let config = ws.config().build().unwrap();
    let result = run_batch(&config, transformer(office.clone())).await;

    assert!(result.success);
    assert_partitioned(&result, &config);
    assert_eq!(result.skipped_by_folder["reports"], vec!["q1.pdf"]);
    assert!(!result.processed_by_folder.contains_key("reports"));
    assert_eq!(result.processed_by_folder["memos"], vec!["m.txt"]);
    assert_eq!(office.calls.load(Ordering::SeqCst), 0);
    assert!(result
        .output_artifacts
        .contains(&ws.exports.join("reports_2024-01-01_00-00-00.md")));
    assert_eq!(ws.read_export("reports_2024-01-01_00-00-00.md"), "earlier run");
}

#[tokio::test]
async fn test_second_run_converts_nothing() {
    let ws = Workspace::new();
    ws.add("a.pdf", "%PDF").add("reports/q1.pdf", "%PDF");
    let config = ws.config().write_summary(false).build().unwrap();

    let first_office = Arc::new(FakeOfficeConverter::default());
    let first = run_batch(&config, transformer(first_office.clone())).await;
    assert_eq!(first.processed_count(), 2);
    let exports_after_first = ws.export_names();

    let second_office = Arc::new(FakeOfficeConverter::default());
    let second = run_batch(&config, transformer(second_office.clone())).await;

    assert!(second.success);
    assert_partitioned(&first, &config);
    assert_partitioned(&second, &config);
    assert_eq!(second_office.calls.load(Ordering::SeqCst), 0);
    assert_eq!(second.processed_count(), 0);
    assert_eq!(second.skipped_count(), 2);
    assert_eq!(second.output_artifacts, first.output_artifacts);
    assert_eq!(ws.export_names(), exports_after_first);
}

#[tokio::test]
async fn test_no_skip_reconverts_everything() {
    let ws = Workspace::new();
    ws.add("reports/q1.pdf", "%PDF");
    std::fs::create_dir_all(&ws.exports).unwrap();
    std::fs::write(ws.exports.join("reports.md"), "stale").unwrap();

    let office = Arc::new(FakeOfficeConverter::default());
    let config = ws.config().skip_already_converted(false).build().unwrap();
    let result = run_batch(&config, transformer(office.clone())).await;

    assert_eq!(office.calls.load(Ordering::SeqCst), 1);
    assert!(result.skipped_by_folder.is_empty());
    assert!(ws.read_export("reports.md").contains("Converted body of q1.pdf"));
}

#[tokio::test]
async fn test_empty_imports_is_fatal_without_summary() {
    let ws = Workspace::new();
    ws.add("readme.exe", "MZ");

    let result = run_batch(
        &ws.config().build().unwrap(),
        transformer(Arc::new(FakeOfficeConverter::default())),
    )
    .await;

    assert!(!result.success);
    let msg = result.error_message.unwrap();
    assert!(msg.contains("No supported files"));
    assert!(msg.contains(".pdf"));
    assert!(result.summary_path.is_none());
    assert!(!ws.exports.exists());
}

#[tokio::test]
async fn test_all_files_failing_still_produces_artifact() {
    let ws = Workspace::new();
    ws.add("broken/x_corrupt.pdf", "%PDF");

    let config = ws.config().build().unwrap();
    let result = run_batch(&config, transformer(Arc::new(FakeOfficeConverter::default()))).await;

    assert!(result.success);
    assert_partitioned(&result, &config);
    assert_eq!(result.failed_files, vec!["x_corrupt.pdf"]);
    assert!(!result.processed_by_folder.contains_key("broken"));
    let body = ws.read_export("broken.md");
    assert!(body.contains("*Generated from 1 document(s)*"));
    assert!(!body.contains("----------------"));
}

#[tokio::test]
async fn test_custom_formats_filter_discovery() {
    let ws = Workspace::new();
    ws.add("a.PDF", "%PDF").add("b.txt", "text");

    let office = Arc::new(FakeOfficeConverter::default());
    let config = ws.config().supported_formats(["pdf"]).build().unwrap();
    let result = run_batch(&config, transformer(office)).await;

    assert_eq!(result.processed_by_folder["_root"], vec!["a.PDF"]);
    assert_partitioned(&result, &config);
}

#[tokio::test]
async fn test_reserved_root_folder_is_reported_not_merged() {
    let ws = Workspace::new();
    ws.add("a.pdf", "%PDF")
        .add("_root/a.pdf", "%PDF")
        .add("reports/q1.pdf", "%PDF");

    let office = Arc::new(FakeOfficeConverter::default());
    let config = ws.config().root_output_name("combined_root.md").build().unwrap();
    let result = run_batch(&config, transformer(office.clone())).await;

    assert!(result.success);
    assert_eq!(result.processed_by_folder["_root"], vec!["a.pdf"]);
    assert_eq!(result.processed_by_folder["reports"], vec!["q1.pdf"]);
    assert_eq!(office.calls.load(Ordering::SeqCst), 2);
    assert!(!ws.export_names().contains("_root.md"));
    assert!(ws
        .read_export("combined_root.md")
        .starts_with("# Combined Documents – Root Directory\n\n*Generated from 1 document(s)*"));

    let summary = std::fs::read_to_string(result.summary_path.as_ref().unwrap()).unwrap();
    assert!(summary.contains("reserved name '_root'"));
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RunProgressCallback for RecordingCallback {
    fn on_run_start(&self, total_folders: usize, total_files: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {total_folders}/{total_files}"));
    }
    fn on_folder_skipped(&self, folder: &str, _file_count: usize) {
        self.events.lock().unwrap().push(format!("skip {folder}"));
    }
    fn on_file_complete(&self, _folder: &str, file: &str, _markdown_len: usize) {
        self.events.lock().unwrap().push(format!("ok {file}"));
    }
    fn on_file_error(&self, _folder: &str, file: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("err {file}"));
    }
    fn on_run_complete(&self, result: &RunResult) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {}", result.success));
    }
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let ws = Workspace::new();
    ws.add("a.pdf", "%PDF")
        .add("b_corrupt.pdf", "%PDF")
        .add("reports/q1.pdf", "%PDF");
    std::fs::create_dir_all(&ws.exports).unwrap();
    std::fs::write(ws.exports.join("reports.md"), "done before").unwrap();

    let cb = Arc::new(RecordingCallback::default());
    let config = ws
        .config()
        .progress_callback(cb.clone() as Arc<dyn RunProgressCallback>)
        .build()
        .unwrap();
    run_batch(&config, transformer(Arc::new(FakeOfficeConverter::default()))).await;

    assert_eq!(
        *cb.events.lock().unwrap(),
        vec![
            "start 2/3",
            "ok a.pdf",
            "err b_corrupt.pdf",
            "skip reports",
            "done true"
        ]
    );
}

#[tokio::test]
async fn test_validate_before_run() {
    let ws = Workspace::new();
    ws.add("a.pdf", "%PDF").add("reports/q1.docx", "PK");

    let report = validate_configuration(&ws.config().build().unwrap()).await;
    assert!(report.valid);
    assert_eq!(report.folders_found, 2);
    assert_eq!(report.supported_files_found, 2);
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_command_converter() {
    use folder2md::{CommandTransformer, TimeoutTransformer};
    use std::time::Duration;

    let ws = Workspace::new();
    ws.add("slides/deck.html", "<h1>Deck</h1>");

    let routing = RoutingTransformer::new()
        .route([".md", ".txt"], Arc::new(PlainTextTransformer))
        .fallback(Arc::new(CommandTransformer::new("cat", vec![])));
    let transformer = TimeoutTransformer::new(routing, Duration::from_secs(30));

    let result = run_batch(&ws.config().build().unwrap(), Arc::new(transformer)).await;

    assert!(result.success);
    assert_eq!(result.processed_by_folder["slides"], vec!["deck.html"]);
    assert!(ws.read_export("slides.md").contains("<h1>Deck</h1>"));
}
