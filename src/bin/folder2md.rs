//! CLI binary for folder2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig`, assembles a transformer and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use folder2md::config::DEFAULT_ROOT_OUTPUT_NAME;
use folder2md::transform::text::TEXT_EXTENSIONS;
use folder2md::{
    discover_blocking, run_batch, validate_configuration, ArtifactNaming, BatchConfig,
    CommandTransformer, DocumentTransformer, PlainTextTransformer, ProgressCallback,
    RoutingTransformer, RunProgressCallback, RunResult, TimeoutTransformer, SUPPORTED_FORMATS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

fn folder_label(folder: &str) -> &str {
    if folder == folder2md::discovery::ROOT_SENTINEL {
        "Root Directory"
    } else {
        folder
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over every discovered file, with a
/// log line per folder and per failed file. Events from concurrently
/// processed folders interleave, so counters are atomic.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Discovering documents…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_folders: usize, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Found {total_files} document(s) in {total_folders} folder(s)"
            ))
        ));
    }

    fn on_folder_start(&self, folder: &str, file_count: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            cyan("▸"),
            bold(folder_label(folder)),
            dim(&format!("{file_count} file(s)"))
        ));
    }

    fn on_folder_skipped(&self, folder: &str, file_count: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            dim("↷"),
            folder_label(folder),
            dim("already converted")
        ));
        self.bar.inc(file_count as u64);
    }

    fn on_file_start(&self, _folder: &str, file: &str) {
        self.bar.set_message(file.to_string());
    }

    fn on_file_complete(&self, _folder: &str, file: &str, markdown_len: usize) {
        self.bar.println(format!(
            "    {} {:<40}  {}",
            green("✓"),
            file,
            dim(&format!("{markdown_len:>7} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, _folder: &str, file: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar
            .println(format!("    {} {:<40}  {}", red("✗"), file, red(&msg)));
        self.bar.inc(1);
    }

    fn on_folder_abandoned(&self, folder: &str, error: &str) {
        self.bar.println(format!(
            "  {} {}  {}",
            red("✘"),
            bold(folder_label(folder)),
            red(error)
        ));
    }

    fn on_run_complete(&self, result: &RunResult) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);

        if let Some(ref msg) = result.error_message {
            eprintln!("{} {}", red("✘"), msg);
        } else if failed == 0 {
            eprintln!(
                "{} {} file(s) converted, {} skipped",
                green("✔"),
                bold(&result.processed_count().to_string()),
                result.skipped_count()
            );
        } else {
            eprintln!(
                "{} {} file(s) converted, {} skipped  ({} failed)",
                if result.success { cyan("⚠") } else { red("✘") },
                bold(&result.processed_count().to_string()),
                result.skipped_count(),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ./imports into ./exports (Markdown and text files only)
  folder2md

  # Use pandoc for everything that is not .md/.txt
  folder2md --converter "pandoc -t gfm {input}"

  # Custom directories, reconvert everything, timestamped artifacts
  folder2md -i ~/inbox -e ~/kb --no-skip --timestamped

  # Only PDFs, four folders at a time, 2-minute cap per document
  folder2md --formats .pdf --converter "markitdown {input}" \
            --concurrency 4 --transform-timeout 120

  # What would be converted?
  folder2md --list-files

  # Check directories and ledger state without converting
  folder2md --validate

  # Machine-readable result on stdout
  folder2md --json > result.json

LAYOUT:
  imports/a.pdf             →  exports/combined_documents.md
  imports/reports/q1.docx   →  exports/reports.md
  imports/reports/q2.xlsx   ↗

  Files directly in the imports directory form one group; every immediate
  subfolder forms another. Deeper subfolders are ignored. A folder whose
  artifact already exists in the exports directory is skipped unless
  --no-skip is given.

ENVIRONMENT VARIABLES:
  FOLDER2MD_IMPORTS        Input directory
  FOLDER2MD_EXPORTS        Output directory
  FOLDER2MD_CONVERTER      External converter command
  RUST_LOG                 Override the log filter (e.g. folder2md=debug)
"#;

/// Batch-convert folders of documents into combined Markdown files.
#[derive(Parser, Debug)]
#[command(
    name = "folder2md",
    version,
    about = "Batch-convert folders of documents into combined Markdown files",
    long_about = "Scan an imports directory, convert every supported document through a \
pluggable converter and write one combined Markdown file per folder. Folders that were \
already converted are skipped, failed documents are reported without stopping the batch, \
and every run ends with a processing summary.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory to scan for documents.
    #[arg(short, long, env = "FOLDER2MD_IMPORTS", default_value = "imports")]
    imports: PathBuf,

    /// Directory receiving the combined Markdown files.
    #[arg(short, long, env = "FOLDER2MD_EXPORTS", default_value = "exports")]
    exports: PathBuf,

    /// File name for documents sitting directly in the imports directory.
    #[arg(short, long, env = "FOLDER2MD_OUTPUT", default_value = DEFAULT_ROOT_OUTPUT_NAME)]
    output: String,

    /// Reconvert folders that already have an output file.
    #[arg(long, env = "FOLDER2MD_NO_SKIP")]
    no_skip: bool,

    /// Comma-separated extensions to process (e.g. ".pdf,.docx").
    #[arg(long, env = "FOLDER2MD_FORMATS", value_delimiter = ',')]
    formats: Option<Vec<String>>,

    /// Name subfolder outputs `<folder>_<YYYY-MM-DD_HH-MM-SS>.md`.
    #[arg(long, env = "FOLDER2MD_TIMESTAMPED")]
    timestamped: bool,

    /// Number of folders processed at the same time.
    #[arg(short, long, env = "FOLDER2MD_CONCURRENCY", default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(1..=64))]
    concurrency: u32,

    /// External converter for non-text formats; `{input}` is the document path.
    #[arg(long, env = "FOLDER2MD_CONVERTER")]
    converter: Option<String>,

    /// Per-document conversion timeout in seconds (0 = none).
    #[arg(long, env = "FOLDER2MD_TRANSFORM_TIMEOUT", default_value_t = 0)]
    transform_timeout: u64,

    /// Do not write processing_summary_<ts>.md.
    #[arg(long, env = "FOLDER2MD_NO_SUMMARY")]
    no_summary: bool,

    /// List discovered documents per folder and exit.
    #[arg(long)]
    list_files: bool,

    /// Validate directories and ledger state, then exit.
    #[arg(long)]
    validate: bool,

    /// Print the run result as JSON on stdout.
    #[arg(long, env = "FOLDER2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FOLDER2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FOLDER2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FOLDER2MD_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress =
        !cli.quiet && !cli.no_progress && !cli.json && !cli.list_files && !cli.validate;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_files {
        let groups = discover_blocking(&config.input_dir, &config.supported_formats)
            .await
            .context("Failed to scan imports directory")?;
        for group in &groups {
            println!("{} ({} files)", bold(group.id.display_name()), group.files.len());
            for name in group.file_names() {
                println!("  • {name}");
            }
        }
        return Ok(());
    }

    // ── Validate-only mode ───────────────────────────────────────────────
    if cli.validate {
        let report = validate_configuration(&config).await;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            println!("Imports:            {}", config.input_dir.display());
            println!("Exports:            {}", config.output_dir.display());
            println!("Formats:            {}", config.formats_display());
            println!("Folders found:      {}", report.folders_found);
            println!("Documents found:    {}", report.supported_files_found);
            println!("Already converted:  {}", report.folders_already_converted);
            for w in &report.warnings {
                println!("{} {}", cyan("⚠"), w);
            }
            for e in &report.errors {
                println!("{} {}", red("✘"), e);
            }
            println!(
                "{}",
                if report.valid {
                    green("Configuration is valid")
                } else {
                    red("Configuration is invalid")
                }
            );
        }
        if !report.valid {
            std::process::exit(1);
        }
        return Ok(());
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let transformer = build_transformer(&cli, &config)?;
    let result = run_batch(&config, transformer).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if !cli.quiet {
        if !show_progress {
            if let Some(ref msg) = result.error_message {
                eprintln!("{} {}", red("✘"), msg);
            } else {
                eprintln!(
                    "Converted {} file(s), skipped {}, failed {} in {:.1}s",
                    result.processed_count(),
                    result.skipped_count(),
                    result.failed_count(),
                    result.elapsed_seconds
                );
            }
        }
        for path in &result.output_artifacts {
            eprintln!("   →  {}", bold(&path.display().to_string()));
        }
        if let Some(ref summary) = result.summary_path {
            eprintln!("   {}", dim(&format!("summary: {}", summary.display())));
        }
    }

    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .input_dir(&cli.imports)
        .output_dir(&cli.exports)
        .root_output_name(&cli.output)
        .skip_already_converted(!cli.no_skip)
        .artifact_naming(if cli.timestamped {
            ArtifactNaming::Timestamped
        } else {
            ArtifactNaming::Plain
        })
        .folder_concurrency(cli.concurrency as usize)
        .write_summary(!cli.no_summary);

    if let Some(ref formats) = cli.formats {
        builder = builder.supported_formats(formats.iter().map(|f| f.trim()));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Text formats are read directly; everything else goes to `--converter`.
fn build_transformer(cli: &Cli, config: &BatchConfig) -> Result<Arc<dyn DocumentTransformer>> {
    let mut routing =
        RoutingTransformer::new().route(TEXT_EXTENSIONS.iter().copied(), Arc::new(PlainTextTransformer));

    match cli.converter {
        Some(ref line) => {
            let command =
                CommandTransformer::from_command_line(line).context("Invalid --converter")?;
            debug!("Non-text formats are converted by '{}'", command.program());
            routing = routing.fallback(Arc::new(command));
        }
        None => {
            let unhandled: Vec<&str> = config
                .supported_formats
                .iter()
                .map(String::as_str)
                .filter(|ext| !routing.handles(ext))
                .collect();
            if !unhandled.is_empty() {
                warn!(
                    "No --converter given; {} files will be reported as failed (default formats: {})",
                    unhandled.join(", "),
                    SUPPORTED_FORMATS.join(" ")
                );
            }
        }
    }

    if cli.transform_timeout > 0 {
        let bounded = TimeoutTransformer::new(routing, Duration::from_secs(cli.transform_timeout));
        debug!("Per-document timeout: {:?}", bounded.limit());
        Ok(Arc::new(bounded))
    } else {
        Ok(Arc::new(routing))
    }
}
