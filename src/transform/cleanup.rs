//! Deterministic text cleanup applied by the bundled adapters.
//!
//! Converters emit inconsistent whitespace: CRLF line endings, hyphenated
//! line breaks carried over from page layout, runs of spaces from column
//! alignment, and stray zero-width characters. These rules run in order:
//!
//! 1. Normalise line endings (CRLF → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 3. Collapse 3+ consecutive newlines into one blank line
//! 4. Join words hyphenated across a line break
//! 5. Collapse runs of spaces
//! 6. Trim every line
//! 7. Drop leading and trailing empty lines

use crate::ledger::sanitize_name;
use chrono::{DateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

const INVISIBLE_CHARS: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}', '\u{00AD}'];

/// Apply all cleanup rules to converter output.
pub fn clean_text(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let s = input.replace("\r\n", "\n").replace('\r', "\n");
    let s: String = s.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    let s = RE_EXCESS_NEWLINES.replace_all(&s, "\n\n");
    let s = s.replace("-\n", "");
    let s = RE_SPACE_RUNS.replace_all(&s, " ");

    let lines: Vec<&str> = s.split('\n').map(str::trim).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map(|i| i + 1)
        .unwrap_or(start);
    lines[start..end.max(start)].join("\n")
}

/// Markdown header introducing one converted document inside a combined file.
///
/// ```text
/// # quarterly_report
///
/// *Source: quarterly report.pdf*
/// *Processed: 2024-01-01 09:30:00*
/// ```
pub fn section_header<Tz>(path: &Path, processed_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "# {}\n\n*Source: {}*  \n*Processed: {}*\n\n",
        sanitize_name(&stem),
        file_name,
        processed_at.format("%Y-%m-%d %H:%M:%S")
    )
}
