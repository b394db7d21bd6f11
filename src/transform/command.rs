//! External-command adapter: delegate conversion to a tool that prints
//! Markdown on stdout.
//!
//! The command is spawned directly (no shell), with the document path
//! substituted for every `{input}` argument. When no argument contains the
//! placeholder the path is appended as the last argument. The child is
//! killed if the future is dropped, so [`super::TimeoutTransformer`] can
//! bound it.

use super::cleanup::{clean_text, section_header};
use super::DocumentTransformer;
use crate::discovery::file_name_of;
use crate::error::{BatchError, TransformError};
use async_trait::async_trait;
use chrono::Local;
use std::path::Path;
use std::process::Stdio;
use tracing::debug;

/// Placeholder replaced with the document path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

const MAX_STDERR_CHARS: usize = 300;

/// Runs an external converter for each document.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    program: String,
    args: Vec<String>,
}

impl CommandTransformer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace, e.g. `"pandoc -t gfm {input}"`.
    ///
    /// Quoting is not interpreted; use [`CommandTransformer::new`] for
    /// arguments containing spaces.
    pub fn from_command_line(line: &str) -> Result<Self, BatchError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| BatchError::InvalidConfig("Converter command is empty".into()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one invocation on `path`.
    pub fn args_for(&self, path: &Path) -> Vec<String> {
        let input = path.to_string_lossy();
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    a.replace(INPUT_PLACEHOLDER, &input)
                } else {
                    a.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(input.into_owned());
        }
        args
    }
}

#[async_trait]
impl DocumentTransformer for CommandTransformer {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        let file = file_name_of(path);
        let args = self.args_for(path);
        debug!("Running converter: {} {:?}", self.program, args);

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| TransformError::Failed {
                file: file.clone(),
                detail: format!("could not start '{}': {e}", self.program),
            })?;

        if !output.status.success() {
            return Err(TransformError::CommandFailed {
                file,
                status: output.status.to_string(),
                stderr: excerpt(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        let body = String::from_utf8_lossy(&output.stdout);
        Ok(format!(
            "{}{}",
            section_header(path, &Local::now()),
            clean_text(&body)
        ))
    }
}

fn excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.chars().count() <= MAX_STDERR_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_STDERR_CHARS - 1).collect();
    format!("{cut}\u{2026}")
}
