//! The transformation port: turn one document into Markdown text.
//!
//! The orchestrator only knows the [`DocumentTransformer`] trait. Concrete
//! converters (OCR engines, layout models, office-format readers) live
//! outside this crate or behind the small adapters below, so the batch core
//! never links against a conversion engine.
//!
//! ## Adapters
//!
//! - [`text::PlainTextTransformer`]: `.md` / `.txt` read straight from disk
//! - [`command::CommandTransformer`]: any external tool that prints Markdown
//!   on stdout (`pandoc -t gfm {input}`, `markitdown {input}`, …)
//! - [`RoutingTransformer`]: dispatch by file extension
//! - [`timeout::TimeoutTransformer`]: bound the latency of any of the above

pub mod cleanup;
pub mod command;
pub mod text;
pub mod timeout;

use crate::config::normalise_extension;
use crate::discovery::file_name_of;
use crate::error::TransformError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub use command::CommandTransformer;
pub use text::PlainTextTransformer;
pub use timeout::TimeoutTransformer;

/// Converts a single document into Markdown.
///
/// Calls are made one file at a time per folder; with folder concurrency
/// above one, calls for different folders may overlap, hence `Send + Sync`.
#[async_trait]
pub trait DocumentTransformer: Send + Sync {
    /// Produce Markdown for `path`, or a [`TransformError`] naming the file.
    async fn transform(&self, path: &Path) -> Result<String, TransformError>;
}

#[async_trait]
impl<T: DocumentTransformer + ?Sized> DocumentTransformer for Arc<T> {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        (**self).transform(path).await
    }
}

/// Dispatches to a transformer chosen by lowercase file extension.
#[derive(Default)]
pub struct RoutingTransformer {
    routes: HashMap<String, Arc<dyn DocumentTransformer>>,
    fallback: Option<Arc<dyn DocumentTransformer>>,
}

impl RoutingTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every extension in `extensions` to `transformer`.
    pub fn route<I, S>(mut self, extensions: I, transformer: Arc<dyn DocumentTransformer>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            self.routes
                .insert(normalise_extension(ext.as_ref()), Arc::clone(&transformer));
        }
        self
    }

    /// Used for extensions without an explicit route.
    pub fn fallback(mut self, transformer: Arc<dyn DocumentTransformer>) -> Self {
        self.fallback = Some(transformer);
        self
    }

    /// True when `extension` (any case, with or without dot) has a route or a fallback exists.
    pub fn handles(&self, extension: &str) -> bool {
        self.fallback.is_some() || self.routes.contains_key(&normalise_extension(extension))
    }
}

#[async_trait]
impl DocumentTransformer for RoutingTransformer {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        let extension = path
            .extension()
            .map(|e| normalise_extension(&e.to_string_lossy()))
            .unwrap_or_default();

        let target = self.routes.get(&extension).or(self.fallback.as_ref());
        match target {
            Some(t) => t.transform(path).await,
            None => Err(TransformError::Unsupported {
                file: file_name_of(path),
                extension,
            }),
        }
    }
}
