//! Latency bound for any [`DocumentTransformer`].
//!
//! The orchestrator waits as long as a transformer takes. Wrap the
//! transformer in [`TimeoutTransformer`] to turn a hung conversion into a
//! recorded per-file failure instead.

use super::DocumentTransformer;
use crate::discovery::file_name_of;
use crate::error::TransformError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Fails a conversion with [`TransformError::Timeout`] after `limit`.
pub struct TimeoutTransformer<T> {
    inner: T,
    limit: Duration,
}

impl<T> TimeoutTransformer<T> {
    pub fn new(inner: T, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<T: DocumentTransformer> DocumentTransformer for TimeoutTransformer<T> {
    async fn transform(&self, path: &Path) -> Result<String, TransformError> {
        match tokio::time::timeout(self.limit, self.inner.transform(path)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Conversion of {} exceeded {}s",
                    path.display(),
                    self.limit.as_secs()
                );
                Err(TransformError::Timeout {
                    file: file_name_of(path),
                    secs: self.limit.as_secs(),
                })
            }
        }
    }
}
