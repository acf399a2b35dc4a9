use async_trait::async_trait;
use thiserror::Error;

use crate::models::{QueryKind, QuerySpec, RangeWindow, Sample};

pub mod client;

pub use client::HttpBackend;

/// Why a backend query produced no samples.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("query timed out")]
    Timeout,

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("malformed response body: {0}")]
    Decode(String),

    #[error("backend rejected query: {0}")]
    Api(String),
}

pub type BackendResult = std::result::Result<Vec<Sample>, BackendError>;

/// The time-series query API the gateway polls.
#[async_trait]
pub trait MetricsBackend: Send + Sync {
    async fn query(&self, name: &str, expression: &str) -> BackendResult;

    async fn query_range(
        &self,
        name: &str,
        expression: &str,
        window: &RangeWindow,
    ) -> BackendResult;

    async fn execute(&self, spec: &QuerySpec) -> BackendResult {
        match &spec.kind {
            QueryKind::Instant => self.query(&spec.name, &spec.expression).await,
            QueryKind::Range(window) => {
                self.query_range(&spec.name, &spec.expression, window).await
            }
        }
    }
}
