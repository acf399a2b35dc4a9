use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{BackendError, BackendResult, MetricsBackend};
use crate::config::GatewayConfig;
use crate::metrics::{self, QueryTimer};
use crate::models::{QueryResponse, RangeWindow};

/// Prometheus-compatible HTTP query API client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    query_timeout: Duration,
    range_query_timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let defaults = GatewayConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            query_timeout: defaults.query_timeout,
            range_query_timeout: defaults.range_query_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.prometheus_url.clone())
            .with_timeouts(config.query_timeout, config.range_query_timeout)
    }

    pub fn with_timeouts(mut self, query_timeout: Duration, range_query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self.range_query_timeout = range_query_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(
        &self,
        name: &str,
        path: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> BackendResult {
        let _timer = QueryTimer::new(name);
        let url = format!("{}{}", self.base_url, path);

        let result = self.send(&url, params, timeout).await;
        metrics::record_query(name, result.is_ok());
        if let Ok(samples) = &result {
            debug!("Query {} returned {} series", name, samples.len());
        }
        result
    }

    async fn send(&self, url: &str, params: &[(&str, &str)], timeout: Duration) -> BackendResult {
        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }

        let body: QueryResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout
            } else {
                BackendError::Decode(e.to_string())
            }
        })?;

        if body.status.as_deref() == Some("error") {
            return Err(BackendError::Api(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body.data.result)
    }
}

fn classify(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(err.to_string())
    }
}

#[async_trait]
impl MetricsBackend for HttpBackend {
    async fn query(&self, name: &str, expression: &str) -> BackendResult {
        self.fetch(
            name,
            "/api/v1/query",
            &[("query", expression)],
            self.query_timeout,
        )
        .await
    }

    async fn query_range(
        &self,
        name: &str,
        expression: &str,
        window: &RangeWindow,
    ) -> BackendResult {
        self.fetch(
            name,
            "/api/v1/query_range",
            &[
                ("query", expression),
                ("start", window.start.as_str()),
                ("end", window.end.as_str()),
                ("step", window.step.as_str()),
            ],
            self.range_query_timeout,
        )
        .await
    }
}
