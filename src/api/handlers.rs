use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use super::gateway::GatewayState;
use crate::{
    batch::{run_batch, BatchResults},
    dashboard::{self, DashboardView},
    metrics,
    models::{QuerySpec, Sample},
    queries, GatewayError, Result,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub timestamp: String,
    pub data: DashboardView,
}

#[derive(Debug, Serialize)]
pub struct ServiceMetricsResponse {
    pub success: bool,
    pub service: String,
    pub timestamp: String,
    pub metrics: BTreeMap<String, Vec<Sample>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetricsResponse {
    pub success: bool,
    pub timestamp: String,
    pub business_metrics: BTreeMap<String, Vec<Sample>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub query: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub query: String,
    pub data: Vec<Sample>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub name: Option<String>,
    pub status: &'static str,
    pub instance: Option<String>,
    pub last_check: String,
}

#[derive(Debug, Serialize)]
pub struct ServicesStatusResponse {
    pub success: bool,
    pub services: Vec<ServiceStatus>,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ordered(results: BatchResults) -> BTreeMap<String, Vec<Sample>> {
    results.into_iter().collect()
}

async fn execute(state: &GatewayState, queries: &[QuerySpec]) -> BatchResults {
    run_batch(
        state.backend.as_ref(),
        queries,
        state.config.max_concurrent_queries,
    )
    .await
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "Metrics Service API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /health - Service health",
            "GET /metrics - Prometheus metrics",
            "GET /api/dashboard - Dashboard overview",
            "GET /api/services/status - Services status",
            "GET /api/service/:serviceName/metrics - Per-service metrics",
            "GET /api/business-metrics - Business counters",
            "GET /api/metrics/history?query=<expr>&start&end&step - Range query"
        ]
    }))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: metrics::SERVICE_NAME,
        timestamp: now(),
    })
}

pub async fn prometheus_metrics() -> Result<impl IntoResponse> {
    let body = metrics::render().map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, metrics::content_type())], body))
}

pub async fn dashboard(State(state): State<GatewayState>) -> Json<DashboardResponse> {
    let results = execute(&state, &queries::dashboard_queries()).await;
    let view = dashboard::format(&results, &state.config.known_services);
    metrics::publish_dashboard(&view);

    Json(DashboardResponse {
        success: true,
        timestamp: now(),
        data: view,
    })
}

pub async fn service_metrics(
    State(state): State<GatewayState>,
    Path(service_name): Path<String>,
) -> Json<ServiceMetricsResponse> {
    info!("Fetching metrics for service {}", service_name);
    let results = execute(&state, &queries::service_queries(&service_name)).await;

    Json(ServiceMetricsResponse {
        success: true,
        service: service_name,
        timestamp: now(),
        metrics: ordered(results),
    })
}

pub async fn business_metrics(State(state): State<GatewayState>) -> Json<BusinessMetricsResponse> {
    let results = execute(&state, &queries::business_queries()).await;

    Json(BusinessMetricsResponse {
        success: true,
        timestamp: now(),
        business_metrics: ordered(results),
    })
}

pub async fn metrics_history(
    State(state): State<GatewayState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>> {
    let expression = params
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| GatewayError::Validation("Query parameter 'query' is required".into()))?;

    let window = queries::history_window(params.start, params.end, params.step, Utc::now().timestamp());
    let mut results = execute(&state, &queries::history_queries(&expression, window)).await;

    Ok(Json(HistoryResponse {
        success: true,
        data: results.remove(queries::HISTORY).unwrap_or_default(),
        query: expression,
    }))
}

/// Unlike the batch endpoints, a failed backend call surfaces here as a 500.
pub async fn services_status(
    State(state): State<GatewayState>,
) -> Result<Json<ServicesStatusResponse>> {
    let samples = state
        .backend
        .query(queries::SERVICES_STATUS, "up")
        .await?;

    let last_check = now();
    let services = samples
        .iter()
        .map(|sample| ServiceStatus {
            name: sample.label("job").map(str::to_string),
            status: if sample.numeric() == 1.0 { "healthy" } else { "down" },
            instance: sample.label("instance").map(str::to_string),
            last_check: last_check.clone(),
        })
        .collect();

    Ok(Json(ServicesStatusResponse {
        success: true,
        services,
    }))
}
