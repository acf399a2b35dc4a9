use lazy_static::lazy_static;
use prometheus::{
    register_gauge_vec_with_registry, register_histogram_vec_with_registry,
    register_int_counter_vec_with_registry, Encoder, GaugeVec, HistogramOpts, HistogramVec,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Instant;

use crate::dashboard::DashboardView;

pub const SERVICE_NAME: &str = "metrics-service";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Backend query metrics
    pub static ref PROMETHEUS_QUERIES: IntCounterVec = register_int_counter_vec_with_registry!(
        Opts::new(
            "metrics_service_prometheus_queries_total",
            "Total number of Prometheus queries executed"
        ),
        &["query_type", "status"],
        REGISTRY
    ).unwrap();

    pub static ref PROMETHEUS_QUERY_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        HistogramOpts::new(
            "metrics_service_prometheus_query_duration_seconds",
            "Duration of Prometheus queries in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["query_type"],
        REGISTRY
    ).unwrap();

    // Request metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "route", "status_code"],
        REGISTRY
    ).unwrap();

    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "Duration of HTTP requests in seconds"
        )
        .buckets(vec![0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 7.0, 10.0]),
        &["method", "route", "status_code"],
        REGISTRY
    ).unwrap();

    pub static ref REQUEST_PROTOCOL: IntCounterVec = register_int_counter_vec_with_registry!(
        Opts::new("request_protocol_total", "Total requests by protocol"),
        &["protocol"],
        REGISTRY
    ).unwrap();

    // Health metrics
    pub static ref SERVICE_HEALTH_STATUS: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new(
            "service_health_status",
            "Health status of the service (1 = healthy, 0 = unhealthy)"
        ),
        &["service_name"],
        REGISTRY
    ).unwrap();

    pub static ref EXTERNAL_SERVICE_HEALTH: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new(
            "external_service_health",
            "Health status of external services (1 = healthy, 0 = unhealthy)"
        ),
        &["service_name"],
        REGISTRY
    ).unwrap();

    // Dashboard metrics
    pub static ref AGGREGATED_DATA: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new(
            "metrics_service_aggregated_data",
            "Aggregated metrics data for dashboard"
        ),
        &["metric_type", "service"],
        REGISTRY
    ).unwrap();

    // Never populated: the gateway keeps no cache.
    pub static ref CACHE_HITS: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new(
            "metrics_service_cache_hits_total",
            "Number of cache hits for metrics requests"
        ),
        &["cache_type"],
        REGISTRY
    ).unwrap();
}

pub fn init_metrics() {
    lazy_static::initialize(&CACHE_HITS);
    SERVICE_HEALTH_STATUS
        .with_label_values(&[SERVICE_NAME])
        .set(1.0);

    #[cfg(target_os = "linux")]
    {
        let collector = prometheus::process_collector::ProcessCollector::new(
            std::process::id() as i32,
            "metrics_service",
        );
        if let Err(e) = REGISTRY.register(Box::new(collector)) {
            tracing::warn!("Failed to register process collector: {}", e);
        }
    }
}

/// Text exposition of everything in [`REGISTRY`].
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Observes the query duration when dropped.
pub struct QueryTimer {
    query_type: String,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_type: &str) -> Self {
        Self {
            query_type: query_type.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        PROMETHEUS_QUERY_DURATION
            .with_label_values(&[self.query_type.as_str()])
            .observe(duration);
    }
}

pub fn record_query(query_type: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    PROMETHEUS_QUERIES
        .with_label_values(&[query_type, status])
        .inc();
}

pub fn record_http_request(method: &str, route: &str, status_code: u16, duration: f64) {
    let status = status_code.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, route, status.as_str()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, route, status.as_str()])
        .observe(duration);
}

pub fn record_protocol(protocol: &str) {
    REQUEST_PROTOCOL.with_label_values(&[protocol]).inc();
}

/// Mirrors the latest dashboard computation into the gateway's own gauges.
pub fn publish_dashboard(view: &DashboardView) {
    let overview = &view.overview;
    let all = "all";
    AGGREGATED_DATA
        .with_label_values(&["services_up", all])
        .set(overview.services_up as f64);
    AGGREGATED_DATA
        .with_label_values(&["total_requests", all])
        .set(overview.total_requests);
    AGGREGATED_DATA
        .with_label_values(&["health_score", all])
        .set(overview.health_score as f64);

    for service in &view.services {
        let up = if service.status == "up" { 1.0 } else { 0.0 };
        EXTERNAL_SERVICE_HEALTH
            .with_label_values(&[service.name.as_str()])
            .set(up);
        AGGREGATED_DATA
            .with_label_values(&["requests", service.name.as_str()])
            .set(service.requests);
        AGGREGATED_DATA
            .with_label_values(&["response_time", service.name.as_str()])
            .set(service.response_time);
    }
}
