//! Named query sets for each endpoint.

use crate::models::{QuerySpec, RangeWindow};

pub const SERVICES_STATUS: &str = "servicesStatus";
pub const SERVICES_HEALTH: &str = "servicesHealth";
pub const HTTP_REQUESTS_RATE: &str = "httpRequestsRate";
pub const RESPONSE_TIME: &str = "responseTime";
pub const ERROR_RATE: &str = "errorRate";
pub const ACTIVE_CONNECTIONS: &str = "activeConnections";
pub const DATABASE_STATUS: &str = "databaseStatus";
pub const AUTH_REQUESTS: &str = "authRequests";
pub const NOTIFICATIONS_SENT: &str = "notificationsSent";
pub const PAYMENTS_PROCESSED: &str = "paymentsProcessed";
pub const WEBHOOKS_RECEIVED: &str = "webhooksReceived";

pub const HISTORY: &str = "history";

pub const DEFAULT_STEP: &str = "1m";
pub const DEFAULT_HISTORY_SECS: i64 = 3600;

pub fn dashboard_queries() -> Vec<QuerySpec> {
    vec![
        QuerySpec::instant(SERVICES_STATUS, "up"),
        QuerySpec::instant(SERVICES_HEALTH, "service_health_status"),
        QuerySpec::instant(
            HTTP_REQUESTS_RATE,
            "sum(rate(http_requests_total[5m])) by (job)",
        ),
        QuerySpec::instant(
            RESPONSE_TIME,
            "histogram_quantile(0.95, sum(rate(http_request_duration_seconds_bucket[5m])) by (le, job))",
        ),
        QuerySpec::instant(
            ERROR_RATE,
            r#"sum(rate(http_requests_total{status_code=~"5.."}[5m])) by (job) / sum(rate(http_requests_total[5m])) by (job) * 100"#,
        ),
        QuerySpec::instant(ACTIVE_CONNECTIONS, "active_connections"),
        QuerySpec::instant(DATABASE_STATUS, "database_connection_status"),
        QuerySpec::instant(AUTH_REQUESTS, "sum(auth_requests_total)"),
        QuerySpec::instant(NOTIFICATIONS_SENT, "sum(notifications_sent_total)"),
        QuerySpec::instant(PAYMENTS_PROCESSED, "sum(payments_processed_total)"),
        QuerySpec::instant(WEBHOOKS_RECEIVED, "sum(webhooks_received_total)"),
    ]
}

/// Escapes a value for use inside a double-quoted label matcher.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn service_queries(service_name: &str) -> Vec<QuerySpec> {
    let job = escape_label_value(service_name);
    vec![
        QuerySpec::instant(
            "requests",
            format!(r#"sum(rate(http_requests_total{{job="{}"}}[5m]))"#, job),
        ),
        QuerySpec::instant(
            "errors",
            format!(
                r#"sum(rate(http_requests_total{{job="{}",status_code=~"5.."}}[5m]))"#,
                job
            ),
        ),
        QuerySpec::instant(
            "latency",
            format!(
                r#"histogram_quantile(0.95, sum(rate(http_request_duration_seconds_bucket{{job="{}"}}[5m])) by (le))"#,
                job
            ),
        ),
        QuerySpec::instant("uptime", format!(r#"up{{job="{}"}}"#, job)),
    ]
}

pub fn business_queries() -> Vec<QuerySpec> {
    [
        ("authLogins", "auth_logins_total"),
        ("authRegistrations", "auth_registrations_total"),
        ("notificationsSent", "notifications_sent_total"),
        ("notificationsFailed", "notifications_failed_total"),
        ("paymentsProcessed", "payments_processed_total"),
        ("paymentsFailed", "payments_failed_total"),
        ("webhooksReceived", "webhooks_received_total"),
        ("webhooksFailed", "webhooks_failed_total"),
    ]
    .into_iter()
    .map(|(name, counter)| QuerySpec::instant(name, format!("sum({})", counter)))
    .collect()
}

/// Range window with the defaults applied: the last hour, one-minute step.
pub fn history_window(
    start: Option<String>,
    end: Option<String>,
    step: Option<String>,
    now: i64,
) -> RangeWindow {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    RangeWindow {
        start: non_empty(start).unwrap_or_else(|| (now - DEFAULT_HISTORY_SECS).to_string()),
        end: non_empty(end).unwrap_or_else(|| now.to_string()),
        step: non_empty(step).unwrap_or_else(|| DEFAULT_STEP.to_string()),
    }
}

pub fn history_queries(expression: &str, window: RangeWindow) -> Vec<QuerySpec> {
    vec![QuerySpec::range(HISTORY, expression, window)]
}
