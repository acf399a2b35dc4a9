//! Reshapes a dashboard batch into the view returned to the frontend.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{
    average, count_equal, count_up, find_by_service, fixed, health_score, round_to, sum,
};
use crate::batch::BatchResults;
use crate::models::Sample;
use crate::queries::{
    ACTIVE_CONNECTIONS, AUTH_REQUESTS, DATABASE_STATUS, ERROR_RATE, HTTP_REQUESTS_RATE,
    NOTIFICATIONS_SENT, PAYMENTS_PROCESSED, RESPONSE_TIME, SERVICES_HEALTH, SERVICES_STATUS,
    WEBHOOKS_RECEIVED,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub overview: Overview,
    pub services: Vec<ServiceView>,
    pub system_metrics: SystemMetrics,
    pub business_metrics: BusinessMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_services: usize,
    pub services_up: usize,
    pub services_down: usize,
    pub total_requests: f64,
    pub avg_response_time: String,
    pub error_rate: String,
    pub health_score: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub name: String,
    pub status: String,
    pub health: String,
    pub requests: f64,
    pub response_time: f64,
    pub errors: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub active_connections: f64,
    pub databases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub authentications: f64,
    pub notifications: f64,
    pub payments: f64,
    pub webhooks: f64,
}

/// Derives the dashboard from the results of [`crate::queries::dashboard_queries`].
///
/// Pure: missing result keys read as empty lists.
pub fn format(results: &BatchResults, known_services: &[String]) -> DashboardView {
    let get = |name: &str| result(results, name);

    let status = get(SERVICES_STATUS);
    let health = get(SERVICES_HEALTH);
    let requests = get(HTTP_REQUESTS_RATE);
    let response_time = get(RESPONSE_TIME);
    let error_rate = get(ERROR_RATE);

    let overview = Overview {
        total_services: known_services.len(),
        services_up: count_up(status),
        services_down: count_equal(status, 0.0),
        total_requests: round_to(sum(requests), 2),
        avg_response_time: fixed(average(response_time), 3),
        error_rate: fixed(average(error_rate), 2),
        health_score: health_score(health),
    };

    let services = known_services
        .iter()
        .map(|name| ServiceView {
            name: name.clone(),
            status: match find_by_service(status, name) {
                Some(s) if s.numeric() == 1.0 => "up",
                Some(_) => "down",
                None => "unknown",
            }
            .to_string(),
            health: match find_by_service(health, name) {
                Some(s) if s.numeric() == 1.0 => "healthy",
                Some(_) => "unhealthy",
                None => "unknown",
            }
            .to_string(),
            requests: service_value(requests, name, 2),
            response_time: service_value(response_time, name, 3),
            errors: service_value(error_rate, name, 2),
        })
        .collect();

    DashboardView {
        overview,
        services,
        system_metrics: SystemMetrics {
            active_connections: sum(get(ACTIVE_CONNECTIONS)),
            databases: database_status(get(DATABASE_STATUS)),
        },
        business_metrics: BusinessMetrics {
            authentications: sum(get(AUTH_REQUESTS)),
            notifications: sum(get(NOTIFICATIONS_SENT)),
            payments: sum(get(PAYMENTS_PROCESSED)),
            webhooks: sum(get(WEBHOOKS_RECEIVED)),
        },
    }
}

fn result<'a>(results: &'a BatchResults, name: &str) -> &'a [Sample] {
    results.get(name).map(Vec::as_slice).unwrap_or(&[])
}

fn service_value(samples: &[Sample], service: &str, places: u32) -> f64 {
    find_by_service(samples, service)
        .map(|s| round_to(s.numeric(), places))
        .unwrap_or(0.0)
}

fn database_status(samples: &[Sample]) -> BTreeMap<String, String> {
    let mut databases = BTreeMap::new();
    for sample in samples {
        let entity = sample
            .label("service_name")
            .or_else(|| sample.label("job"))
            .or_else(|| sample.label("instance"))
            .unwrap_or("unknown");
        let state = if sample.numeric() == 1.0 {
            "connected"
        } else {
            "disconnected"
        };
        databases
            .entry(entity.to_string())
            .or_insert_with(|| state.to_string());
    }
    databases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SampleValue;
    use pretty_assertions::assert_eq;

    fn known() -> Vec<String> {
        ["auth-service", "payment-service", "webhook-service"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn sample(labels: &[(&str, &str)], raw: &str) -> Sample {
        Sample {
            metric: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            value: Some(SampleValue::new(1_700_000_000, raw)),
            values: Vec::new(),
        }
    }

    fn populated() -> BatchResults {
        let mut results = BatchResults::new();
        results.insert(
            SERVICES_STATUS.into(),
            vec![
                sample(&[("job", "auth-service")], "1"),
                sample(&[("instance", "10.0.0.7:payment-service-1")], "0"),
                sample(&[("job", "prometheus")], "1"),
            ],
        );
        results.insert(
            SERVICES_HEALTH.into(),
            vec![
                sample(&[("job", "auth-service")], "1"),
                sample(&[("job", "payment-service")], "0"),
                sample(&[("job", "prometheus")], "1"),
                sample(&[("job", "other")], "1"),
            ],
        );
        results.insert(
            HTTP_REQUESTS_RATE.into(),
            vec![
                sample(&[("job", "auth-service")], "1.234"),
                sample(&[("job", "unlisted")], "2"),
            ],
        );
        results.insert(
            RESPONSE_TIME.into(),
            vec![
                sample(&[("job", "auth-service")], "2"),
                sample(&[("job", "payment-service")], "4"),
            ],
        );
        results.insert(
            ERROR_RATE.into(),
            vec![sample(&[("job", "payment-service")], "5")],
        );
        results.insert(
            ACTIVE_CONNECTIONS.into(),
            vec![
                sample(&[("job", "auth-service")], "3"),
                sample(&[("job", "payment-service")], "4"),
            ],
        );
        results.insert(
            DATABASE_STATUS.into(),
            vec![
                sample(&[("service_name", "auth-service"), ("job", "x")], "1"),
                sample(&[("job", "payment-service")], "0"),
                sample(&[("service_name", "auth-service")], "0"),
            ],
        );
        results.insert(AUTH_REQUESTS.into(), vec![sample(&[], "10")]);
        results.insert(PAYMENTS_PROCESSED.into(), vec![sample(&[], "nope")]);
        results
    }

    #[test]
    fn empty_results_use_defaults() {
        let view = format(&BatchResults::new(), &known());

        assert_eq!(
            view.overview,
            Overview {
                total_services: 3,
                services_up: 0,
                services_down: 0,
                total_requests: 0.0,
                avg_response_time: "0.000".into(),
                error_rate: "0.00".into(),
                health_score: 100,
            }
        );
        assert!(view.services.iter().all(|s| s.status == "unknown"
            && s.health == "unknown"
            && s.requests == 0.0
            && s.response_time == 0.0
            && s.errors == 0.0));
        assert!(view.system_metrics.databases.is_empty());
        assert_eq!(view.business_metrics.authentications, 0.0);
    }

    #[test]
    fn overview_aggregates_everything_reported() {
        let view = format(&populated(), &known());

        assert_eq!(view.overview.services_up, 2);
        assert_eq!(view.overview.services_down, 1);
        assert_eq!(view.overview.total_requests, 3.23);
        assert_eq!(view.overview.avg_response_time, "3.000");
        assert_eq!(view.overview.error_rate, "5.00");
        assert_eq!(view.overview.health_score, 75);
    }

    #[test]
    fn services_follow_known_list() {
        let view = format(&populated(), &known());
        let names: Vec<_> = view.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["auth-service", "payment-service", "webhook-service"]);

        assert_eq!(
            view.services[0],
            ServiceView {
                name: "auth-service".into(),
                status: "up".into(),
                health: "healthy".into(),
                requests: 1.23,
                response_time: 2.0,
                errors: 0.0,
            }
        );
        assert_eq!(view.services[1].status, "down");
        assert_eq!(view.services[1].health, "unhealthy");
        assert_eq!(view.services[1].response_time, 4.0);
        assert_eq!(view.services[1].errors, 5.0);
        assert_eq!(view.services[2].status, "unknown");
    }

    #[test]
    fn system_and_business_metrics() {
        let view = format(&populated(), &known());
        assert_eq!(view.system_metrics.active_connections, 7.0);

        let mut expected = BTreeMap::new();
        expected.insert("auth-service".to_string(), "connected".to_string());
        expected.insert("payment-service".to_string(), "disconnected".to_string());
        assert_eq!(view.system_metrics.databases, expected);

        assert_eq!(view.business_metrics.authentications, 10.0);
        assert_eq!(view.business_metrics.payments, 0.0);
    }

    #[test]
    fn format_is_deterministic() {
        let results = populated();
        let first = serde_json::to_string(&format(&results, &known())).unwrap();
        let second = serde_json::to_string(&format(&results, &known())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(format(&BatchResults::new(), &known())).unwrap();
        assert_eq!(json["overview"]["servicesUp"], 0);
        assert_eq!(json["overview"]["healthScore"], 100);
        assert_eq!(json["overview"]["avgResponseTime"], "0.000");
        assert!(json["systemMetrics"]["databases"].is_object());
        assert!(json["businessMetrics"]["webhooks"].is_number());
    }
}
