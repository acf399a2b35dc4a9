use std::env;
use std::time::Duration;

use crate::{GatewayError, Result};

pub const DEFAULT_PORT: u16 = 5006;
pub const DEFAULT_PROMETHEUS_URL: &str = "http://prometheus:9090";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_KNOWN_SERVICES: &[&str] = &[
    "auth-service",
    "notification-service",
    "payment-service",
    "webhook-service",
    "metrics-service",
];

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub prometheus_url: String,
    pub cors_origin: String,
    pub known_services: Vec<String>,
    pub query_timeout: Duration,
    pub range_query_timeout: Duration,
    /// Per-batch fan-out bound, `0` for unbounded.
    pub max_concurrent_queries: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            known_services: DEFAULT_KNOWN_SERVICES.iter().map(|s| s.to_string()).collect(),
            query_timeout: Duration::from_secs(5),
            range_query_timeout: Duration::from_secs(10),
            max_concurrent_queries: 16,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let known_services = match lookup("KNOWN_SERVICES") {
            Some(raw) => parse_list(&raw),
            None => defaults.known_services,
        };
        if known_services.is_empty() {
            return Err(GatewayError::Config(
                "KNOWN_SERVICES must name at least one service".to_string(),
            ));
        }

        let prometheus_url = lookup("PROMETHEUS_URL")
            .unwrap_or(defaults.prometheus_url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            prometheus_url,
            cors_origin: lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            known_services,
            query_timeout: Duration::from_secs(parse_or(
                &lookup,
                "QUERY_TIMEOUT_SECS",
                defaults.query_timeout.as_secs(),
            )?),
            range_query_timeout: Duration::from_secs(parse_or(
                &lookup,
                "RANGE_QUERY_TIMEOUT_SECS",
                defaults.range_query_timeout.as_secs(),
            )?),
            max_concurrent_queries: parse_or(
                &lookup,
                "MAX_CONCURRENT_QUERIES",
                defaults.max_concurrent_queries,
            )?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| GatewayError::Config(format!("invalid {}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = GatewayConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 5006);
        assert_eq!(config.prometheus_url, "http://prometheus:9090");
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.known_services.len(), 5);
        assert_eq!(config.query_timeout, Duration::from_secs(5));
        assert_eq!(config.range_query_timeout, Duration::from_secs(10));
    }

    #[test]
    fn overrides_are_read() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("PROMETHEUS_URL", "http://localhost:9090/"),
            ("KNOWN_SERVICES", " billing , ,search "),
            ("MAX_CONCURRENT_QUERIES", "0"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.prometheus_url, "http://localhost:9090");
        assert_eq!(config.known_services, vec!["billing", "search"]);
        assert_eq!(config.max_concurrent_queries, 0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GatewayConfig::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(GatewayConfig::from_lookup(lookup_from(&[("KNOWN_SERVICES", " , ")])).is_err());
    }
}
