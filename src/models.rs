use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;

/// `[unix_timestamp, "stringified_number"]` as returned by the query API.
///
/// The timestamp is kept as the JSON number it arrived as, so integer and
/// fractional timestamps are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleValue(pub Number, pub String);

impl SampleValue {
    pub fn new(timestamp: i64, raw: impl Into<String>) -> Self {
        Self(Number::from(timestamp), raw.into())
    }
}

/// One series returned by an instant or range query.
///
/// Instant queries fill `value`, range queries fill `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<SampleValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<SampleValue>,
}

impl Sample {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }

    /// Numeric value of the instant sample. Missing, unparseable and
    /// non-finite values read as `0`.
    pub fn numeric(&self) -> f64 {
        self.value
            .as_ref()
            .and_then(|SampleValue(_, raw)| raw.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

/// `{"status": ..., "data": {"resultType": ..., "result": [...]}}`
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: QueryData,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType", default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub result: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: String,
    pub end: String,
    pub step: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Instant,
    Range(RangeWindow),
}

/// A named backend lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub name: String,
    pub expression: String,
    pub kind: QueryKind,
}

impl QuerySpec {
    pub fn instant(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            kind: QueryKind::Instant,
        }
    }

    pub fn range(
        name: impl Into<String>,
        expression: impl Into<String>,
        window: RangeWindow,
    ) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            kind: QueryKind::Range(window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(raw: &str) -> Sample {
        Sample {
            value: Some(SampleValue::new(1_700_000_000, raw)),
            ..Default::default()
        }
    }

    #[test]
    fn numeric_parses_float_strings() {
        assert_eq!(sample("1").numeric(), 1.0);
        assert_eq!(sample("0.25").numeric(), 0.25);
    }

    #[test]
    fn numeric_defaults_to_zero() {
        assert_eq!(sample("not-a-number").numeric(), 0.0);
        assert_eq!(sample("NaN").numeric(), 0.0);
        assert_eq!(sample("+Inf").numeric(), 0.0);
        assert_eq!(Sample::default().numeric(), 0.0);
    }

    #[test]
    fn decodes_instant_and_range_payloads() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"job": "auth-service"}, "value": [1700000000.5, "1"]}
                ]
            }
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.result.len(), 1);
        assert_eq!(parsed.data.result[0].label("job"), Some("auth-service"));
        assert_eq!(parsed.data.result[0].numeric(), 1.0);

        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [
                    {"metric": {}, "values": [[1700000000, "3"], [1700000060, "4"]]}
                ]
            }
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.result[0].values.len(), 2);
        assert!(parsed.data.result[0].value.is_none());
    }

    #[test]
    fn timestamps_are_reserialized_unchanged() {
        let raw = r#"{"metric":{"job":"auth-service"},"value":[1700000000,"0.125"]}"#;
        let sample: Sample = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&sample).unwrap(), raw);

        let raw = r#"{"metric":{},"values":[[1700000000.5,"1"],[1700000060,"2"]]}"#;
        let sample: Sample = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&sample).unwrap(), raw);
    }
}
