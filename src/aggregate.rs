//! Small pure helpers over sample lists.

use crate::models::Sample;

pub fn sum(samples: &[Sample]) -> f64 {
    samples.iter().map(Sample::numeric).sum()
}

/// Arithmetic mean, `0` for an empty list.
pub fn average(samples: &[Sample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    sum(samples) / samples.len() as f64
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// `value` formatted with exactly `places` decimals. Ties round away from
/// zero, as in [`round_to`].
pub fn fixed(value: f64, places: u32) -> String {
    format!("{:.*}", places as usize, round_to(value, places))
}

pub fn count_equal(samples: &[Sample], target: f64) -> usize {
    samples.iter().filter(|s| s.numeric() == target).count()
}

pub fn count_up(samples: &[Sample]) -> usize {
    count_equal(samples, 1.0)
}

/// Percentage of samples reporting `1`, rounded. `100` when there are none.
pub fn health_score(samples: &[Sample]) -> u32 {
    if samples.is_empty() {
        return 100;
    }
    let healthy = count_up(samples) as f64;
    let score = (100.0 * healthy / samples.len() as f64).round();
    score.clamp(0.0, 100.0) as u32
}

/// True if the sample's `job` is `service` or its `instance` contains it.
pub fn matches_service(sample: &Sample, service: &str) -> bool {
    sample.label("job") == Some(service)
        || sample
            .label("instance")
            .map_or(false, |instance| instance.contains(service))
}

/// First sample in result order attributed to `service`.
pub fn find_by_service<'a>(samples: &'a [Sample], service: &str) -> Option<&'a Sample> {
    samples.iter().find(|s| matches_service(s, service))
}
