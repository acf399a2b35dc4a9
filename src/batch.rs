use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::backend::MetricsBackend;
use crate::models::{QuerySpec, Sample};

/// Query name to the samples it produced. Failed queries map to an empty list.
pub type BatchResults = HashMap<String, Vec<Sample>>;

/// Executes every query concurrently and waits for all of them to settle.
///
/// A failing query never affects the others; its slot is an empty list.
/// `max_concurrency` bounds the fan-out, `0` issues every query at once.
pub async fn run_batch(
    backend: &dyn MetricsBackend,
    queries: &[QuerySpec],
    max_concurrency: usize,
) -> BatchResults {
    let limit = if max_concurrency == 0 {
        queries.len().max(1)
    } else {
        max_concurrency
    };

    // Owned items keep the stream future `Send` for any borrow of `queries`.
    let results: BatchResults = stream::iter(queries.iter().cloned())
        .map(|spec| async move {
            let samples = match backend.execute(&spec).await {
                Ok(samples) => samples,
                Err(e) => {
                    warn!("Query {} failed ({}): {}", spec.name, spec.expression, e);
                    Vec::new()
                }
            };
            (spec.name, samples)
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    debug!("Batch of {} queries settled", results.len());
    results
}
