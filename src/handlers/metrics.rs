//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every scrape runs one collection pass and returns the registry in
//! Prometheus text format. A pass owns the sink lock until the registry has
//! been encoded, so passes never overlap and a scrape never sees the gauges
//! of a pass in progress, even when the scraping request is cancelled.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use herakles_disk_check::{MetricSink, PassSummary};
use prometheus::{Encoder, Registry, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

use crate::state::{AppState, SharedState};

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    EncodingFailed,
    PassAborted,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            MetricsError::EncodingFailed => "Failed to encode metrics",
            MetricsError::PassAborted => "Collection pass aborted",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Runs one collection pass and publishes its gauges.
///
/// A failed pass clears the disk gauges instead of leaving partial or stale
/// values behind.
pub async fn run_pass(state: &SharedState) -> Option<PassSummary> {
    match locked_pass(state, |_| ()).await {
        Ok((summary, ())) => summary,
        Err(e) => {
            error!("Collection pass panicked: {}", e);
            None
        }
    }
}

/// Runs a pass on a blocking thread, then `after` while the sink lock is
/// still held. The lock guard moves into the blocking task, so dropping the
/// returned future does not release it before the pass has finished.
async fn locked_pass<T, F>(
    state: &SharedState,
    after: F,
) -> Result<(Option<PassSummary>, T), tokio::task::JoinError>
where
    F: FnOnce(&AppState) -> T + Send + 'static,
    T: Send + 'static,
{
    let start = Instant::now();
    let mut guard = state.sink.clone().lock_owned().await;
    let state = state.clone();

    tokio::task::spawn_blocking(move || {
        let summary = match state.check.run(state.source.as_ref(), &mut *guard) {
            Ok(summary) => {
                debug!(
                    "Collection pass emitted {} gauges for {} devices",
                    summary.gauges, summary.devices
                );
                Some(summary)
            }
            Err(e) => {
                warn!("Collection pass failed: {}", e);
                guard.begin_pass();
                None
            }
        };

        state.pass_duration.set(start.elapsed().as_secs_f64());
        state
            .pass_success
            .set(if summary.is_some() { 1.0 } else { 0.0 });
        state
            .devices
            .set(summary.map(|s| s.devices).unwrap_or(0) as f64);

        let output = after(state.as_ref());
        drop(guard);
        (summary, output)
    })
    .await
}

fn encode(registry: &Registry) -> Result<String, MetricsError> {
    let families = registry.gather();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);
    let encoder = TextEncoder::new();

    if encoder.encode(&families, &mut buffer).is_err() {
        error!("Failed to encode Prometheus metrics");
        return Err(MetricsError::EncodingFailed);
    }

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");

    let body = match locked_pass(&state, |state| encode(&state.registry)).await {
        Ok((_, body)) => body?,
        Err(e) => {
            error!("Collection pass panicked: {}", e);
            return Err(MetricsError::PassAborted);
        }
    };

    debug!(
        "Metrics request completed: {} bytes, {:.3}ms",
        body.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    Ok(body)
}
