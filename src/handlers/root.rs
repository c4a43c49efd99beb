//! Root endpoint handler for the landing page.
//!
//! This module provides the `/` endpoint handler that lists the available
//! endpoints and the discovery source in use.

use axum::extract::State;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-node-exporter - More info: https://www.herakles.now - Support: exporter@herakles.now";

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> String {
    debug!("Processing / request");

    let version = env!("CARGO_PKG_VERSION");

    let uptime_secs = state.start_time.elapsed().as_secs();
    let hours = uptime_secs / 3600;
    let minutes = (uptime_secs % 3600) / 60;
    let seconds = uptime_secs % 60;

    format!(
        "herakles-disk-check {version}\n\
         \n\
         Uptime:            {hours}h {minutes}m {seconds}s\n\
         Discovery source:  {source}\n\
         \n\
         Endpoints:\n\
         \x20 /metrics   Prometheus metrics (runs one collection pass)\n\
         \x20 /config    Effective configuration (YAML)\n\
         \n\
         {FOOTER_TEXT}\n",
        source = state.source.name(),
    )
}
