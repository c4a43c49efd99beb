//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_disk_check::{DiscoverySource, DiskCheck, PrometheusSink};
use prometheus::{Gauge, Registry};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub check: DiskCheck,
    pub source: Arc<dyn DiscoverySource + Send + Sync>,
    /// Held from the start of a pass until its gauges are encoded.
    pub sink: Arc<Mutex<PrometheusSink>>,
    pub pass_duration: Gauge,
    pub pass_success: Gauge,
    pub devices: Gauge,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
