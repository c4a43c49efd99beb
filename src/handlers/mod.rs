//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Plain-text landing page
//! - `/metrics`: Prometheus metrics endpoint
//! - `/config`: Configuration display endpoint

pub mod config;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use config::config_handler;
pub use metrics::{metrics_handler, run_pass};
pub use root::root_handler;
