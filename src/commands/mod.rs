//! CLI command implementations for herakles-disk-check.
//!
//! This module provides implementations for all CLI subcommands:
//! - `collect`: Run collection passes and print the gauges
//! - `config`: Configuration file generation
//! - `check-requirements`: Runtime requirement validation

pub mod collect;
pub mod config;

// Re-export command functions
pub use collect::command_collect;
pub use config::command_config;
