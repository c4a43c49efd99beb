//! Startup requirement validation for herakles-disk-check.
//!
//! This module checks that at least one discovery source can work on this
//! host before the exporter starts serving.

use herakles_disk_check::host::{DISKSTATS_PATH, MOUNTS_PATH};
use herakles_disk_check::SourceKind;
use std::fs;
use tracing::{error, info, warn};

/// Validate all runtime requirements for the configured source
pub fn validate_requirements(source: SourceKind) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let mounts = check_mount_table();
    let df = check_df();

    match source {
        SourceKind::Mounts => {
            mounts?;
            check_diskstats();
        }
        SourceKind::Df => df?,
        SourceKind::Auto => {
            if mounts.is_ok() {
                check_diskstats();
            } else if let Err(e) = df {
                error!("❌ Neither {} nor df is usable", MOUNTS_PATH);
                return Err(e);
            }
        }
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Check that the mount table can be read
fn check_mount_table() -> Result<(), ValidationError> {
    match fs::read_to_string(MOUNTS_PATH) {
        Ok(content) => {
            info!(
                "✅ {} readable ({} mounts)",
                MOUNTS_PATH,
                content.lines().count()
            );
            Ok(())
        }
        Err(e) => {
            warn!("⚠️  Cannot read {}: {}", MOUNTS_PATH, e);
            Err(ValidationError::MountTableUnavailable(e.to_string()))
        }
    }
}

/// Latency gauges need the kernel I/O counters; their absence is not fatal.
fn check_diskstats() {
    if fs::metadata(DISKSTATS_PATH).is_ok() {
        info!("✅ {} available - latency gauges enabled", DISKSTATS_PATH);
    } else {
        warn!("⚠️  {} not found - collection passes will fail", DISKSTATS_PATH);
    }
}

/// Check that df is on PATH
fn check_df() -> Result<(), ValidationError> {
    match which::which("df") {
        Ok(path) => {
            info!("✅ df found at {}", path.display());
            Ok(())
        }
        Err(e) => {
            warn!("⚠️  df not found on PATH: {}", e);
            Err(ValidationError::DfNotFound)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Mount table not readable: {0}")]
    MountTableUnavailable(String),

    #[error("df command not found on PATH")]
    DfNotFound,
}
