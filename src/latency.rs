//! Correlates kernel I/O counters with accepted devices.
//!
//! I/O counters are keyed by the short kernel name (`sda1`) while the mount
//! table uses the device path (`/dev/sda1`). Counters whose device was
//! filtered out simply find no match.

use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::IoCounterSample;

/// Filesystem type and mountpoint of an accepted device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub fstype: String,
    pub mountpoint: String,
}

/// Devices accepted during one pass, keyed by device path.
///
/// A device mounted several times keeps its first mountpoint.
#[derive(Debug, Clone, Default)]
pub struct ValidDiskIndex {
    disks: BTreeMap<String, DiskEntry>,
}

impl ValidDiskIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: &str, fstype: &str, mountpoint: &str) {
        self.disks
            .entry(device.to_string())
            .or_insert_with(|| DiskEntry {
                fstype: fstype.to_string(),
                mountpoint: mountpoint.to_string(),
            });
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }

    /// First accepted device (in device path order) that `raw_key` refers to.
    pub fn find(&self, raw_key: &str) -> Option<(&str, &DiskEntry)> {
        let pattern = format!("^(/dev/)?{}$", regex::escape(raw_key));
        let re = Regex::new(&pattern).ok()?;
        self.disks
            .iter()
            .find(|(device, _)| re.is_match(device))
            .map(|(device, entry)| (device.as_str(), entry))
    }
}

/// Latency ratios for one accepted device.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyReading {
    pub device: String,
    pub fstype: String,
    pub mountpoint: String,
    pub read_time_pct: f64,
    pub write_time_pct: f64,
}

/// Matches every counter against the index, skipping unknown devices.
pub fn correlate(
    index: &ValidDiskIndex,
    counters: &BTreeMap<String, IoCounterSample>,
) -> Vec<LatencyReading> {
    counters
        .iter()
        .filter_map(|(raw_key, sample)| {
            let (device, entry) = index.find(raw_key)?;
            debug!("Passed: {} -> {}", raw_key, device);
            Some(LatencyReading {
                device: device.to_string(),
                fstype: entry.fstype.clone(),
                mountpoint: entry.mountpoint.clone(),
                read_time_pct: time_pct(sample.read_time_ms),
                write_time_pct: time_pct(sample.write_time_ms),
            })
        })
        .collect()
}

// x100 for a percentage, /1000 because counters are in milliseconds
fn time_pct(ms: u64) -> f64 {
    ms as f64 * 100.0 / 1000.0
}
