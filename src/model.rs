//! Data model shared by the discovery sources and the collection pass.
//!
//! All values here are produced fresh for each collection pass and dropped
//! once the pass has emitted its gauges.

use std::collections::BTreeSet;

/// A mounted filesystem discovered before exclusion filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCandidate {
    pub device: String,
    pub fstype: String,
    pub mountpoint: String,
    /// Mount options; only the structured source fills these in.
    pub options: BTreeSet<String>,
}

impl DiskCandidate {
    pub fn new(
        device: impl Into<String>,
        fstype: impl Into<String>,
        mountpoint: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            fstype: fstype.into(),
            mountpoint: mountpoint.into(),
            options: BTreeSet::new(),
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Space usage of a mountpoint in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UsageSample {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    /// Percentage in [0, 100] as reported by the OS.
    pub used_percent: f64,
}

/// Inode counts of a mountpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InodeSample {
    pub total: u64,
    pub free: u64,
}

/// Cumulative I/O time of one kernel block device, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounterSample {
    pub read_time_ms: u64,
    pub write_time_ms: u64,
}

/// Platform family, which decides the cdrom exclusion and inode collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Whether the platform exposes inode counts.
    pub fn has_inodes(self) -> bool {
        matches!(self, Platform::Unix)
    }
}
