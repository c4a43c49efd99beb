//! Space and inode metric arithmetic.
//!
//! Space values are reported in kilobytes, a unit contract kept for existing
//! dashboards. `in_use` values are ratios in [0, 1].

use crate::model::{InodeSample, UsageSample};

pub const DISK_TOTAL: &str = "system.disk.total";
pub const DISK_USED: &str = "system.disk.used";
pub const DISK_FREE: &str = "system.disk.free";
pub const DISK_IN_USE: &str = "system.disk.in_use";
pub const DISK_READ_TIME_PCT: &str = "system.disk.read_time_pct";
pub const DISK_WRITE_TIME_PCT: &str = "system.disk.write_time_pct";
pub const INODES_TOTAL: &str = "system.fs.inodes.total";
pub const INODES_FREE: &str = "system.fs.inodes.free";
pub const INODES_USED: &str = "system.fs.inodes.used";
pub const INODES_IN_USE: &str = "system.fs.inodes.in_use";

/// Every metric name the check can emit.
pub const ALL_METRICS: &[&str] = &[
    DISK_TOTAL,
    DISK_USED,
    DISK_FREE,
    DISK_IN_USE,
    DISK_READ_TIME_PCT,
    DISK_WRITE_TIME_PCT,
    INODES_TOTAL,
    INODES_FREE,
    INODES_USED,
    INODES_IN_USE,
];

/// Space metrics of one device, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceMetrics {
    pub total_kb: f64,
    /// Absent when a df row carries no numeric value in the column.
    pub used_kb: Option<f64>,
    pub free_kb: Option<f64>,
    /// Absent when the source did not report a usable percentage.
    pub in_use: Option<f64>,
}

impl SpaceMetrics {
    /// From a byte-based usage query. `in_use` follows the OS-reported
    /// percentage, which accounts for reserved blocks and so may differ from
    /// `used / total`.
    pub fn from_usage(usage: &UsageSample) -> Self {
        Self {
            total_kb: usage.total_bytes as f64 / 1024.0,
            used_kb: Some(usage.used_bytes as f64 / 1024.0),
            free_kb: Some(usage.free_bytes as f64 / 1024.0),
            in_use: Some(usage.used_percent / 100.0),
        }
    }

    pub fn gauges(&self) -> Vec<(&'static str, f64)> {
        let optional = [
            (DISK_USED, self.used_kb),
            (DISK_FREE, self.free_kb),
            (DISK_IN_USE, self.in_use),
        ];
        std::iter::once((DISK_TOTAL, self.total_kb))
            .chain(optional.into_iter().filter_map(|(name, v)| v.map(|v| (name, v))))
            .collect()
    }
}

/// Inode metrics of one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InodeMetrics {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub in_use: f64,
}

impl InodeMetrics {
    /// Returns `None` for filesystems reporting zero inodes.
    pub fn from_sample(sample: &InodeSample) -> Option<Self> {
        if sample.total == 0 {
            return None;
        }
        let used = sample.total.saturating_sub(sample.free);
        Some(Self {
            total: sample.total,
            free: sample.free,
            used,
            in_use: used as f64 / sample.total as f64,
        })
    }

    pub fn gauges(&self) -> Vec<(&'static str, f64)> {
        vec![
            (INODES_TOTAL, self.total as f64),
            (INODES_FREE, self.free as f64),
            (INODES_USED, self.used as f64),
            (INODES_IN_USE, self.in_use),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_metrics_from_usage() {
        let usage = UsageSample {
            total_bytes: 5 * 1024,
            used_bytes: 4 * 1024,
            free_bytes: 1024,
            used_percent: 80.0,
        };
        let space = SpaceMetrics::from_usage(&usage);
        assert_eq!(space.total_kb, 5.0);
        assert_eq!(space.used_kb, Some(4.0));
        assert_eq!(space.free_kb, Some(1.0));
        assert_eq!(space.in_use, Some(0.8));
        assert_eq!(space.gauges().len(), 4);
    }

    #[test]
    fn test_in_use_keeps_os_percentage() {
        // 5% reserved for root: used/total is 0.5 but the OS reports 52.6%
        let usage = UsageSample {
            total_bytes: 100 * 1024,
            used_bytes: 50 * 1024,
            free_bytes: 45 * 1024,
            used_percent: 52.6,
        };
        let space = SpaceMetrics::from_usage(&usage);
        assert!((space.in_use.unwrap() - 0.526).abs() < 1e-9);
    }

    #[test]
    fn test_inode_metrics() {
        let inodes = InodeMetrics::from_sample(&InodeSample { total: 10, free: 9 }).unwrap();
        assert_eq!(inodes.total, 10);
        assert_eq!(inodes.free, 9);
        assert_eq!(inodes.used, 1);
        assert!((inodes.in_use - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_space_in_use_stays_within_unit_range() {
        let cases = [
            // (total, used, free, percent)
            (100, 0, 100, 0.0),
            (100, 100, 0, 100.0),
            (100, 50, 45, 52.6),
            (0, 0, 0, 0.0),
            (u64::MAX / 2, u64::MAX / 2, 0, 100.0),
        ];
        for (total, used, free, percent) in cases {
            let space = SpaceMetrics::from_usage(&UsageSample {
                total_bytes: total,
                used_bytes: used,
                free_bytes: free,
                used_percent: percent,
            });
            let in_use = space.in_use.unwrap();
            assert!(
                (0.0..=1.0).contains(&in_use),
                "in_use {} out of range for {:?}",
                in_use,
                (total, used, free, percent)
            );
        }
    }

    #[test]
    fn test_inode_in_use_stays_within_unit_range() {
        let cases = [
            // (total, free, expected in_use)
            (10, 0, 1.0),
            (10, 10, 0.0),
            (10, 9, 0.1),
            (1, 0, 1.0),
            // Some filesystems report more free than total inodes
            (10, 12, 0.0),
            (u64::MAX, 0, 1.0),
        ];
        for (total, free, expected) in cases {
            let inodes = InodeMetrics::from_sample(&InodeSample { total, free }).unwrap();
            assert!((0.0..=1.0).contains(&inodes.in_use));
            assert!(
                (inodes.in_use - expected).abs() < 1e-9,
                "in_use for total={} free={}: {}",
                total,
                free,
                inodes.in_use
            );
        }
    }

    #[test]
    fn test_partial_space_emits_only_known_gauges() {
        let space = SpaceMetrics {
            total_kb: 2048.0,
            used_kb: Some(2048.0),
            free_kb: None,
            in_use: None,
        };
        assert_eq!(space.gauges(), vec![(DISK_TOTAL, 2048.0), (DISK_USED, 2048.0)]);
    }

    #[test]
    fn test_zero_inodes_yield_nothing() {
        assert!(InodeMetrics::from_sample(&InodeSample { total: 0, free: 0 }).is_none());
    }
}
