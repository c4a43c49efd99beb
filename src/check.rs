//! The collection pass.
//!
//! A pass resolves the exclusion configuration, asks the discovery source for
//! readings, turns them into gauges and only then hands them to the sink, so a
//! failing pass emits nothing.

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::exclusion::{ExclusionConfig, InstanceConfig};
use crate::metrics::{DISK_READ_TIME_PCT, DISK_TOTAL, DISK_WRITE_TIME_PCT};
use crate::sink::{GaugeSample, MetricSink};
use crate::source::{Collection, DiscoverySource};

/// Disk check for a single configured instance.
#[derive(Debug, Clone)]
pub struct DiskCheck {
    instance: InstanceConfig,
    legacy_device_re: Option<String>,
}

impl DiskCheck {
    /// Sets up the check. At most one instance may be configured; with none
    /// the defaults apply.
    pub fn new(instances: &[InstanceConfig], legacy_device_re: Option<&str>) -> Result<Self> {
        if instances.len() > 1 {
            return Err(Error::TooManyInstances(instances.len()));
        }
        let check = Self {
            instance: instances.first().cloned().unwrap_or_default(),
            legacy_device_re: legacy_device_re.map(str::to_string),
        };
        // Surface a bad regex at setup rather than on the first pass.
        check.exclusion()?;
        Ok(check)
    }

    pub fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    /// Exclusion configuration for a new pass.
    pub fn exclusion(&self) -> Result<ExclusionConfig> {
        ExclusionConfig::load(&self.instance, self.legacy_device_re.as_deref())
    }

    /// Runs discovery and returns the gauges of the pass.
    pub fn collect(&self, source: &dyn DiscoverySource) -> Result<Vec<GaugeSample>> {
        let exclusion = self.exclusion()?;
        let collection = source.collect(&exclusion)?;
        Ok(to_samples(&exclusion, &collection))
    }

    /// Runs a pass and emits its gauges.
    pub fn run(
        &self,
        source: &dyn DiscoverySource,
        sink: &mut dyn MetricSink,
    ) -> Result<PassSummary> {
        let samples = self.collect(source)?;
        sink.begin_pass();
        for s in &samples {
            sink.gauge(&s.name, s.value, &s.tags, &s.device_name);
        }
        Ok(PassSummary {
            gauges: samples.len(),
            devices: samples.iter().filter(|s| s.name == DISK_TOTAL).count(),
        })
    }
}

/// What a successful pass emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    pub gauges: usize,
    pub devices: usize,
}

fn to_samples(exclusion: &ExclusionConfig, collection: &Collection) -> Vec<GaugeSample> {
    let mut samples = Vec::new();
    let mut seen = BTreeSet::new();

    for reading in &collection.readings {
        let disk = &reading.candidate;
        let device_name = exclusion.device_name(&disk.device, &disk.mountpoint);
        if !seen.insert(device_name.to_string()) {
            debug!("Skipping duplicate mount of {}", device_name);
            continue;
        }
        let tags = exclusion.tags_for(&disk.fstype);

        let gauges = reading
            .space
            .gauges()
            .into_iter()
            .chain(reading.inodes.iter().flat_map(|i| i.gauges()));
        for (name, value) in gauges {
            samples.push(sample(name, value, &tags, device_name));
        }
    }

    for latency in &collection.latency {
        let device_name = exclusion.device_name(&latency.device, &latency.mountpoint);
        let tags = exclusion.tags_for(&latency.fstype);
        samples.push(sample(DISK_READ_TIME_PCT, latency.read_time_pct, &tags, device_name));
        samples.push(sample(DISK_WRITE_TIME_PCT, latency.write_time_pct, &tags, device_name));
    }

    samples
}

fn sample(name: &str, value: f64, tags: &[String], device_name: &str) -> GaugeSample {
    GaugeSample {
        name: name.to_string(),
        value,
        tags: tags.to_vec(),
        device_name: device_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::LatencyReading;
    use crate::metrics::{InodeMetrics, SpaceMetrics};
    use crate::model::DiskCandidate;
    use crate::source::DiskReading;

    fn reading(device: &str, mountpoint: &str) -> DiskReading {
        DiskReading {
            candidate: DiskCandidate::new(device, "ext4", mountpoint),
            space: SpaceMetrics {
                total_kb: 5.0,
                used_kb: Some(4.0),
                free_kb: Some(1.0),
                in_use: Some(0.8),
            },
            inodes: None,
        }
    }

    #[test]
    fn test_too_many_instances() {
        let instances = vec![InstanceConfig::default(), InstanceConfig::default()];
        let err = DiskCheck::new(&instances, None).unwrap_err();
        assert!(matches!(err, Error::TooManyInstances(2)));
    }

    #[test]
    fn test_duplicate_identity_emitted_once() {
        let exclusion = ExclusionConfig::load(&InstanceConfig::default(), None).unwrap();
        let collection = Collection {
            readings: vec![reading("/dev/sda1", "/"), reading("/dev/sda1", "/mnt/bind")],
            latency: Vec::new(),
        };
        let samples = to_samples(&exclusion, &collection);
        assert_eq!(samples.len(), 4);
    }

    #[test]
    fn test_use_mount_and_tags() {
        let instance = InstanceConfig {
            use_mount: Some(true),
            tag_by_filesystem: Some(true),
            ..Default::default()
        };
        let exclusion = ExclusionConfig::load(&instance, None).unwrap();
        let mut with_inodes = reading("/dev/sda1", "/");
        with_inodes.inodes = Some(InodeMetrics {
            total: 10,
            free: 9,
            used: 1,
            in_use: 0.1,
        });
        let collection = Collection {
            readings: vec![with_inodes],
            latency: vec![LatencyReading {
                device: "/dev/sda1".into(),
                fstype: "ext4".into(),
                mountpoint: "/".into(),
                read_time_pct: 1.5,
                write_time_pct: 2.5,
            }],
        };
        let samples = to_samples(&exclusion, &collection);
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| s.device_name == "/"));
        assert!(samples.iter().all(|s| s.tags == vec!["ext4".to_string()]));
    }
}
