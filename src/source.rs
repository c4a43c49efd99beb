//! Discovery sources.
//!
//! A [`DiscoverySource`] turns the host's mount table into readings for the
//! accepted devices. There are two: [`StructuredSource`] queries the mount
//! table and statvfs directly and also reports I/O latency; [`DfSource`]
//! parses `df` output where no mount table is available.
//!
//! The OS primitives sit behind the [`MountTable`], [`StatFs`] and
//! [`CommandRunner`] traits so both sources can run against canned data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::df::{parse_df_output, DF_ARGS, DF_PROGRAM};
use crate::error::Result;
use crate::exclusion::ExclusionConfig;
use crate::latency::{correlate, LatencyReading, ValidDiskIndex};
use crate::metrics::{InodeMetrics, SpaceMetrics};
use crate::model::{DiskCandidate, InodeSample, IoCounterSample, Platform, UsageSample};

/// Which discovery source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Mount table when readable, df otherwise
    #[default]
    Auto,
    /// Mount table, statvfs and kernel I/O counters
    Mounts,
    /// Parsed `df -T -k` output
    Df,
}

/// Mount enumeration and I/O counter primitives.
pub trait MountTable {
    /// Mounted filesystems. With `all == false` only physical devices.
    fn partitions(&self, all: bool) -> Result<Vec<DiskCandidate>>;

    /// Cumulative I/O times keyed by kernel device name, e.g. `sda1`.
    fn io_counters(&self) -> Result<BTreeMap<String, IoCounterSample>>;
}

/// Filesystem statistics keyed by mountpoint.
pub trait StatFs {
    fn usage(&self, mountpoint: &str) -> Result<UsageSample>;
    fn inodes(&self, mountpoint: &str) -> Result<InodeSample>;
}

/// Runs an external command and returns its stdout.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// Metrics gathered for one accepted device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskReading {
    pub candidate: DiskCandidate,
    pub space: SpaceMetrics,
    pub inodes: Option<InodeMetrics>,
}

/// Result of one discovery run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub readings: Vec<DiskReading>,
    /// Only filled by the structured source.
    pub latency: Vec<LatencyReading>,
}

pub trait DiscoverySource {
    fn name(&self) -> &'static str;
    fn collect(&self, exclusion: &ExclusionConfig) -> Result<Collection>;
}

fn inode_metrics<S: StatFs>(
    stat: &S,
    platform: Platform,
    mountpoint: &str,
) -> Result<Option<InodeMetrics>> {
    if !platform.has_inodes() {
        return Ok(None);
    }
    let sample = stat.inodes(mountpoint)?;
    Ok(InodeMetrics::from_sample(&sample))
}

/// Discovery through the mount table and statvfs.
pub struct StructuredSource<M, S> {
    mounts: M,
    stat: S,
    platform: Platform,
}

impl<M: MountTable, S: StatFs> StructuredSource<M, S> {
    pub fn new(mounts: M, stat: S, platform: Platform) -> Self {
        Self {
            mounts,
            stat,
            platform,
        }
    }
}

impl<M: MountTable, S: StatFs> DiscoverySource for StructuredSource<M, S> {
    fn name(&self) -> &'static str {
        "mounts"
    }

    fn collect(&self, exclusion: &ExclusionConfig) -> Result<Collection> {
        let mut index = ValidDiskIndex::new();
        let mut readings = Vec::new();

        for part in self.mounts.partitions(exclusion.include_all_partitions)? {
            if exclusion.should_exclude_partition(&part, self.platform) {
                continue;
            }
            index.insert(&part.device, &part.fstype, &part.mountpoint);
            debug!("Passed: {}", part.device);

            let usage = self.stat.usage(&part.mountpoint)?;
            let inodes = inode_metrics(&self.stat, self.platform, &part.mountpoint)?;
            readings.push(DiskReading {
                space: SpaceMetrics::from_usage(&usage),
                inodes,
                candidate: part,
            });
        }

        let counters = self.mounts.io_counters()?;
        let latency = correlate(&index, &counters);

        Ok(Collection { readings, latency })
    }
}

/// Discovery through `df -T -k`.
pub struct DfSource<R, S> {
    runner: R,
    stat: S,
    platform: Platform,
}

impl<R: CommandRunner, S: StatFs> DfSource<R, S> {
    pub fn new(runner: R, stat: S, platform: Platform) -> Self {
        Self {
            runner,
            stat,
            platform,
        }
    }
}

impl<R: CommandRunner, S: StatFs> DiscoverySource for DfSource<R, S> {
    fn name(&self) -> &'static str {
        "df"
    }

    fn collect(&self, exclusion: &ExclusionConfig) -> Result<Collection> {
        let output = self.runner.run(DF_PROGRAM, DF_ARGS)?;
        debug!("{}", output);

        let mut readings = Vec::new();
        for row in parse_df_output(&output, exclusion) {
            debug!("Passed: {}", row.candidate.device);
            let inodes = inode_metrics(&self.stat, self.platform, &row.candidate.mountpoint)?;
            readings.push(DiskReading {
                candidate: row.candidate,
                space: row.space,
                inodes,
            });
        }

        Ok(Collection {
            readings,
            latency: Vec::new(),
        })
    }
}
