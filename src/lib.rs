//! Herakles Disk Check Library
//!
//! Collects disk space, inode and I/O latency gauges for every real
//! filesystem mounted on a host.
//!
//! # Overview
//!
//! - **Discovery**: the mount table (with statvfs and kernel I/O counters) or,
//!   where that is unavailable, parsed `df -T -k` output
//! - **Exclusion**: pseudo devices, configured device names and patterns, and
//!   configured filesystem types are dropped
//! - **Metrics**: space in kilobytes, inode counts and `in_use` ratios
//! - **Latency**: kernel counters (`sda1`) are matched back to accepted
//!   devices (`/dev/sda1`)
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_disk_check::{detect_source, DiskCheck, RecordingSink, SourceKind};
//!
//! let check = DiskCheck::new(&[], None).expect("valid configuration");
//! let source = detect_source(SourceKind::Auto);
//!
//! let mut sink = RecordingSink::new();
//! check.run(source.as_ref(), &mut sink).expect("collection pass");
//!
//! for s in &sink.samples {
//!     println!("{} {} = {}", s.device_name, s.name, s.value);
//! }
//! ```

pub mod check;
pub mod df;
pub mod error;
pub mod exclusion;
pub mod host;
pub mod latency;
pub mod metrics;
pub mod model;
pub mod sink;
pub mod source;

// Re-export main types for convenience
pub use check::{DiskCheck, PassSummary};
pub use error::{Error, Result};
pub use exclusion::{ExclusionConfig, InstanceConfig};
pub use host::{detect_source, HostProbe, SystemCommandRunner};
pub use model::{DiskCandidate, InodeSample, IoCounterSample, Platform, UsageSample};
pub use sink::{GaugeSample, MetricSink, PrometheusSink, RecordingSink};
pub use source::{
    CommandRunner, DfSource, DiscoverySource, MountTable, SourceKind, StatFs, StructuredSource,
};
