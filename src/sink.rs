//! Emission sinks for the gauges produced by a collection pass.

use prometheus::{GaugeVec, Opts, Registry};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::metrics::ALL_METRICS;

/// Label names of every exported disk gauge.
pub const LABELS: &[&str] = &["device", "tags"];

/// Receives the gauges of a successful pass.
pub trait MetricSink {
    /// Called once before the gauges of a pass are emitted.
    fn begin_pass(&mut self) {}

    fn gauge(&mut self, name: &str, value: f64, tags: &[String], device_name: &str);
}

/// One emitted gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeSample {
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
    pub device_name: String,
}

/// Keeps the gauges of the most recent pass in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub samples: Vec<GaugeSample>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a gauge for a device, if it was emitted.
    pub fn value(&self, name: &str, device_name: &str) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.name == name && s.device_name == device_name)
            .map(|s| s.value)
    }
}

impl MetricSink for RecordingSink {
    fn begin_pass(&mut self) {
        self.samples.clear();
    }

    fn gauge(&mut self, name: &str, value: f64, tags: &[String], device_name: &str) {
        self.samples.push(GaugeSample {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
            device_name: device_name.to_string(),
        });
    }
}

/// Publishes gauges to a Prometheus registry.
///
/// `system.disk.total` becomes `<prefix>system_disk_total{device, tags}`.
/// Clones share the underlying gauge vectors.
#[derive(Clone)]
pub struct PrometheusSink {
    gauges: BTreeMap<&'static str, GaugeVec>,
}

impl PrometheusSink {
    pub fn new(registry: &Registry, prefix: &str) -> prometheus::Result<Self> {
        let mut gauges = BTreeMap::new();
        for &name in ALL_METRICS {
            let vec = GaugeVec::new(
                Opts::new(prometheus_name(prefix, name), help_for(name)),
                LABELS,
            )?;
            registry.register(Box::new(vec.clone()))?;
            gauges.insert(name, vec);
        }
        Ok(Self { gauges })
    }
}

impl MetricSink for PrometheusSink {
    // Devices that vanished or got excluded must not linger.
    fn begin_pass(&mut self) {
        for vec in self.gauges.values() {
            vec.reset();
        }
    }

    fn gauge(&mut self, name: &str, value: f64, tags: &[String], device_name: &str) {
        let Some(vec) = self.gauges.get(name) else {
            warn!("Dropping unknown metric {}", name);
            return;
        };
        let tags = tags.join(",");
        vec.with_label_values(&[device_name, tags.as_str()]).set(value);
    }
}

pub fn prometheus_name(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, name.replace('.', "_"))
}

fn help_for(name: &str) -> &'static str {
    match name {
        "system.disk.total" => "Filesystem size in kilobytes",
        "system.disk.used" => "Used filesystem space in kilobytes",
        "system.disk.free" => "Free filesystem space in kilobytes",
        "system.disk.in_use" => "Used share of the filesystem as reported by the OS (0.0-1.0)",
        "system.disk.read_time_pct" => "Cumulative time spent reading, in percent of a second",
        "system.disk.write_time_pct" => "Cumulative time spent writing, in percent of a second",
        "system.fs.inodes.total" => "Total inodes",
        "system.fs.inodes.free" => "Free inodes",
        "system.fs.inodes.used" => "Used inodes",
        "system.fs.inodes.in_use" => "Used share of the inodes (0.0-1.0)",
        _ => "Disk check gauge",
    }
}
