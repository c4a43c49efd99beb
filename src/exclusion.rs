//! Instance configuration and the device exclusion policy.
//!
//! The instance configuration is what users write; [`ExclusionConfig`] is the
//! resolved, immutable form built at the start of each collection pass, with
//! the exclusion regex compiled and the legacy fallback applied.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::model::{DiskCandidate, Platform};

/// Virtual devices that never carry real storage.
pub const FAKE_DEVICES: &[&str] = &["udev", "sysfs", "rpc_pipefs", "proc", "devpts"];

/// Exclusion regex that matches nothing but the empty device name.
pub const DEFAULT_EXCLUDED_DISK_RE: &str = "^$";

/// Per-instance configuration as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceConfig {
    /// Report metrics under the mountpoint instead of the device path
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub use_mount: Option<bool>,

    /// Filesystem types to skip, e.g. `tmpfs`
    #[serde(default)]
    pub excluded_filesystems: Vec<String>,

    /// Device names to skip (exact match)
    #[serde(default)]
    pub excluded_disks: Vec<String>,

    /// Device names to skip (anchored at the start of the name)
    #[serde(default)]
    pub excluded_disk_re: Option<String>,

    /// Add the filesystem type as a tag
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub tag_by_filesystem: Option<bool>,

    /// Include pseudo, memory and duplicate mounts in the mount table query
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub all_partitions: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Accepts YAML booleans, integers (non-zero is true) and the affirmative
/// strings `yes`, `true`, `1` and `on`.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = Option::<Flag>::deserialize(deserializer)?;
    Ok(flag.map(|f| match f {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Text(s) => is_affirmative(&s),
    }))
}

pub fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}

/// Resolved exclusion settings for one collection pass.
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    pub use_mount: bool,
    pub excluded_filesystems: BTreeSet<String>,
    pub excluded_devices: BTreeSet<String>,
    pub excluded_device_regex: Regex,
    pub tag_by_filesystem: bool,
    pub include_all_partitions: bool,
}

impl ExclusionConfig {
    /// Builds the pass configuration from an instance.
    ///
    /// `legacy_device_re` is the global `device_blacklist_re` setting; it only
    /// applies when the instance leaves `excluded_disk_re` at its default.
    pub fn load(instance: &InstanceConfig, legacy_device_re: Option<&str>) -> Result<Self> {
        let pattern = effective_disk_re(instance, legacy_device_re);
        let excluded_device_regex = Regex::new(pattern).map_err(|source| Error::InvalidRegex {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            use_mount: instance.use_mount.unwrap_or(false),
            excluded_filesystems: instance.excluded_filesystems.iter().cloned().collect(),
            excluded_devices: instance.excluded_disks.iter().cloned().collect(),
            excluded_device_regex,
            tag_by_filesystem: instance.tag_by_filesystem.unwrap_or(false),
            include_all_partitions: instance.all_partitions.unwrap_or(true),
        })
    }

    /// Returns true when the device/filesystem pair must not be reported.
    pub fn should_exclude(&self, device: &str, fstype: &str) -> bool {
        FAKE_DEVICES.contains(&device)
            || self.excluded_devices.contains(device)
            || self.matches_excluded_re(device)
            || self.excluded_filesystems.contains(fstype)
    }

    /// Exclusion check for mount table entries, which also skips optical
    /// drives with no medium on Windows; querying those can hang.
    pub fn should_exclude_partition(&self, candidate: &DiskCandidate, platform: Platform) -> bool {
        let unready_drive = platform == Platform::Windows
            && (candidate.options.contains("cdrom") || candidate.fstype.is_empty());
        unready_drive || self.should_exclude(&candidate.device, &candidate.fstype)
    }

    /// Tags attached to every metric of a device.
    pub fn tags_for(&self, fstype: &str) -> Vec<String> {
        if self.tag_by_filesystem {
            vec![fstype.to_string()]
        } else {
            Vec::new()
        }
    }

    /// The identity a device's metrics are reported under.
    pub fn device_name<'a>(&self, device: &'a str, mountpoint: &'a str) -> &'a str {
        if self.use_mount {
            mountpoint
        } else {
            device
        }
    }

    // Anchored at the start only, like a prefix match.
    fn matches_excluded_re(&self, device: &str) -> bool {
        self.excluded_device_regex
            .find(device)
            .is_some_and(|m| m.start() == 0)
    }
}

fn effective_disk_re<'a>(instance: &'a InstanceConfig, legacy: Option<&'a str>) -> &'a str {
    match instance.excluded_disk_re.as_deref() {
        Some(re) if re != DEFAULT_EXCLUDED_DISK_RE => re,
        _ => legacy.unwrap_or(DEFAULT_EXCLUDED_DISK_RE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(instance: InstanceConfig) -> ExclusionConfig {
        ExclusionConfig::load(&instance, None).expect("valid config")
    }

    #[test]
    fn test_defaults() {
        let cfg = config(InstanceConfig::default());
        assert!(!cfg.use_mount);
        assert!(!cfg.tag_by_filesystem);
        assert!(cfg.include_all_partitions);
        assert_eq!(cfg.excluded_device_regex.as_str(), "^$");
        assert!(!cfg.should_exclude("/dev/sda1", "ext4"));
    }

    #[test]
    fn test_regex_matches_from_start_only() {
        let cfg = config(InstanceConfig {
            excluded_disk_re: Some("zroot/.+".into()),
            ..Default::default()
        });
        assert!(cfg.should_exclude("zroot/usr", "zfs"));
        assert!(!cfg.should_exclude("zroot", "zfs"));
        assert!(!cfg.should_exclude("pool/zroot/usr", "zfs"));
    }

    #[test]
    fn test_legacy_regex_fallback() {
        let instance = InstanceConfig::default();
        let cfg = ExclusionConfig::load(&instance, Some("/dev/loop")).unwrap();
        assert!(cfg.should_exclude("/dev/loop0", "squashfs"));

        let explicit = InstanceConfig {
            excluded_disk_re: Some("^/dev/sdz".into()),
            ..Default::default()
        };
        let cfg = ExclusionConfig::load(&explicit, Some("/dev/loop")).unwrap();
        assert!(!cfg.should_exclude("/dev/loop0", "squashfs"));
        assert!(cfg.should_exclude("/dev/sdz1", "ext4"));
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let instance = InstanceConfig {
            excluded_disk_re: Some("(unclosed".into()),
            ..Default::default()
        };
        let err = ExclusionConfig::load(&instance, None).unwrap_err();
        assert!(matches!(err, Error::InvalidRegex { .. }));
    }

    #[test]
    fn test_cdrom_only_excluded_on_windows() {
        let cfg = config(InstanceConfig::default());
        let cdrom = DiskCandidate::new("D:\\", "", "D:\\").with_options(["cdrom"]);
        assert!(cfg.should_exclude_partition(&cdrom, Platform::Windows));
        assert!(!cfg.should_exclude_partition(&cdrom, Platform::Unix));

        let fixed = DiskCandidate::new("C:\\", "NTFS", "C:\\").with_options(["rw", "fixed"]);
        assert!(!cfg.should_exclude_partition(&fixed, Platform::Windows));
    }

    #[test]
    fn test_affirmative_strings() {
        let yaml = "use_mount: 'yes'\ntag_by_filesystem: 'no'\nall_partitions: false\n";
        let instance: InstanceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(instance.use_mount, Some(true));
        assert_eq!(instance.tag_by_filesystem, Some(false));
        assert_eq!(instance.all_partitions, Some(false));

        assert!(is_affirmative("On"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_integer_flags_nonzero_is_true() {
        let yaml = "use_mount: 2\ntag_by_filesystem: 0\nall_partitions: -1\n";
        let instance: InstanceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(instance.use_mount, Some(true));
        assert_eq!(instance.tag_by_filesystem, Some(false));
        assert_eq!(instance.all_partitions, Some(true));
    }

    #[test]
    fn test_tags_and_device_name() {
        let cfg = config(InstanceConfig {
            use_mount: Some(true),
            tag_by_filesystem: Some(true),
            ..Default::default()
        });
        assert_eq!(cfg.tags_for("ext4"), vec!["ext4".to_string()]);
        assert_eq!(cfg.device_name("/dev/sda1", "/"), "/");
    }
}
