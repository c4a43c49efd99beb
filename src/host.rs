//! Host implementations of the discovery primitives.
//!
//! The mount table and I/O counters come from procfs, usage and inode counts
//! from statvfs, and the text source spawns the real `df`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{DiskCandidate, InodeSample, IoCounterSample, Platform, UsageSample};
use crate::source::{
    CommandRunner, DfSource, DiscoverySource, MountTable, SourceKind, StatFs, StructuredSource,
};

pub const MOUNTS_PATH: &str = "/proc/self/mounts";
pub const FILESYSTEMS_PATH: &str = "/proc/filesystems";
pub const DISKSTATS_PATH: &str = "/proc/diskstats";

/// procfs and statvfs backed primitives.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl MountTable for HostProbe {
    fn partitions(&self, all: bool) -> Result<Vec<DiskCandidate>> {
        let content = fs::read_to_string(MOUNTS_PATH).map_err(|e| Error::io(MOUNTS_PATH, e))?;
        let physical = if all {
            None
        } else {
            let filesystems =
                fs::read_to_string(FILESYSTEMS_PATH).map_err(|e| Error::io(FILESYSTEMS_PATH, e))?;
            Some(parse_physical_filesystems(&filesystems))
        };
        Ok(parse_mounts(&content, physical.as_ref()))
    }

    fn io_counters(&self) -> Result<BTreeMap<String, IoCounterSample>> {
        let content =
            fs::read_to_string(DISKSTATS_PATH).map_err(|e| Error::io(DISKSTATS_PATH, e))?;
        Ok(parse_diskstats(&content))
    }
}

impl StatFs for HostProbe {
    fn usage(&self, mountpoint: &str) -> Result<UsageSample> {
        let stat = statvfs(mountpoint)?;
        let frsize = stat.fragment_size() as u64;
        let total_bytes = stat.blocks() as u64 * frsize;
        let free_bytes = stat.blocks_available() as u64 * frsize;
        let used_bytes = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64) * frsize;

        Ok(UsageSample {
            total_bytes,
            used_bytes,
            free_bytes,
            used_percent: used_percent(used_bytes, free_bytes),
        })
    }

    fn inodes(&self, mountpoint: &str) -> Result<InodeSample> {
        let stat = statvfs(mountpoint)?;
        Ok(InodeSample {
            total: stat.files() as u64,
            free: stat.files_free() as u64,
        })
    }
}

fn statvfs(mountpoint: &str) -> Result<nix::sys::statvfs::Statvfs> {
    nix::sys::statvfs::statvfs(mountpoint).map_err(|source| Error::Stat {
        mountpoint: mountpoint.to_string(),
        source,
    })
}

/// Used share of the space available to unprivileged users, rounded to one
/// decimal like `df` does.
fn used_percent(used: u64, available: u64) -> f64 {
    let total_user = used + available;
    if total_user == 0 {
        return 0.0;
    }
    let pct = used as f64 / total_user as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

/// Runs commands with the C locale so numbers are not localized.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .env("LC_ALL", "C")
            .output()
            .map_err(|source| Error::CommandSpawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Picks the discovery source for this host.
pub fn detect_source(kind: SourceKind) -> Box<dyn DiscoverySource + Send + Sync> {
    let platform = Platform::current();
    let use_mounts = match kind {
        SourceKind::Mounts => true,
        SourceKind::Df => false,
        SourceKind::Auto => fs::File::open(MOUNTS_PATH).is_ok(),
    };

    if use_mounts {
        info!("Using mount table discovery ({})", MOUNTS_PATH);
        Box::new(StructuredSource::new(HostProbe, HostProbe, platform))
    } else {
        info!(
            "Using df discovery ({} {})",
            crate::df::DF_PROGRAM,
            crate::df::DF_ARGS.join(" ")
        );
        Box::new(DfSource::new(SystemCommandRunner, HostProbe, platform))
    }
}

/// Parses `/proc/self/mounts`. With `physical` set, only entries whose
/// filesystem type is listed there are returned.
pub fn parse_mounts(content: &str, physical: Option<&BTreeSet<String>>) -> Vec<DiskCandidate> {
    let mut out = Vec::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }

        let device = unescape_octal(fields[0]);
        let fstype = fields[2];
        if let Some(physical) = physical {
            if device.is_empty() || device == "none" || !physical.contains(fstype) {
                continue;
            }
        }

        out.push(
            DiskCandidate::new(device, fstype, unescape_octal(fields[1]))
                .with_options(fields[3].split(',')),
        );
    }
    out
}

/// Filesystem types backed by a block device, from `/proc/filesystems`.
pub fn parse_physical_filesystems(content: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for line in content.lines() {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some("nodev"), Some("zfs")) => {
                out.insert("zfs".to_string());
            }
            (Some(fstype), None) => {
                out.insert(fstype.to_string());
            }
            _ => {}
        }
    }
    out
}

/// Parses `/proc/diskstats` into read/write times per kernel device name.
///
/// Older kernels print only four counters for partitions; those carry no
/// timing and report zero.
pub fn parse_diskstats(content: &str) -> BTreeMap<String, IoCounterSample> {
    let mut out = BTreeMap::new();
    for line in content.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let sample = match fields.len() {
            n if n >= 14 => IoCounterSample {
                read_time_ms: fields[6].parse().unwrap_or(0),
                write_time_ms: fields[10].parse().unwrap_or(0),
            },
            7 => IoCounterSample::default(),
            _ => {
                debug!("Skipping malformed diskstats line: {}", line);
                continue;
            }
        };
        out.insert(fields[2].to_string(), sample);
    }
    out
}

/// Decodes the `\040`-style escapes the kernel uses for spaces, tabs and
/// backslashes in mount table fields.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(byte) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return None;
    }
    let code = digits
        .iter()
        .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
    u8::try_from(code).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNTS: &str = "\
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
udev /dev devtmpfs rw,nosuid,relatime,size=8119464k 0 0
/dev/sda1 / ext4 rw,relatime,errors=remount-ro 0 0
tmpfs /run tmpfs rw,nosuid,nodev,noexec,relatime 0 0
/dev/sdb1 /mnt/backup\\040disk xfs rw,relatime 0 0
";

    const FILESYSTEMS: &str = "\
nodev\tsysfs
nodev\ttmpfs
nodev\tproc
nodev\tdevtmpfs
\text4
\txfs
nodev\tzfs
";

    #[test]
    fn test_parse_mounts_all() {
        let parts = parse_mounts(MOUNTS, None);
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[3].device, "/dev/sda1");
        assert_eq!(parts[3].fstype, "ext4");
        assert!(parts[3].options.contains("errors=remount-ro"));
        assert_eq!(parts[5].mountpoint, "/mnt/backup disk");
    }

    #[test]
    fn test_parse_mounts_physical_only() {
        let physical = parse_physical_filesystems(FILESYSTEMS);
        assert!(physical.contains("zfs"));
        assert!(!physical.contains("tmpfs"));

        let parts = parse_mounts(MOUNTS, Some(&physical));
        let devices: Vec<&str> = parts.iter().map(|p| p.device.as_str()).collect();
        assert_eq!(devices, vec!["/dev/sda1", "/dev/sdb1"]);
    }

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   8       0 sda 1000 20 30000 400 500 60 7000 800 0 900 1200 0 0 0 0
   8       1 sda1 900 10 20000 15 400 50 6000 25 0 800 1100 0 0 0 0
   8      17 sdb1 10 200 30 400
   7       0 loop0 bad
";
        let stats = parse_diskstats(content);
        assert_eq!(stats.len(), 3);
        assert_eq!(
            stats["sda1"],
            IoCounterSample {
                read_time_ms: 15,
                write_time_ms: 25
            }
        );
        assert_eq!(stats["sdb1"], IoCounterSample::default());
        assert!(!stats.contains_key("loop0"));
    }

    #[test]
    fn test_used_percent() {
        assert_eq!(used_percent(0, 0), 0.0);
        assert_eq!(used_percent(1, 3), 25.0);
        assert_eq!(used_percent(1, 2), 33.3);
    }

    #[test]
    fn test_unescape_octal() {
        assert_eq!(unescape_octal("/mnt/a\\040b"), "/mnt/a b");
        assert_eq!(unescape_octal("/mnt/tab\\011x"), "/mnt/tab\tx");
        assert_eq!(unescape_octal("trailing\\04"), "trailing\\04");
    }

    #[test]
    fn test_host_root_usage() {
        let usage = HostProbe.usage("/").expect("statvfs on / should work");
        assert!(usage.total_bytes > 0);
        assert!((0.0..=100.0).contains(&usage.used_percent));
    }
}
