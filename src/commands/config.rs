//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::generated();
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-disk-check.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Disk Check Configuration
# ==================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# metric_prefix: "herakles_"   # Prefix for exported metric names
#
# Discovery
# ---------
# source: auto                 # auto, mounts (/proc/self/mounts) or df (df -T -k)
# device_blacklist_re: null    # Legacy exclusion regex, used when the instance
#                              # leaves excluded_disk_re at "^$"
#
# Instance (at most one)
# ----------------------
# instances:
#   - use_mount: no                  # Report under the mountpoint instead of the device
#     excluded_filesystems: [tmpfs]  # Filesystem types to skip
#     excluded_disks: [/dev/sdz]     # Device names to skip (exact match)
#     excluded_disk_re: "^$"         # Device names to skip (matched from the start)
#     tag_by_filesystem: no          # Tag every gauge with the filesystem type
#     all_partitions: yes            # Include pseudo and duplicate mounts in discovery
#
# Boolean instance keys also accept yes/no, on/off and 1/0.
"#;

    format!("{comments}\n{yaml}")
}
