//! Configuration management for herakles-disk-check.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_disk_check::{DiskCheck, InstanceConfig, SourceKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_METRIC_PREFIX: &str = "herakles_";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    /// Prefix for exported metric names
    pub metric_prefix: Option<String>,

    /// Discovery source: auto | mounts | df
    #[serde(default)]
    pub source: SourceKind,

    /// Legacy global exclusion regex, used when the instance sets no
    /// excluded_disk_re of its own
    pub device_blacklist_re: Option<String>,

    /// Disk check instances (at most one)
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            metric_prefix: Some(DEFAULT_METRIC_PREFIX.to_string()),
            source: SourceKind::Auto,
            device_blacklist_re: None,
            instances: Vec::new(),
        }
    }
}

impl Config {
    /// Starting point written by the `config` command. Unlike the built-in
    /// default it skips memory-backed and container overlay filesystems.
    pub fn generated() -> Self {
        Self {
            instances: vec![InstanceConfig {
                use_mount: Some(false),
                excluded_filesystems: vec!["tmpfs".into(), "devtmpfs".into(), "overlay".into()],
                excluded_disks: Vec::new(),
                excluded_disk_re: Some("^$".into()),
                tag_by_filesystem: Some(false),
                all_partitions: Some(true),
            }],
            ..Self::default()
        }
    }

    /// Builds the disk check for this configuration.
    pub fn disk_check(&self) -> herakles_disk_check::Result<DiskCheck> {
        DiskCheck::new(&self.instances, self.device_blacklist_re.as_deref())
    }

    pub fn metric_prefix(&self) -> &str {
        self.metric_prefix.as_deref().unwrap_or(DEFAULT_METRIC_PREFIX)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    cfg.disk_check()?;

    let prefix = cfg.metric_prefix();
    let valid_prefix = prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !prefix.starts_with(|c: char| c.is_ascii_digit());
    if !valid_prefix {
        return Err(format!("Invalid metric_prefix '{}'", prefix).into());
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(source) = args.source {
        config.source = source;
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        PathBuf::from(p)
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/disk-check.yaml",
            "/etc/herakles/disk-check.yml",
            "/etc/herakles/disk-check.json",
            "./herakles-disk-check.yaml",
            "./herakles-disk-check.yml",
            "./herakles-disk-check.json",
        ];

        defaults
            .iter()
            .find(|p| Path::new(p).exists())
            .map(PathBuf::from)
            .unwrap_or_default()
    };

    if path.as_os_str().is_empty() {
        return Ok(Config::default());
    }
    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
