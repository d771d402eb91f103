use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 4500;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

/// On-disk server configuration (`config.toml` in the data directory).
///
/// CLI flags and environment variables override file values; the file
/// overrides the built-in defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    /// Write logs to this file path (rotated daily) in addition to stdout.
    pub log_file: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            port: None,
            bind_address: None,
            log_level: None,
            log_file: None,
        }
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Merge defaults, `{data_dir}/config.toml`, and CLI/env overrides.
    /// Flag values win over file values.
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log_level: Option<String>,
        bind_address: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let file = load_config_file(&data_dir);

        Self {
            port: port.or(file.port).unwrap_or_else(default_port),
            bind_address: bind_address
                .or(file.bind_address)
                .unwrap_or_else(default_bind_address),
            log_level: log_level.or(file.log_level).unwrap_or_else(default_log_level),
            log_file: log_file.or(file.log_file),
            data_dir,
        }
    }

    pub fn bind(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Default data directory: `~/.taskd` (falls back to `./.taskd` when the
/// home directory cannot be determined).
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskd")
}

fn load_config_file(data_dir: &Path) -> ConfigFile {
    let path = data_dir.join("config.toml");
    if !path.exists() {
        return ConfigFile::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(text) => match toml::from_str(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("invalid config.toml at {}: {e} — using defaults", path.display());
                ConfigFile::default()
            }
        },
        Err(e) => {
            warn!("could not read {}: {e} — using defaults", path.display());
            ConfigFile::default()
        }
    }
}
