//! Configuration for opsdeck.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (OPSDECK_HOME, OPSDECK_CONFIG, OPSDECK_LISTEN, OPSDECK_DB)
//! 2. Config file ($OPSDECK_HOME/config.yaml)
//! 3. Defaults (~/.opsdeck, 127.0.0.1:8080, ops.db)
//!
//! Relative paths in the config file resolve against the opsdeck home
//! directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::seed::DEMO_OPERATOR_ID;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Listen address for the HTTP server
    pub listen: Option<String>,
    /// Database file (relative to opsdeck home)
    pub database: Option<String>,
    #[serde(default)]
    pub execution: Option<ExecutionConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionConfig {
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub failure_rate: Option<f64>,
    pub command_timeout_seconds: Option<u64>,
    pub operator: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to opsdeck home (state directory)
    pub home: PathBuf,
    /// Listen address for the HTTP server
    pub listen: String,
    /// Absolute path to the database file
    pub database: PathBuf,
    /// Execution settings
    pub execution: ExecutionSettings,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Lower bound of the scripted transport's latency, milliseconds
    pub min_delay_ms: u64,
    /// Upper bound of the scripted transport's latency, milliseconds
    pub max_delay_ms: u64,
    /// Probability that an unmatched command fails synthetically
    pub failure_rate: f64,
    /// Deadline for one transport call, seconds
    pub command_timeout_seconds: u64,
    /// Acting operator id for console submissions
    pub operator: String,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: 500,
            max_delay_ms: 3500,
            failure_rate: 0.1,
            command_timeout_seconds: 30,
            operator: DEMO_OPERATOR_ID.to_string(),
        }
    }
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

impl ResolvedConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let home = match std::env::var("OPSDECK_HOME") {
            Ok(env_home) => PathBuf::from(env_home),
            Err(_) => dirs::home_dir()
                .context("Failed to determine home directory")?
                .join(".opsdeck"),
        };

        let config_path = match std::env::var("OPSDECK_CONFIG") {
            Ok(p) => Some(PathBuf::from(p)),
            Err(_) => {
                let default = home.join("config.yaml");
                default.exists().then_some(default)
            }
        };

        let file = match config_path {
            Some(ref path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        let listen = std::env::var("OPSDECK_LISTEN")
            .ok()
            .or(file.listen)
            .unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let database = std::env::var("OPSDECK_DB")
            .ok()
            .or(file.database)
            .map(|p| resolve_path(&home, &p))
            .unwrap_or_else(|| home.join("ops.db"));

        let defaults = ExecutionSettings::default();
        let exec_file = file.execution.unwrap_or_default();
        let execution = ExecutionSettings {
            min_delay_ms: exec_file.min_delay_ms.unwrap_or(defaults.min_delay_ms),
            max_delay_ms: exec_file.max_delay_ms.unwrap_or(defaults.max_delay_ms),
            failure_rate: exec_file.failure_rate.unwrap_or(defaults.failure_rate),
            command_timeout_seconds: exec_file
                .command_timeout_seconds
                .unwrap_or(defaults.command_timeout_seconds),
            operator: exec_file.operator.unwrap_or(defaults.operator),
        };

        Ok(Self {
            home,
            listen,
            database,
            execution,
            config_file: config_path,
        })
    }
}
