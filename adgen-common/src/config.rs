//! Configuration loading and output root resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML config file
//! 4. Built-in defaults

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ADGEN_CONFIG";

/// Environment variable naming the audio output root
pub const OUTPUT_DIR_ENV_VAR: &str = "ADGEN_OUTPUT_DIR";

/// Output root used when nothing else is configured
pub const DEFAULT_OUTPUT_DIR: &str = "generated/audio";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the config file to load, if any.
///
/// Order: CLI path → `ADGEN_CONFIG` → `<config_dir>/adgen/<file_name>` →
/// `/etc/adgen/<file_name>` (Linux only). Discovered defaults are only
/// returned when they exist; explicit paths are returned as given so a
/// typo surfaces as a load error instead of silently using defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("adgen").join(file_name));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/adgen").join(file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Read and parse a TOML config file
pub fn load_toml_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
    })?;

    let config = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e))
    })?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Load config from `path` when given, otherwise fall back to defaults
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => load_toml_config(path),
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(T::default())
        }
    }
}

/// Output root resolution: CLI → `ADGEN_OUTPUT_DIR` → TOML → default
#[derive(Debug, Clone)]
pub struct OutputRootResolver {
    env_var_name: String,
}

impl OutputRootResolver {
    pub fn new() -> Self {
        Self {
            env_var_name: OUTPUT_DIR_ENV_VAR.to_string(),
        }
    }

    /// Use a different environment variable (tests, embedding)
    pub fn with_env_var(env_var_name: impl Into<String>) -> Self {
        Self {
            env_var_name: env_var_name.into(),
        }
    }

    pub fn resolve(&self, cli_arg: Option<&Path>, toml_value: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = toml_value {
            return path.to_path_buf();
        }

        PathBuf::from(DEFAULT_OUTPUT_DIR)
    }
}

impl Default for OutputRootResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Create `path` (and parents) if missing
pub fn ensure_directory(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(Error::InvalidInput(format!(
            "{} exists and is not a directory",
            path.display()
        )));
    }
    std::fs::create_dir_all(path)?;
    info!("Created directory {}", path.display());
    Ok(())
}
