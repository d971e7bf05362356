//! Configuration file loading.
//!
//! The service reads a TOML file from the first location that exists
//! (explicit path, `./flowsketch.toml`, the platform config directory) and
//! falls back to defaults. The generator credential can also come from the
//! environment, which takes precedence over the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use flowsketch_generate::GeneratorSettings;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const LOCAL_CONFIG: &str = "flowsketch.toml";

/// Environment variables checked for the credential, in order.
pub const API_KEY_VARS: [&str; 2] = ["FLOWSKETCH_API_KEY", "V0_API_KEY"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub generator: GeneratorSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            generator: GeneratorSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Let the environment supply (or replace) the generator credential.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let found = API_KEY_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.trim().is_empty()).map(|v| (*var, v)));
        if let Some((var, key)) = found {
            debug!(var = var; "Using API key from environment");
            self.generator.api_key = Some(key);
        }
    }
}

/// Find and load configuration.
///
/// Search order:
/// 1. Explicit path if provided (must exist)
/// 2. `flowsketch.toml` in the working directory
/// 3. `flowsketch/config.toml` in the platform config directory
/// 4. Defaults
pub fn load_config(explicit_path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new(LOCAL_CONFIG);
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let system_config = config_dir.join("flowsketch").join("config.toml");
        if system_config.exists() {
            info!(
                path = system_config.display().to_string();
                "Loading configuration from system path"
            );
            return load_config_file(&system_config);
        }
        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(ServerConfig::default())
}

fn load_config_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}
