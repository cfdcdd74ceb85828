//! Configuration File Loading
//!
//! Loads [`EngineConfig`] from TOML or JSON files, picking the format from
//! the file extension, and layers environment variable overrides on top.

use super::EngineConfig;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_VAR: &str = "MAXIMA_DRIVER_CONFIG";
/// Overrides [`EngineConfig::executable_path`]
pub const EXECUTABLE_PATH_VAR: &str = "MAXIMA_DRIVER_EXECUTABLE";
/// Overrides [`EngineConfig::encoding`]
pub const ENCODING_VAR: &str = "MAXIMA_DRIVER_ENCODING";
/// Overrides [`EngineConfig::default_call_timeout`]
pub const CALL_TIMEOUT_VAR: &str = "MAXIMA_DRIVER_CALL_TIMEOUT";
/// Overrides [`EngineConfig::default_batch_timeout`]
pub const BATCH_TIMEOUT_VAR: &str = "MAXIMA_DRIVER_BATCH_TIMEOUT";

const CONFIG_FILE_STEM: &str = "maxima-driver";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Pick a format from a file extension; anything unrecognised is TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

/// Configuration file loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base paths (without extension) searched in order
    search_paths: Vec<PathBuf>,
    /// Path the last configuration was loaded from
    current_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
            current_path: None,
        }
    }

    /// Find a configuration file, load it and apply environment overrides
    ///
    /// An explicit file named by [`CONFIG_PATH_VAR`] takes precedence over
    /// the search paths. With no file anywhere, defaults are used.
    pub fn load(&mut self) -> Result<EngineConfig> {
        let config = match env::var_os(CONFIG_PATH_VAR) {
            Some(path) => {
                let path = PathBuf::from(path);
                let config = Self::load_from_path(&path)?;
                self.current_path = Some(path);
                config
            }
            None => match self.find_config_file() {
                Some(path) => {
                    let config = Self::load_from_path(&path)?;
                    self.current_path = Some(path);
                    config
                }
                None => {
                    debug!("No configuration file found; using defaults");
                    EngineConfig::default()
                }
            },
        };

        Self::apply_env_overrides(config)
    }

    /// Load a specific configuration file
    pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!("Loading configuration from {}", path.display());
        match ConfigFormat::from_path(path) {
            ConfigFormat::Toml => Self::from_toml_str(&content),
            ConfigFormat::Json => Self::from_json_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<EngineConfig> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<EngineConfig> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save configuration to a specific path, in the format its extension implies
    pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
        let save_failed = |e: std::io::Error| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(save_failed)?;
        }

        let content = match ConfigFormat::from_path(path) {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: "JSON".to_string(),
                    reason: e.to_string(),
                }
            })?,
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                    format: "TOML".to_string(),
                    reason: e.to_string(),
                })?
            }
        };

        fs::write(path, content).map_err(save_failed)?;
        debug!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Override fields from `MAXIMA_DRIVER_*` environment variables
    pub fn apply_env_overrides(mut config: EngineConfig) -> Result<EngineConfig> {
        if let Some(path) = env::var_os(EXECUTABLE_PATH_VAR) {
            config.executable_path = PathBuf::from(path);
        }
        if let Ok(encoding) = env::var(ENCODING_VAR) {
            config.encoding = encoding;
        }
        if let Some(seconds) = env_seconds(CALL_TIMEOUT_VAR)? {
            config.default_call_timeout = seconds;
        }
        if let Some(seconds) = env_seconds(BATCH_TIMEOUT_VAR)? {
            config.default_batch_timeout = seconds;
        }
        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        for base in &self.search_paths {
            for format in [ConfigFormat::Toml, ConfigFormat::Json] {
                let candidate = base.with_extension(format.extension());
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn default_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join(CONFIG_FILE_STEM));
        }

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(CONFIG_FILE_STEM).join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", CONFIG_FILE_STEM)));
        }

        paths
    }

    /// Get the path the configuration was loaded from
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a custom search path
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn env_seconds(var: &str) -> Result<Option<i64>> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::ConfigParseFailed {
                format: var.to_string(),
                reason: format!("'{}' is not a whole number of seconds: {}", value, e),
            }),
        Err(_) => Ok(None),
    }
}
