//! Engine configuration
//!
//! Everything needed to start an engine process: the command line, its
//! environment, the text encoding spoken over the pipes, and default
//! timeouts. Locating an engine installation on the host is not done here;
//! the executable path must be supplied.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::framing::resolve_encoding;
use crate::models::CallTimeout;
use crate::process::EngineCommand;

/// Built-in default for interactive calls
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Built-in default for batch runs
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(180);

/// Encoding used when none is configured
pub const DEFAULT_ENCODING: &str = "US-ASCII";

/// Configuration for launching engine processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the engine executable
    pub executable_path: PathBuf,

    /// Arguments passed to the executable
    pub arguments: Vec<String>,

    /// Exact environment for the engine; `None` inherits ours
    pub environment: Option<BTreeMap<String, String>>,

    /// Text encoding label used for input and output
    pub encoding: String,

    /// Default timeout for interactive calls, in seconds
    /// (0 = built-in default, negative = no timeout)
    pub default_call_timeout: i64,

    /// Default timeout for batch runs, in seconds
    /// (0 = built-in default, negative = no timeout)
    pub default_batch_timeout: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executable_path: PathBuf::new(),
            arguments: Vec::new(),
            environment: None,
            encoding: DEFAULT_ENCODING.to_string(),
            default_call_timeout: 0,
            default_batch_timeout: 0,
        }
    }
}

impl EngineConfig {
    /// Configuration for the given executable with everything else defaulted
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
            ..Self::default()
        }
    }

    /// Check the configuration can be used to launch an engine
    pub fn validate(&self) -> Result<()> {
        if self.executable_path.as_os_str().is_empty() {
            return Err(Error::MissingExecutable);
        }
        resolve_encoding(&self.encoding)?;
        Ok(())
    }

    /// The command line this configuration describes
    pub fn command(&self) -> EngineCommand {
        EngineCommand {
            program: self.executable_path.clone(),
            args: self.arguments.clone(),
            environment: self.environment.clone(),
        }
    }

    /// Effective default for interactive calls
    pub fn call_timeout(&self) -> CallTimeout {
        resolve_timeout(self.default_call_timeout, DEFAULT_CALL_TIMEOUT)
    }

    /// Effective default for batch runs
    pub fn batch_timeout(&self) -> CallTimeout {
        resolve_timeout(self.default_batch_timeout, DEFAULT_BATCH_TIMEOUT)
    }
}

/// Apply the seconds convention, substituting `built_in` for zero
pub fn resolve_timeout(configured: i64, built_in: Duration) -> CallTimeout {
    CallTimeout::from_seconds(configured).or(CallTimeout::After(built_in))
}
