//! Engine Process Spawning
//!
//! Starts the engine with all three standard streams piped. Working out
//! which executable to run is the launcher's business; this module only
//! consumes a ready command line. Whatever process is spawned here must be
//! the engine itself (not a wrapper script), since termination kills this
//! handle and nothing else.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};

/// A fully assembled engine command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable to run
    pub program: PathBuf,
    /// Arguments passed to the executable
    pub args: Vec<String>,
    /// Exact environment for the child; `None` inherits ours
    pub environment: Option<BTreeMap<String, String>>,
}

impl EngineCommand {
    /// Create a command with no arguments and an inherited environment
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            environment: None,
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Check the command is usable before anything is spawned
    pub fn validate(&self) -> Result<()> {
        if self.program.as_os_str().is_empty() {
            return Err(Error::MissingExecutable);
        }

        // Bare names are resolved through PATH at spawn time
        if looks_like_path(&self.program) && !self.program.exists() {
            return Err(Error::LaunchFailed {
                command: self.to_string(),
                reason: "executable does not exist".to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

fn looks_like_path(program: &Path) -> bool {
    program.is_absolute() || program.components().count() > 1
}

/// Spawn the engine with piped stdin, stdout and stderr
pub fn spawn_engine_process(command: &EngineCommand) -> Result<Child> {
    command.validate()?;

    let mut builder = Command::new(&command.program);
    builder
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    if let Some(environment) = &command.environment {
        builder.env_clear();
        builder.envs(environment);
    }

    debug!("Starting engine process: {}", command);
    let child = builder.spawn().map_err(|e| Error::LaunchFailed {
        command: command.to_string(),
        reason: e.to_string(),
    })?;
    trace!("Engine process started with pid {}", child.id());

    Ok(child)
}
