//! Engine Launcher
//!
//! Turns an [`EngineConfig`] into running sessions and batch runs. The
//! configuration is checked once, up front, so a bad executable path or
//! encoding is reported before any process is started.
//!
//! The configured executable must be the engine process itself. When an
//! installation only offers a wrapper script that does not pass signals on,
//! configure the underlying binary instead, otherwise a timed out call can
//! leave the real engine running.

use std::io::{Read, Write};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::framing::{resolve_encoding, TextEncoding};
use crate::models::{CallTimeout, TerminationOutcome};
use crate::process::{spawn_engine_process, EngineCommand, ProcessController, StderrSink};
use crate::session::{BatchRunner, InteractiveSession};

/// Starts engine processes from a validated configuration
#[derive(Debug, Clone)]
pub struct Launcher {
    config: EngineConfig,
    command: EngineCommand,
    encoding: TextEncoding,
}

impl Launcher {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let encoding = resolve_encoding(&config.encoding)?;
        let command = config.command();
        command.validate()?;

        debug!("Engine launcher ready for '{}' ({})", command, encoding.name());
        Ok(Self {
            config,
            command,
            encoding,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start an interactive session, discarding engine stderr
    pub fn launch_session(&self) -> Result<InteractiveSession> {
        self.start_session(None)
    }

    /// Start an interactive session forwarding engine stderr to `stderr`
    pub fn launch_session_with_stderr(&self, stderr: StderrSink) -> Result<InteractiveSession> {
        self.start_session(Some(stderr))
    }

    fn start_session(&self, stderr: Option<StderrSink>) -> Result<InteractiveSession> {
        info!("Launching interactive engine session");
        let controller = self.new_controller(stderr)?;
        InteractiveSession::start(controller, self.encoding, self.config.call_timeout())
    }

    /// Feed `input` to a fresh engine and copy everything it prints to `output`
    ///
    /// Uses the configured batch timeout and discards engine stderr.
    pub fn run_batch<R, W>(&self, input: R, output: W) -> Result<TerminationOutcome>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        self.run_batch_with(input, output, None, CallTimeout::Default)
    }

    /// [`Launcher::run_batch`] with a stderr sink and explicit timeout
    ///
    /// [`CallTimeout::Default`] selects the configured batch timeout.
    pub fn run_batch_with<R, W>(
        &self,
        input: R,
        output: W,
        stderr: Option<StderrSink>,
        timeout: CallTimeout,
    ) -> Result<TerminationOutcome>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let controller = self.new_controller(stderr)?;
        let timeout = timeout.or(self.config.batch_timeout());
        BatchRunner::new(controller, Box::new(input), Box::new(output)).run(timeout)
    }

    fn new_controller(&self, stderr: Option<StderrSink>) -> Result<ProcessController> {
        let child = spawn_engine_process(&self.command)?;
        ProcessController::new(child, stderr)
    }
}
