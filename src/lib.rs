//! maxima-driver - drive an interactive Maxima process over pipes
//!
//! Maxima is a REPL: it reads statements ending in `;` or `$` and answers
//! with free-form text followed by a new input prompt. Nothing in that text
//! says where a response ends. This crate wraps the process behind a
//! synchronous call/response API, synthesizing the framing, decoding the
//! byte stream incrementally and enforcing per-call timeouts.
//!
//! ## Module Organization
//!
//! - [`launcher`] - Validates configuration and starts engine processes
//! - [`session`] - Interactive sessions, batch runs, session pooling
//! - [`process`] - Process ownership, stream pumping, timeouts, termination
//! - [`framing`] - Incremental decoding and end-of-response detection
//! - [`output`] - Parsing raw call output into results
//! - [`config`] - Engine configuration and config file loading
//! - [`models`] - Timeout, state and termination types
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use maxima_driver::{output, EngineConfig, Launcher};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let launcher = Launcher::new(EngineConfig::new("/usr/bin/maxima"))?;
//! let session = launcher.launch_session()?;
//!
//! let raw = session.execute_call("1+2;")?;
//! assert_eq!(output::parse_single_linear_output_result(&raw).as_deref(), Some("3"));
//!
//! session.terminate();
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! Every session owns a small tokio runtime whose blocking pool runs the
//! stdin writer and stdout reader of the current call. The public API is
//! blocking and must not be called from inside an async runtime; use
//! `spawn_blocking` there. Only one call may be in flight per session;
//! overlapping calls fail with [`Error::CallInFlight`].
//!
//! ## Logging
//!
//! Everything is logged through `tracing`, tagged with the session id.
//! Raw pipe traffic is logged at `trace` level. No subscriber is installed
//! by this crate.

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod framing;
pub mod launcher;
pub mod models;
pub mod output;
pub mod process;
pub mod session;

// Re-exports for core functionality
pub use config::loader::ConfigLoader;
pub use config::EngineConfig;
pub use error::{Error, ErrorKind, Result};
pub use launcher::Launcher;
pub use models::{CallTimeout, SessionState, TerminationOutcome};
pub use output::{LinearOutput, OutputParser};
pub use session::{
    BatchRunner, InteractiveSession, LauncherSessionFactory, OneShotSessionManager,
    SessionFactory, SessionManager, SessionPool,
};

// Version information
/// The current version of maxima-driver from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Build a [`Launcher`] from the first configuration file found
///
/// Looks where [`ConfigLoader::load`] looks and applies environment
/// overrides. Fails if the result does not name a usable engine.
pub fn init() -> Result<Launcher> {
    info!("Initializing {} v{}", NAME, VERSION);
    let mut loader = ConfigLoader::new();
    let config = loader.load()?;
    match loader.current_path() {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("Using default configuration"),
    }
    Launcher::new(config)
}

/// Build a [`Launcher`] from a specific configuration file
pub fn init_with_config(config_path: &std::path::Path) -> Result<Launcher> {
    info!(
        "Initializing {} v{} with config: {}",
        NAME,
        VERSION,
        config_path.display()
    );
    let config = ConfigLoader::load_from_path(config_path)?;
    Launcher::new(ConfigLoader::apply_env_overrides(config)?)
}
