//! Error types and Result aliases for maxima-driver

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for maxima-driver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`], for callers that only care about recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unusable executable, encoding or configuration file
    Configuration,
    /// Call input rejected before anything was sent to the engine
    CallerInput,
    /// A call exceeded its deadline; the session has been terminated
    Timeout,
    /// The session was already terminated
    Terminated,
    /// The engine's output could not be read or understood
    Protocol,
    /// Internal precondition violated
    Logic,
}

/// Main error type for maxima-driver
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // === Configuration errors ===
    /// No executable path was configured
    #[error("Engine executable path must not be empty")]
    MissingExecutable,

    /// The configured text encoding is unknown or cannot be used for input
    #[error("Unsupported text encoding '{label}': {reason}")]
    UnsupportedEncoding { label: String, reason: String },

    /// The engine process could not be started
    #[error("Failed to launch '{command}': {reason}")]
    LaunchFailed { command: String, reason: String },

    /// Failed to load configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to write configuration file
    #[error("Failed to save config to '{}': {reason}", path.display())]
    ConfigSaveFailed { path: PathBuf, reason: String },

    /// Failed to parse configuration
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config to {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    // === Caller input errors ===
    /// Empty call input
    #[error("Call input must not be empty")]
    MissingInput,

    /// Call input without an accepted terminator
    #[error("Call input '{input}' does not end with ';' or '$', nor look like a :lisp call")]
    UnterminatedInput { input: String },

    /// Call input containing characters the session encoding cannot represent
    #[error("Call input contains characters that cannot be encoded as {encoding}")]
    UnencodableInput { encoding: String },

    // === Timeout ===
    /// Call exceeded its deadline
    #[error("Call timed out after {timeout:?}")]
    CallTimeout { timeout: Duration },

    // === Terminated ===
    /// Operation attempted on a terminated process
    #[error("Engine process has been terminated")]
    ProcessTerminated,

    // === Protocol errors ===
    /// stdout closed before the response was complete
    #[error("Engine output ended before the next input prompt")]
    PrematureEndOfOutput,

    /// Bytes from the engine were not valid in the session encoding
    #[error("Malformed {encoding} output from engine: {reason}")]
    MalformedOutput { encoding: String, reason: String },

    /// A worker task panicked or was cancelled by the runtime
    #[error("I/O worker failed: {reason}")]
    WorkerFailed { reason: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Logic errors ===
    /// A call was issued while another was still running
    #[error("A call is already in flight on this session")]
    CallInFlight,

    /// Internal precondition violated
    #[error("Internal error: {reason}")]
    Logic { reason: String },
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingExecutable
            | Error::UnsupportedEncoding { .. }
            | Error::LaunchFailed { .. }
            | Error::ConfigLoadFailed { .. }
            | Error::ConfigSaveFailed { .. }
            | Error::ConfigParseFailed { .. }
            | Error::ConfigSerializationFailed { .. } => ErrorKind::Configuration,
            Error::MissingInput | Error::UnterminatedInput { .. } | Error::UnencodableInput { .. } => {
                ErrorKind::CallerInput
            }
            Error::CallTimeout { .. } => ErrorKind::Timeout,
            Error::ProcessTerminated => ErrorKind::Terminated,
            Error::PrematureEndOfOutput
            | Error::MalformedOutput { .. }
            | Error::WorkerFailed { .. }
            | Error::Io(_) => ErrorKind::Protocol,
            Error::CallInFlight | Error::Logic { .. } => ErrorKind::Logic,
        }
    }

    pub(crate) fn logic(reason: impl Into<String>) -> Self {
        Error::Logic {
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed {
            format: "TOML".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParseFailed {
            format: "JSON".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::WorkerFailed {
            reason: err.to_string(),
        }
    }
}
