//! Core data models for maxima-driver
//!
//! Small value types shared between the process controller, the
//! interactive session and the batch runner.

pub mod call;
pub mod engine_process;

// Re-exports for convenience
pub use call::CallTimeout;
pub use engine_process::{SessionState, TerminationOutcome};
