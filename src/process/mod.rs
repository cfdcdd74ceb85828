//! Engine Process Management
//!
//! Spawning the engine, pumping its stdin/stdout/stderr pipes on a small
//! worker pool, and tearing the process down again.

pub mod controller;
pub mod handler;
pub mod spawn;
pub mod streams;

// Re-exports for convenience
pub use controller::{CallInput, ProcessController};
pub use handler::OutputHandler;
pub use spawn::{spawn_engine_process, EngineCommand};
pub use streams::StderrSink;
