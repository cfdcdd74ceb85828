//! Output Handlers
//!
//! The reader task hands every chunk of engine stdout to an [`OutputHandler`],
//! which decides when the current call's output is complete.

use crate::error::Result;

/// Consumer of raw engine stdout for the duration of one call
pub trait OutputHandler: Send {
    /// Invoked once before the first chunk of a call is read
    fn call_starting(&mut self) {}

    /// Consume a chunk; return `true` once the call's output is complete
    fn handle_output(&mut self, bytes: &[u8]) -> Result<bool>;

    /// stdout reached end of stream before `handle_output` reported completion
    fn handle_eof(&mut self) -> Result<()>;
}
