//! Batch Runs
//!
//! Streams a whole script through a fresh engine and copies its output
//! through verbatim. Closing stdin at the end of the script makes the
//! engine exit, so end of output marks the end of the run.

use std::io::Write;

use crate::error::Result;
use crate::models::{CallTimeout, TerminationOutcome};
use crate::process::{CallInput, OutputHandler, ProcessController};

/// Destination for batch output
pub type BatchOutput = Box<dyn Write + Send>;

/// Copies engine stdout to the batch output
struct PassthroughHandler {
    output: BatchOutput,
}

impl OutputHandler for PassthroughHandler {
    fn handle_output(&mut self, bytes: &[u8]) -> Result<bool> {
        self.output.write_all(bytes)?;
        Ok(false)
    }

    fn handle_eof(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}

impl Drop for PassthroughHandler {
    fn drop(&mut self) {
        // Also reached when a failed run abandons the handler
        if let Err(e) = self.output.flush() {
            warn!("Failed to flush batch output: {}", e);
        }
    }
}

/// One batch run over a dedicated engine process
pub struct BatchRunner {
    controller: ProcessController,
    input: CallInput,
    output: BatchOutput,
}

impl BatchRunner {
    pub fn new(controller: ProcessController, input: CallInput, output: BatchOutput) -> Self {
        Self {
            controller,
            input,
            output,
        }
    }

    /// Run the script to completion and return how the engine ended
    ///
    /// The engine process is always terminated and the output flushed,
    /// whether or not the run succeeds. [`CallTimeout::Default`] means no
    /// timeout here; resolve configured defaults before calling.
    pub fn run(self, timeout: CallTimeout) -> Result<TerminationOutcome> {
        let Self {
            controller,
            input,
            output,
        } = self;

        info!(session = %controller.id(), "Running engine in batch mode");
        let handler = PassthroughHandler { output };
        let result = controller.call(Some(input), true, handler, timeout.limit());
        let outcome = controller.terminate();

        // Flushes through Drop
        drop(result?);
        debug!(session = %controller.id(), ?outcome, "Batch run finished");
        Ok(outcome)
    }
}
