//! Interactive Sessions
//!
//! Call/response access to a running engine. Every call is suffixed with a
//! trailer that prints [`CALL_SENTINEL`] so the end of its response can be
//! found in otherwise unframed REPL output.

use std::io::Cursor;
use std::sync::{Mutex, PoisonError};

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::framing::{ResponseFramer, StreamDecoder, TextEncoding};
use crate::models::{CallTimeout, SessionState, TerminationOutcome};
use crate::process::{CallInput, ProcessController};

/// Printed by the trailer appended to every call
pub const CALL_SENTINEL: &str = "MAXIMA-DRIVER-INTERACTIVE-CALL-OUTPUT-TERMINATOR";

/// Clears the last result label and prints the sentinel
static CALL_TRAILER: Lazy<String> =
    Lazy::new(|| format!("block(kill(1), print(\"{}\"))$\n", CALL_SENTINEL));

/// Clears engine state without restarting the process
pub const SOFT_RESET_CALL: &str = "[kill(all),reset()]$";

/// A running engine accepting one call at a time
pub struct InteractiveSession {
    controller: ProcessController,
    encoding: TextEncoding,
    /// Lent to the framer for the duration of each call
    decoder: Mutex<Option<StreamDecoder>>,
    default_call_timeout: CallTimeout,
}

impl InteractiveSession {
    /// Wrap a freshly started engine and read up to its first input prompt
    ///
    /// The startup banner read is bounded by `default_call_timeout`.
    pub fn start(
        controller: ProcessController,
        encoding: TextEncoding,
        default_call_timeout: CallTimeout,
    ) -> Result<Self> {
        let session = Self {
            controller,
            encoding,
            decoder: Mutex::new(Some(StreamDecoder::new(encoding))),
            default_call_timeout: Self::concrete_default(default_call_timeout),
        };
        session.advance_to_ready()?;
        Ok(session)
    }

    fn advance_to_ready(&self) -> Result<()> {
        trace!(session = %self.id(), "Reading engine banner up to the first input prompt");
        let framer = ResponseFramer::for_startup(self.lend_decoder()?);
        let framer = self
            .controller
            .call(None, false, framer, self.default_call_timeout.limit())?;
        self.return_decoder(framer);
        debug!(session = %self.id(), "Engine is ready");
        Ok(())
    }

    /// Session identifier used in log output
    pub fn id(&self) -> Uuid {
        self.controller.id()
    }

    /// Evaluate `input` under the default timeout and return the raw output
    pub fn execute_call(&self, input: &str) -> Result<String> {
        self.execute_call_with_timeout(input, CallTimeout::Default)
    }

    /// Evaluate `input` and return everything the engine printed for it
    ///
    /// `input` must end with `;` or `$` (after trailing whitespace), or be a
    /// `:lisp` call ending with `)`. Output usually ends with the next input
    /// prompt; see [`crate::output`] for extracting the result.
    pub fn execute_call_with_timeout(&self, input: &str, timeout: CallTimeout) -> Result<String> {
        debug!(session = %self.id(), "execute_call(input={:?}, timeout={:?})", input, timeout);
        let output = self.run_call(input, timeout, true)?.unwrap_or_default();
        debug!(session = %self.id(), "execute_call() => {:?}", output);
        Ok(output)
    }

    /// Evaluate `input` under the default timeout, ignoring its output
    pub fn execute_call_discard_output(&self, input: &str) -> Result<()> {
        self.execute_call_discard_output_with_timeout(input, CallTimeout::Default)
    }

    /// Like [`InteractiveSession::execute_call_with_timeout`] without keeping output
    pub fn execute_call_discard_output_with_timeout(
        &self,
        input: &str,
        timeout: CallTimeout,
    ) -> Result<()> {
        debug!(session = %self.id(), "execute_call_discard_output(input={:?}, timeout={:?})", input, timeout);
        self.run_call(input, timeout, false)?;
        Ok(())
    }

    /// Clear all engine state without restarting the process
    pub fn soft_reset(&self) -> Result<()> {
        self.execute_call_discard_output(SOFT_RESET_CALL)
    }

    pub fn terminate(&self) -> TerminationOutcome {
        self.controller.terminate()
    }

    pub fn is_terminated(&self) -> bool {
        self.controller.is_terminated()
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    /// Timeout applied to calls made with [`CallTimeout::Default`]
    pub fn default_call_timeout(&self) -> CallTimeout {
        self.default_call_timeout
    }

    /// Change the default; passing [`CallTimeout::Default`] restores the built-in one
    pub fn set_default_call_timeout(&mut self, timeout: CallTimeout) {
        self.default_call_timeout = Self::concrete_default(timeout);
    }

    fn concrete_default(timeout: CallTimeout) -> CallTimeout {
        timeout.or(CallTimeout::After(crate::config::DEFAULT_CALL_TIMEOUT))
    }

    fn run_call(&self, input: &str, timeout: CallTimeout, capture: bool) -> Result<Option<String>> {
        if self.is_terminated() {
            return Err(Error::ProcessTerminated);
        }

        let engine_input = build_call_input(input)?;
        let encoded = self.encode(&engine_input)?;
        trace!(
            session = %self.id(),
            "Sending {:?} and reading output up to the prompt after {}",
            engine_input,
            CALL_SENTINEL
        );

        let framer = ResponseFramer::for_call(self.lend_decoder()?, CALL_SENTINEL, capture);
        let limit = timeout.or(self.default_call_timeout).limit();
        let framer = self.controller.call(Some(encoded), false, framer, limit)?;
        Ok(self.return_decoder(framer))
    }

    fn encode(&self, text: &str) -> Result<CallInput> {
        let bytes = self.encoding.encode(text)?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn lend_decoder(&self) -> Result<StreamDecoder> {
        let mut slot = self.decoder.lock().unwrap_or_else(PoisonError::into_inner);
        // Only a call in progress holds the decoder
        slot.take().ok_or(Error::CallInFlight)
    }

    fn return_decoder(&self, framer: ResponseFramer) -> Option<String> {
        let (decoder, output) = framer.into_parts();
        *self.decoder.lock().unwrap_or_else(PoisonError::into_inner) = Some(decoder);
        output
    }
}

impl std::fmt::Debug for InteractiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveSession")
            .field("controller", &self.controller)
            .field("encoding", &self.encoding.name())
            .field("default_call_timeout", &self.default_call_timeout)
            .finish()
    }
}

/// Validate call input and append the sentinel trailer on a line of its own
pub fn build_call_input(input: &str) -> Result<String> {
    let trimmed = input.trim_end();
    let last = trimmed.chars().last().ok_or(Error::MissingInput)?;

    let accepted = match last {
        ';' | '$' => true,
        ')' => trimmed.contains(":lisp"),
        _ => false,
    };
    if !accepted {
        return Err(Error::UnterminatedInput {
            input: input.to_string(),
        });
    }

    // Some platforms skip the rest of a line after an error, so the trailer always gets its own
    Ok(format!("{}\n{}", trimmed, CALL_TRAILER.as_str()))
}
