//! Response Framing
//!
//! The engine's output carries no length prefix or "done" marker, so every
//! call is followed by a trailer that prints a fixed sentinel. A response is
//! complete once the sentinel line has gone past and the line after it ends
//! with the engine's input prompt suffix.

use crate::error::{Error, Result};
use crate::framing::decoder::StreamDecoder;
use crate::process::OutputHandler;

/// Every input prompt (`(%i3) ` and friends) ends with this
pub const INPUT_PROMPT_SUFFIX: &str = ") ";

/// Line-level state of the framer, kept apart from the decoder so the
/// decoder can forward text into it while both are borrowed
#[derive(Debug)]
struct LineTracker {
    sentinel: Option<String>,
    output: Option<String>,
    current_line: String,
    sentinel_seen: bool,
}

impl LineTracker {
    fn reset(&mut self) {
        self.current_line.clear();
        self.sentinel_seen = self.sentinel.is_none();
        if let Some(output) = self.output.as_mut() {
            output.clear();
        }
    }

    fn consume(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => self.end_line(),
                // Only line feeds delimit lines
                '\r' => {}
                c => self.current_line.push(c),
            }
        }
    }

    fn end_line(&mut self) {
        let sentinel_at = self
            .sentinel
            .as_deref()
            .and_then(|sentinel| self.current_line.find(sentinel));

        match sentinel_at {
            Some(position) => {
                trace!("Found call sentinel; response ends at the next input prompt");
                self.sentinel_seen = true;
                if let Some(output) = self.output.as_mut() {
                    output.push_str(&self.current_line[..position]);
                }
            }
            None => {
                if let Some(output) = self.output.as_mut() {
                    output.push_str(&self.current_line);
                    output.push('\n');
                }
            }
        }

        self.current_line.clear();
    }

    fn is_complete(&self) -> bool {
        self.sentinel_seen && self.current_line.ends_with(INPUT_PROMPT_SUFFIX)
    }
}

/// Detects the end of one engine response as decoded text streams in
#[derive(Debug)]
pub struct ResponseFramer {
    decoder: StreamDecoder,
    lines: LineTracker,
}

impl ResponseFramer {
    /// Framer for a call whose input was suffixed with a trailer printing
    /// `sentinel`. When `capture` is false the output is discarded.
    pub fn for_call(decoder: StreamDecoder, sentinel: &str, capture: bool) -> Self {
        Self {
            decoder,
            lines: LineTracker {
                sentinel: Some(sentinel.to_string()),
                output: capture.then(String::new),
                current_line: String::new(),
                sentinel_seen: false,
            },
        }
    }

    /// Framer that reads the startup banner up to the first input prompt
    pub fn for_startup(decoder: StreamDecoder) -> Self {
        Self {
            decoder,
            lines: LineTracker {
                sentinel: None,
                output: None,
                current_line: String::new(),
                sentinel_seen: true,
            },
        }
    }

    /// Whether the input prompt following the sentinel has been seen
    pub fn is_complete(&self) -> bool {
        self.lines.is_complete()
    }

    /// Give back the decoder for reuse and the captured output, if any
    pub fn into_parts(self) -> (StreamDecoder, Option<String>) {
        (self.decoder, self.lines.output)
    }
}

impl OutputHandler for ResponseFramer {
    fn call_starting(&mut self) {
        self.decoder.reset();
        self.lines.reset();
    }

    fn handle_output(&mut self, bytes: &[u8]) -> Result<bool> {
        let Self { decoder, lines } = self;
        decoder.feed(bytes, |text| lines.consume(text))?;
        Ok(lines.is_complete())
    }

    fn handle_eof(&mut self) -> Result<()> {
        let Self { decoder, lines } = self;
        decoder.finish(|text| lines.consume(text))?;
        if lines.is_complete() {
            Ok(())
        } else {
            Err(Error::PrematureEndOfOutput)
        }
    }
}
