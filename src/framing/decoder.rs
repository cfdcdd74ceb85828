//! Incremental Output Decoding
//!
//! Turns byte chunks of arbitrary size into text without ever splitting a
//! multi-byte character across chunk boundaries. Bytes are staged in a fixed
//! size buffer, decoded as far as they are well-formed, and whatever the
//! decoder could not consume yet is compacted to the front of the buffer
//! before more input is accepted.

use encoding_rs::{DecoderResult, Encoding};

use crate::error::{Error, Result};

/// Size of the byte and char staging buffers
pub const DECODE_BUFFER_SIZE: usize = 1024;

/// Labels meaning 7-bit ASCII; `encoding_rs` folds these into windows-1252
const ASCII_LABELS: &[&str] = &["us-ascii", "ascii", "ansi_x3.4-1968"];

/// Text encoding spoken over the engine's pipes
///
/// A thin layer over [`encoding_rs::Encoding`] that also knows strict
/// 7-bit ASCII, where any byte or character outside `0x00..=0x7F` is an error
/// in both directions.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    ascii_only: bool,
}

impl TextEncoding {
    /// Look up an encoding by label, rejecting ones that cannot encode input
    pub fn for_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        let encoding =
            Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| Error::UnsupportedEncoding {
                label: label.to_string(),
                reason: "unknown encoding label".to_string(),
            })?;

        // UTF-16 and the replacement encoding decode fine but encode as something else
        if encoding.output_encoding() != encoding {
            return Err(Error::UnsupportedEncoding {
                label: label.to_string(),
                reason: format!("{} cannot be used to encode engine input", encoding.name()),
            });
        }

        let ascii_only = ASCII_LABELS
            .iter()
            .any(|ascii| trimmed.eq_ignore_ascii_case(ascii));
        Ok(Self {
            encoding,
            ascii_only,
        })
    }

    pub fn name(&self) -> &'static str {
        if self.ascii_only {
            "US-ASCII"
        } else {
            self.encoding.name()
        }
    }

    pub fn is_ascii_only(&self) -> bool {
        self.ascii_only
    }

    /// Encode engine input; characters the encoding cannot represent are an error
    pub fn encode(&self, text: &str) -> Result<Vec<u8>> {
        if self.ascii_only && !text.is_ascii() {
            return Err(self.unencodable());
        }
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(self.unencodable());
        }
        Ok(bytes.into_owned())
    }

    fn unencodable(&self) -> Error {
        Error::UnencodableInput {
            encoding: self.name().to_string(),
        }
    }
}

impl std::fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a text encoding by label, rejecting ones that cannot encode input
pub fn resolve_encoding(label: &str) -> Result<TextEncoding> {
    TextEncoding::for_label(label)
}

/// Streaming byte-to-text decoder with staging buffers
pub struct StreamDecoder {
    encoding: TextEncoding,
    decoder: encoding_rs::Decoder,
    /// Bytes received but not yet handed to the decoder
    pending: Vec<u8>,
    /// Decoded text waiting to be forwarded
    decoded: String,
}

impl std::fmt::Debug for StreamDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamDecoder")
            .field("encoding", &self.encoding.name())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl StreamDecoder {
    /// Create a decoder for the given encoding
    pub fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            decoder: encoding.encoding.new_decoder_without_bom_handling(),
            pending: Vec::with_capacity(DECODE_BUFFER_SIZE),
            decoded: String::with_capacity(DECODE_BUFFER_SIZE),
        }
    }

    /// Create a decoder from an encoding label such as `"UTF-8"`
    pub fn for_label(label: &str) -> Result<Self> {
        Ok(Self::new(TextEncoding::for_label(label)?))
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Discard all staged bytes, staged text and carried-over decoder state
    pub fn reset(&mut self) {
        self.decoder = self.encoding.encoding.new_decoder_without_bom_handling();
        self.pending.clear();
        self.decoded.clear();
    }

    /// Decode a chunk, forwarding each decoded text fragment to `emit`
    pub fn feed<F>(&mut self, bytes: &[u8], mut emit: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            let room = DECODE_BUFFER_SIZE - self.pending.len();
            let take = room.min(remaining.len());
            self.pending.extend_from_slice(&remaining[..take]);
            remaining = &remaining[take..];
            self.decode_pending(false, &mut emit)?;
        }
        Ok(())
    }

    /// Signal end of input; a dangling partial character is an error
    pub fn finish<F>(&mut self, mut emit: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        self.decode_pending(true, &mut emit)
    }

    fn decode_pending<F>(&mut self, last: bool, emit: &mut F) -> Result<()>
    where
        F: FnMut(&str),
    {
        if self.encoding.ascii_only {
            if let Some(byte) = self.pending.iter().find(|b| !b.is_ascii()) {
                return Err(Error::MalformedOutput {
                    encoding: self.encoding.name().to_string(),
                    reason: format!("byte 0x{:02X} is outside 7-bit ASCII", byte),
                });
            }
        }

        loop {
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(&self.pending, &mut self.decoded, last);

            // Compact whatever was not consumed to the front of the staging buffer
            self.pending.drain(..read);

            if !self.decoded.is_empty() {
                emit(&self.decoded);
                self.decoded.clear();
            }

            match result {
                DecoderResult::InputEmpty => return Ok(()),
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(malformed, consumed_after) => {
                    return Err(Error::MalformedOutput {
                        encoding: self.encoding.name().to_string(),
                        reason: format!(
                            "{} malformed byte(s) followed by {} consumed byte(s)",
                            malformed, consumed_after
                        ),
                    });
                }
            }
        }
    }
}
