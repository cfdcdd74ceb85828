//! Engine Output Framing
//!
//! Decoding of the engine's byte stream and detection of where one
//! response ends.

pub mod decoder;
pub mod framer;

pub use decoder::{resolve_encoding, StreamDecoder, TextEncoding, DECODE_BUFFER_SIZE};
pub use framer::{ResponseFramer, INPUT_PROMPT_SUFFIX};
