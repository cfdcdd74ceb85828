//! Engine output post-processing
//!
//! Pure functions turning the raw text captured from a call into the value
//! a caller actually wants.

pub mod parser;

pub use parser::{
    parse_linear_result, parse_single_linear_output, parse_single_linear_output_result,
    strip_intermediate_input_prompts, LinearOutput, OutputParser, DEFAULT_INCHAR, DEFAULT_OUTCHAR,
};
