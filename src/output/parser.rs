//! Linear Output Parsing
//!
//! Splits raw call output of the shape
//!
//! ```text
//! <preamble>(%o7)     <result>
//! ```
//!
//! into its parts, then undoes the engine's line-continuation escaping in
//! the result. Anything in the output that looks like a prompt is treated
//! as one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default input prompt prefix
pub const DEFAULT_INCHAR: &str = "%i";
/// Default output prompt prefix
pub const DEFAULT_OUTCHAR: &str = "%o";

static DEFAULT_PARSER: Lazy<OutputParser> = Lazy::new(OutputParser::default);

/// One output prompt and the result that follows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearOutput {
    /// Everything printed before the output prompt
    pub preamble: String,
    /// The output prompt itself, e.g. `(%o2)`
    pub output_prompt: String,
    /// The result with line continuations resolved
    pub result: String,
}

/// Parser for a particular pair of prompt prefixes
#[derive(Debug, Clone)]
pub struct OutputParser {
    input_prompt: Regex,
    linear_output: Regex,
}

impl OutputParser {
    /// Parser for the given input and output prompt prefixes
    pub fn new(inchar: &str, outchar: &str) -> Self {
        let input_prompt = format!(r"\({}\d+\)", regex::escape(inchar));
        let linear_output = format!(r"(?s)\A(.*?)(\({}\d+\))\s*(.*?)\s*\z", regex::escape(outchar));

        Self {
            input_prompt: Regex::new(&input_prompt).expect("escaped prompt pattern is valid"),
            linear_output: Regex::new(&linear_output).expect("escaped prompt pattern is valid"),
        }
    }

    /// Remove input prompts that some platforms echo in the middle of output
    pub fn strip_intermediate_input_prompts(&self, raw: &str) -> String {
        self.input_prompt.replace_all(raw, "").into_owned()
    }

    /// Split raw output at its output prompt; `None` if there isn't one
    pub fn parse_single_linear_output(&self, raw: &str) -> Option<LinearOutput> {
        let stripped = self.strip_intermediate_input_prompts(raw);
        let captures = self.linear_output.captures(&stripped)?;

        Some(LinearOutput {
            preamble: captures[1].to_string(),
            output_prompt: captures[2].to_string(),
            result: parse_linear_result(&captures[3]),
        })
    }

    /// Just the result part of [`OutputParser::parse_single_linear_output`]
    pub fn parse_single_linear_output_result(&self, raw: &str) -> Option<String> {
        self.parse_single_linear_output(raw).map(|output| output.result)
    }
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new(DEFAULT_INCHAR, DEFAULT_OUTCHAR)
    }
}

/// [`OutputParser::strip_intermediate_input_prompts`] with default prompts
pub fn strip_intermediate_input_prompts(raw: &str) -> String {
    DEFAULT_PARSER.strip_intermediate_input_prompts(raw)
}

/// [`OutputParser::parse_single_linear_output`] with default prompts
pub fn parse_single_linear_output(raw: &str) -> Option<LinearOutput> {
    DEFAULT_PARSER.parse_single_linear_output(raw)
}

/// [`OutputParser::parse_single_linear_output_result`] with default prompts
pub fn parse_single_linear_output_result(raw: &str) -> Option<String> {
    DEFAULT_PARSER.parse_single_linear_output_result(raw)
}

/// Resolve backslash escapes in a linear result
///
/// A backslash before a line feed is a soft line break, dropped outside
/// strings and kept as a real newline inside them. A backslash before any
/// other character yields that character. Unescaped double quotes toggle
/// whether we are inside a string.
pub fn parse_linear_result(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in raw.chars() {
        if escaped {
            if c != '\n' || in_string {
                result.push(c);
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            result.push(c);
            if c == '"' {
                in_string = !in_string;
            }
        }
    }

    result
}
