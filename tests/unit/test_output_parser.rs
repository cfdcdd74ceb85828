//! Unit Tests for Output Parsing

use maxima_driver::output::{
    parse_linear_result, parse_single_linear_output, parse_single_linear_output_result,
    strip_intermediate_input_prompts, OutputParser,
};

#[test]
fn test_documented_shape() {
    let output =
        parse_single_linear_output("<preamble>\n(%o2)                                false\n")
            .unwrap();
    assert_eq!(output.preamble, "<preamble>\n");
    assert_eq!(output.output_prompt, "(%o2)");
    assert_eq!(output.result, "false");
}

#[test]
fn test_trailing_input_prompt_is_ignored() {
    assert_eq!(
        parse_single_linear_output_result("(%o1) 3\n(%i2) ").as_deref(),
        Some("3")
    );
}

#[test]
fn test_intermediate_input_prompts_are_stripped() {
    assert_eq!(
        strip_intermediate_input_prompts("(%i3) (%o3) x\n(%i4) "),
        " (%o3) x\n "
    );
    assert_eq!(strip_intermediate_input_prompts("(%i) kept"), "(%i) kept");
}

#[test]
fn test_multiline_result() {
    let output = parse_single_linear_output("(%o12) [1,\\\n2,\\\n3]\n(%i13) ").unwrap();
    assert_eq!(output.output_prompt, "(%o12)");
    assert_eq!(output.result, "[1,2,3]");
}

#[test]
fn test_missing_output_prompt() {
    assert!(parse_single_linear_output("").is_none());
    assert!(parse_single_linear_output("T\n(%i2) ").is_none());
    assert!(parse_single_linear_output_result("(o1) 3").is_none());
}

#[test]
fn test_escape_resolution_depends_on_quotes() {
    assert_eq!(parse_linear_result("1\\\n2"), "12");
    assert_eq!(parse_linear_result("\"1\\\n2\""), "\"1\n2\"");
}

#[test]
fn test_other_escapes_yield_the_character() {
    assert_eq!(parse_linear_result("a\\b"), "ab");
    assert_eq!(parse_linear_result("\"say \\\"hi\\\"\""), "\"say \"hi\"\"");
    assert_eq!(parse_linear_result("dangling\\"), "dangling");
}

#[test]
fn test_custom_prompts() {
    let parser = OutputParser::new("C", "D");
    let output = parser
        .parse_single_linear_output("(C1) noise\n(D1) x^2\n(C2) ")
        .unwrap();
    assert_eq!(output.preamble, " noise\n");
    assert_eq!(output.output_prompt, "(D1)");
    assert_eq!(output.result, "x^2");
    assert!(parser.parse_single_linear_output("(%o1) 1").is_none());
}

#[test]
fn test_linear_output_serializes() {
    let output = parse_single_linear_output("(%o1) 1\n").unwrap();
    let json = serde_json::to_string(&output).unwrap();
    assert!(json.contains("\"output_prompt\":\"(%o1)\""));
}
