//! Integration Tests for Batch Runs

#![cfg(unix)]

#[path = "../test_utils/mod.rs"]
mod test_utils;

use maxima_driver::{CallTimeout, ErrorKind, TerminationOutcome};
use std::io::Cursor;
use std::time::Duration;
use test_utils::{fake_launcher, SharedBuffer};

fn script(text: &str) -> Cursor<Vec<u8>> {
    Cursor::new(text.as_bytes().to_vec())
}

#[test]
fn test_batch_output_is_copied_verbatim() {
    let output = SharedBuffer::default();
    let outcome = fake_launcher()
        .run_batch(script("1+2;\n6*7;\n"), output.clone())
        .unwrap();

    assert_eq!(outcome, TerminationOutcome::Exited(0));
    assert_eq!(
        output.contents(),
        "Fake Maxima 0.0.1 (sh)\nusing Lisp none\n(%i1) (%o1) 3\n(%i2) (%o2) 42\n(%i3) "
    );
}

#[test]
fn test_batch_reports_engine_exit_code() {
    let output = SharedBuffer::default();
    let outcome = fake_launcher()
        .run_batch(script("crash;\n1;\n"), output.clone())
        .unwrap();

    assert_eq!(outcome, TerminationOutcome::Exited(3));
    assert!(output.contents().ends_with("fatal error\n"));
}

#[test]
fn test_batch_timeout() {
    let output = SharedBuffer::default();
    let err = fake_launcher()
        .run_batch_with(
            script("1;\nloop;\n"),
            output.clone(),
            None,
            CallTimeout::After(Duration::from_millis(500)),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[test]
fn test_batch_stderr_sink() {
    let output = SharedBuffer::default();
    let stderr = SharedBuffer::default();
    fake_launcher()
        .run_batch_with(
            script("warn;\n"),
            output.clone(),
            Some(Box::new(stderr.clone())),
            CallTimeout::Default,
        )
        .unwrap();

    assert!(output.contents().contains("(%o1) done"));
    assert_eq!(stderr.contents(), "warning: something odd\n");
}
