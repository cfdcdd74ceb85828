//! Contract Tests for Session Lifecycle
//!
//! Startup, termination, timeouts and failure handling of interactive
//! sessions, driven against the scripted stand-in engine.

#![cfg(unix)]

#[path = "../test_utils/mod.rs"]
mod test_utils;

use maxima_driver::{
    CallTimeout, EngineConfig, Error, ErrorKind, Launcher, SessionState, TerminationOutcome,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use test_utils::{evaluate, fake_engine_config, fake_launcher, launch_fake_session, SharedBuffer};

#[test]
fn test_session_starts_running() {
    let session = launch_fake_session();
    assert_eq!(session.state(), SessionState::Running);
    assert!(!session.is_terminated());
    session.terminate();
}

#[test]
fn test_terminate_is_idempotent() {
    let session = launch_fake_session();

    // Closing stdin makes the engine exit on its own
    assert_eq!(session.terminate(), TerminationOutcome::Exited(0));
    assert_eq!(session.state(), SessionState::Terminated);

    let second = session.terminate();
    assert_eq!(second, TerminationOutcome::AlreadyTerminated);
    assert_eq!(second.code(), -1);
}

#[test]
fn test_calls_fail_after_termination() {
    let session = launch_fake_session();
    session.terminate();

    let err = session.execute_call("1;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Terminated);
    let err = session.soft_reset().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Terminated);
}

#[test]
fn test_timeout_terminates_session() {
    let session = launch_fake_session();

    let started = Instant::now();
    let err = session
        .execute_call_with_timeout("loop;", CallTimeout::After(Duration::from_millis(500)))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.to_string().contains("500ms"));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(session.is_terminated());
    assert_eq!(session.terminate(), TerminationOutcome::AlreadyTerminated);
}

#[test]
fn test_engine_exit_mid_call_is_protocol_fault() {
    let session = launch_fake_session();

    let err = session.execute_call("crash;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(session.is_terminated());
}

#[test]
fn test_malformed_output_is_protocol_fault() {
    let session = launch_fake_session();

    let err = session.execute_call("garbage;").unwrap_err();
    assert!(matches!(err, Error::MalformedOutput { .. }), "{:?}", err);
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(session.is_terminated());
    assert_eq!(session.terminate(), TerminationOutcome::AlreadyTerminated);
}

#[test]
fn test_non_ascii_output_is_fatal_under_ascii() {
    let config = EngineConfig {
        encoding: "US-ASCII".to_string(),
        ..fake_engine_config()
    };
    let session = Launcher::new(config).unwrap().launch_session().unwrap();
    assert_eq!(evaluate(&session, "1+2;"), "3");

    let err = session.execute_call("accented;").unwrap_err();
    match &err {
        Error::MalformedOutput { encoding, .. } => assert_eq!(encoding, "US-ASCII"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(session.is_terminated());
}

#[test]
fn test_overlapping_call_is_logic_fault() {
    let session = Arc::new(launch_fake_session());

    let running = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.execute_call_with_timeout("loop;", CallTimeout::After(Duration::from_secs(10)))
        })
    };
    thread::sleep(Duration::from_millis(300));

    let err = session.execute_call("1;").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Logic);

    // Terminating cancels the call that is still running
    assert_eq!(session.terminate(), TerminationOutcome::ForciblyDestroyed);
    let err = running.join().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Terminated);
}

#[test]
fn test_stderr_goes_to_sink() {
    let stderr = SharedBuffer::default();
    let session = fake_launcher()
        .launch_session_with_stderr(Box::new(stderr.clone()))
        .unwrap();

    assert_eq!(evaluate(&session, "warn;"), "done");
    session.terminate();

    assert_eq!(stderr.contents(), "warning: something odd\n");
}

#[test]
fn test_dropping_session_terminates_engine() {
    let session = launch_fake_session();
    evaluate(&session, "1;");
    drop(session);
}
