//! Test Utilities
//!
//! Helpers for driving the scripted stand-in engine in
//! `tests/fixtures/fake_engine.sh`.

#![allow(dead_code, unused_imports)]

pub mod fake_engine;

pub use fake_engine::{
    evaluate, fake_engine_config, fake_launcher, init_tracing, launch_fake_session, SharedBuffer,
};
