//! Fake engine launch helpers

use maxima_driver::output::parse_single_linear_output_result;
use maxima_driver::{EngineConfig, InteractiveSession, Launcher};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Route driver logs to the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Path of the stand-in engine script
pub fn fake_engine_script() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("fake_engine.sh")
}

/// Configuration running the stand-in engine through `/bin/sh`
pub fn fake_engine_config() -> EngineConfig {
    EngineConfig {
        arguments: vec![fake_engine_script().display().to_string()],
        encoding: "UTF-8".to_string(),
        default_call_timeout: 10,
        default_batch_timeout: 10,
        ..EngineConfig::new("/bin/sh")
    }
}

pub fn fake_launcher() -> Launcher {
    init_tracing();
    Launcher::new(fake_engine_config()).expect("fake engine config is valid")
}

pub fn launch_fake_session() -> InteractiveSession {
    fake_launcher()
        .launch_session()
        .expect("fake engine session starts")
}

/// Evaluate `input` and extract the linear result
pub fn evaluate(session: &InteractiveSession, input: &str) -> String {
    let raw = session.execute_call(input).expect("call succeeds");
    parse_single_linear_output_result(&raw)
        .unwrap_or_else(|| panic!("no output prompt in {:?}", raw))
}

/// Cloneable in-memory sink for stderr and batch output
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
