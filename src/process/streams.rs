//! Engine I/O Streams
//!
//! The blocking loops run by the writer and reader tasks of a call, plus
//! opportunistic draining of the engine's stderr. Both loops drain stderr
//! every time they go round, so stderr never needs a task of its own.

use std::io::{ErrorKind, Read, Write};
use std::process::{ChildStderr, ChildStdin, ChildStdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::handler::OutputHandler;
use crate::error::{Error, Result};

/// Size of buffer used to send call input to engine stdin
pub const INPUT_BUFFER_SIZE: usize = 1024;
/// Size of buffer used to read engine stdout
pub const OUTPUT_BUFFER_SIZE: usize = 1024;
/// Size of buffer used to read engine stderr
pub const STDERR_BUFFER_SIZE: usize = 128;

/// Destination for anything the engine writes to stderr
pub type StderrSink = Box<dyn Write + Send>;

struct StderrState {
    stderr: Option<ChildStderr>,
    sink: Option<StderrSink>,
}

/// Engine stderr plus the sink it is forwarded to, shared by both tasks
pub(crate) struct StderrDrain {
    state: Arc<Mutex<StderrState>>,
}

impl StderrDrain {
    pub(crate) fn new(stderr: ChildStderr, sink: Option<StderrSink>) -> Result<Self> {
        #[cfg(unix)]
        {
            set_nonblocking(&stderr)?;
            Ok(Self {
                state: Arc::new(Mutex::new(StderrState {
                    stderr: Some(stderr),
                    sink,
                })),
            })
        }

        #[cfg(not(unix))]
        {
            // No non-blocking pipe reads here, so a dedicated thread does the copying
            let state = Arc::new(Mutex::new(StderrState { stderr: None, sink }));
            spawn_stderr_pump(stderr, Arc::clone(&state))?;
            Ok(Self { state })
        }
    }

    /// Forward whatever stderr output is available right now without blocking
    pub(crate) fn drain(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let StderrState { stderr, sink } = &mut *state;
        let Some(pipe) = stderr.as_mut() else {
            return;
        };

        let mut buffer = [0u8; STDERR_BUFFER_SIZE];
        let mut reached_eof = false;
        loop {
            match pipe.read(&mut buffer) {
                Ok(0) => {
                    reached_eof = true;
                    break;
                }
                Ok(n) => forward_stderr(sink, &buffer[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Failed to read engine stderr: {}", e);
                    break;
                }
            }
        }

        if reached_eof {
            trace!("Engine stderr reached EOF");
            *stderr = None;
        }
    }

    /// Final drain, then flush and release the sink
    pub(crate) fn close(&self) {
        self.drain();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.stderr = None;
        if let Some(mut sink) = state.sink.take() {
            if let Err(e) = sink.flush() {
                warn!("Failed to flush engine stderr sink: {}", e);
            }
        }
    }
}

fn forward_stderr(sink: &mut Option<StderrSink>, bytes: &[u8]) {
    trace!("engine stderr: {}", String::from_utf8_lossy(bytes));
    if let Some(out) = sink.as_mut() {
        if let Err(e) = out.write_all(bytes).and_then(|_| out.flush()) {
            warn!("Failed to forward engine stderr, dropping sink: {}", e);
            *sink = None;
        }
    }
}

#[cfg(unix)]
fn set_nonblocking(stderr: &ChildStderr) -> Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};

    let flags = fcntl(stderr, FcntlArg::F_GETFL).map_err(std::io::Error::from)?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(stderr, FcntlArg::F_SETFL(flags)).map_err(std::io::Error::from)?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_stderr_pump(mut stderr: ChildStderr, state: Arc<Mutex<StderrState>>) -> Result<()> {
    std::thread::Builder::new()
        .name("maxima-stderr".to_string())
        .spawn(move || {
            let mut buffer = [0u8; STDERR_BUFFER_SIZE];
            loop {
                match stderr.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                        forward_stderr(&mut state.sink, &buffer[..n]);
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            debug!("Engine stderr pump exiting");
        })?;
    Ok(())
}

/// Writer task: copy call input to engine stdin, then flush or close it
pub(crate) fn write_input(
    input: Option<Box<dyn Read + Send>>,
    close_on_eof: bool,
    stdin: &Mutex<Option<ChildStdin>>,
    stderr: &StderrDrain,
    cancelled: &AtomicBool,
) -> Result<()> {
    let Some(mut input) = input else {
        trace!("No call input; stdin loop exiting immediately");
        return Ok(());
    };

    let mut buffer = [0u8; INPUT_BUFFER_SIZE];
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Err(Error::ProcessTerminated);
        }
        stderr.drain();

        let n = match input.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        let mut guard = stdin.lock().unwrap_or_else(PoisonError::into_inner);
        if n == 0 {
            if close_on_eof {
                trace!("Call input exhausted; closing engine stdin");
                guard.take();
            } else if let Some(pipe) = guard.as_mut() {
                trace!("Call input exhausted; flushing engine stdin");
                pipe.flush()?;
            }
            return Ok(());
        }

        let pipe = guard.as_mut().ok_or(Error::ProcessTerminated)?;
        trace!("engine <<< {}", String::from_utf8_lossy(&buffer[..n]));
        pipe.write_all(&buffer[..n])?;
        pipe.flush()?;
    }
}

/// Reader task: feed engine stdout to `handler` until it reports completion
pub(crate) fn read_output<H>(
    mut stdout: ChildStdout,
    mut handler: H,
    stderr: &StderrDrain,
    cancelled: &AtomicBool,
) -> Result<(H, ChildStdout)>
where
    H: OutputHandler,
{
    handler.call_starting();

    let mut buffer = [0u8; OUTPUT_BUFFER_SIZE];
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Err(Error::ProcessTerminated);
        }
        stderr.drain();

        let n = match stdout.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if n == 0 {
            trace!("Engine stdout reached EOF");
            handler.handle_eof()?;
            break;
        }

        trace!("engine >>> {}", String::from_utf8_lossy(&buffer[..n]));
        if handler.handle_output(&buffer[..n])? {
            break;
        }
    }

    Ok((handler, stdout))
}
