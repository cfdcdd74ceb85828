//! Engine Process Controller
//!
//! Owns the engine child process and drives exactly one call at a time to
//! completion, failure or timeout. Each call runs a writer task (call input
//! to stdin) and a reader task (stdout to an [`OutputHandler`]) on a small
//! per-controller tokio runtime; both tasks drain stderr as they go.
//!
//! Any failed call leaves the process destroyed. After that, every call
//! fails immediately with [`Error::ProcessTerminated`].

use std::io::Read;
use std::process::{Child, ChildStdin, ChildStdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::handler::OutputHandler;
use super::streams::{read_output, write_input, StderrDrain, StderrSink};
use crate::error::{Error, Result};
use crate::models::{SessionState, TerminationOutcome};

/// Input for a single call, streamed to engine stdin
pub type CallInput = Box<dyn Read + Send>;

/// How long a process gets to exit on its own once stdin is closed
pub const TERMINATION_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Blocking threads per controller: one writer, one reader
const IO_WORKER_THREADS: usize = 2;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Owner of one engine process and its pipes
pub struct ProcessController {
    id: Uuid,
    pid: u32,
    child: Mutex<Child>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr: Arc<StderrDrain>,
    runtime: Mutex<Option<Runtime>>,
    /// Held for the whole duration of a call
    call_slot: Mutex<()>,
    cancelled: Arc<AtomicBool>,
    terminated: AtomicBool,
}

/// Pipes and I/O runtime taken over from a new child
struct Plumbing {
    id: Uuid,
    stdin: ChildStdin,
    stdout: ChildStdout,
    stderr: StderrDrain,
    runtime: Runtime,
}

impl Plumbing {
    fn take_from(child: &mut Child, stderr_sink: Option<StderrSink>) -> Result<Self> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::logic("engine stdin is not piped"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::logic("engine stdout is not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::logic("engine stderr is not piped"))?;

        let id = Uuid::new_v4();
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(IO_WORKER_THREADS)
            .thread_name(format!("maxima-io-{}", id.simple()))
            .enable_time()
            .build()?;

        Ok(Self {
            id,
            stdin,
            stdout,
            stderr: StderrDrain::new(stderr, stderr_sink)?,
            runtime,
        })
    }
}

impl ProcessController {
    /// Take ownership of a freshly spawned engine process
    ///
    /// All three standard streams of `child` must be piped. If the controller
    /// cannot be set up, `child` is killed and reaped before the error is
    /// returned.
    pub fn new(mut child: Child, stderr_sink: Option<StderrSink>) -> Result<Self> {
        let plumbing = match Plumbing::take_from(&mut child, stderr_sink) {
            Ok(plumbing) => plumbing,
            Err(e) => {
                warn!(pid = child.id(), "Engine process setup failed, killing it: {}", e);
                if let Err(kill_err) = child.kill() {
                    debug!("Kill after failed setup: {}", kill_err);
                }
                if let Err(wait_err) = child.wait() {
                    warn!("Failed to reap engine process: {}", wait_err);
                }
                return Err(e);
            }
        };

        let pid = child.id();
        debug!(session = %plumbing.id, pid, "Engine process controller created");

        Ok(Self {
            id: plumbing.id,
            pid,
            child: Mutex::new(child),
            stdin: Arc::new(Mutex::new(Some(plumbing.stdin))),
            stdout: Mutex::new(Some(plumbing.stdout)),
            stderr: Arc::new(plumbing.stderr),
            runtime: Mutex::new(Some(plumbing.runtime)),
            call_slot: Mutex::new(()),
            cancelled: Arc::new(AtomicBool::new(false)),
            terminated: AtomicBool::new(false),
        })
    }

    /// Session identifier used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// OS process id of the engine
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> SessionState {
        if self.is_terminated() {
            SessionState::Terminated
        } else {
            SessionState::Running
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Run one call and hand the handler back once it reports completion
    ///
    /// Blocks the calling thread, so it must not be invoked from inside an
    /// async runtime. `input` of `None` sends nothing and only reads. With
    /// `close_input_on_exhaustion`, engine stdin is closed once `input` is
    /// exhausted; otherwise it is only flushed. `None` for `timeout` waits
    /// indefinitely.
    ///
    /// On any error the engine process is destroyed before returning.
    pub fn call<H>(
        &self,
        input: Option<CallInput>,
        close_input_on_exhaustion: bool,
        handler: H,
        timeout: Option<Duration>,
    ) -> Result<H>
    where
        H: OutputHandler + 'static,
    {
        let _slot = match self.call_slot.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(Error::CallInFlight),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        if self.is_terminated() {
            return Err(Error::ProcessTerminated);
        }

        let stdout = lock(&self.stdout)
            .take()
            .ok_or_else(|| Error::logic("engine stdout is unavailable between calls"))?;
        let handle = match lock(&self.runtime).as_ref() {
            Some(runtime) => runtime.handle().clone(),
            None => return Err(Error::ProcessTerminated),
        };

        trace!(session = %self.id, ?timeout, "Starting call");

        let writer = {
            let stdin = Arc::clone(&self.stdin);
            let stderr = Arc::clone(&self.stderr);
            let cancelled = Arc::clone(&self.cancelled);
            handle.spawn_blocking(move || {
                write_input(input, close_input_on_exhaustion, &stdin, &stderr, &cancelled)
            })
        };
        let reader = {
            let stderr = Arc::clone(&self.stderr);
            let cancelled = Arc::clone(&self.cancelled);
            handle.spawn_blocking(move || read_output(stdout, handler, &stderr, &cancelled))
        };

        let outcome = handle.block_on(async move {
            let both = async { tokio::try_join!(join_worker(writer), join_worker(reader)) };
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, both).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::CallTimeout { timeout: limit }),
                },
                None => both.await,
            }
        });

        match outcome {
            Ok(((), (handler, stdout))) => {
                *lock(&self.stdout) = Some(stdout);
                trace!(session = %self.id, "Call completed");
                Ok(handler)
            }
            Err(err) => {
                let err = match err {
                    Error::CallTimeout { .. } => err,
                    _ if self.cancelled.load(Ordering::SeqCst) => Error::ProcessTerminated,
                    _ => err,
                };
                warn!(session = %self.id, "Call failed, destroying engine process: {}", err);
                self.shutdown(false);
                Err(err)
            }
        }
    }

    /// Terminate the engine process
    ///
    /// Cancels an in-flight call first. Otherwise stdin is closed and the
    /// process gets [`TERMINATION_GRACE_PERIOD`] to exit before being
    /// killed. Safe to call any number of times.
    pub fn terminate(&self) -> TerminationOutcome {
        if self.is_terminated() {
            return TerminationOutcome::AlreadyTerminated;
        }

        match self.call_slot.try_lock() {
            Ok(_slot) => self.shutdown(true),
            Err(TryLockError::Poisoned(poisoned)) => {
                let _slot = poisoned.into_inner();
                self.shutdown(true)
            }
            Err(TryLockError::WouldBlock) => {
                debug!(session = %self.id, "Cancelling in-flight call");
                self.cancelled.store(true, Ordering::SeqCst);
                self.kill();
                let _slot = lock(&self.call_slot);
                match self.shutdown(false) {
                    TerminationOutcome::AlreadyTerminated => TerminationOutcome::ForciblyDestroyed,
                    outcome => outcome,
                }
            }
        }
    }

    /// Tear everything down; the caller must hold the call slot
    fn shutdown(&self, graceful: bool) -> TerminationOutcome {
        if self.terminated.swap(true, Ordering::SeqCst) {
            return TerminationOutcome::AlreadyTerminated;
        }
        self.cancelled.store(true, Ordering::SeqCst);

        let outcome = if graceful {
            lock(&self.stdin).take();
            match self.wait_for_exit(TERMINATION_GRACE_PERIOD) {
                Some(outcome) => outcome,
                None => {
                    self.kill();
                    TerminationOutcome::ForciblyDestroyed
                }
            }
        } else {
            self.kill();
            lock(&self.stdin).take();
            TerminationOutcome::ForciblyDestroyed
        };

        self.stderr.close();
        lock(&self.stdout).take();
        if let Some(runtime) = lock(&self.runtime).take() {
            runtime.shutdown_background();
        }

        info!(session = %self.id, pid = self.pid, ?outcome, "Engine process terminated");
        outcome
    }

    /// Poll for a natural exit; `None` if the process is still running
    fn wait_for_exit(&self, grace: Duration) -> Option<TerminationOutcome> {
        let deadline = Instant::now() + grace;
        loop {
            match lock(&self.child).try_wait() {
                Ok(Some(status)) => {
                    // Death by signal has no exit code
                    return Some(status.code().map_or(
                        TerminationOutcome::ForciblyDestroyed,
                        TerminationOutcome::Exited,
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(session = %self.id, "Failed to poll engine process: {}", e);
                    return None;
                }
            }
            if Instant::now() >= deadline {
                debug!(session = %self.id, "Engine did not exit within {:?}", grace);
                return None;
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }

    fn kill(&self) {
        let mut child = lock(&self.child);
        if let Err(e) = child.kill() {
            debug!(session = %self.id, "Kill failed (process may have exited): {}", e);
        }
        if let Err(e) = child.wait() {
            warn!(session = %self.id, "Failed to reap engine process: {}", e);
        }
    }
}

impl Drop for ProcessController {
    fn drop(&mut self) {
        if !self.is_terminated() {
            debug!(session = %self.id, "Controller dropped while running; terminating");
            self.terminate();
        }
    }
}

impl std::fmt::Debug for ProcessController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessController")
            .field("id", &self.id)
            .field("pid", &self.pid)
            .field("state", &self.state())
            .finish()
    }
}

async fn join_worker<T>(worker: JoinHandle<Result<T>>) -> Result<T> {
    worker.await?
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
