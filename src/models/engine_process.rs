//! Engine Process Model
//!
//! Lifecycle state of an engine child process and the result of tearing it down.

/// Lifecycle of a session; only ever moves from `Running` to `Terminated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Process is alive and accepting calls
    #[default]
    Running,
    /// Process has been torn down
    Terminated,
}

/// What happened when a process was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// Process exited on its own after stdin was closed
    Exited(i32),
    /// Process had already been terminated; nothing was done
    AlreadyTerminated,
    /// Process did not exit in time (or died from a signal) and was killed
    ForciblyDestroyed,
}

impl TerminationOutcome {
    /// Sentinel code returned for [`TerminationOutcome::AlreadyTerminated`]
    pub const ALREADY_TERMINATED: i32 = -1;
    /// Sentinel code returned for [`TerminationOutcome::ForciblyDestroyed`]
    pub const FORCIBLY_DESTROYED: i32 = -2;

    /// Integer form: the real exit code, or one of the sentinels
    pub fn code(&self) -> i32 {
        match self {
            TerminationOutcome::Exited(code) => *code,
            TerminationOutcome::AlreadyTerminated => Self::ALREADY_TERMINATED,
            TerminationOutcome::ForciblyDestroyed => Self::FORCIBLY_DESTROYED,
        }
    }
}
