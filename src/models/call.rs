//! Call Model
//!
//! Timeout policy for a single call.

use std::time::Duration;

/// How long a call may run before the engine process is killed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallTimeout {
    /// Use the session's configured default
    #[default]
    Default,
    /// Kill the engine once this much wall-clock time has passed
    After(Duration),
    /// Wait for as long as the engine takes
    Unbounded,
}

impl CallTimeout {
    /// Interpret an integer number of seconds using the configuration
    /// convention: zero means "default", negative means "no timeout".
    pub fn from_seconds(seconds: i64) -> Self {
        match seconds {
            0 => CallTimeout::Default,
            s if s > 0 => CallTimeout::After(Duration::from_secs(s as u64)),
            _ => CallTimeout::Unbounded,
        }
    }

    /// Substitute `fallback` when this is [`CallTimeout::Default`]
    pub fn or(self, fallback: CallTimeout) -> CallTimeout {
        match self {
            CallTimeout::Default => fallback,
            other => other,
        }
    }

    /// The deadline to race against, if any
    pub fn limit(&self) -> Option<Duration> {
        match self {
            CallTimeout::After(limit) => Some(*limit),
            CallTimeout::Default | CallTimeout::Unbounded => None,
        }
    }
}

impl From<Duration> for CallTimeout {
    fn from(limit: Duration) -> Self {
        CallTimeout::After(limit)
    }
}
