//! Engine sessions
//!
//! [`InteractiveSession`] for call/response use of a long-lived engine,
//! [`BatchRunner`] for one-shot scripts, and pooling glue for reusing
//! interactive sessions.

pub mod batch;
pub mod interactive;
pub mod pool;

pub use batch::{BatchOutput, BatchRunner};
pub use interactive::{build_call_input, InteractiveSession, CALL_SENTINEL, SOFT_RESET_CALL};
pub use pool::{
    LauncherSessionFactory, OneShotSessionManager, SessionFactory, SessionManager, SessionPool,
    DEFAULT_MAX_IDLE,
};
