//! Session Reuse
//!
//! Starting an engine is slow, so sessions can be handed back after use and
//! soft reset for the next caller. [`SessionFactory`] describes the
//! lifecycle hooks, [`SessionManager`] the obtain/give-back surface.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::interactive::InteractiveSession;
use crate::error::Result;
use crate::launcher::Launcher;

/// Idle sessions kept by a [`SessionPool`] unless told otherwise
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Lifecycle hooks used by pooling mechanisms
pub trait SessionFactory: Send + Sync {
    /// Start a new ready session
    fn create(&self) -> Result<InteractiveSession>;

    /// Whether `session` can still be handed out
    fn validate(&self, session: &InteractiveSession) -> bool;

    /// Prepare a returned session for its next user; a session that cannot
    /// be prepared is terminated so [`SessionFactory::validate`] rejects it
    fn passivate(&self, session: &InteractiveSession);

    /// Dispose of a session for good
    fn destroy(&self, session: InteractiveSession);
}

/// Obtain/give-back surface for code that does not care whether sessions are reused
pub trait SessionManager: Send + Sync {
    fn obtain(&self) -> Result<InteractiveSession>;

    fn give_back(&self, session: InteractiveSession);
}

/// [`SessionFactory`] launching sessions from a [`Launcher`]
#[derive(Debug)]
pub struct LauncherSessionFactory {
    launcher: Launcher,
}

impl LauncherSessionFactory {
    pub fn new(launcher: Launcher) -> Self {
        Self { launcher }
    }
}

impl SessionFactory for LauncherSessionFactory {
    fn create(&self) -> Result<InteractiveSession> {
        debug!("Creating new pooled session");
        self.launcher.launch_session()
    }

    fn validate(&self, session: &InteractiveSession) -> bool {
        !session.is_terminated()
    }

    fn passivate(&self, session: &InteractiveSession) {
        debug!(session = %session.id(), "Resetting session before returning it to the pool");
        if let Err(e) = session.soft_reset() {
            warn!(session = %session.id(), "Could not reset session, terminating it: {}", e);
            session.terminate();
        }
    }

    fn destroy(&self, session: InteractiveSession) {
        debug!(session = %session.id(), "Terminating pooled session");
        session.terminate();
    }
}

/// Launches a session per [`SessionManager::obtain`] and terminates it on return
#[derive(Debug)]
pub struct OneShotSessionManager {
    launcher: Launcher,
}

impl OneShotSessionManager {
    pub fn new(launcher: Launcher) -> Self {
        Self { launcher }
    }
}

impl SessionManager for OneShotSessionManager {
    fn obtain(&self) -> Result<InteractiveSession> {
        self.launcher.launch_session()
    }

    fn give_back(&self, session: InteractiveSession) {
        session.terminate();
    }
}

/// Keeps returned sessions alive for reuse
pub struct SessionPool<F: SessionFactory> {
    factory: F,
    idle: Mutex<Vec<InteractiveSession>>,
    max_idle: usize,
    closed: AtomicBool,
}

impl<F: SessionFactory> SessionPool<F> {
    pub fn new(factory: F) -> Self {
        Self::with_max_idle(factory, DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(factory: F, max_idle: usize) -> Self {
        info!(max_idle, "Creating session pool");
        Self {
            factory,
            idle: Mutex::new(Vec::new()),
            max_idle,
            closed: AtomicBool::new(false),
        }
    }

    /// Number of sessions waiting to be reused
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Destroy all idle sessions; sessions returned later are destroyed too
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Shutting down session pool");

        let idle: Vec<_> = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for session in idle {
            self.factory.destroy(session);
        }
    }

    fn take_idle(&self) -> Option<InteractiveSession> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }
}

impl<F: SessionFactory> SessionManager for SessionPool<F> {
    fn obtain(&self) -> Result<InteractiveSession> {
        while let Some(session) = self.take_idle() {
            if self.factory.validate(&session) {
                trace!(session = %session.id(), "Reusing idle session");
                return Ok(session);
            }
            debug!(session = %session.id(), "Discarding invalid idle session");
            self.factory.destroy(session);
        }
        self.factory.create()
    }

    fn give_back(&self, session: InteractiveSession) {
        if self.is_shut_down() || !self.factory.validate(&session) {
            self.factory.destroy(session);
            return;
        }

        self.factory.passivate(&session);
        if !self.factory.validate(&session) {
            self.factory.destroy(session);
            return;
        }

        // shutdown() may have run during passivation; decide under the idle lock
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_shut_down() || idle.len() >= self.max_idle {
            drop(idle);
            self.factory.destroy(session);
            return;
        }
        idle.push(session);
    }
}

impl<F: SessionFactory> Drop for SessionPool<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<F: SessionFactory + std::fmt::Debug> std::fmt::Debug for SessionPool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPool")
            .field("factory", &self.factory)
            .field("idle", &self.idle_count())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}
