//! Session factory.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kc_core::{Error, Result};
use kc_storage::IdentityStore;

use crate::session::{KeycloakSession, OpenSessionGuard};

/// Creates [`KeycloakSession`]s against one identity store.
///
/// `shutdown` must be called exactly once, after every session created by
/// the factory has been closed.
pub struct KeycloakSessionFactory {
    store: Arc<dyn IdentityStore>,
    open_sessions: Arc<AtomicUsize>,
    shut_down: AtomicBool,
}

impl fmt::Debug for KeycloakSessionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeycloakSessionFactory")
            .field("backend", &self.store.backend())
            .field("open_sessions", &self.open_sessions())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl KeycloakSessionFactory {
    /// Opens a factory over the given store.
    #[must_use]
    pub fn open(store: Arc<dyn IdentityStore>) -> Self {
        tracing::debug!(backend = store.backend(), "Session factory opened");
        Self {
            store,
            open_sessions: Arc::new(AtomicUsize::new(0)),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Creates a new session in the `Created` state.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` after [`shutdown`](Self::shutdown).
    pub fn create_session(&self) -> Result<KeycloakSession> {
        let guard = OpenSessionGuard::new(Arc::clone(&self.open_sessions));
        if self.shut_down.load(Ordering::SeqCst) {
            return Err(Error::state("session factory has been shut down"));
        }
        Ok(KeycloakSession::new(Arc::clone(&self.store), guard))
    }

    /// Shuts the factory down and releases the store.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` if called twice or while sessions are still
    /// open; in the latter case the factory stays usable.
    pub async fn shutdown(&self) -> Result<()> {
        if self
            .shut_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::state("session factory already shut down"));
        }

        let open = self.open_sessions();
        if open > 0 {
            self.shut_down.store(false, Ordering::SeqCst);
            return Err(Error::state(format!(
                "cannot shut down with {open} open session(s)"
            )));
        }

        self.store.close().await;
        tracing::info!(backend = self.store.backend(), "Session factory shut down");
        Ok(())
    }

    /// Returns the number of sessions not yet closed.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    /// Returns whether the factory has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn IdentityStore> {
        &self.store
    }
}
