//! Keycloak session management.
//!
//! A [`KeycloakSession`] is the unit of work every realm operation runs in.
//! It owns one store transaction between `begin` and `commit`/`rollback`
//! and moves through the states
//! `Created -> Active -> Committed | RolledBack -> Closed`.
//!
//! Realms read in a session are attached to it once; every handle on the
//! same realm shares that copy, so a change made through one handle is seen
//! through all of them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kc_core::{Error, Result};
use kc_model::Realm;
use kc_storage::{IdentityStore, RealmProvider, StoreTransaction};
use parking_lot::RwLock;
use uuid::Uuid;

/// A realm attached to a session, shared by every handle on it.
pub type SharedRealm = Arc<RwLock<Realm>>;

/// Lifecycle state of a [`KeycloakSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    /// Created but not begun.
    Created,
    /// Begun; reads and writes are allowed.
    Active,
    /// Committed; every write is durable.
    Committed,
    /// Rolled back; every write was discarded.
    RolledBack,
    /// Closed; the session holds no resources.
    Closed,
}

impl TransactionState {
    /// Returns the state name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts a session as open until it is closed or dropped.
#[derive(Debug)]
pub(crate) struct OpenSessionGuard(Arc<AtomicUsize>);

impl OpenSessionGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for OpenSessionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A Keycloak session represents a unit of work.
///
/// All store access goes through [`KeycloakSession::transaction`], which is
/// only available while the session is active. Realm configuration changes
/// are staged on the session and written to the store at commit.
pub struct KeycloakSession {
    /// Unique session identifier.
    id: Uuid,

    store: Arc<dyn IdentityStore>,

    state: TransactionState,

    /// Present exactly while `Active`.
    tx: Option<Box<dyn StoreTransaction>>,

    /// Realms read or created in this session.
    realms: HashMap<Uuid, SharedRealm>,

    /// Attached realms with pending configuration changes.
    dirty_realms: HashSet<Uuid>,

    guard: Option<OpenSessionGuard>,
}

impl fmt::Debug for KeycloakSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeycloakSession")
            .field("id", &self.id)
            .field("backend", &self.store.backend())
            .field("state", &self.state)
            .field("realms", &self.realms.len())
            .field("dirty_realms", &self.dirty_realms.len())
            .finish_non_exhaustive()
    }
}

impl KeycloakSession {
    pub(crate) fn new(store: Arc<dyn IdentityStore>, guard: OpenSessionGuard) -> Self {
        Self {
            id: Uuid::now_v7(),
            store,
            state: TransactionState::Created,
            tx: None,
            realms: HashMap::new(),
            dirty_realms: HashSet::new(),
            guard: Some(guard),
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns whether reads and writes are currently allowed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Returns whether this session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == TransactionState::Closed
    }

    /// Starts the unit of work.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless the session is freshly created, or a
    /// store error if the transaction cannot be opened.
    pub async fn begin(&mut self) -> Result<()> {
        if self.state != TransactionState::Created {
            return Err(Error::state(format!(
                "cannot begin a session that is {}",
                self.state
            )));
        }

        self.tx = Some(self.store.begin().await?);
        self.state = TransactionState::Active;
        tracing::debug!(session_id = %self.id, "Session begun");
        Ok(())
    }

    /// Flushes staged realms and commits the store transaction.
    ///
    /// If either step fails the store transaction is discarded, the session
    /// ends up `RolledBack` and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless active, `Error::Conflict` if a
    /// concurrent commit claimed the same unique key or changed a realm this
    /// session modified since it was read, or a store error.
    pub async fn commit(&mut self) -> Result<()> {
        let mut tx = self.take_active("commit")?;
        let dirty: Vec<Realm> = self
            .dirty_realms
            .drain()
            .filter_map(|id| self.realms.get(&id).map(|realm| realm.read().clone()))
            .collect();
        self.realms.clear();

        for realm in &dirty {
            if let Err(err) = tx.update_realm(realm).await {
                self.state = TransactionState::RolledBack;
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        session_id = %self.id,
                        error = %rollback_err,
                        "Rollback after failed flush also failed"
                    );
                }
                return Err(err.into());
            }
        }

        if let Err(err) = tx.commit().await {
            self.state = TransactionState::RolledBack;
            tracing::debug!(session_id = %self.id, error = %err, "Session commit failed");
            return Err(err.into());
        }

        self.state = TransactionState::Committed;
        tracing::debug!(
            session_id = %self.id,
            flushed_realms = dirty.len(),
            "Session committed"
        );
        Ok(())
    }

    /// Discards every write made in this session.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless active. The session is `RolledBack`
    /// even if the store reports a failure.
    pub async fn rollback(&mut self) -> Result<()> {
        let tx = self.take_active("roll back")?;
        self.realms.clear();
        self.dirty_realms.clear();
        self.state = TransactionState::RolledBack;
        tx.rollback().await?;
        tracing::debug!(session_id = %self.id, "Session rolled back");
        Ok(())
    }

    /// Closes the session, rolling back first if it is still active.
    ///
    /// Closing is allowed from any state and closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the store error if the implicit rollback fails; the session
    /// is closed regardless.
    pub async fn close(&mut self) -> Result<()> {
        if self.state == TransactionState::Closed {
            return Ok(());
        }

        let result = if self.state == TransactionState::Active {
            self.rollback().await
        } else {
            Ok(())
        };

        self.tx = None;
        self.realms.clear();
        self.dirty_realms.clear();
        self.state = TransactionState::Closed;
        self.guard = None;
        tracing::debug!(session_id = %self.id, "Session closed");
        result
    }

    /// Returns the active store transaction.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless the session is active.
    pub fn transaction(&mut self) -> Result<&mut dyn StoreTransaction> {
        if self.state != TransactionState::Active {
            return Err(self.inactive_error("access the store"));
        }
        match self.tx.as_deref_mut() {
            Some(tx) => Ok(tx),
            None => Err(Error::state("active session has no store transaction")),
        }
    }

    /// Ensures the session is active.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` otherwise.
    pub fn ensure_active(&self) -> Result<()> {
        if self.state == TransactionState::Active {
            Ok(())
        } else {
            Err(self.inactive_error("use the session"))
        }
    }

    /// Returns the copy of a realm attached to this session, if any.
    #[must_use]
    pub fn attached_realm(&self, id: Uuid) -> Option<SharedRealm> {
        self.realms.get(&id).map(Arc::clone)
    }

    /// Attaches a realm read from the store and returns the shared copy.
    ///
    /// A realm that is already attached keeps its session copy, which may
    /// carry pending changes; `loaded` is ignored in that case.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless the session is active.
    pub fn attach_realm(&mut self, loaded: Realm) -> Result<SharedRealm> {
        self.ensure_active()?;
        let shared = self
            .realms
            .entry(loaded.id)
            .or_insert_with(|| Arc::new(RwLock::new(loaded)));
        Ok(Arc::clone(shared))
    }

    /// Applies a change to an attached realm.
    ///
    /// `change` returns whether it modified the realm; only then is the
    /// realm marked for flushing at commit. The result of `change` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` unless the session is active and
    /// `Error::NotFound` if the realm is not attached (for instance because
    /// it was deleted in this session).
    pub fn modify_realm<F>(&mut self, id: Uuid, change: F) -> Result<bool>
    where
        F: FnOnce(&mut Realm) -> bool,
    {
        self.ensure_active()?;
        let shared = self
            .realms
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("realm {id} is not attached to this session")))?;

        let mut realm = shared.write();
        let changed = change(&mut realm);
        if changed {
            realm.touch();
            self.dirty_realms.insert(id);
        }
        Ok(changed)
    }

    /// Detaches a realm, dropping any pending change to it.
    pub fn discard_realm(&mut self, id: Uuid) {
        self.realms.remove(&id);
        self.dirty_realms.remove(&id);
    }

    fn take_active(&mut self, action: &str) -> Result<Box<dyn StoreTransaction>> {
        if self.state != TransactionState::Active {
            return Err(self.inactive_error(action));
        }
        self.tx
            .take()
            .ok_or_else(|| Error::state("active session has no store transaction"))
    }

    fn inactive_error(&self, action: &str) -> Error {
        Error::state(format!(
            "cannot {action}: session {} is {}",
            self.id, self.state
        ))
    }
}

impl Drop for KeycloakSession {
    fn drop(&mut self) {
        if self.state != TransactionState::Closed {
            tracing::warn!(
                session_id = %self.id,
                state = %self.state,
                "Session dropped without close; discarding pending work"
            );
        }
    }
}
