//! In-memory [`IdentityStore`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use kc_model::{CredentialType, Realm, Role, StoredCredential, User};
use kc_storage::{
    CredentialProvider, IdentityStore, RealmProvider, RoleProvider, StorageResult,
    StoreTransaction, UserProvider,
};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::snapshot::{Op, Snapshot};

/// Identity store that keeps all state in process memory.
///
/// Transactions read from a private copy of the committed state taken at
/// `begin`. At commit their writes are replayed against the state committed
/// at that moment, so a concurrent transaction that claimed the same role
/// name or username first makes the later commit fail with
/// `StorageError::Duplicate`, and a realm updated by a transaction that
/// committed first fails with `StorageError::ConcurrentModification`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityStore {
    state: Arc<RwLock<Snapshot>>,
}

impl InMemoryIdentityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let working = self.state.read().clone();
        tracing::debug!(backend = "memory", "Store transaction started");
        Ok(Box::new(InMemoryTransaction {
            state: Arc::clone(&self.state),
            working,
            log: Vec::new(),
        }))
    }
}

/// A transaction against an [`InMemoryIdentityStore`].
#[derive(Debug)]
pub struct InMemoryTransaction {
    state: Arc<RwLock<Snapshot>>,
    working: Snapshot,
    log: Vec<Op>,
}

impl InMemoryTransaction {
    fn write(&mut self, op: Op) -> StorageResult<()> {
        self.working.apply(&op)?;
        self.log.push(op);
        Ok(())
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let Self { state, log, .. } = *self;
        if log.is_empty() {
            return Ok(());
        }

        let mut committed = state.write();
        let mut next = committed.clone();
        for op in &log {
            if let Err(err) = next.apply(op) {
                tracing::debug!(error = %err, "Store commit rejected");
                return Err(err);
            }
        }
        *committed = next;
        tracing::debug!(writes = log.len(), "Store transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        tracing::debug!(writes = self.log.len(), "Store transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl RealmProvider for InMemoryTransaction {
    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        self.write(Op::CreateRealm(realm.clone()))
    }

    async fn update_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        self.write(Op::UpdateRealm(realm.clone()))
    }

    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()> {
        self.write(Op::DeleteRealm(id))
    }

    async fn get_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>> {
        Ok(self.working.realms.get(&id).cloned())
    }

    async fn list_realms(&mut self) -> StorageResult<Vec<Realm>> {
        let mut realms: Vec<Realm> = self.working.realms.values().cloned().collect();
        realms.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(realms)
    }
}

#[async_trait]
impl RoleProvider for InMemoryTransaction {
    async fn create_role(&mut self, role: &Role) -> StorageResult<()> {
        self.write(Op::CreateRole(role.clone()))
    }

    async fn delete_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        self.write(Op::DeleteRole { realm_id, id })
    }

    async fn get_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<Role>> {
        Ok(self
            .working
            .roles
            .get(&id)
            .filter(|r| r.realm_id == realm_id)
            .cloned())
    }

    async fn get_role_by_name(
        &mut self,
        realm_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        Ok(self.working.find_role(realm_id, name).cloned())
    }

    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        let mut roles: Vec<Role> = self
            .working
            .roles
            .values()
            .filter(|r| r.realm_id == realm_id)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl UserProvider for InMemoryTransaction {
    async fn create_user(&mut self, user: &User) -> StorageResult<()> {
        self.write(Op::CreateUser(user.clone()))
    }

    async fn delete_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        self.write(Op::DeleteUser { realm_id, id })
    }

    async fn get_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self
            .working
            .users
            .get(&id)
            .filter(|u| u.realm_id == realm_id)
            .cloned())
    }

    async fn get_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        Ok(self.working.find_user(realm_id, username).cloned())
    }

    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>> {
        let mut users: Vec<User> = self
            .working
            .users
            .values()
            .filter(|u| u.realm_id == realm_id)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn grant_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        self.write(Op::Grant {
            realm_id,
            user_id,
            role_id,
        })
    }

    async fn revoke_role(
        &mut self,
        _realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        self.write(Op::Revoke { user_id, role_id })
    }

    async fn has_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<bool> {
        let in_realm = self
            .working
            .users
            .get(&user_id)
            .is_some_and(|u| u.realm_id == realm_id);
        Ok(in_realm && self.working.grants.contains(&(user_id, role_id)))
    }

    async fn get_user_roles(&mut self, realm_id: Uuid, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        let mut roles: Vec<&Role> = self
            .working
            .grants
            .iter()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, role_id)| self.working.roles.get(role_id))
            .filter(|r| r.realm_id == realm_id)
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles.into_iter().map(|r| r.id).collect())
    }
}

#[async_trait]
impl CredentialProvider for InMemoryTransaction {
    async fn upsert_credential(&mut self, credential: &StoredCredential) -> StorageResult<()> {
        self.write(Op::UpsertCredential(credential.clone()))
    }

    async fn get_credential(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<Option<StoredCredential>> {
        Ok(self
            .working
            .credentials
            .get(&(user_id, credential_type))
            .filter(|c| c.realm_id == realm_id)
            .cloned())
    }

    async fn list_credentials(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<StoredCredential>> {
        let mut creds: Vec<StoredCredential> = self
            .working
            .credentials
            .values()
            .filter(|c| c.user_id == user_id && c.realm_id == realm_id)
            .cloned()
            .collect();
        creds.sort_by_key(|c| c.created_at);
        Ok(creds)
    }

    async fn delete_credential(
        &mut self,
        _realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<()> {
        self.write(Op::DeleteCredential {
            user_id,
            credential_type,
        })
    }
}
