//! Store state and the write log replayed at commit.

use std::collections::{HashMap, HashSet};

use kc_model::{CredentialType, Realm, Role, StoredCredential, User};
use kc_storage::{StorageError, StorageResult};
use uuid::Uuid;

/// One consistent version of the whole store.
#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    pub(crate) realms: HashMap<Uuid, Realm>,
    pub(crate) roles: HashMap<Uuid, Role>,
    pub(crate) users: HashMap<Uuid, User>,
    pub(crate) credentials: HashMap<(Uuid, CredentialType), StoredCredential>,
    /// (user id, role id)
    pub(crate) grants: HashSet<(Uuid, Uuid)>,
}

/// A write performed by a transaction.
#[derive(Debug, Clone)]
pub(crate) enum Op {
    CreateRealm(Realm),
    UpdateRealm(Realm),
    DeleteRealm(Uuid),
    CreateRole(Role),
    DeleteRole {
        realm_id: Uuid,
        id: Uuid,
    },
    CreateUser(User),
    DeleteUser {
        realm_id: Uuid,
        id: Uuid,
    },
    Grant {
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    },
    Revoke {
        user_id: Uuid,
        role_id: Uuid,
    },
    UpsertCredential(StoredCredential),
    DeleteCredential {
        user_id: Uuid,
        credential_type: CredentialType,
    },
}

impl Snapshot {
    /// Applies a write, checking every constraint first.
    ///
    /// On error the snapshot is left untouched.
    pub(crate) fn apply(&mut self, op: &Op) -> StorageResult<()> {
        match op {
            Op::CreateRealm(realm) => {
                if self.realms.contains_key(&realm.id) {
                    return Err(StorageError::duplicate(
                        "Realm",
                        "id",
                        realm.id.to_string(),
                    ));
                }
                self.realms.insert(realm.id, realm.clone());
            }
            Op::UpdateRealm(realm) => {
                let slot = self
                    .realms
                    .get_mut(&realm.id)
                    .ok_or_else(|| StorageError::not_found("Realm", realm.id))?;
                if slot.version != realm.version {
                    return Err(StorageError::concurrent_modification("Realm", realm.id));
                }
                *slot = Realm {
                    version: realm.version + 1,
                    ..realm.clone()
                };
            }
            Op::DeleteRealm(id) => {
                if self.realms.remove(id).is_none() {
                    return Err(StorageError::not_found("Realm", *id));
                }
                self.roles.retain(|_, role| role.realm_id != *id);
                let users: HashSet<Uuid> = self
                    .users
                    .values()
                    .filter(|user| user.realm_id == *id)
                    .map(|user| user.id)
                    .collect();
                self.users.retain(|user_id, _| !users.contains(user_id));
                self.credentials.retain(|_, cred| cred.realm_id != *id);
                let roles = &self.roles;
                self.grants.retain(|(user_id, role_id)| {
                    !users.contains(user_id) && roles.contains_key(role_id)
                });
            }
            Op::CreateRole(role) => {
                self.require_realm(role.realm_id)?;
                if self.roles.contains_key(&role.id) {
                    return Err(StorageError::duplicate("Role", "id", role.id.to_string()));
                }
                if self.find_role(role.realm_id, &role.name).is_some() {
                    return Err(StorageError::duplicate("Role", "name", role.name.clone()));
                }
                self.roles.insert(role.id, role.clone());
            }
            Op::DeleteRole { realm_id, id } => {
                if !self.roles.get(id).is_some_and(|r| r.realm_id == *realm_id) {
                    return Err(StorageError::not_found("Role", *id));
                }
                self.roles.remove(id);
                self.grants.retain(|(_, role_id)| role_id != id);
            }
            Op::CreateUser(user) => {
                self.require_realm(user.realm_id)?;
                if self.users.contains_key(&user.id) {
                    return Err(StorageError::duplicate("User", "id", user.id.to_string()));
                }
                if self.find_user(user.realm_id, &user.username).is_some() {
                    return Err(StorageError::duplicate(
                        "User",
                        "username",
                        user.username.clone(),
                    ));
                }
                self.users.insert(user.id, user.clone());
            }
            Op::DeleteUser { realm_id, id } => {
                self.require_user(*realm_id, *id)?;
                self.users.remove(id);
                self.credentials.retain(|(user_id, _), _| user_id != id);
                self.grants.retain(|(user_id, _)| user_id != id);
            }
            Op::Grant {
                realm_id,
                user_id,
                role_id,
            } => {
                self.require_user(*realm_id, *user_id)?;
                if !self
                    .roles
                    .get(role_id)
                    .is_some_and(|r| r.realm_id == *realm_id)
                {
                    return Err(StorageError::not_found("Role", *role_id));
                }
                self.grants.insert((*user_id, *role_id));
            }
            Op::Revoke { user_id, role_id } => {
                self.grants.remove(&(*user_id, *role_id));
            }
            Op::UpsertCredential(cred) => {
                self.require_user(cred.realm_id, cred.user_id)?;
                self.credentials
                    .insert((cred.user_id, cred.credential_type), cred.clone());
            }
            Op::DeleteCredential {
                user_id,
                credential_type,
            } => {
                self.credentials.remove(&(*user_id, *credential_type));
            }
        }
        Ok(())
    }

    pub(crate) fn find_role(&self, realm_id: Uuid, name: &str) -> Option<&Role> {
        self.roles
            .values()
            .find(|r| r.realm_id == realm_id && r.name == name)
    }

    pub(crate) fn find_user(&self, realm_id: Uuid, username: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.realm_id == realm_id && u.username == username)
    }

    fn require_realm(&self, realm_id: Uuid) -> StorageResult<()> {
        if self.realms.contains_key(&realm_id) {
            Ok(())
        } else {
            Err(StorageError::not_found("Realm", realm_id))
        }
    }

    fn require_user(&self, realm_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        if self
            .users
            .get(&user_id)
            .is_some_and(|u| u.realm_id == realm_id)
        {
            Ok(())
        } else {
            Err(StorageError::not_found("User", user_id))
        }
    }
}
