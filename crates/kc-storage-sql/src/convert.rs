//! Conversion between database entities and domain models.

use kc_model::{CredentialType, Realm, Role, StoredCredential, User};
use kc_storage::StorageError;

use crate::entities::{CredentialRow, RealmRow, RoleRow, UserRow};

/// Convert a `RealmRow` to a `Realm` domain model.
impl From<RealmRow> for Realm {
    fn from(row: RealmRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            enabled: row.enabled,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
            access_code_lifespan: row.access_code_lifespan,
            token_lifespan: row.token_lifespan,
            cookie_login_allowed: row.cookie_login_allowed,
            automatic_registration_after_social_login: row
                .automatic_registration_after_social_login,
            public_key_pem: row.public_key_pem,
            private_key_pem: row.private_key_pem,
            default_roles: row.default_roles.0,
            required_credentials: row.required_credentials.0,
        }
    }
}

/// Convert a `UserRow` to a `User` domain model.
impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            realm_id: row.realm_id,
            username: row.username,
            enabled: row.enabled,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Convert a `RoleRow` to a `Role` domain model.
impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            realm_id: row.realm_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Convert a `CredentialRow` to a `StoredCredential`.
///
/// Rows with an unknown type tag are rejected rather than guessed at.
impl TryFrom<CredentialRow> for StoredCredential {
    type Error = StorageError;

    fn try_from(row: CredentialRow) -> Result<Self, Self::Error> {
        let credential_type: CredentialType = row
            .credential_type
            .parse()
            .map_err(|e: kc_core::Error| StorageError::InvalidData(e.to_string()))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            realm_id: row.realm_id,
            credential_type,
            created_at: row.created_at,
            secret_data: row.secret_data,
            credential_data: row.credential_data,
        })
    }
}
