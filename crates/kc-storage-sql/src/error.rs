//! SQL storage error types.

use kc_storage::StorageError;
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Converts a `SQLx` error to a storage error.
///
/// Unique constraint violations (`PostgreSQL` error code 23505) become
/// [`StorageError::Duplicate`], named after the violated constraint.
#[allow(clippy::needless_pass_by_value)]
pub fn from_sqlx_error(err: SqlxError) -> StorageError {
    match err {
        SqlxError::RowNotFound => StorageError::Internal("Row not found".to_string()),
        SqlxError::Database(db_err) => {
            if db_err.code().is_some_and(|c| c == "23505") {
                let (entity_type, field) = constraint_target(db_err.constraint());
                StorageError::duplicate(entity_type, field, db_err.message())
            } else if db_err.code().is_some_and(|c| c == "23503") {
                // Foreign key violation
                StorageError::InvalidData(format!("Reference violation: {}", db_err.message()))
            } else {
                StorageError::Query(db_err.to_string())
            }
        }
        SqlxError::PoolTimedOut => StorageError::Connection("Connection pool timeout".to_string()),
        SqlxError::PoolClosed => StorageError::Connection("Connection pool closed".to_string()),
        SqlxError::Io(io) => StorageError::Connection(io.to_string()),
        _ => StorageError::Internal(err.to_string()),
    }
}

/// Maps a constraint name from the migration to the entity and field it guards.
fn constraint_target(constraint: Option<&str>) -> (&'static str, &'static str) {
    match constraint {
        Some("roles_realm_id_name_key") => ("Role", "name"),
        Some("users_realm_id_username_key") => ("User", "username"),
        Some("credentials_user_id_credential_type_key") => ("Credential", "credential_type"),
        Some("realms_pkey") => ("Realm", "id"),
        Some("roles_pkey") => ("Role", "id"),
        Some("users_pkey") => ("User", "id"),
        _ => ("Entity", "key"),
    }
}

/// Creates a not found error for the given entity type and ID.
pub const fn not_found(entity_type: &'static str, id: Uuid) -> StorageError {
    StorageError::not_found(entity_type, id)
}
