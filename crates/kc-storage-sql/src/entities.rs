//! Database entity types for `SQLx`.
//!
//! These types map directly to database rows and are converted
//! to/from domain models.

use chrono::{DateTime, Utc};
use kc_model::RequiredCredential;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for realms.
#[derive(Debug, Clone, FromRow)]
pub struct RealmRow {
    pub id: Uuid,
    pub name: String,
    pub enabled: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_code_lifespan: i32,
    pub token_lifespan: i32,
    pub cookie_login_allowed: bool,
    pub automatic_registration_after_social_login: bool,
    pub public_key_pem: Option<String>,
    pub private_key_pem: Option<String>,
    pub default_roles: sqlx::types::Json<Vec<Uuid>>,
    pub required_credentials: sqlx::types::Json<Vec<RequiredCredential>>,
}

/// Database row for users.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub realm_id: Uuid,
    pub username: String,
    pub enabled: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for roles.
#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub realm_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database row for credentials.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub realm_id: Uuid,
    pub credential_type: String,
    pub created_at: DateTime<Utc>,
    pub secret_data: String,
    pub credential_data: String,
}
