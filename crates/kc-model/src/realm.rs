//! Realm domain model.
//!
//! A realm is the top-level container for all identity entities.
//! Each realm is isolated and owns its own users, roles and
//! credential policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::{CredentialType, RequiredCredential};

/// A realm.
///
/// The identifier is assigned once at construction and never changes.
/// Names are human readable and not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable realm name.
    pub name: String,
    /// Whether the realm is enabled.
    pub enabled: bool,
    /// Optimistic concurrency counter, advanced by the store on every
    /// update. An update carrying an older value is rejected.
    #[serde(default)]
    pub version: i64,

    // === Timestamps ===
    /// When the realm was created.
    pub created_at: DateTime<Utc>,
    /// When the realm was last updated.
    pub updated_at: DateTime<Utc>,

    // === Lifespans (seconds) ===
    /// Authorization code lifespan.
    pub access_code_lifespan: i32,
    /// Token lifespan.
    pub token_lifespan: i32,

    // === Login Settings ===
    /// Allow login through an existing cookie.
    pub cookie_login_allowed: bool,
    /// Register users automatically after a social login.
    pub automatic_registration_after_social_login: bool,

    // === Keys ===
    /// Public key material (PEM, opaque to the core).
    pub public_key_pem: Option<String>,
    /// Private key material (PEM, opaque to the core).
    pub private_key_pem: Option<String>,

    // === Policy ===
    /// Default role IDs in declaration order.
    pub default_roles: Vec<Uuid>,
    /// Credential types required during authentication.
    pub required_credentials: Vec<RequiredCredential>,
}

impl Realm {
    /// Creates a new, disabled realm with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            enabled: false,
            version: 0,
            created_at: now,
            updated_at: now,
            access_code_lifespan: 60, // 1 minute
            token_lifespan: 300,      // 5 minutes
            cookie_login_allowed: false,
            automatic_registration_after_social_login: false,
            public_key_pem: None,
            private_key_pem: None,
            default_roles: Vec::new(),
            required_credentials: Vec::new(),
        }
    }

    /// Sets both lifespans.
    #[must_use]
    pub const fn with_lifespans(mut self, access_code_lifespan: i32, token_lifespan: i32) -> Self {
        self.access_code_lifespan = access_code_lifespan;
        self.token_lifespan = token_lifespan;
        self
    }

    /// Records a modification.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Appends a default role unless it is already declared.
    ///
    /// Returns `true` if the list changed.
    pub fn add_default_role(&mut self, role_id: Uuid) -> bool {
        if self.default_roles.contains(&role_id) {
            return false;
        }
        self.default_roles.push(role_id);
        true
    }

    /// Removes a default role declaration.
    ///
    /// Returns `true` if the list changed.
    pub fn remove_default_role(&mut self, role_id: Uuid) -> bool {
        let before = self.default_roles.len();
        self.default_roles.retain(|id| *id != role_id);
        before != self.default_roles.len()
    }

    /// Checks whether a role is declared as default.
    #[must_use]
    pub fn is_default_role(&self, role_id: Uuid) -> bool {
        self.default_roles.contains(&role_id)
    }

    /// Inserts the canonical entry for a credential type.
    ///
    /// Returns `true` if the set changed.
    pub fn add_required_credential(&mut self, credential_type: CredentialType) -> bool {
        if self.requires(credential_type) {
            return false;
        }
        self.required_credentials
            .push(RequiredCredential::canonical(credential_type));
        true
    }

    /// Replaces the whole required-credential set.
    ///
    /// Duplicates collapse onto their first occurrence; every entry is
    /// classified canonically.
    pub fn replace_required_credentials(
        &mut self,
        types: impl IntoIterator<Item = CredentialType>,
    ) {
        let mut entries: Vec<RequiredCredential> = Vec::new();
        for credential_type in types {
            if !entries.iter().any(|c| c.credential_type == credential_type) {
                entries.push(RequiredCredential::canonical(credential_type));
            }
        }
        self.required_credentials = entries;
    }

    /// Checks whether a credential type is required.
    #[must_use]
    pub fn requires(&self, credential_type: CredentialType) -> bool {
        self.required_credentials
            .iter()
            .any(|c| c.credential_type == credential_type)
    }
}
