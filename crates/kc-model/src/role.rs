//! Role domain model.
//!
//! Roles are used for role-based access control (RBAC). Every role is
//! scoped to exactly one realm; users hold roles through grants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A realm role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// Role name (unique within the realm).
    pub name: String,
    /// Role description.
    pub description: Option<String>,

    // === Scope ===
    /// Realm this role belongs to.
    pub realm_id: Uuid,

    // === Timestamps ===
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new realm role.
    #[must_use]
    pub fn new(realm_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            realm_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Checks if the role belongs to the given realm.
    #[must_use]
    pub fn belongs_to(&self, realm_id: Uuid) -> bool {
        self.realm_id == realm_id
    }
}
