//! Audit events for realm mutations.
//!
//! ## NIST 800-53 Rev5: AU-2 (Event Logging)
//!
//! Every mutation of a realm, its roles, users, grants or credentials
//! produces an [`Event`]. Events are emitted through `tracing` as structured
//! records; credential values never appear in them.
//!
//! ## NIST 800-53 Rev5: AU-3 (Content of Audit Records)
//!
//! All events include:
//! - Timestamp (ISO 8601)
//! - Event type
//! - Realm and user identity (when available)
//! - Outcome (success/failure)
//! - Affected resource details

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    // Realm events
    /// Realm created.
    RealmCreated,
    /// Realm deleted.
    RealmDeleted,
    /// Realm required credentials changed.
    RequiredCredentialsUpdated,

    // User events
    /// User created.
    UserCreated,
    /// User deleted.
    UserDeleted,
    /// User credential created or replaced.
    CredentialUpdated,
    /// User credential removed.
    CredentialRemoved,

    // Role events
    /// Role created.
    RoleCreated,
    /// Role deleted.
    RoleDeleted,
    /// Role declared as a realm default.
    DefaultRoleAdded,
    /// Role assigned to user.
    RoleAssignedToUser,
    /// Role unassigned from user.
    RoleUnassignedFromUser,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A realm audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: EventType,
    /// Outcome of the event.
    pub outcome: EventOutcome,
    /// Realm where the event occurred.
    pub realm_id: Option<Uuid>,
    /// User associated with the event.
    pub user_id: Option<Uuid>,
    /// Unit of work the event was recorded in.
    pub session_id: Option<Uuid>,
    /// Error message (for failure events).
    pub error: Option<String>,
    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Writes the event to the tracing pipeline.
    pub fn emit(&self) {
        tracing::info!(
            event_id = %self.id,
            event_type = ?self.event_type,
            outcome = ?self.outcome,
            realm_id = ?self.realm_id,
            user_id = ?self.user_id,
            session_id = ?self.session_id,
            error = ?self.error,
            details = ?self.details,
            "realm_event"
        );
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    realm_id: Option<Uuid>,
    user_id: Option<Uuid>,
    session_id: Option<Uuid>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            realm_id: None,
            user_id: None,
            session_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the realm ID.
    #[must_use]
    pub const fn realm(mut self, realm_id: Uuid) -> Self {
        self.realm_id = Some(realm_id);
        self
    }

    /// Sets the user ID.
    #[must_use]
    pub const fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Sets the unit of work ID.
    #[must_use]
    pub const fn session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            realm_id: self.realm_id,
            user_id: self.user_id,
            session_id: self.session_id,
            error: self.error,
            details: self.details,
        }
    }

    /// Builds the event and emits it.
    pub fn emit(self) {
        self.build().emit();
    }
}
