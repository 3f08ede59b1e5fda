//! Credential domain model.
//!
//! Three shapes of credential live here:
//! - [`RequiredCredential`] - a credential type a realm mandates,
//! - [`UserCredential`] - a transient, caller-supplied value,
//! - [`StoredCredential`] - what the identity store persists.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use kc_core::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credential type.
///
/// The set is closed: classification of a type is fixed by
/// [`CredentialType::policy`] and never derived from caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    /// Password credential.
    Password,
    /// TOTP (Time-based One-Time Password) seed.
    Totp,
    /// Client certificate.
    #[serde(rename = "cert")]
    ClientCert,
}

/// Classification of a credential type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// The user must supply the credential while authenticating.
    pub input: bool,
    /// The stored form must not allow recovery of the value.
    pub secret: bool,
}

impl CredentialType {
    /// All known credential types.
    pub const ALL: [Self; 3] = [Self::Password, Self::Totp, Self::ClientCert];

    /// Returns the string representation used in storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Totp => "totp",
            Self::ClientCert => "cert",
        }
    }

    /// Returns the canonical classification of this type.
    #[must_use]
    pub const fn policy(&self) -> CredentialPolicy {
        match self {
            Self::Password => CredentialPolicy {
                input: true,
                secret: true,
            },
            Self::Totp => CredentialPolicy {
                input: true,
                secret: false,
            },
            Self::ClientCert => CredentialPolicy {
                input: false,
                secret: false,
            },
        }
    }

    /// Checks if values of this type must be stored one-way.
    #[must_use]
    pub const fn is_secret(&self) -> bool {
        self.policy().secret
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "totp" | "one-time-password" => Ok(Self::Totp),
            "cert" => Ok(Self::ClientCert),
            other => Err(Error::validation(format!(
                "unknown credential type '{other}'"
            ))),
        }
    }
}

/// A credential type mandated by a realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredCredential {
    /// Credential type.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// The user must supply this credential during authentication.
    pub input: bool,
    /// The value must never be exposed once stored.
    pub secret: bool,
}

impl RequiredCredential {
    /// Creates the canonical entry for a credential type.
    #[must_use]
    pub const fn canonical(credential_type: CredentialType) -> Self {
        let policy = credential_type.policy();
        Self {
            credential_type,
            input: policy.input,
            secret: policy.secret,
        }
    }
}

/// A transient credential supplied by a caller.
///
/// The value is held in clear form only for as long as it takes to store
/// or verify it; `Debug` output never shows it.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredential {
    /// Credential type.
    pub credential_type: CredentialType,
    /// Clear or caller-supplied value.
    pub value: String,
}

impl UserCredential {
    /// Creates a new transient credential.
    #[must_use]
    pub fn new(credential_type: CredentialType, value: impl Into<String>) -> Self {
        Self {
            credential_type,
            value: value.into(),
        }
    }

    /// Creates a password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self::new(CredentialType::Password, value)
    }

    /// Creates a TOTP seed credential.
    #[must_use]
    pub fn totp(value: impl Into<String>) -> Self {
        Self::new(CredentialType::Totp, value)
    }
}

impl fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredential")
            .field("credential_type", &self.credential_type)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// A persisted user credential.
///
/// ## Security Note
///
/// For secret types `secret_data` holds a PHC-formatted Argon2id hash that
/// carries its own salt and cost parameters; the clear value is never
/// stored. Non-secret types keep the value as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    // === Identity ===
    /// Unique identifier.
    pub id: Uuid,
    /// User this credential belongs to.
    pub user_id: Uuid,
    /// Realm this credential belongs to.
    pub realm_id: Uuid,

    // === Type ===
    /// Credential type.
    pub credential_type: CredentialType,

    // === Timestamps ===
    /// When the credential was created.
    pub created_at: DateTime<Utc>,

    // === Credential Data ===
    /// Stored value (hash for secret types).
    pub secret_data: String,
    /// Credential metadata as JSON (e.g. hash algorithm).
    pub credential_data: String,
}

impl StoredCredential {
    /// Creates a new stored credential.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        realm_id: Uuid,
        credential_type: CredentialType,
        secret_data: impl Into<String>,
        credential_data: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            realm_id,
            credential_type,
            created_at: Utc::now(),
            secret_data: secret_data.into(),
            credential_data: credential_data.into(),
        }
    }
}

/// Password credential data structure.
///
/// This is stored in the `credential_data` field for secret credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentialData {
    /// Hash algorithm used.
    pub algorithm: String,
    /// Additional algorithm-specific parameters.
    #[serde(default)]
    pub additional_parameters: HashMap<String, String>,
}

impl PasswordCredentialData {
    /// Creates credential data for Argon2id.
    #[must_use]
    pub fn argon2id() -> Self {
        Self {
            algorithm: "argon2id".to_string(),
            additional_parameters: HashMap::new(),
        }
    }

    /// Serializes the data for the `credential_data` column.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| format!(r#"{{"algorithm":"{}"}}"#, self.algorithm))
    }
}
