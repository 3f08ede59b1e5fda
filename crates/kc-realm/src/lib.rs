//! # kc-realm
//!
//! Realm lifecycle, configuration, credential policy and role-based access
//! control.
//!
//! Every operation takes the [`KeycloakSession`](kc_spi::KeycloakSession) it
//! runs in. [`RealmModel`] handles are bound to the session that produced
//! them and refuse to work with any other.
//!
//! ## Example
//!
//! ```ignore
//! let factory = bootstrap::build_session_factory(&config).await?;
//! let manager = RealmManager::from_config(&config)?;
//!
//! let mut session = factory.create_session()?;
//! session.begin().await?;
//! let mut realm = manager.create_realm(&mut session, "JUGGLER").await?;
//! realm.set_enabled(&mut session, true)?;
//! realm.add_required_credential(&mut session, "password")?;
//! let user = realm.add_user(&mut session, "bburke").await?;
//! realm.update_credential(&mut session, &user, &UserCredential::password("geheim")).await?;
//! session.commit().await?;
//! session.close().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
mod credential;
pub mod manager;
pub mod model;
mod rbac;

pub use manager::RealmManager;
pub use model::RealmModel;

use kc_core::{Error, Result};

/// Rejects empty and whitespace-only names.
pub(crate) fn require_name<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    Ok(value)
}
