//! Credential policy: required credential types and user credentials.

use std::sync::Arc;

use kc_auth::{AuthError, AuthResult, PasswordHasherService};
use kc_core::event::{Event, EventType};
use kc_core::{Error, Result};
use kc_model::{
    CredentialType, PasswordCredentialData, RequiredCredential, StoredCredential, User,
    UserCredential,
};
use kc_spi::KeycloakSession;
use kc_storage::{CredentialProvider, UserProvider};
use tokio::task;

use crate::model::RealmModel;

impl RealmModel {
    /// Requires a credential type in this realm.
    ///
    /// The entry is classified canonically; adding a type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown type tag.
    pub fn add_required_credential(
        &mut self,
        session: &mut KeycloakSession,
        credential_type: &str,
    ) -> Result<()> {
        let credential_type: CredentialType = credential_type.parse()?;
        if self.stage_if(session, |realm| realm.add_required_credential(credential_type))? {
            self.emit_required_credentials(session);
        }
        Ok(())
    }

    /// Replaces the required credential set.
    ///
    /// Every tag is validated before anything changes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if any tag is unknown.
    pub fn update_required_credentials<I, S>(
        &mut self,
        session: &mut KeycloakSession,
        credential_types: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let types = credential_types
            .into_iter()
            .map(|tag| tag.as_ref().parse::<CredentialType>())
            .collect::<Result<Vec<_>>>()?;

        self.stage(session, |realm| realm.replace_required_credentials(types))?;
        self.emit_required_credentials(session);
        Ok(())
    }

    /// Returns the required credentials in insertion order.
    #[must_use]
    pub fn get_required_credentials(&self) -> Vec<RequiredCredential> {
        self.read(|realm| realm.required_credentials.clone())
    }

    /// Stores a credential for a user, replacing any of the same type.
    ///
    /// Secret types are hashed with Argon2id; only the PHC string is kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty value and `Error::NotFound`
    /// if the user is not in this realm.
    pub async fn update_credential(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        credential: &UserCredential,
    ) -> Result<()> {
        if credential.value.is_empty() {
            return Err(Error::validation(format!(
                "{} credential value must not be empty",
                credential.credential_type
            )));
        }
        self.bind(session)?;
        self.require_user(session, user).await?;

        let stored = if credential.credential_type.is_secret() {
            let hash = hash_off_thread(&self.hasher, credential.value.clone()).await?;
            StoredCredential::new(
                user.id,
                self.id(),
                credential.credential_type,
                hash,
                PasswordCredentialData::argon2id().to_json(),
            )
        } else {
            StoredCredential::new(
                user.id,
                self.id(),
                credential.credential_type,
                credential.value.clone(),
                "{}",
            )
        };
        let session_id = session.id();
        session.transaction()?.upsert_credential(&stored).await?;

        Event::builder(EventType::CredentialUpdated)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .detail("credential_type", credential.credential_type.as_str())
            .emit();
        Ok(())
    }

    /// Removes the user's credential of the given type.
    ///
    /// Returns `false` if the user had none.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an unknown type tag and
    /// `Error::NotFound` if the user is not in this realm.
    pub async fn remove_credential(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        credential_type: &str,
    ) -> Result<bool> {
        let credential_type: CredentialType = credential_type.parse()?;
        self.bind(session)?;
        self.require_user(session, user).await?;

        let session_id = session.id();
        let tx = session.transaction()?;
        if !tx
            .has_credential_type(self.id(), user.id, credential_type)
            .await?
        {
            return Ok(false);
        }
        tx.delete_credential(self.id(), user.id, credential_type)
            .await?;

        Event::builder(EventType::CredentialRemoved)
            .realm(self.id())
            .user(user.id)
            .session(session_id)
            .detail("credential_type", credential_type.as_str())
            .emit();
        Ok(true)
    }

    /// Lists the credential types the user has stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::State` outside the handle's active session.
    pub async fn get_credential_types(
        &self,
        session: &mut KeycloakSession,
        user: &User,
    ) -> Result<Vec<CredentialType>> {
        self.bind(session)?;
        let stored = session
            .transaction()?
            .list_credentials(self.id(), user.id)
            .await?;
        Ok(stored.into_iter().map(|c| c.credential_type).collect())
    }

    /// Checks a candidate password against the user's stored password.
    ///
    /// A user without a password never validates. A stored record that
    /// cannot be parsed is logged and treated as a mismatch. A match against
    /// a hash made with other Argon2 costs is rehashed with the current ones.
    ///
    /// # Errors
    ///
    /// Returns store errors only; a mismatch is `Ok(false)`.
    pub async fn validate_password(
        &self,
        session: &mut KeycloakSession,
        user: &User,
        candidate: &str,
    ) -> Result<bool> {
        self.bind(session)?;
        let stored = session
            .transaction()?
            .get_credential(self.id(), user.id, CredentialType::Password)
            .await?;

        let Some(stored) = stored else {
            return Ok(false);
        };

        let outcome = verify_off_thread(
            &self.hasher,
            candidate.to_string(),
            stored.secret_data.clone(),
        )
        .await?;
        match outcome {
            Ok(()) => {
                if self.hasher.needs_rehash(&stored.secret_data) {
                    let hash = hash_off_thread(&self.hasher, candidate.to_string()).await?;
                    let upgraded = StoredCredential::new(
                        user.id,
                        self.id(),
                        CredentialType::Password,
                        hash,
                        PasswordCredentialData::argon2id().to_json(),
                    );
                    session.transaction()?.upsert_credential(&upgraded).await?;
                    tracing::debug!(
                        realm_id = %self.id(),
                        user_id = %user.id,
                        "Password rehashed with current policy"
                    );
                }
                Ok(true)
            }
            Err(AuthError::InvalidCredentials) => Ok(false),
            Err(err) => {
                tracing::warn!(
                    realm_id = %self.id(),
                    user_id = %user.id,
                    credential_id = %stored.id,
                    error = %err,
                    "Stored password could not be verified"
                );
                Ok(false)
            }
        }
    }

    async fn require_user(&self, session: &mut KeycloakSession, user: &User) -> Result<()> {
        if user.realm_id != self.id()
            || session
                .transaction()?
                .get_user(self.id(), user.id)
                .await?
                .is_none()
        {
            return Err(Error::not_found(format!(
                "user {} not found in realm {}",
                user.id,
                self.id()
            )));
        }
        Ok(())
    }

    fn emit_required_credentials(&self, session: &KeycloakSession) {
        let types: Vec<&str> = self
            .get_required_credentials()
            .iter()
            .map(|c| c.credential_type.as_str())
            .collect();
        Event::builder(EventType::RequiredCredentialsUpdated)
            .realm(self.id())
            .session(session.id())
            .detail("types", types.join(","))
            .emit();
    }
}

/// Argon2 is CPU bound; it runs on the blocking pool, off the async workers.
async fn hash_off_thread(hasher: &Arc<PasswordHasherService>, value: String) -> Result<String> {
    let hasher = Arc::clone(hasher);
    Ok(task::spawn_blocking(move || hasher.hash(&value))
        .await
        .map_err(|e| Error::Store(format!("password hashing task failed: {e}")))??)
}

async fn verify_off_thread(
    hasher: &Arc<PasswordHasherService>,
    candidate: String,
    hash: String,
) -> Result<AuthResult<()>> {
    let hasher = Arc::clone(hasher);
    task::spawn_blocking(move || hasher.verify(&candidate, &hash))
        .await
        .map_err(|e| Error::Store(format!("password verification task failed: {e}")))
}
