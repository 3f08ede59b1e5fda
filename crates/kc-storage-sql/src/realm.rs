//! `PostgreSQL` implementation of the realm storage provider.

use async_trait::async_trait;
use kc_model::Realm;
use kc_storage::error::StorageResult;
use kc_storage::{RealmProvider, StorageError};
use uuid::Uuid;

use crate::entities::RealmRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

impl PgTransaction {
    /// Explains an update that matched no row.
    async fn missing_or_stale(&mut self, id: Uuid) -> StorageError {
        let exists: Result<(bool,), _> =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM realms WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await;

        match exists {
            Ok((true,)) => StorageError::concurrent_modification("Realm", id),
            Ok((false,)) => not_found("Realm", id),
            Err(err) => from_sqlx_error(err),
        }
    }
}

#[async_trait]
impl RealmProvider for PgTransaction {
    async fn create_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        let query = sqlx::query(
            r"INSERT INTO realms (
                id, name, enabled, version, created_at, updated_at,
                access_code_lifespan, token_lifespan,
                cookie_login_allowed, automatic_registration_after_social_login,
                public_key_pem, private_key_pem, default_roles, required_credentials
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(realm.id)
        .bind(&realm.name)
        .bind(realm.enabled)
        .bind(realm.version)
        .bind(realm.created_at)
        .bind(realm.updated_at)
        .bind(realm.access_code_lifespan)
        .bind(realm.token_lifespan)
        .bind(realm.cookie_login_allowed)
        .bind(realm.automatic_registration_after_social_login)
        .bind(&realm.public_key_pem)
        .bind(&realm.private_key_pem)
        .bind(sqlx::types::Json(&realm.default_roles))
        .bind(sqlx::types::Json(&realm.required_credentials));
        self.execute(query).await?;

        Ok(())
    }

    async fn update_realm(&mut self, realm: &Realm) -> StorageResult<()> {
        let query = sqlx::query(
            r"UPDATE realms SET
                name = $2, enabled = $3, updated_at = $4,
                access_code_lifespan = $5, token_lifespan = $6,
                cookie_login_allowed = $7, automatic_registration_after_social_login = $8,
                public_key_pem = $9, private_key_pem = $10,
                default_roles = $11, required_credentials = $12,
                version = version + 1
            WHERE id = $1 AND version = $13",
        )
        .bind(realm.id)
        .bind(&realm.name)
        .bind(realm.enabled)
        .bind(realm.updated_at)
        .bind(realm.access_code_lifespan)
        .bind(realm.token_lifespan)
        .bind(realm.cookie_login_allowed)
        .bind(realm.automatic_registration_after_social_login)
        .bind(&realm.public_key_pem)
        .bind(&realm.private_key_pem)
        .bind(sqlx::types::Json(&realm.default_roles))
        .bind(sqlx::types::Json(&realm.required_credentials))
        .bind(realm.version);
        let result = self.execute(query).await?;

        if result.rows_affected() == 0 {
            return Err(self.missing_or_stale(realm.id).await);
        }

        Ok(())
    }

    async fn delete_realm(&mut self, id: Uuid) -> StorageResult<()> {
        let result = self
            .execute(sqlx::query("DELETE FROM realms WHERE id = $1").bind(id))
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Realm", id));
        }

        Ok(())
    }

    async fn get_realm(&mut self, id: Uuid) -> StorageResult<Option<Realm>> {
        let row: Option<RealmRow> = sqlx::query_as("SELECT * FROM realms WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(row.map(Realm::from))
    }

    async fn list_realms(&mut self) -> StorageResult<Vec<Realm>> {
        let rows: Vec<RealmRow> = sqlx::query_as("SELECT * FROM realms ORDER BY name, id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Realm::from).collect())
    }
}
