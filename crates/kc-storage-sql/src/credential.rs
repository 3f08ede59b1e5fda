//! `PostgreSQL` implementation of the credential storage provider.

use async_trait::async_trait;
use kc_model::{CredentialType, StoredCredential};
use kc_storage::CredentialProvider;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::CredentialRow;
use crate::error::from_sqlx_error;
use crate::store::PgTransaction;

#[async_trait]
impl CredentialProvider for PgTransaction {
    async fn upsert_credential(&mut self, credential: &StoredCredential) -> StorageResult<()> {
        self.require_user(credential.realm_id, credential.user_id)
            .await?;

        let query = sqlx::query(
            r"INSERT INTO credentials (
                id, user_id, realm_id, credential_type,
                created_at, secret_data, credential_data
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, credential_type) DO UPDATE SET
                id = EXCLUDED.id,
                created_at = EXCLUDED.created_at,
                secret_data = EXCLUDED.secret_data,
                credential_data = EXCLUDED.credential_data",
        )
        .bind(credential.id)
        .bind(credential.user_id)
        .bind(credential.realm_id)
        .bind(credential.credential_type.as_str())
        .bind(credential.created_at)
        .bind(&credential.secret_data)
        .bind(&credential.credential_data);
        self.execute(query).await?;

        Ok(())
    }

    async fn get_credential(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<Option<StoredCredential>> {
        let row: Option<CredentialRow> = sqlx::query_as(
            r"SELECT * FROM credentials
            WHERE realm_id = $1 AND user_id = $2 AND credential_type = $3",
        )
        .bind(realm_id)
        .bind(user_id)
        .bind(credential_type.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        row.map(StoredCredential::try_from).transpose()
    }

    async fn list_credentials(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
    ) -> StorageResult<Vec<StoredCredential>> {
        let rows: Vec<CredentialRow> = sqlx::query_as(
            r"SELECT * FROM credentials
            WHERE realm_id = $1 AND user_id = $2
            ORDER BY created_at",
        )
        .bind(realm_id)
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        rows.into_iter().map(StoredCredential::try_from).collect()
    }

    async fn delete_credential(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        credential_type: CredentialType,
    ) -> StorageResult<()> {
        let query = sqlx::query(
            "DELETE FROM credentials WHERE realm_id = $1 AND user_id = $2 AND credential_type = $3",
        )
        .bind(realm_id)
        .bind(user_id)
        .bind(credential_type.as_str());
        self.execute(query).await?;

        Ok(())
    }
}
