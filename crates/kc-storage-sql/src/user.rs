//! `PostgreSQL` implementation of the user storage provider.

use async_trait::async_trait;
use kc_model::User;
use kc_storage::UserProvider;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::UserRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

impl PgTransaction {
    async fn user_in_realm(&mut self, realm_id: Uuid, user_id: Uuid) -> StorageResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND realm_id = $2)",
        )
        .bind(user_id)
        .bind(realm_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(exists)
    }

    async fn role_in_realm(&mut self, realm_id: Uuid, role_id: Uuid) -> StorageResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM roles WHERE id = $1 AND realm_id = $2)",
        )
        .bind(role_id)
        .bind(realm_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(exists)
    }

    pub(crate) async fn require_user(&mut self, realm_id: Uuid, user_id: Uuid) -> StorageResult<()> {
        if self.user_in_realm(realm_id, user_id).await? {
            Ok(())
        } else {
            Err(not_found("User", user_id))
        }
    }
}

#[async_trait]
impl UserProvider for PgTransaction {
    async fn create_user(&mut self, user: &User) -> StorageResult<()> {
        let query = sqlx::query(
            r"INSERT INTO users (
                id, realm_id, username, enabled, first_name, last_name, email,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(user.id)
        .bind(user.realm_id)
        .bind(&user.username)
        .bind(user.enabled)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(user.created_at)
        .bind(user.updated_at);
        self.execute(query).await?;

        Ok(())
    }

    async fn delete_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        // Credentials and role mappings go with the user via ON DELETE CASCADE
        let query = sqlx::query("DELETE FROM users WHERE id = $1 AND realm_id = $2")
            .bind(id)
            .bind(realm_id);
        let result = self.execute(query).await?;

        if result.rows_affected() == 0 {
            return Err(not_found("User", id));
        }

        Ok(())
    }

    async fn get_user(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE id = $1 AND realm_id = $2")
                .bind(id)
                .bind(realm_id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_username(
        &mut self,
        realm_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE realm_id = $1 AND username = $2")
                .bind(realm_id)
                .bind(username)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(User::from))
    }

    async fn list_users(&mut self, realm_id: Uuid) -> StorageResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT * FROM users WHERE realm_id = $1 ORDER BY username")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn grant_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        self.require_user(realm_id, user_id).await?;
        if !self.role_in_realm(realm_id, role_id).await? {
            return Err(not_found("Role", role_id));
        }

        let query = sqlx::query(
            r"INSERT INTO user_role_mappings (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id);
        self.execute(query).await?;

        Ok(())
    }

    async fn revoke_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<()> {
        let query = sqlx::query(
            r"DELETE FROM user_role_mappings m
            USING users u
            WHERE m.user_id = u.id AND u.realm_id = $1 AND m.user_id = $2 AND m.role_id = $3",
        )
        .bind(realm_id)
        .bind(user_id)
        .bind(role_id);
        self.execute(query).await?;

        Ok(())
    }

    async fn has_role(
        &mut self,
        realm_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> StorageResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r"SELECT EXISTS(
                SELECT 1 FROM user_role_mappings m
                JOIN users u ON u.id = m.user_id
                WHERE u.realm_id = $1 AND m.user_id = $2 AND m.role_id = $3
            )",
        )
        .bind(realm_id)
        .bind(user_id)
        .bind(role_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(exists)
    }

    async fn get_user_roles(&mut self, realm_id: Uuid, user_id: Uuid) -> StorageResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"SELECT r.id FROM user_role_mappings m
            JOIN roles r ON r.id = m.role_id
            WHERE r.realm_id = $1 AND m.user_id = $2
            ORDER BY r.name",
        )
        .bind(realm_id)
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
