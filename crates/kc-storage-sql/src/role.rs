//! `PostgreSQL` implementation of the role storage provider.

use async_trait::async_trait;
use kc_model::Role;
use kc_storage::RoleProvider;
use kc_storage::error::StorageResult;
use uuid::Uuid;

use crate::entities::RoleRow;
use crate::error::{from_sqlx_error, not_found};
use crate::store::PgTransaction;

#[async_trait]
impl RoleProvider for PgTransaction {
    async fn create_role(&mut self, role: &Role) -> StorageResult<()> {
        let query = sqlx::query(
            r"INSERT INTO roles (id, name, description, realm_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.description)
        .bind(role.realm_id)
        .bind(role.created_at)
        .bind(role.updated_at);
        self.execute(query).await?;

        Ok(())
    }

    async fn delete_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<()> {
        let query = sqlx::query("DELETE FROM roles WHERE id = $1 AND realm_id = $2")
            .bind(id)
            .bind(realm_id);
        let result = self.execute(query).await?;

        if result.rows_affected() == 0 {
            return Err(not_found("Role", id));
        }

        Ok(())
    }

    async fn get_role(&mut self, realm_id: Uuid, id: Uuid) -> StorageResult<Option<Role>> {
        let row: Option<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE id = $1 AND realm_id = $2")
                .bind(id)
                .bind(realm_id)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Role::from))
    }

    async fn get_role_by_name(
        &mut self,
        realm_id: Uuid,
        name: &str,
    ) -> StorageResult<Option<Role>> {
        let row: Option<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE realm_id = $1 AND name = $2")
                .bind(realm_id)
                .bind(name)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(row.map(Role::from))
    }

    async fn list_roles(&mut self, realm_id: Uuid) -> StorageResult<Vec<Role>> {
        let rows: Vec<RoleRow> =
            sqlx::query_as("SELECT * FROM roles WHERE realm_id = $1 ORDER BY name")
                .bind(realm_id)
                .fetch_all(&mut *self.tx)
                .await
                .map_err(from_sqlx_error)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }
}
