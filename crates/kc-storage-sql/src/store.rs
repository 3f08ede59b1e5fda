//! `PostgreSQL` [`IdentityStore`] backed by one `SQLx` transaction per unit of work.

use async_trait::async_trait;
use kc_storage::{IdentityStore, StorageError, StorageResult, StoreTransaction};
use sqlx::postgres::{PgArguments, PgQueryResult};
use sqlx::query::Query;
use sqlx::{Acquire, PgPool, Postgres, Transaction};

use crate::error::from_sqlx_error;
use crate::pool::{PoolConfig, create_pool};

/// `PostgreSQL` identity store.
///
/// Uniqueness of role names and usernames is arbitrated by the unique
/// constraints declared in the migrations.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    pub async fn connect(config: &PoolConfig) -> StorageResult<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    /// Applies the bundled schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Internal(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Transaction(e.to_string()))?;
        tracing::debug!(backend = "postgres", "Store transaction started");
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// A transaction against a [`PgIdentityStore`].
///
/// Dropping it without commit rolls the database transaction back. Every
/// write runs inside its own savepoint, so a rejected statement (a unique
/// violation, for instance) leaves the transaction usable, matching the
/// in-memory store.
pub struct PgTransaction {
    pub(crate) tx: Transaction<'static, Postgres>,
}

impl PgTransaction {
    /// Executes one write statement inside a savepoint.
    ///
    /// On failure the savepoint is rolled back and the mapped error is
    /// returned; earlier writes of the transaction are kept.
    pub(crate) async fn execute(
        &mut self,
        query: Query<'_, Postgres, PgArguments>,
    ) -> StorageResult<PgQueryResult> {
        let mut savepoint = Acquire::begin(&mut self.tx)
            .await
            .map_err(|e| StorageError::Transaction(e.to_string()))?;

        match query.execute(&mut *savepoint).await {
            Ok(done) => {
                savepoint
                    .commit()
                    .await
                    .map_err(|e| StorageError::Transaction(e.to_string()))?;
                Ok(done)
            }
            Err(err) => {
                if let Err(rollback_err) = savepoint.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        "Rollback to savepoint failed"
                    );
                }
                Err(from_sqlx_error(err))
            }
        }
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn commit(self: Box<Self>) -> StorageResult<()> {
        let Self { tx } = *self;
        tx.commit().await.map_err(from_sqlx_error)?;
        tracing::debug!("Store transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StorageResult<()> {
        let Self { tx } = *self;
        tx.rollback()
            .await
            .map_err(|e| StorageError::Transaction(e.to_string()))?;
        tracing::debug!("Store transaction rolled back");
        Ok(())
    }
}
