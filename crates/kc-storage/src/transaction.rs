//! Store and transaction traits.

use async_trait::async_trait;

use crate::credential::CredentialProvider;
use crate::error::StorageResult;
use crate::realm::RealmProvider;
use crate::role::RoleProvider;
use crate::user::UserProvider;

/// A durable identity store shared by every unit of work.
///
/// Implementations must be thread-safe and support concurrent transactions.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns a short backend name for logging.
    fn backend(&self) -> &'static str;

    /// Starts a new transaction.
    ///
    /// Each transaction sees a logically independent view of the store:
    /// its own writes are visible to it immediately, other transactions'
    /// writes only once they commit.
    async fn begin(&self) -> StorageResult<Box<dyn StoreTransaction>>;

    /// Releases store-wide resources (connection pools, files).
    async fn close(&self) {}
}

/// One atomic transaction against an [`IdentityStore`].
///
/// Dropping a transaction without committing discards it.
#[async_trait]
pub trait StoreTransaction:
    RealmProvider + RoleProvider + UserProvider + CredentialProvider + Send
{
    /// Applies every write of this transaction atomically.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` when a uniqueness constraint was
    /// violated by a concurrently committed transaction; nothing is applied
    /// in that case.
    async fn commit(self: Box<Self>) -> StorageResult<()>;

    /// Discards every write of this transaction.
    async fn rollback(self: Box<Self>) -> StorageResult<()>;
}
