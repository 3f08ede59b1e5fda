//! # kc-storage-mem
//!
//! In-memory identity store.
//!
//! Every transaction works on a private snapshot of the committed state and
//! records its writes. Commit replays the writes against the state committed
//! at that moment, arbitrating uniqueness constraints the same way a
//! database would with unique indexes.
//!
//! ## Example
//!
//! ```ignore
//! use kc_storage::IdentityStore;
//! use kc_storage_mem::InMemoryIdentityStore;
//!
//! let store = InMemoryIdentityStore::new();
//! let mut tx = store.begin().await?;
//! tx.create_realm(&realm).await?;
//! tx.commit().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod snapshot;
mod store;

pub use store::{InMemoryIdentityStore, InMemoryTransaction};
