//! Persistence layer for pool and share records.
//!
//! Records live in an ordered key-value store. Every mutating engine call
//! writes through a [`store::CacheStore`] whose changes are committed only
//! once the whole call has succeeded.

/// Key-value stores.
pub mod store;
/// Typed repositories over a store.
pub mod repositories;

pub use repositories::{Database, PoolRepository, ShareRepository, StoreError};
pub use store::{CacheStore, ChangeSet, KvRead, KvStore, MemoryStore};
