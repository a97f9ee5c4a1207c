//! Pool repository for pool record persistence.

use super::keys::{POOL_KEY_PREFIX, pool_key};
use super::{StoreError, decode, encode};
use crate::store::{KvRead, KvStore};
use amm_domain::state::PoolRecord;

/// Repository for pool record CRUD operations.
#[derive(Debug)]
pub struct PoolRepository<S> {
    store: S,
}

impl<S> PoolRepository<S> {
    /// Creates a new PoolRepository.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KvRead> PoolRepository<S> {
    /// Finds a pool by its id.
    ///
    /// # Errors
    /// Returns an error if the stored record can not be decoded.
    pub fn find(&self, pool_id: &str) -> Result<Option<PoolRecord>, StoreError> {
        let key = pool_key(pool_id);
        self.store
            .get(&key)
            .map(|raw| decode(&key, &raw))
            .transpose()
    }

    /// Finds all pools, ordered by pool id.
    ///
    /// # Errors
    /// Returns an error if any stored record can not be decoded.
    pub fn find_all(&self) -> Result<Vec<PoolRecord>, StoreError> {
        self.store
            .prefix_scan(&[POOL_KEY_PREFIX])
            .iter()
            .map(|(key, raw)| decode(key, raw))
            .collect()
    }
}

impl<S: KvStore> PoolRepository<S> {
    /// Creates or replaces a pool record.
    ///
    /// # Errors
    /// Returns an error if the record can not be encoded.
    pub fn save(&mut self, record: &PoolRecord) -> Result<(), StoreError> {
        let value = encode(record)?;
        self.store.set(pool_key(&record.pool_id), value);
        Ok(())
    }

    /// Deletes a pool by id.
    pub fn delete(&mut self, pool_id: &str) {
        self.store.delete(&pool_key(pool_id));
    }
}
