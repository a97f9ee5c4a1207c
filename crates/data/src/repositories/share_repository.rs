//! Share repository for depositor share records.

use super::keys::{SHARE_KEY_PREFIX, depositor_prefix, share_key};
use super::{StoreError, decode, encode};
use crate::store::{KvRead, KvStore};
use amm_domain::state::ShareRecord;

/// Repository for share record CRUD operations.
#[derive(Debug)]
pub struct ShareRepository<S> {
    store: S,
}

impl<S> ShareRepository<S> {
    /// Creates a new ShareRepository.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KvRead> ShareRepository<S> {
    /// Finds the shares `depositor` holds in `pool_id`.
    ///
    /// # Errors
    /// Returns an error if the key can not be built or the record decoded.
    pub fn find(&self, depositor: &str, pool_id: &str) -> Result<Option<ShareRecord>, StoreError> {
        let key = share_key(depositor, pool_id)?;
        self.store
            .get(&key)
            .map(|raw| decode(&key, &raw))
            .transpose()
    }

    /// Finds every deposit of one owner, ordered by pool id.
    ///
    /// # Errors
    /// Returns an error if any stored record can not be decoded.
    pub fn find_by_owner(&self, depositor: &str) -> Result<Vec<ShareRecord>, StoreError> {
        self.scan(&depositor_prefix(depositor)?)
    }

    /// Finds every deposit into one pool. Scans all share records.
    ///
    /// # Errors
    /// Returns an error if any stored record can not be decoded.
    pub fn find_by_pool(&self, pool_id: &str) -> Result<Vec<ShareRecord>, StoreError> {
        let mut records = self.find_all()?;
        records.retain(|r| r.pool_id == pool_id);
        Ok(records)
    }

    /// Finds all share records in key order.
    ///
    /// # Errors
    /// Returns an error if any stored record can not be decoded.
    pub fn find_all(&self) -> Result<Vec<ShareRecord>, StoreError> {
        self.scan(&[SHARE_KEY_PREFIX])
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<ShareRecord>, StoreError> {
        self.store
            .prefix_scan(prefix)
            .iter()
            .map(|(key, raw)| decode(key, raw))
            .collect()
    }
}

impl<S: KvStore> ShareRepository<S> {
    /// Creates or replaces a share record.
    ///
    /// # Errors
    /// Returns an error if the key can not be built or the record encoded.
    pub fn save(&mut self, record: &ShareRecord) -> Result<(), StoreError> {
        let key = share_key(&record.depositor, &record.pool_id)?;
        let value = encode(record)?;
        self.store.set(key, value);
        Ok(())
    }

    /// Deletes the share record of `depositor` in `pool_id`.
    ///
    /// # Errors
    /// Returns an error if the key can not be built.
    pub fn delete(&mut self, depositor: &str, pool_id: &str) -> Result<(), StoreError> {
        let key = share_key(depositor, pool_id)?;
        self.store.delete(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::Database;
    use crate::store::{CacheStore, MemoryStore};
    use primitive_types::U256;

    const DEPOSITOR_1: &str = "kava1mq9qxlhze029lm0frzw2xr6hem8c3k9ts54w0w";
    const DEPOSITOR_2: &str = "kava1esagqd83rhqdtpy5sxhklaxgn58k2m3s3mnpea";

    fn share(depositor: &str, pool_id: &str, shares: u64) -> ShareRecord {
        ShareRecord::new(depositor, pool_id, U256::from(shares))
    }

    fn seeded() -> Database<MemoryStore> {
        let mut db = Database::new(MemoryStore::new());
        for record in [
            share(DEPOSITOR_1, "ukava/usdx", 1_500_000),
            share(DEPOSITOR_2, "ukava/usdx", 1_500_000),
            share(DEPOSITOR_1, "hard/usdx", 2_000_000),
            share(DEPOSITOR_2, "hard/ukava", 5_000_000),
        ] {
            db.shares_mut().save(&record).unwrap();
        }
        db
    }

    #[test]
    fn test_save_find_delete() {
        let mut db = Database::new(MemoryStore::new());
        let record = share(DEPOSITOR_1, "ukava/usdx", 3_000_000);

        assert_eq!(db.shares().find(DEPOSITOR_1, "ukava/usdx").unwrap(), None);
        db.shares_mut().save(&record).unwrap();
        assert_eq!(
            db.shares().find(DEPOSITOR_1, "ukava/usdx").unwrap(),
            Some(record)
        );
        assert_eq!(db.shares().find(DEPOSITOR_2, "ukava/usdx").unwrap(), None);

        db.shares_mut().delete(DEPOSITOR_1, "ukava/usdx").unwrap();
        assert_eq!(db.shares().find(DEPOSITOR_1, "ukava/usdx").unwrap(), None);
    }

    #[test]
    fn test_find_by_owner() {
        let db = seeded();
        let pools: Vec<String> = db
            .shares()
            .find_by_owner(DEPOSITOR_1)
            .unwrap()
            .into_iter()
            .map(|r| r.pool_id)
            .collect();
        assert_eq!(pools, vec!["hard/usdx", "ukava/usdx"]);
        assert!(db.shares().find_by_owner("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_pool() {
        let db = seeded();
        let records = db.shares().find_by_pool("ukava/usdx").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.pool_id == "ukava/usdx"));

        assert_eq!(db.shares().find_by_pool("hard/ukava").unwrap().len(), 1);
        assert!(db.shares().find_by_pool("bnb/usdx").unwrap().is_empty());
        assert_eq!(db.shares().find_all().unwrap().len(), 4);
    }

    #[test]
    fn test_writes_through_cache_are_discarded_unless_applied() {
        let mut base = seeded().into_inner();

        let mut cached = Database::new(CacheStore::new(&base));
        cached.shares_mut().delete(DEPOSITOR_1, "ukava/usdx").unwrap();
        cached
            .shares_mut()
            .save(&share(DEPOSITOR_1, "bnb/usdx", 10))
            .unwrap();
        assert_eq!(cached.shares().find_by_owner(DEPOSITOR_1).unwrap().len(), 2);
        drop(cached);
        assert_eq!(
            Database::new(&base).shares().find_by_owner(DEPOSITOR_1).unwrap().len(),
            2
        );

        let mut cached = Database::new(CacheStore::new(&base));
        cached.shares_mut().delete(DEPOSITOR_1, "ukava/usdx").unwrap();
        let changes = cached.into_inner().into_changes();
        changes.apply(&mut base);
        assert_eq!(
            Database::new(&base).shares().find(DEPOSITOR_1, "ukava/usdx").unwrap(),
            None
        );
    }
}
