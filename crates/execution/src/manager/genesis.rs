use super::PoolManager;
use crate::bank::Bank;
use crate::error::SwapError;
use crate::events::EventSink;
use crate::params::{ParamSource, ParamStore};
use amm_data::{CacheStore, Database, KvStore};
use amm_domain::genesis::GenesisState;
use tracing::info;

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamStore,
    E: EventSink,
{
    /// Validates `genesis` and loads its params and records.
    ///
    /// Nothing is written when validation fails.
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> Result<(), SwapError> {
        self.breaker.check()?;
        genesis.validate()?;

        let mut db = Database::new(CacheStore::new(&self.store));
        for record in &genesis.pool_records {
            db.pools_mut().save(record)?;
        }
        for record in &genesis.share_records {
            db.shares_mut().save(record)?;
        }
        let changes = db.into_inner().into_changes();

        self.params.set_params(genesis.params.clone());
        changes.apply(&mut self.store);

        info!(
            pools = genesis.pool_records.len(),
            shares = genesis.share_records.len(),
            "Genesis loaded"
        );
        Ok(())
    }
}

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Current params plus every record, in store key order.
    pub fn export_genesis(&self) -> Result<GenesisState, SwapError> {
        self.breaker.check()?;
        let db = Database::new(&self.store);
        Ok(GenesisState::new(
            self.params.params(),
            db.pools().find_all()?,
            db.shares().find_all()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SwapError;
    use crate::manager::MemoryPoolManager;
    use amm_domain::genesis::GenesisState;
    use amm_domain::params::{AllowedPool, AllowedPools, Params};
    use amm_domain::state::{PoolRecord, ShareRecord};
    use amm_domain::token::{Coin, Coins};
    use primitive_types::U256;
    use rust_decimal_macros::dec;

    const DEPOSITOR_1: &str = "kava1mq9qxlhze029lm0frzw2xr6hem8c3k9ts54w0w";
    const DEPOSITOR_2: &str = "kava1esagqd83rhqdtpy5sxhklaxgn58k2m3s3mnpea";

    fn pool(a: (&str, u64), b: (&str, u64), shares: u64) -> PoolRecord {
        let reserves = Coins::new([Coin::new(a.0, a.1), Coin::new(b.0, b.1)]).unwrap();
        PoolRecord::new(&reserves, U256::from(shares)).unwrap()
    }

    #[test]
    fn test_init_genesis_rejects_invalid_state() {
        let mut manager = MemoryPoolManager::in_memory(Params::default());
        let invalid = GenesisState::new(Params::new(AllowedPools::default(), dec!(-1)), vec![], vec![]);

        let err = manager.init_genesis(&invalid).unwrap_err();
        assert!(matches!(err, SwapError::Genesis(_)));
        assert_eq!(manager.param_source(), &Params::default());
        assert!(manager.store().is_empty());
    }

    #[test]
    fn test_init_and_export_genesis() {
        // ordered as the store keys them, so export compares equal
        let state = GenesisState::new(
            Params::new(
                AllowedPools::new([AllowedPool::new("ukava", "usdx")]),
                dec!(0.00255),
            ),
            vec![
                pool(("hard", 1_000_000), ("usdx", 2_000_000), 1_000_000),
                pool(("ukava", 1_000_000), ("usdx", 5_000_000), 3_000_000),
            ],
            vec![
                ShareRecord::new(DEPOSITOR_2, "hard/usdx", U256::from(1_000_000u64)),
                ShareRecord::new(DEPOSITOR_1, "ukava/usdx", U256::from(3_000_000u64)),
            ],
        );

        let mut manager = MemoryPoolManager::in_memory(Params::default());
        manager.init_genesis(&state).unwrap();

        assert_eq!(manager.params().unwrap(), state.params);
        assert_eq!(manager.pool("hard/usdx").unwrap(), Some(state.pool_records[0].clone()));
        assert_eq!(manager.pool("ukava/usdx").unwrap(), Some(state.pool_records[1].clone()));
        assert_eq!(
            manager.deposits_by_owner(DEPOSITOR_2).unwrap(),
            vec![state.share_records[0].clone()]
        );

        assert_eq!(manager.export_genesis().unwrap(), state);
    }

    #[test]
    fn test_export_empty_genesis() {
        let manager = MemoryPoolManager::in_memory(Params::default());
        let exported = manager.export_genesis().unwrap();
        assert!(exported.is_empty());
    }
}
