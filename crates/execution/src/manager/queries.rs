use super::{PoolManager, find_pool};
use crate::bank::Bank;
use crate::error::SwapError;
use crate::events::EventSink;
use crate::params::ParamSource;
use amm_data::{Database, KvStore};
use amm_domain::error::PoolError;
use amm_domain::math::Dec;
use amm_domain::math::constant_product::{calculate_k, calculate_spot_price};
use amm_domain::params::Params;
use amm_domain::state::{PoolRecord, ShareRecord};
use amm_domain::token::Coins;
use primitive_types::U512;

/// A pool with its derived market figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolInfo {
    pub record: PoolRecord,
    /// Price of one unit of `denom_a` in `denom_b`.
    pub spot_price: Option<Dec>,
    /// `reserves_a * reserves_b`.
    pub constant_product: U512,
}

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Current parameters.
    pub fn params(&self) -> Result<Params, SwapError> {
        self.breaker.check()?;
        Ok(self.params.params())
    }

    /// The pool stored under `pool_id`.
    pub fn pool(&self, pool_id: &str) -> Result<Option<PoolRecord>, SwapError> {
        self.breaker.check()?;
        Ok(Database::new(&self.store).pools().find(pool_id)?)
    }

    /// Every pool, ordered by id.
    pub fn pools(&self) -> Result<Vec<PoolRecord>, SwapError> {
        self.breaker.check()?;
        Ok(Database::new(&self.store).pools().find_all()?)
    }

    /// A pool with its spot price and constant product.
    pub fn pool_info(&self, pool_id: &str) -> Result<Option<PoolInfo>, SwapError> {
        self.breaker.check()?;
        let db = Database::new(&self.store);
        let Some((record, _)) = find_pool(&db, pool_id)? else {
            return Ok(None);
        };

        let spot_price = calculate_spot_price(record.reserves_a.amount, record.reserves_b.amount);
        let constant_product = calculate_k(record.reserves_a.amount, record.reserves_b.amount);
        Ok(Some(PoolInfo {
            record,
            spot_price,
            constant_product,
        }))
    }

    /// Every deposit held by `owner`.
    pub fn deposits_by_owner(&self, owner: &str) -> Result<Vec<ShareRecord>, SwapError> {
        self.breaker.check()?;
        Ok(Database::new(&self.store).shares().find_by_owner(owner)?)
    }

    /// Every deposit in `pool_id`.
    pub fn deposits_by_pool(&self, pool_id: &str) -> Result<Vec<ShareRecord>, SwapError> {
        self.breaker.check()?;
        Ok(Database::new(&self.store).shares().find_by_pool(pool_id)?)
    }

    /// Every deposit.
    pub fn deposits(&self) -> Result<Vec<ShareRecord>, SwapError> {
        self.breaker.check()?;
        Ok(Database::new(&self.store).shares().find_all()?)
    }

    /// Coins the deposit of `owner` in `pool_id` is currently worth.
    pub fn deposit_share_value(&self, owner: &str, pool_id: &str) -> Result<Option<Coins>, SwapError> {
        self.breaker.check()?;
        let db = Database::new(&self.store);
        let Some(share) = db.shares().find(owner, pool_id)? else {
            return Ok(None);
        };
        let (_, pool) = find_pool(&db, pool_id)?.ok_or_else(|| {
            PoolError::InvalidPool(format!("pool {pool_id} not found"))
        })?;
        Ok(Some(pool.share_value(share.shares_owned)?))
    }
}
