use super::slippage::{check_limit, deposit_slippage};
use super::{
    DepositOutcome, PoolManager, ShareChange, check_reserve_room, find_pool, validate_address,
    validate_pair,
};
use crate::bank::Bank;
use crate::error::SwapError;
use crate::events::{DepositData, EventData, EventSink};
use crate::params::ParamSource;
use amm_data::{CacheStore, Database, KvStore};
use amm_domain::error::{InvariantViolation, PoolError};
use amm_domain::math::Dec;
use amm_domain::pool::DenominatedPool;
use amm_domain::state::{PoolRecord, ShareRecord, pool_id};
use amm_domain::token::{Coin, Coins};
use primitive_types::{U256, U512};
use tracing::info;

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Deposits `coin_a` and `coin_b` into their pool, creating the pool when
    /// the pair is allowed.
    ///
    /// An existing pool takes as much of both coins as fits its current
    /// ratio; only that amount leaves the depositor's account.
    pub fn deposit(
        &mut self,
        depositor: &str,
        coin_a: &Coin,
        coin_b: &Coin,
    ) -> Result<DepositOutcome, SwapError> {
        self.breaker.check()?;
        let result = self.deposit_with_limit(depositor, coin_a, coin_b, None);
        self.settle("deposit", result)
    }

    pub(super) fn deposit_with_limit(
        &mut self,
        depositor: &str,
        coin_a: &Coin,
        coin_b: &Coin,
        slippage_limit: Option<Dec>,
    ) -> Result<DepositOutcome, SwapError> {
        validate_address(depositor, "depositor")?;
        validate_pair(coin_a, coin_b)?;
        let (params, _) = self.current_params()?;

        let pool_id = pool_id(&coin_a.denom, &coin_b.denom);
        let desired = Coins::new([coin_a.clone(), coin_b.clone()])
            .map_err(|e| PoolError::InvalidCoins(e.to_string()))?;

        let mut db = Database::new(CacheStore::new(&self.store));

        let (pool, deposited, shares) = match find_pool(&db, &pool_id)? {
            Some((_, mut pool)) => {
                check_deposit_room(&pool_id, &pool, &desired)?;
                let (deposited, shares) = pool.add_liquidity(&desired)?;
                (pool, deposited, shares)
            }
            None => {
                if !params.allowed_pools.contains_pool(&pool_id) {
                    return Err(PoolError::NotAllowed(format!(
                        "can not create pool '{pool_id}'"
                    ))
                    .into());
                }
                let pool = DenominatedPool::new(&desired)?;
                let shares = pool.total_shares();
                (pool, desired, shares)
            }
        };

        if deposited.amount_of(&coin_a.denom).is_zero()
            || deposited.amount_of(&coin_b.denom).is_zero()
            || shares.is_zero()
        {
            return Err(PoolError::InsufficientLiquidity("deposit must be increased".into()).into());
        }
        if let Some(limit) = slippage_limit {
            check_limit(deposit_slippage(coin_a, coin_b, &deposited)?, limit)?;
        }

        db.pools_mut().save(&PoolRecord::from_pool(&pool))?;

        let share_change = match db.shares().find(depositor, &pool_id)? {
            Some(record) => {
                let owned = record.shares_owned.checked_add(shares).ok_or_else(|| {
                    InvariantViolation::new(format!(
                        "shares of {depositor} in {pool_id} overflow"
                    ))
                })?;
                db.shares_mut()
                    .save(&ShareRecord::new(depositor, pool_id.as_str(), owned))?;
                ShareChange::Modified {
                    pool_id: &pool_id,
                    owner: depositor,
                    before: record.shares_owned,
                }
            }
            None => {
                db.shares_mut()
                    .save(&ShareRecord::new(depositor, pool_id.as_str(), shares))?;
                ShareChange::Created {
                    pool_id: &pool_id,
                    owner: depositor,
                    shares,
                }
            }
        };

        self.bank.send_from_account_to_pool(depositor, &deposited)?;

        let changes = db.into_inner().into_changes();
        let event = EventData::Deposit(DepositData {
            pool_id: pool_id.clone(),
            depositor: depositor.to_string(),
            amount: deposited.clone(),
            shares,
        });
        self.commit(changes, Some(share_change), event);

        info!(
            pool_id = %pool_id,
            depositor = depositor,
            deposited = %deposited,
            shares = %shares,
            "Deposit committed"
        );

        Ok(DepositOutcome {
            pool_id,
            deposited,
            shares,
        })
    }
}

/// Rejects a deposit whose reserves or minted shares would not fit in 256
/// bits. Minted shares never exceed the smaller desired-to-reserve ratio of
/// the total.
fn check_deposit_room(
    pool_id: &str,
    pool: &DenominatedPool,
    desired: &Coins,
) -> Result<(), PoolError> {
    let reserves = pool.reserves();
    let total = pool.total_shares();

    let mut max_shares = U512::MAX;
    for coin in desired.iter() {
        let reserve = reserves.amount_of(&coin.denom);
        check_reserve_room(pool_id, reserve, coin)?;
        if !reserve.is_zero() {
            max_shares = max_shares.min(coin.amount.full_mul(total) / U512::from(reserve));
        }
    }

    let fits = U512::from(total)
        .checked_add(max_shares)
        .is_some_and(|sum| sum <= U512::from(U256::MAX));
    if !fits {
        return Err(PoolError::InvalidCoins(format!(
            "deposit {desired} mints more shares than pool {pool_id} can hold"
        )));
    }
    Ok(())
}
