use super::slippage::{check_limit, shortfall_slippage};
use super::{PoolManager, ShareChange, WithdrawOutcome, find_pool, payout_error, validate_address};
use crate::bank::Bank;
use crate::error::SwapError;
use crate::events::{EventData, EventSink, WithdrawData};
use crate::params::ParamSource;
use amm_data::{CacheStore, Database, KvStore};
use amm_domain::error::{InvariantViolation, PoolError};
use amm_domain::state::{PoolRecord, ShareRecord};
use amm_domain::token::Coin;
use primitive_types::U256;
use rust_decimal::Decimal;
use tracing::info;

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Burns `shares` of `owner` in `pool_id` and pays out their value.
    ///
    /// Each expected coin may exceed the paid amount by at most
    /// `slippage_limit`, checked per asset.
    pub fn withdraw(
        &mut self,
        owner: &str,
        pool_id: &str,
        shares: U256,
        slippage_limit: Decimal,
        expected_a: &Coin,
        expected_b: &Coin,
    ) -> Result<WithdrawOutcome, SwapError> {
        self.breaker.check()?;
        let result =
            self.withdraw_inner(owner, pool_id, shares, slippage_limit, expected_a, expected_b);
        self.settle("withdraw", result)
    }

    pub(super) fn withdraw_inner(
        &mut self,
        owner: &str,
        pool_id: &str,
        shares: U256,
        slippage_limit: Decimal,
        expected_a: &Coin,
        expected_b: &Coin,
    ) -> Result<WithdrawOutcome, SwapError> {
        validate_address(owner, "owner")?;
        let limit = super::slippage_limit(slippage_limit)?;

        let mut db = Database::new(CacheStore::new(&self.store));

        let share_record = db.shares().find(owner, pool_id)?.ok_or_else(|| {
            PoolError::ShareRecordNotFound(format!("no deposit for {owner} in pool {pool_id}"))
        })?;
        let owned = share_record.shares_owned;
        if shares.is_zero() || shares > owned {
            return Err(PoolError::InvalidShares(format!(
                "withdraw of {shares} shares, owner holds {owned}"
            ))
            .into());
        }

        let (_, mut pool) = find_pool(&db, pool_id)?.ok_or_else(|| {
            InvariantViolation::new(format!("pool {pool_id} not found for share record of {owner}"))
        })?;

        let expected_denoms = [expected_a.denom.as_str(), expected_b.denom.as_str()];
        if !expected_denoms.contains(&pool.denom_a()) || !expected_denoms.contains(&pool.denom_b()) {
            return Err(PoolError::InvalidCoins(format!(
                "expected coins {expected_a},{expected_b} do not match pool {pool_id}"
            ))
            .into());
        }

        let value = pool.share_value(shares)?;
        let value_a = value.amount_of(pool.denom_a());
        let value_b = value.amount_of(pool.denom_b());
        if value_a.is_zero() || value_b.is_zero() {
            return Err(PoolError::InsufficientLiquidity("shares must be increased".into()).into());
        }
        for expected in [expected_a, expected_b] {
            let calculated = value.amount_of(&expected.denom);
            check_limit(shortfall_slippage(expected.amount, calculated)?, limit)?;
        }

        let withdrawn = pool.remove_liquidity(shares)?;
        if pool.is_empty() {
            db.pools_mut().delete(pool_id);
        } else {
            db.pools_mut().save(&PoolRecord::from_pool(&pool))?;
        }

        let remaining = owned - shares;
        if remaining.is_zero() {
            db.shares_mut().delete(owner, pool_id)?;
        } else {
            db.shares_mut()
                .save(&ShareRecord::new(owner, pool_id, remaining))?;
        }

        self.bank
            .send_from_pool_to_account(owner, &withdrawn)
            .map_err(payout_error)?;

        let changes = db.into_inner().into_changes();
        let share_change = ShareChange::Modified {
            pool_id,
            owner,
            before: owned,
        };
        let event = EventData::Withdraw(WithdrawData {
            pool_id: pool_id.to_string(),
            owner: owner.to_string(),
            amount: withdrawn.clone(),
            shares,
        });
        self.commit(changes, Some(share_change), event);

        info!(
            pool_id = pool_id,
            owner = owner,
            withdrawn = %withdrawn,
            shares = %shares,
            "Withdraw committed"
        );

        Ok(WithdrawOutcome {
            pool_id: pool_id.to_string(),
            withdrawn,
            shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::bank::{Bank, BankError, MemoryBank};
    use crate::error::SwapError;
    use crate::hooks::{HookCall, RecordingHooks};
    use crate::manager::MemoryPoolManager;
    use amm_data::Database;
    use amm_domain::error::PoolError;
    use amm_domain::params::{AllowedPool, AllowedPools, Params};
    use amm_domain::token::{Coin, Coins};
    use primitive_types::U256;
    use rust_decimal_macros::dec;

    const ALICE: &str = "kava1alice";

    fn coins(list: &[(&str, u64)]) -> Coins {
        Coins::new(list.iter().map(|(d, a)| Coin::new(*d, *a))).unwrap()
    }

    fn fund(bank: &mut MemoryBank, address: &str) {
        bank.fund_account(address, &coins(&[("ukava", 10_000_000), ("usdx", 50_000_000)]))
            .unwrap();
    }

    /// Alice owns the whole `ukava/usdx` pool: 10e6 ukava, 50e6 usdx, 22360679 shares.
    fn manager() -> MemoryPoolManager {
        let params = Params::new(
            AllowedPools::new([AllowedPool::new("ukava", "usdx")]),
            dec!(0.003),
        );
        let mut manager = MemoryPoolManager::in_memory(params);
        fund(manager.bank_mut(), ALICE);
        manager
            .deposit(ALICE, &Coin::new("ukava", 10_000_000u64), &Coin::new("usdx", 50_000_000u64))
            .unwrap();
        manager
    }

    fn ukava(amount: u64) -> Coin {
        Coin::new("ukava", amount)
    }

    fn usdx(amount: u64) -> Coin {
        Coin::new("usdx", amount)
    }

    #[test]
    fn test_full_withdraw_deletes_records() {
        let mut manager = manager();
        let outcome = manager
            .withdraw(
                ALICE,
                "ukava/usdx",
                U256::from(22_360_679u64),
                dec!(0),
                &ukava(10_000_000),
                &usdx(50_000_000),
            )
            .unwrap();
        assert_eq!(outcome.withdrawn, coins(&[("ukava", 10_000_000), ("usdx", 50_000_000)]));

        let db = Database::new(manager.store());
        assert!(db.pools().find("ukava/usdx").unwrap().is_none());
        assert!(db.shares().find(ALICE, "ukava/usdx").unwrap().is_none());
        assert!(manager.store().is_empty());
        assert!(manager.bank().pool_balance().is_empty());
        assert_eq!(
            manager.bank().balance(ALICE),
            coins(&[("ukava", 10_000_000), ("usdx", 50_000_000)])
        );
    }

    #[test]
    fn test_partial_withdraw() {
        let mut manager = manager();
        let outcome = manager
            .withdraw(
                ALICE,
                "ukava/usdx",
                U256::from(11_180_339u64),
                dec!(0.01),
                &ukava(5_000_000),
                &usdx(25_000_000),
            )
            .unwrap();
        assert_eq!(outcome.withdrawn, coins(&[("ukava", 4_999_999), ("usdx", 24_999_998)]));

        let db = Database::new(manager.store());
        let pool = db.pools().find("ukava/usdx").unwrap().unwrap();
        assert_eq!(pool.total_shares, U256::from(11_180_340u64));
        assert_eq!(pool.reserves(), coins(&[("ukava", 5_000_001), ("usdx", 25_000_002)]));
        let share = db.shares().find(ALICE, "ukava/usdx").unwrap().unwrap();
        assert_eq!(share.shares_owned, U256::from(11_180_340u64));
    }

    #[test]
    fn test_withdraw_slippage_per_asset() {
        let mut manager = manager();
        let err = manager
            .withdraw(
                ALICE,
                "ukava/usdx",
                U256::from(11_180_339u64),
                dec!(0.01),
                &ukava(5_100_000),
                &usdx(25_000_000),
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::Pool(PoolError::SlippageExceeded(_))));

        // lower expectations never fail
        assert!(
            manager
                .withdraw(
                    ALICE,
                    "ukava/usdx",
                    U256::from(1_000_000u64),
                    dec!(0),
                    &ukava(1),
                    &usdx(1),
                )
                .is_ok()
        );
    }

    #[test]
    fn test_withdraw_errors() {
        let mut manager = manager();

        let err = manager
            .withdraw("kava1nobody", "ukava/usdx", U256::from(1), dec!(0.01), &ukava(1), &usdx(1))
            .unwrap_err();
        assert!(matches!(err, SwapError::Pool(PoolError::ShareRecordNotFound(_))));

        for shares in [U256::zero(), U256::from(22_360_680u64)] {
            let err = manager
                .withdraw(ALICE, "ukava/usdx", shares, dec!(0.01), &ukava(1), &usdx(1))
                .unwrap_err();
            assert!(matches!(err, SwapError::Pool(PoolError::InvalidShares(_))));
        }

        let err = manager
            .withdraw(
                ALICE,
                "ukava/usdx",
                U256::from(1_000u64),
                dec!(0.01),
                &ukava(1),
                &Coin::new("hard", 1u64),
            )
            .unwrap_err();
        assert!(matches!(err, SwapError::Pool(PoolError::InvalidCoins(_))));

        let err = manager
            .withdraw(ALICE, "ukava/usdx", U256::from(1), dec!(0.01), &ukava(1), &usdx(1))
            .unwrap_err();
        assert_eq!(
            err.as_pool_error(),
            Some(&PoolError::InsufficientLiquidity("shares must be increased".into()))
        );
        assert!(!manager.is_halted());
    }

    #[test]
    fn test_withdraw_hooks_see_balance_before() {
        let recorder = RecordingHooks::new();
        let mut manager = manager();
        manager.set_hooks(recorder.clone());

        for shares in [11_180_339u64, 11_180_340] {
            manager
                .withdraw(ALICE, "ukava/usdx", U256::from(shares), dec!(1), &ukava(1), &usdx(1))
                .unwrap();
        }

        let calls = recorder.take();
        assert_eq!(
            calls,
            vec![
                HookCall::BeforePoolDepositModified {
                    pool_id: "ukava/usdx".into(),
                    depositor: ALICE.into(),
                    shares_owned: U256::from(22_360_679u64),
                },
                HookCall::BeforePoolDepositModified {
                    pool_id: "ukava/usdx".into(),
                    depositor: ALICE.into(),
                    shares_owned: U256::from(11_180_340u64),
                },
            ]
        );
    }

    #[test]
    fn test_withdraw_into_full_balance_is_rejected() {
        let mut manager = manager();
        let full = Coins::new([Coin::new("usdx", U256::MAX)]).unwrap();
        manager.bank_mut().fund_account(ALICE, &full).unwrap();
        let store_before = manager.store().clone();
        let pool_before = manager.bank().pool_balance();

        let err = manager
            .withdraw(ALICE, "ukava/usdx", U256::from(1_000_000u64), dec!(1), &ukava(1), &usdx(1))
            .unwrap_err();
        assert_eq!(err, SwapError::Bank(BankError::Overflow(ALICE.into())));
        assert!(!manager.is_halted());

        assert_eq!(manager.store(), &store_before);
        assert_eq!(manager.bank().pool_balance(), pool_before);
        assert_eq!(manager.bank().balance(ALICE), full);
        assert!(!manager.check_invariants().1);
    }

    #[test]
    fn test_reserve_shortfall_halts_engine() {
        let mut manager = manager();
        manager
            .bank_mut()
            .burn_from_pool(&coins(&[("ukava", 1)]))
            .unwrap();

        let err = manager
            .withdraw(
                ALICE,
                "ukava/usdx",
                U256::from(22_360_679u64),
                dec!(0.01),
                &ukava(10_000_000),
                &usdx(50_000_000),
            )
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("reserve account out of sync"));
        assert!(manager.is_halted());

        // the pool record was not touched
        let db = Database::new(manager.store());
        assert!(db.pools().find("ukava/usdx").unwrap().is_some());

        let err = manager
            .deposit(ALICE, &ukava(1_000), &usdx(5_000))
            .unwrap_err();
        assert!(matches!(err, SwapError::Halted(_)));
    }
}
