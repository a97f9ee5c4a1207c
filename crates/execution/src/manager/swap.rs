use super::slippage::{check_limit, price_slippage};
use super::{
    PoolManager, SwapOutcome, check_reserve_room, find_pool, payout_error, validate_address,
    validate_pair,
};
use crate::bank::Bank;
use crate::error::SwapError;
use crate::events::{EventData, EventSink, ExactDirection, TradeData};
use crate::params::ParamSource;
use amm_data::{CacheStore, ChangeSet, Database, KvStore};
use amm_domain::error::{InvariantViolation, PoolError};
use amm_domain::math::constant_product::input_for_exact_output;
use amm_domain::state::{PoolRecord, pool_id};
use amm_domain::token::{Coin, Coins};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    /// Trades exactly `exact_coin_a` for at least `coin_b` less
    /// `slippage_limit`.
    pub fn swap_exact_for_tokens(
        &mut self,
        requester: &str,
        exact_coin_a: &Coin,
        coin_b: &Coin,
        slippage_limit: Decimal,
        deadline: i64,
    ) -> Result<SwapOutcome, SwapError> {
        self.breaker.check()?;
        let result =
            self.swap_exact_for_tokens_inner(requester, exact_coin_a, coin_b, slippage_limit, deadline);
        self.settle("swap_exact_for_tokens", result)
    }

    /// Trades at most `coin_a` plus `slippage_limit` for exactly
    /// `exact_coin_b`.
    pub fn swap_for_exact_tokens(
        &mut self,
        requester: &str,
        coin_a: &Coin,
        exact_coin_b: &Coin,
        slippage_limit: Decimal,
        deadline: i64,
    ) -> Result<SwapOutcome, SwapError> {
        self.breaker.check()?;
        let result =
            self.swap_for_exact_tokens_inner(requester, coin_a, exact_coin_b, slippage_limit, deadline);
        self.settle("swap_for_exact_tokens", result)
    }

    pub(super) fn swap_exact_for_tokens_inner(
        &mut self,
        requester: &str,
        exact_coin_a: &Coin,
        coin_b: &Coin,
        slippage_limit: Decimal,
        deadline: i64,
    ) -> Result<SwapOutcome, SwapError> {
        self.check_deadline(deadline)?;
        validate_address(requester, "requester")?;
        validate_pair(exact_coin_a, coin_b)?;
        let limit = super::slippage_limit(slippage_limit)?;
        let (_, fee) = self.current_params()?;

        let pool_id = pool_id(&exact_coin_a.denom, &coin_b.denom);
        let mut db = Database::new(CacheStore::new(&self.store));
        let (_, mut pool) = find_pool(&db, &pool_id)?
            .ok_or_else(|| PoolError::InvalidPool(format!("pool {pool_id} not found")))?;

        let reserve_in = pool.reserves().amount_of(&exact_coin_a.denom);
        check_reserve_room(&pool_id, reserve_in, exact_coin_a)?;

        let (output, fee_paid) = pool.swap_with_exact_input(exact_coin_a, fee)?;
        if output.is_zero() {
            return Err(PoolError::InsufficientLiquidity("increase input amount".into()).into());
        }
        debug!(pool_id = %pool_id, output = %output, fee = %fee_paid, "Exact input quote");

        check_limit(price_slippage(output.amount, coin_b.amount)?, limit)?;

        db.pools_mut().save(&PoolRecord::from_pool(&pool))?;
        let changes = db.into_inner().into_changes();

        let outcome = SwapOutcome {
            pool_id,
            input: exact_coin_a.clone(),
            output,
            fee_paid,
        };
        self.finish_swap(changes, requester, outcome, ExactDirection::Input)
    }

    pub(super) fn swap_for_exact_tokens_inner(
        &mut self,
        requester: &str,
        coin_a: &Coin,
        exact_coin_b: &Coin,
        slippage_limit: Decimal,
        deadline: i64,
    ) -> Result<SwapOutcome, SwapError> {
        self.check_deadline(deadline)?;
        validate_address(requester, "requester")?;
        validate_pair(coin_a, exact_coin_b)?;
        let limit = super::slippage_limit(slippage_limit)?;
        let (_, fee) = self.current_params()?;

        let pool_id = pool_id(&coin_a.denom, &exact_coin_b.denom);
        let mut db = Database::new(CacheStore::new(&self.store));
        let (_, mut pool) = find_pool(&db, &pool_id)?
            .ok_or_else(|| PoolError::InvalidPool(format!("pool {pool_id} not found")))?;

        let reserve_out = pool.reserves().amount_of(&exact_coin_b.denom);
        if exact_coin_b.amount >= reserve_out {
            return Err(PoolError::InsufficientLiquidity(format!(
                "output {} >= pool reserves {reserve_out}",
                exact_coin_b.amount
            ))
            .into());
        }

        // the output is below the reserves, so a failed quote means the
        // required input does not fit in 256 bits
        let reserve_in = pool.reserves().amount_of(&coin_a.denom);
        let (required, _) = input_for_exact_output(exact_coin_b.amount, reserve_out, reserve_in, fee)
            .map_err(|_| {
                PoolError::InvalidCoins(format!("input for {exact_coin_b} overflows"))
            })?;
        check_reserve_room(&pool_id, reserve_in, &Coin::new(coin_a.denom.clone(), required))?;

        let (input, fee_paid) = pool.swap_with_exact_output(exact_coin_b, fee)?;
        debug!(pool_id = %pool_id, input = %input, fee = %fee_paid, "Exact output quote");

        let input_without_fee = input
            .amount
            .checked_sub(fee_paid.amount)
            .ok_or_else(|| InvariantViolation::new("swap fee exceeds input"))?;
        check_limit(price_slippage(coin_a.amount, input_without_fee)?, limit)?;

        db.pools_mut().save(&PoolRecord::from_pool(&pool))?;
        let changes = db.into_inner().into_changes();

        let outcome = SwapOutcome {
            pool_id,
            input,
            output: exact_coin_b.clone(),
            fee_paid,
        };
        self.finish_swap(changes, requester, outcome, ExactDirection::Output)
    }

    /// Moves both legs of a staged trade and commits it.
    ///
    /// When the output leg fails the input leg is sent back before the
    /// error is returned.
    fn finish_swap(
        &mut self,
        changes: ChangeSet,
        requester: &str,
        outcome: SwapOutcome,
        exact_direction: ExactDirection,
    ) -> Result<SwapOutcome, SwapError> {
        let input = Coins::new([outcome.input.clone()])
            .map_err(|e| PoolError::InvalidCoins(e.to_string()))?;
        let output = Coins::new([outcome.output.clone()])
            .map_err(|e| InvariantViolation::new(e.to_string()))?;

        self.bank.send_from_account_to_pool(requester, &input)?;
        if let Err(err) = self.bank.send_from_pool_to_account(requester, &output) {
            self.bank
                .send_from_pool_to_account(requester, &input)
                .map_err(|e| InvariantViolation::new(format!("swap input not returned: {e}")))?;
            warn!(requester = requester, error = %err, "Swap output failed, input returned");
            return Err(payout_error(err));
        }

        let event = EventData::Trade(TradeData {
            pool_id: outcome.pool_id.clone(),
            requester: requester.to_string(),
            input: outcome.input.clone(),
            output: outcome.output.clone(),
            fee_paid: outcome.fee_paid.clone(),
            exact_direction,
        });
        self.commit(changes, None, event);

        info!(
            pool_id = %outcome.pool_id,
            requester = requester,
            input = %outcome.input,
            output = %outcome.output,
            fee_paid = %outcome.fee_paid,
            exact = %exact_direction,
            "Swap committed"
        );
        Ok(outcome)
    }
}
