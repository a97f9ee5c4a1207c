//! Pool manager: deposits, withdrawals and swaps over persisted pools.
//!
//! Every mutating call stages its record writes in a [`CacheStore`] over the
//! committed store. The staged writes are applied only after all checks and
//! transfers succeeded, so a failed call leaves no trace. An
//! [`InvariantViolation`] anywhere trips the circuit breaker and halts the
//! engine.

mod deposit;
mod genesis;
mod queries;
mod slippage;
mod swap;
mod withdraw;

pub use queries::PoolInfo;

use crate::bank::{Bank, BankError, MemoryBank};
use crate::emergency::CircuitBreaker;
use crate::error::SwapError;
use crate::events::{EventData, EventSink, MemoryEventSink, SwapEvent};
use crate::hooks::{Hooks, SwapHooks};
use crate::params::ParamSource;
use amm_data::{ChangeSet, Database, KvRead, KvStore, MemoryStore};
use amm_domain::error::{InvariantViolation, ParamsError, PoolError, RequestError};
use amm_domain::math::Dec;
use amm_domain::params::Params;
use amm_domain::pool::DenominatedPool;
use amm_domain::requests::{Deadline, Request, validate_address};
use amm_domain::state::{PoolRecord, pool_id};
use amm_domain::token::{Coin, Coins};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Result of a committed deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositOutcome {
    pub pool_id: String,
    /// Coins taken from the depositor.
    pub deposited: Coins,
    /// Shares minted to the depositor.
    pub shares: U256,
}

/// Result of a committed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    pub pool_id: String,
    /// Coins paid to the owner.
    pub withdrawn: Coins,
    /// Shares burned.
    pub shares: U256,
}

/// Result of a committed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub pool_id: String,
    pub input: Coin,
    pub output: Coin,
    /// Fee charged, in the input denomination.
    pub fee_paid: Coin,
}

/// Result of [`PoolManager::execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Deposit(DepositOutcome),
    Withdraw(WithdrawOutcome),
    Swap(SwapOutcome),
}

/// Runs pool operations against a store, a bank, a parameter source and an
/// event sink.
///
/// Mutating calls take `&mut self`, so one manager serializes all writers.
#[derive(Debug)]
pub struct PoolManager<S, B, P, E> {
    store: S,
    bank: B,
    params: P,
    events: E,
    hooks: Hooks,
    breaker: CircuitBreaker,
    block_time: DateTime<Utc>,
}

/// A manager backed entirely by memory.
pub type MemoryPoolManager = PoolManager<MemoryStore, MemoryBank, Params, MemoryEventSink>;

impl MemoryPoolManager {
    /// Creates an empty in-memory engine with `params`.
    #[must_use]
    pub fn in_memory(params: Params) -> Self {
        Self::new(MemoryStore::new(), MemoryBank::new(), params, MemoryEventSink::new())
    }
}

impl<S, B, P, E> PoolManager<S, B, P, E>
where
    S: KvStore,
    B: Bank,
    P: ParamSource,
    E: EventSink,
{
    pub fn new(store: S, bank: B, params: P, events: E) -> Self {
        Self {
            store,
            bank,
            params,
            events,
            hooks: Hooks::none(),
            breaker: CircuitBreaker::new(),
            block_time: DateTime::<Utc>::default(),
        }
    }

    /// Installs hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: impl SwapHooks + 'static) -> Self {
        self.hooks.set(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: impl SwapHooks + 'static) {
        self.hooks.set(hooks);
    }

    pub fn clear_hooks(&mut self) {
        self.hooks.clear();
    }

    /// Sets the block time deadlines are compared against.
    pub fn set_block_time(&mut self, block_time: DateTime<Utc>) {
        self.block_time = block_time;
    }

    #[must_use]
    pub fn block_time(&self) -> DateTime<Utc> {
        self.block_time
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access, bypassing every check.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    #[must_use]
    pub fn param_source(&self) -> &P {
        &self.params
    }

    pub fn param_source_mut(&mut self) -> &mut P {
        &mut self.params
    }

    #[must_use]
    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// True once an invariant violation halted the engine.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        !self.breaker.is_allowed()
    }

    /// Validates a request, checks its deadline and runs it.
    ///
    /// Deposits run with the request's slippage bound on the deposit ratio.
    pub fn execute(&mut self, request: &Request) -> Result<Outcome, SwapError> {
        self.breaker.check()?;
        debug!(kind = request.kind(), "Executing request");

        let result = self.execute_request(request);
        self.settle(request.kind(), result)
    }

    fn execute_request(&mut self, request: &Request) -> Result<Outcome, SwapError> {
        request.validate()?;
        self.check_deadline(request.deadline())?;

        match request {
            Request::Deposit(r) => {
                let limit = slippage_limit(r.slippage)?;
                self.deposit_with_limit(&r.depositor, &r.token_a, &r.token_b, Some(limit))
                    .map(Outcome::Deposit)
            }
            Request::Withdraw(r) => self
                .withdraw_inner(
                    &r.from,
                    &pool_id(&r.expected_token_a.denom, &r.expected_token_b.denom),
                    r.shares,
                    r.slippage,
                    &r.expected_token_a,
                    &r.expected_token_b,
                )
                .map(Outcome::Withdraw),
            Request::SwapExactForTokens(r) => self
                .swap_exact_for_tokens_inner(
                    &r.requester,
                    &r.exact_token_a,
                    &r.token_b,
                    r.slippage,
                    r.deadline,
                )
                .map(Outcome::Swap),
            Request::SwapForExactTokens(r) => self
                .swap_for_exact_tokens_inner(
                    &r.requester,
                    &r.token_a,
                    &r.exact_token_b,
                    r.slippage,
                    r.deadline,
                )
                .map(Outcome::Swap),
        }
    }

    /// Trips the breaker on fatal errors and logs rejections.
    fn settle<T>(&mut self, operation: &str, result: Result<T, SwapError>) -> Result<T, SwapError> {
        match &result {
            Err(SwapError::Fatal(violation)) => {
                self.breaker.trip(violation.clone(), self.block_time);
            }
            Err(err) => {
                warn!(operation = operation, error = %err, "Operation rejected");
            }
            Ok(_) => {}
        }
        result
    }

    fn check_deadline(&self, deadline: i64) -> Result<(), PoolError> {
        let now = self.block_time.timestamp();
        if now >= deadline {
            return Err(PoolError::DeadlineExceeded(format!(
                "block time {now} >= deadline {deadline}"
            )));
        }
        Ok(())
    }

    /// Applies staged writes, firing share hooks around the commit, then
    /// emits `event`.
    fn commit(
        &mut self,
        changes: ChangeSet,
        share_change: Option<ShareChange<'_>>,
        event: EventData,
    ) {
        if let Some(ShareChange::Modified { pool_id, owner, before }) = &share_change {
            self.hooks.before_pool_deposit_modified(pool_id, owner, *before);
        }
        changes.apply(&mut self.store);
        if let Some(ShareChange::Created { pool_id, owner, shares }) = &share_change {
            self.hooks.after_pool_deposit_created(pool_id, owner, *shares);
        }
        self.events.emit(SwapEvent::new(self.block_time, event));
    }

    /// Params and swap fee for the current call.
    fn current_params(&self) -> Result<(Params, Dec), SwapError> {
        let params = self.params.params();
        params.validate()?;
        let fee = params
            .swap_fee_dec()
            .map_err(|e| ParamsError::InvalidSwapFee(e.to_string()))?;
        Ok((params, fee))
    }
}

/// Share record change made by a call, reported to hooks on commit.
enum ShareChange<'a> {
    Created {
        pool_id: &'a str,
        owner: &'a str,
        shares: U256,
    },
    Modified {
        pool_id: &'a str,
        owner: &'a str,
        before: U256,
    },
}

/// Rehydrates a persisted pool. Any inconsistency is fatal.
pub(crate) fn load_pool(record: &PoolRecord) -> Result<DenominatedPool, InvariantViolation> {
    let corrupted = |e: &dyn std::fmt::Display| {
        InvariantViolation::new(format!("invalid pool {}: {e}", record.pool_id))
    };
    let pool = DenominatedPool::with_existing_shares(&record.reserves(), record.total_shares)
        .map_err(|e| corrupted(&e))?;
    record.validate().map_err(|e| corrupted(&e))?;
    Ok(pool)
}

/// Loads the pool stored under `pool_id`, checking the record matches its key.
pub(crate) fn find_pool<S: KvRead>(
    db: &Database<S>,
    pool_id: &str,
) -> Result<Option<(PoolRecord, DenominatedPool)>, SwapError> {
    let Some(record) = db.pools().find(pool_id)? else {
        return Ok(None);
    };
    if record.pool_id != pool_id {
        return Err(InvariantViolation::new(format!(
            "pool record {} stored under {pool_id}",
            record.pool_id
        ))
        .into());
    }
    let pool = load_pool(&record)?;
    Ok(Some((record, pool)))
}

fn slippage_limit(limit: Decimal) -> Result<Dec, RequestError> {
    Dec::from_decimal(limit)
        .map_err(|_| RequestError::InvalidSlippage("slippage can not be negative".into()))
}

/// Fails when `coin` no longer fits next to `reserve` in 256 bits.
fn check_reserve_room(pool_id: &str, reserve: U256, coin: &Coin) -> Result<(), PoolError> {
    if reserve.checked_add(coin.amount).is_none() {
        return Err(PoolError::InvalidCoins(format!(
            "{coin} overflows reserves of pool {pool_id}"
        )));
    }
    Ok(())
}

/// Maps a failed payout from the reserve account. An owner balance that
/// would overflow is rejected; a short reserve account is fatal.
fn payout_error(err: BankError) -> SwapError {
    match err {
        BankError::Overflow(_) => err.into(),
        BankError::InsufficientFunds { .. } => {
            InvariantViolation::new(format!("reserve account out of sync: {err}")).into()
        }
    }
}

/// Checks a caller-supplied pair: valid denominations, positive amounts,
/// distinct denominations.
fn validate_pair(a: &Coin, b: &Coin) -> Result<(), PoolError> {
    for coin in [a, b] {
        if coin.validate().is_err() || coin.is_zero() {
            return Err(PoolError::InvalidCoins(format!("invalid amount {coin}")));
        }
    }
    if a.denom == b.denom {
        return Err(PoolError::InvalidCoins(
            "denominations can not be equal".into(),
        ));
    }
    Ok(())
}
