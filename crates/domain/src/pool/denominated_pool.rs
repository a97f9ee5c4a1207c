use crate::error::{InvariantViolation, PoolError};
use crate::math::dec::Dec;
use crate::pool::base_pool::BasePool;
use crate::token::{Coin, Coins};
use primitive_types::U256;

/// Splits a reserve bag into its two coins in canonical denomination order.
///
/// The bag must hold exactly two positive denominations. [`Coins`] already
/// sorts and drops zero amounts, so the order here is independent of the
/// order the caller supplied.
pub fn normalize_reserves(reserves: &Coins) -> Result<(&Coin, &Coin), PoolError> {
    match reserves.as_slice() {
        [a, b] if a.denom < b.denom => Ok((a, b)),
        _ => Err(PoolError::InvalidPool(
            "reserves must have two denominations".into(),
        )),
    }
}

/// A [`BasePool`] labelled with the two denominations it trades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominatedPool {
    denom_a: String,
    denom_b: String,
    pool: BasePool,
}

impl DenominatedPool {
    /// Creates a pool from a two-denomination reserve bag.
    pub fn new(reserves: &Coins) -> Result<Self, PoolError> {
        let (a, b) = normalize_reserves(reserves)?;
        let pool = BasePool::new(a.amount, b.amount)?;

        Ok(Self {
            denom_a: a.denom.clone(),
            denom_b: b.denom.clone(),
            pool,
        })
    }

    /// Rehydrates a pool with a known share supply.
    pub fn with_existing_shares(reserves: &Coins, total_shares: U256) -> Result<Self, PoolError> {
        let (a, b) = normalize_reserves(reserves)?;
        let pool = BasePool::with_existing_shares(a.amount, b.amount, total_shares)?;

        Ok(Self {
            denom_a: a.denom.clone(),
            denom_b: b.denom.clone(),
            pool,
        })
    }

    #[must_use]
    pub fn denom_a(&self) -> &str {
        &self.denom_a
    }

    #[must_use]
    pub fn denom_b(&self) -> &str {
        &self.denom_b
    }

    /// Both reserve coins, zero amounts included.
    #[must_use]
    pub fn reserve_coins(&self) -> (Coin, Coin) {
        (
            Coin::new(self.denom_a.clone(), self.pool.reserves_a()),
            Coin::new(self.denom_b.clone(), self.pool.reserves_b()),
        )
    }

    /// Reserves as a coin bag; empty once the pool is drained.
    #[must_use]
    pub fn reserves(&self) -> Coins {
        self.coins(self.pool.reserves_a(), self.pool.reserves_b())
    }

    #[must_use]
    pub fn total_shares(&self) -> U256 {
        self.pool.total_shares()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    /// Adds liquidity and returns the coins actually deposited plus the
    /// shares minted.
    pub fn add_liquidity(&mut self, deposit: &Coins) -> Result<(Coins, U256), InvariantViolation> {
        let desired_a = deposit.amount_of(&self.denom_a);
        let desired_b = deposit.amount_of(&self.denom_b);

        let (actual_a, actual_b, shares) = self.pool.add_liquidity(desired_a, desired_b)?;
        Ok((self.coins(actual_a, actual_b), shares))
    }

    /// Removes `shares` and returns the withdrawn coins.
    pub fn remove_liquidity(&mut self, shares: U256) -> Result<Coins, InvariantViolation> {
        let (a, b) = self.pool.remove_liquidity(shares)?;
        Ok(self.coins(a, b))
    }

    /// Coin value of `shares` without changing the pool.
    pub fn share_value(&self, shares: U256) -> Result<Coins, InvariantViolation> {
        let (a, b) = self.pool.share_value(shares)?;
        Ok(self.coins(a, b))
    }

    /// Trades an exact input coin. Returns `(output, fee)`, the fee in the
    /// input denomination.
    pub fn swap_with_exact_input(
        &mut self,
        exact_input: &Coin,
        fee: Dec,
    ) -> Result<(Coin, Coin), InvariantViolation> {
        let (output, fee_paid) = match exact_input.denom.as_str() {
            d if d == self.denom_a => {
                let (out, paid) = self.pool.swap_exact_a_for_b(exact_input.amount, fee)?;
                (Coin::new(self.denom_b.clone(), out), paid)
            }
            d if d == self.denom_b => {
                let (out, paid) = self.pool.swap_exact_b_for_a(exact_input.amount, fee)?;
                (Coin::new(self.denom_a.clone(), out), paid)
            }
            _ => return Err(self.unknown_denom(&exact_input.denom)),
        };
        Ok((output, Coin::new(exact_input.denom.clone(), fee_paid)))
    }

    /// Trades for an exact output coin. Returns `(input, fee)`, both in the
    /// input denomination.
    pub fn swap_with_exact_output(
        &mut self,
        exact_output: &Coin,
        fee: Dec,
    ) -> Result<(Coin, Coin), InvariantViolation> {
        let (input_denom, amount_in, fee_paid) = match exact_output.denom.as_str() {
            d if d == self.denom_a => {
                let (amount_in, paid) = self.pool.swap_b_for_exact_a(exact_output.amount, fee)?;
                (self.denom_b.clone(), amount_in, paid)
            }
            d if d == self.denom_b => {
                let (amount_in, paid) = self.pool.swap_a_for_exact_b(exact_output.amount, fee)?;
                (self.denom_a.clone(), amount_in, paid)
            }
            _ => return Err(self.unknown_denom(&exact_output.denom)),
        };
        Ok((
            Coin::new(input_denom.clone(), amount_in),
            Coin::new(input_denom, fee_paid),
        ))
    }

    fn coins(&self, a: U256, b: U256) -> Coins {
        Coins::from_pair(
            Coin::new(self.denom_a.clone(), a),
            Coin::new(self.denom_b.clone(), b),
        )
    }

    fn unknown_denom(&self, denom: &str) -> InvariantViolation {
        InvariantViolation::new(format!(
            "invalid denomination: {denom} is not in pool {}/{}",
            self.denom_a, self.denom_b
        ))
    }
}
