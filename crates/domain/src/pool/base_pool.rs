//! Unitless constant-product liquidity pool.
//!
//! The pool is symmetric: for any operation `F`, applying it to `(A, B, s)`
//! and the mirrored operation to `(B, A, s)` yields mirrored state. Every
//! intermediate product is formed in 512 bits, so the pool only overflows
//! when a reserve or the share supply itself leaves the 256-bit range.
//!
//! Operations given zero inputs, or shares above the total supply, return
//! [`InvariantViolation`]: callers are expected to have rejected those values
//! already, so reaching the core with them indicates a bug.

use crate::error::{InvariantViolation, PoolError};
use crate::math::constant_product::{calculate_k, input_for_exact_output, output_for_exact_input};
use crate::math::dec::Dec;
use crate::math::sqrt::geometric_mean;
use primitive_types::{U256, U512};
use tracing::debug;

fn narrow(value: U512, what: &str) -> Result<U256, InvariantViolation> {
    U256::try_from(value)
        .map_err(|_| InvariantViolation::new(format!("{what} overflows 256 bits: {value}")))
}

fn checked_add(a: U256, b: U256, what: &str) -> Result<U256, InvariantViolation> {
    a.checked_add(b)
        .ok_or_else(|| InvariantViolation::new(format!("{what} overflows 256 bits")))
}

/// Reserves and share supply of a two-asset pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePool {
    reserves_a: U256,
    reserves_b: U256,
    total_shares: U256,
}

impl BasePool {
    /// Creates a pool whose initial shares are `floor(sqrt(a * b))`.
    pub fn new(reserves_a: U256, reserves_b: U256) -> Result<Self, PoolError> {
        if reserves_a.is_zero() || reserves_b.is_zero() {
            return Err(PoolError::InvalidPool(
                "reserves must be greater than zero".into(),
            ));
        }

        Ok(Self {
            reserves_a,
            reserves_b,
            total_shares: geometric_mean(reserves_a, reserves_b),
        })
    }

    /// Rehydrates a pool from persisted reserves and share supply.
    pub fn with_existing_shares(
        reserves_a: U256,
        reserves_b: U256,
        total_shares: U256,
    ) -> Result<Self, PoolError> {
        if reserves_a.is_zero() || reserves_b.is_zero() {
            return Err(PoolError::InvalidPool(
                "reserves must be greater than zero".into(),
            ));
        }
        if total_shares.is_zero() {
            return Err(PoolError::InvalidPool(
                "total shares must be greater than zero".into(),
            ));
        }

        Ok(Self {
            reserves_a,
            reserves_b,
            total_shares,
        })
    }

    #[must_use]
    pub fn reserves_a(&self) -> U256 {
        self.reserves_a
    }

    #[must_use]
    pub fn reserves_b(&self) -> U256 {
        self.reserves_b
    }

    #[must_use]
    pub fn total_shares(&self) -> U256 {
        self.total_shares
    }

    /// True once every share has been withdrawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reserves_a.is_zero() && self.reserves_b.is_zero()
    }

    /// Adds liquidity at the current reserve ratio.
    ///
    /// Returns `(actual_a, actual_b, shares_minted)`. The actual amounts never
    /// exceed the desired ones. An empty pool is reinitialized with the
    /// desired amounts.
    pub fn add_liquidity(
        &mut self,
        desired_a: U256,
        desired_b: U256,
    ) -> Result<(U256, U256, U256), InvariantViolation> {
        if desired_a.is_zero() {
            return Err(InvariantViolation::new(
                "invalid value: deposit A must be positive",
            ));
        }
        if desired_b.is_zero() {
            return Err(InvariantViolation::new(
                "invalid value: deposit B must be positive",
            ));
        }

        if self.is_empty() {
            self.reserves_a = desired_a;
            self.reserves_b = desired_b;
            self.total_shares = geometric_mean(desired_a, desired_b);
            return Ok((desired_a, desired_b, self.total_shares));
        }
        self.assert_reserves_are_positive()?;

        // optimal_b = reserves_b * desired_a / reserves_a; compare
        // optimal_b <= desired_b without dividing first.
        let product_a = self.reserves_b.full_mul(desired_a);
        let product_b = self.reserves_a.full_mul(desired_b);

        let (actual_a, actual_b) = if product_a <= product_b {
            let optimal_b = narrow(product_a / U512::from(self.reserves_a), "deposit B")?;
            (desired_a, optimal_b)
        } else {
            let optimal_a = narrow(product_b / U512::from(self.reserves_b), "deposit A")?;
            (optimal_a, desired_b)
        };

        // the smaller ratio keeps the share ratio at or below both deposit
        // ratios and makes the result independent of reserve order
        let shares_a = actual_a.full_mul(self.total_shares) / U512::from(self.reserves_a);
        let shares_b = actual_b.full_mul(self.total_shares) / U512::from(self.reserves_b);
        let shares = narrow(shares_a.min(shares_b), "minted shares")?;

        let reserves_a = checked_add(self.reserves_a, actual_a, "reserves A")?;
        let reserves_b = checked_add(self.reserves_b, actual_b, "reserves B")?;
        let total_shares = checked_add(self.total_shares, shares, "total shares")?;

        debug!(
            actual_a = %actual_a,
            actual_b = %actual_b,
            shares = %shares,
            "Liquidity added"
        );

        self.reserves_a = reserves_a;
        self.reserves_b = reserves_b;
        self.total_shares = total_shares;

        Ok((actual_a, actual_b, shares))
    }

    /// Removes `shares` and returns the withdrawn `(a, b)`.
    pub fn remove_liquidity(&mut self, shares: U256) -> Result<(U256, U256), InvariantViolation> {
        let (withdraw_a, withdraw_b) = self.share_value(shares)?;

        // share_value bounds every operand, so none of these can underflow
        self.reserves_a -= withdraw_a;
        self.reserves_b -= withdraw_b;
        self.total_shares -= shares;

        Ok((withdraw_a, withdraw_b))
    }

    /// Value of `shares` as `(reserves_a * shares / total, reserves_b * shares / total)`.
    pub fn share_value(&self, shares: U256) -> Result<(U256, U256), InvariantViolation> {
        if shares.is_zero() {
            return Err(InvariantViolation::new(
                "invalid value: shares must be positive",
            ));
        }
        if shares > self.total_shares {
            return Err(InvariantViolation::new(format!(
                "out of bounds: shares {} > total shares {}",
                shares, self.total_shares
            )));
        }

        let total = U512::from(self.total_shares);
        let value_a = narrow(self.reserves_a.full_mul(shares) / total, "share value A")?;
        let value_b = narrow(self.reserves_b.full_mul(shares) / total, "share value B")?;
        Ok((value_a, value_b))
    }

    /// Trades exactly `a` for B. Returns `(b_out, fee_paid_in_a)`.
    pub fn swap_exact_a_for_b(
        &mut self,
        a: U256,
        fee: Dec,
    ) -> Result<(U256, U256), InvariantViolation> {
        let (b, fee_value) = output_for_exact_input(a, self.reserves_a, self.reserves_b, fee)?;
        let new_a = checked_add(self.reserves_a, a, "reserves A")?;
        self.assert_invariant_and_update_reserves(
            new_a,
            fee_value,
            self.reserves_b - b,
            U256::zero(),
        )?;
        Ok((b, fee_value))
    }

    /// Trades exactly `b` for A. Returns `(a_out, fee_paid_in_b)`.
    pub fn swap_exact_b_for_a(
        &mut self,
        b: U256,
        fee: Dec,
    ) -> Result<(U256, U256), InvariantViolation> {
        let (a, fee_value) = output_for_exact_input(b, self.reserves_b, self.reserves_a, fee)?;
        let new_b = checked_add(self.reserves_b, b, "reserves B")?;
        self.assert_invariant_and_update_reserves(
            self.reserves_a - a,
            U256::zero(),
            new_b,
            fee_value,
        )?;
        Ok((a, fee_value))
    }

    /// Trades A for exactly `b`. Returns `(a_in, fee_paid_in_a)`.
    pub fn swap_a_for_exact_b(
        &mut self,
        b: U256,
        fee: Dec,
    ) -> Result<(U256, U256), InvariantViolation> {
        let (a, fee_value) = input_for_exact_output(b, self.reserves_b, self.reserves_a, fee)?;
        let new_a = checked_add(self.reserves_a, a, "reserves A")?;
        self.assert_invariant_and_update_reserves(
            new_a,
            fee_value,
            self.reserves_b - b,
            U256::zero(),
        )?;
        Ok((a, fee_value))
    }

    /// Trades B for exactly `a`. Returns `(b_in, fee_paid_in_b)`.
    pub fn swap_b_for_exact_a(
        &mut self,
        a: U256,
        fee: Dec,
    ) -> Result<(U256, U256), InvariantViolation> {
        let (b, fee_value) = input_for_exact_output(a, self.reserves_a, self.reserves_b, fee)?;
        let new_b = checked_add(self.reserves_b, b, "reserves B")?;
        self.assert_invariant_and_update_reserves(
            self.reserves_a - a,
            U256::zero(),
            new_b,
            fee_value,
        )?;
        Ok((b, fee_value))
    }

    /// Rejects the trade if `(A' - feeA) * (B' - feeB) < A * B`, otherwise
    /// stores the new reserves.
    fn assert_invariant_and_update_reserves(
        &mut self,
        new_reserves_a: U256,
        fee_a: U256,
        new_reserves_b: U256,
        fee_b: U256,
    ) -> Result<(), InvariantViolation> {
        let invariant = calculate_k(self.reserves_a, self.reserves_b);
        let new_invariant = calculate_k(new_reserves_a - fee_a, new_reserves_b - fee_b);

        if invariant > new_invariant {
            return Err(InvariantViolation::new(format!(
                "invalid state: invariant {invariant} decreased to {new_invariant}"
            )));
        }

        self.reserves_a = new_reserves_a;
        self.reserves_b = new_reserves_b;
        Ok(())
    }

    fn assert_reserves_are_positive(&self) -> Result<(), InvariantViolation> {
        if self.reserves_a.is_zero() {
            return Err(InvariantViolation::new(
                "invalid state: reserves A must be positive",
            ));
        }
        if self.reserves_b.is_zero() {
            return Err(InvariantViolation::new(
                "invalid state: reserves B must be positive",
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptest_properties {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn reserve_strategy() -> impl Strategy<Value = u128> {
        1u128..=1_000_000_000_000_000_000_000u128
    }

    fn fee_strategy() -> impl Strategy<Value = Dec> {
        prop_oneof![
            Just("0"),
            Just("0.001"),
            Just("0.0025"),
            Just("0.003"),
            Just("0.05"),
        ]
        .prop_map(|raw| Dec::from_str(raw).unwrap_or(Dec::ZERO))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_creator_withdraws_exact_reserves(
            ra in reserve_strategy(),
            rb in reserve_strategy(),
        ) {
            let Ok(mut pool) = BasePool::new(U256::from(ra), U256::from(rb)) else {
                return Ok(());
            };
            let shares = pool.total_shares();
            prop_assert_eq!(shares, geometric_mean(U256::from(ra), U256::from(rb)));

            let Ok((a, b)) = pool.remove_liquidity(shares) else {
                return Err(TestCaseError::fail("full withdraw failed"));
            };
            prop_assert_eq!(a, U256::from(ra));
            prop_assert_eq!(b, U256::from(rb));
            prop_assert!(pool.is_empty());
        }

        #[test]
        fn prop_add_liquidity_respects_desired_and_ratio(
            ra in reserve_strategy(),
            rb in reserve_strategy(),
            da in reserve_strategy(),
            db in reserve_strategy(),
        ) {
            let Ok(mut pool) = BasePool::new(U256::from(ra), U256::from(rb)) else {
                return Ok(());
            };
            let shares_before = pool.total_shares();
            let Ok((a, b, minted)) = pool.add_liquidity(U256::from(da), U256::from(db)) else {
                return Err(TestCaseError::fail("add liquidity failed"));
            };

            prop_assert!(a <= U256::from(da));
            prop_assert!(b <= U256::from(db));
            prop_assert!(minted.full_mul(U256::from(ra)) <= shares_before.full_mul(a));
            prop_assert!(minted.full_mul(U256::from(rb)) <= shares_before.full_mul(b));
        }

        #[test]
        fn prop_swap_never_decreases_product(
            ra in reserve_strategy(),
            rb in reserve_strategy(),
            amount in 1u128..=1_000_000_000_000u128,
            fee in fee_strategy(),
        ) {
            let Ok(mut pool) = BasePool::new(U256::from(ra), U256::from(rb)) else {
                return Ok(());
            };
            let k_before = calculate_k(pool.reserves_a(), pool.reserves_b());

            let Ok(_) = pool.swap_exact_a_for_b(U256::from(amount), fee) else {
                return Err(TestCaseError::fail("exact input swap failed"));
            };
            prop_assert!(calculate_k(pool.reserves_a(), pool.reserves_b()) >= k_before);
        }

        #[test]
        fn prop_swaps_are_symmetric(
            ra in reserve_strategy(),
            rb in reserve_strategy(),
            amount in 1u128..=1_000_000_000u128,
            fee in fee_strategy(),
        ) {
            let (Ok(mut forward), Ok(mut mirrored)) = (
                BasePool::new(U256::from(ra), U256::from(rb)),
                BasePool::new(U256::from(rb), U256::from(ra)),
            ) else {
                return Ok(());
            };

            let forward_result = forward.swap_exact_a_for_b(U256::from(amount), fee);
            let mirrored_result = mirrored.swap_exact_b_for_a(U256::from(amount), fee);
            prop_assert_eq!(forward_result, mirrored_result);
            prop_assert_eq!(forward.reserves_a(), mirrored.reserves_b());
            prop_assert_eq!(forward.reserves_b(), mirrored.reserves_a());
        }
    }
}
