//! Slippage measures. Each one is a non-negative fraction compared against
//! the caller's limit.

use amm_domain::error::PoolError;
use amm_domain::math::Dec;
use amm_domain::token::{Coin, Coins};
use primitive_types::U256;

/// Fails with `SlippageExceeded` when `slippage > limit`.
pub(super) fn check_limit(slippage: Dec, limit: Dec) -> Result<(), PoolError> {
    if slippage > limit {
        return Err(PoolError::SlippageExceeded(format!(
            "slippage {slippage} > limit {limit}"
        )));
    }
    Ok(())
}

/// `1 - numerator / denominator`, zero when the ratio is at least one.
pub(super) fn price_slippage(numerator: U256, denominator: U256) -> Result<Dec, PoolError> {
    let price_change = Dec::ratio(numerator, denominator).ok_or_else(|| {
        PoolError::InvalidCoins("expected amount must be positive".into())
    })?;
    Ok(Dec::ONE.checked_sub(price_change).unwrap_or(Dec::ZERO))
}

/// `expected / calculated - 1`, zero when `expected <= calculated`.
pub(super) fn shortfall_slippage(expected: U256, calculated: U256) -> Result<Dec, PoolError> {
    let ratio = Dec::ratio(expected, calculated).ok_or_else(|| {
        PoolError::InsufficientLiquidity("shares must be increased".into())
    })?;
    Ok(ratio.checked_sub(Dec::ONE).unwrap_or(Dec::ZERO))
}

/// Relative deviation between the requested deposit ratio `a / b` and the
/// ratio actually deposited, in either direction.
pub(super) fn deposit_slippage(
    desired_a: &Coin,
    desired_b: &Coin,
    deposited: &Coins,
) -> Result<Dec, PoolError> {
    let out_of_range = || PoolError::SlippageExceeded("deposit ratio out of range".into());

    let desired = Dec::ratio(desired_a.amount, desired_b.amount).ok_or_else(out_of_range)?;
    let actual = Dec::ratio(
        deposited.amount_of(&desired_a.denom),
        deposited.amount_of(&desired_b.denom),
    )
    .ok_or_else(out_of_range)?;

    let up = actual.checked_quo(desired).ok_or_else(out_of_range)?;
    let down = desired.checked_quo(actual).ok_or_else(out_of_range)?;
    up.max(down).checked_sub(Dec::ONE).ok_or_else(out_of_range)
}
