use crate::error::InvariantViolation;
use crate::math::dec::Dec;
use primitive_types::{U256, U512};

fn narrow(value: U512, what: &str) -> Result<U256, InvariantViolation> {
    U256::try_from(value)
        .map_err(|_| InvariantViolation::new(format!("{what} overflows 256 bits: {value}")))
}

/// Returns `1 - fee`, checking `0 <= fee < 1`.
pub fn fee_complement(fee: Dec) -> Result<Dec, InvariantViolation> {
    match Dec::ONE.checked_sub(fee) {
        Some(rest) if !rest.is_zero() => Ok(rest),
        _ => Err(InvariantViolation::new(
            "invalid value: fee must be between 0 and 1",
        )),
    }
}

/// Calculates the output for an exact input in a constant product pool (x * y = k).
/// Returns `(amount_out, fee_paid)` where the fee is denominated in the input.
///
/// formula: dy = y * dx' / (x + dx'), with dx' = floor(dx * (1 - fee))
///
/// The fee is the part of the input removed by truncation, so it is at least
/// one unit for any non-zero fee and can not be reduced by splitting a trade.
pub fn output_for_exact_input(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
    fee: Dec,
) -> Result<(U256, U256), InvariantViolation> {
    if amount_in.is_zero() {
        return Err(InvariantViolation::new(
            "invalid value: swap input must be positive",
        ));
    }
    let rest = fee_complement(fee)?;

    let in_after_fee = Dec::from_int(amount_in)
        .checked_mul(rest)
        .map(|d| d.truncate())
        .ok_or_else(|| InvariantViolation::new("swap input overflows"))?;
    let in_after_fee = narrow(in_after_fee, "input after fee")?;

    let numerator = reserve_out.full_mul(in_after_fee);
    let denominator = U512::from(reserve_in) + U512::from(in_after_fee);
    if denominator.is_zero() {
        return Err(InvariantViolation::new(
            "invalid state: reserves must be positive",
        ));
    }

    let amount_out = narrow(numerator / denominator, "swap output")?;
    Ok((amount_out, amount_in - in_after_fee))
}

/// Calculates the input needed for an exact output.
/// Returns `(amount_in, fee_paid)` where the fee is denominated in the input.
///
/// formula: dx = ceil(ceil(x * dy / (y - dy)) / (1 - fee))
///
/// Both steps round up so the constant product never decreases.
pub fn input_for_exact_output(
    amount_out: U256,
    reserve_out: U256,
    reserve_in: U256,
    fee: Dec,
) -> Result<(U256, U256), InvariantViolation> {
    if amount_out.is_zero() {
        return Err(InvariantViolation::new(
            "invalid value: swap output must be positive",
        ));
    }
    if amount_out >= reserve_out {
        return Err(InvariantViolation::new(
            "invalid value: swap output must be less than reserves",
        ));
    }
    let rest = fee_complement(fee)?;

    let (quo, rem) = reserve_in
        .full_mul(amount_out)
        .div_mod(U512::from(reserve_out - amount_out));
    let in_without_fee = if rem.is_zero() { quo } else { quo + 1 };
    let in_without_fee = narrow(in_without_fee, "swap input")?;

    let amount_in = Dec::from_int(in_without_fee)
        .checked_quo(rest)
        .map(|d| d.ceil())
        .ok_or_else(|| InvariantViolation::new("swap input overflows"))?;
    let amount_in = narrow(amount_in, "swap input")?;

    Ok((amount_in, amount_in - in_without_fee))
}

/// Calculates the spot price of the input in terms of the output.
/// Price = reserve_out / reserve_in
pub fn calculate_spot_price(reserve_in: U256, reserve_out: U256) -> Option<Dec> {
    Dec::ratio(reserve_out, reserve_in)
}

/// Calculates the constant product K without overflow.
pub fn calculate_k(reserve_a: U256, reserve_b: U256) -> U512 {
    reserve_a.full_mul(reserve_b)
}
