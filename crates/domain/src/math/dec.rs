//! Fixed-point decimal with 18 fractional digits.
//!
//! Fees and slippage ratios are carried as [`Dec`] so that rounding is
//! identical on every node: multiplication and division round half to even
//! at the 18th digit, and conversions back to integers either truncate or
//! ceil explicitly.

use crate::error::DecError;
use primitive_types::{U256, U512};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits.
pub const PRECISION: u32 = 18;

const ONE_RAW: u64 = 1_000_000_000_000_000_000;

fn precision_multiplier() -> U512 {
    U512::from(ONE_RAW)
}

/// Divides by `10^18` and rounds half to even.
fn chop_precision_and_round(value: U512) -> U512 {
    let (quo, rem) = value.div_mod(precision_multiplier());
    let half = U512::from(ONE_RAW / 2);
    match rem.cmp(&half) {
        Ordering::Less => quo,
        Ordering::Greater => quo + 1,
        Ordering::Equal if quo.bit(0) => quo + 1,
        Ordering::Equal => quo,
    }
}

/// Non-negative decimal stored as an integer scaled by `10^18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(U512);

impl Dec {
    pub const ZERO: Dec = Dec(U512([0; 8]));
    pub const ONE: Dec = Dec(U512([ONE_RAW, 0, 0, 0, 0, 0, 0, 0]));

    /// Wraps a value already scaled by `10^18`.
    #[must_use]
    pub fn from_raw(raw: U512) -> Self {
        Self(raw)
    }

    /// The scaled integer backing this value.
    #[must_use]
    pub fn raw(&self) -> U512 {
        self.0
    }

    #[must_use]
    pub fn from_int(value: U256) -> Self {
        Self(U512::from(value) * precision_multiplier())
    }

    /// Converts a `Decimal`, rounding half to even past 18 digits.
    pub fn from_decimal(value: Decimal) -> Result<Self, DecError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DecError::Negative(value.to_string()));
        }
        let rounded = value.round_dp_with_strategy(PRECISION, RoundingStrategy::MidpointNearestEven);
        let mantissa = rounded.mantissa().unsigned_abs();
        let scale_up = U512::exp10((PRECISION - rounded.scale()) as usize);
        Ok(Self(U512::from(mantissa) * scale_up))
    }

    /// Ratio `numerator / denominator`, `None` when the denominator is zero.
    #[must_use]
    pub fn ratio(numerator: U256, denominator: U256) -> Option<Self> {
        Self::from_int(numerator).checked_quo(Self::from_int(denominator))
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let product = self.0.checked_mul(rhs.0)?;
        Some(Self(chop_precision_and_round(product)))
    }

    /// Division scaled twice before the integer quotient, then rounded.
    #[must_use]
    pub fn checked_quo(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        let scaled = self
            .0
            .checked_mul(precision_multiplier())?
            .checked_mul(precision_multiplier())?;
        Some(Self(chop_precision_and_round(scaled / rhs.0)))
    }

    /// Integer part, rounded toward zero.
    #[must_use]
    pub fn truncate(&self) -> U512 {
        self.0 / precision_multiplier()
    }

    /// Smallest integer not below this value.
    #[must_use]
    pub fn ceil(&self) -> U512 {
        let (quo, rem) = self.0.div_mod(precision_multiplier());
        if rem.is_zero() { quo } else { quo + 1 }
    }
}

impl TryFrom<Decimal> for Dec {
    type Error = DecError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl FromStr for Dec {
    type Err = DecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s).map_err(|_| DecError::Parse(s.to_string()))?;
        Self::from_decimal(value)
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (int, frac) = self.0.div_mod(precision_multiplier());
        write!(f, "{int}.{:0>18}", frac.to_string())
    }
}
