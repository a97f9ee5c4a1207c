//! Engine parameters: the pool creation whitelist and the global swap fee.

use crate::error::{DecError, ParamsError};
use crate::math::dec::Dec;
use crate::state::pool_id;
use crate::token::validate_denom;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A token pair eligible for new pool creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedPool {
    pub token_a: String,
    pub token_b: String,
}

impl AllowedPool {
    pub fn new(token_a: impl Into<String>, token_b: impl Into<String>) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
        }
    }

    /// Unique name of the pair, `token_a:token_b`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}:{}", self.token_a, self.token_b)
    }

    /// Id of the pool this pair creates.
    #[must_use]
    pub fn pool_id(&self) -> String {
        pool_id(&self.token_a, &self.token_b)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        validate_denom(&self.token_a)?;
        validate_denom(&self.token_b)?;

        if self.token_a.eq_ignore_ascii_case(&self.token_b) {
            return Err(ParamsError::SameTokens(
                self.token_a.clone(),
                self.token_b.clone(),
            ));
        }
        if self.token_a > self.token_b {
            return Err(ParamsError::TokenOrder(
                self.token_b.clone(),
                self.token_a.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for AllowedPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AllowedPool:")?;
        writeln!(f, "  Name: {}", self.name())?;
        writeln!(f, "\tToken A: {}", self.token_a)?;
        writeln!(f, "\tToken B: {}", self.token_b)
    }
}

/// Whitelist of pairs that may create pools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedPools(pub Vec<AllowedPool>);

impl AllowedPools {
    pub fn new(pools: impl IntoIterator<Item = AllowedPool>) -> Self {
        Self(pools.into_iter().collect())
    }

    /// Validates every pair and rejects duplicate names.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let mut seen = HashSet::new();
        for pool in &self.0 {
            pool.validate()?;
            let name = pool.name();
            if !seen.insert(name.clone()) {
                return Err(ParamsError::DuplicatePool(name));
            }
        }
        Ok(())
    }

    /// True when some allowed pair creates the pool `id`.
    #[must_use]
    pub fn contains_pool(&self, id: &str) -> bool {
        self.0.iter().any(|p| p.pool_id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AllowedPool> {
        self.0.iter()
    }
}

/// Parameters read by every pool operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Params {
    pub allowed_pools: AllowedPools,
    pub swap_fee: Decimal,
}

impl Params {
    pub fn new(allowed_pools: AllowedPools, swap_fee: Decimal) -> Self {
        Self {
            allowed_pools,
            swap_fee,
        }
    }

    /// Parses and validates params from JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, ParamsError> {
        let params: Params =
            serde_json::from_str(raw).map_err(|e| ParamsError::Json(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        self.allowed_pools.validate()?;
        validate_swap_fee(self.swap_fee)
    }

    /// The swap fee as an 18-decimal fixed point value.
    pub fn swap_fee_dec(&self) -> Result<Dec, DecError> {
        Dec::from_decimal(self.swap_fee)
    }
}

/// Checks `0 <= fee < 1`.
pub fn validate_swap_fee(fee: Decimal) -> Result<(), ParamsError> {
    if (fee.is_sign_negative() && !fee.is_zero()) || fee >= Decimal::ONE {
        return Err(ParamsError::InvalidSwapFee(format!("{fee:.18}")));
    }
    Ok(())
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Params:")?;
        write!(f, "\tAllowedPools:")?;
        for pool in self.allowed_pools.iter() {
            write!(f, " {}", pool.pool_id())?;
        }
        writeln!(f)?;
        writeln!(f, "\tSwapFee: {}", self.swap_fee)
    }
}
