//! Persisted pool and share records.

use crate::error::RecordError;
use crate::pool::DenominatedPool;
use crate::token::{Coin, Coins, amount_serde, validate_denom};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Separator between the two denominations of a pool id.
pub const POOL_ID_SEP: &str = "/";

/// Returns the order-independent id of the pool trading `denom_a` and `denom_b`.
#[must_use]
pub fn pool_id(denom_a: &str, denom_b: &str) -> String {
    if denom_a > denom_b {
        format!("{denom_b}{POOL_ID_SEP}{denom_a}")
    } else {
        format!("{denom_a}{POOL_ID_SEP}{denom_b}")
    }
}

/// Returns the pool id for a two-coin bag, or `None` for any other size.
#[must_use]
pub fn pool_id_from_coins(coins: &Coins) -> Option<String> {
    match coins.as_slice() {
        [a, b] => Some(pool_id(&a.denom, &b.denom)),
        _ => None,
    }
}

/// Splits a pool id back into its two denominations.
///
/// Denominations may themselves contain `/`, so every separator position is
/// tried until one yields two valid, ordered denominations.
#[must_use]
pub fn split_pool_id(id: &str) -> Option<(&str, &str)> {
    id.match_indices(POOL_ID_SEP).find_map(|(at, _)| {
        let (a, b) = (&id[..at], &id[at + POOL_ID_SEP.len()..]);
        let valid = validate_denom(a).is_ok() && validate_denom(b).is_ok() && a < b;
        valid.then_some((a, b))
    })
}

/// Reserves and share supply of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub pool_id: String,
    pub reserves_a: Coin,
    pub reserves_b: Coin,
    #[serde(with = "amount_serde")]
    pub total_shares: U256,
}

impl PoolRecord {
    pub fn new(reserves: &Coins, total_shares: U256) -> Result<Self, RecordError> {
        let [a, b] = reserves.as_slice() else {
            return Err(RecordError::ReserveDenominations);
        };

        Ok(Self {
            pool_id: pool_id(&a.denom, &b.denom),
            reserves_a: a.clone(),
            reserves_b: b.clone(),
            total_shares,
        })
    }

    /// Snapshots a pool. Reserves are kept even when they are zero.
    #[must_use]
    pub fn from_pool(pool: &DenominatedPool) -> Self {
        let (reserves_a, reserves_b) = pool.reserve_coins();
        Self {
            pool_id: pool_id(&reserves_a.denom, &reserves_b.denom),
            reserves_a,
            reserves_b,
            total_shares: pool.total_shares(),
        }
    }

    #[must_use]
    pub fn reserves(&self) -> Coins {
        Coins::from_pair(self.reserves_a.clone(), self.reserves_b.clone())
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        self.reserves_a.validate()?;
        self.reserves_b.validate()?;

        if self.reserves_a.denom >= self.reserves_b.denom
            || self.reserves_a.is_zero()
            || self.reserves_b.is_zero()
        {
            return Err(RecordError::InvalidReserves(
                self.pool_id.clone(),
                format!("{},{}", self.reserves_a, self.reserves_b),
            ));
        }
        if self.total_shares.is_zero() {
            return Err(RecordError::InvalidTotalShares(
                self.pool_id.clone(),
                self.total_shares.to_string(),
            ));
        }
        if self.pool_id != pool_id(&self.reserves_a.denom, &self.reserves_b.denom) {
            return Err(RecordError::PoolIdMismatch(self.pool_id.clone()));
        }
        Ok(())
    }
}

/// A depositor's share balance in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub depositor: String,
    pub pool_id: String,
    #[serde(with = "amount_serde")]
    pub shares_owned: U256,
}

impl ShareRecord {
    pub fn new(depositor: impl Into<String>, pool_id: impl Into<String>, shares_owned: U256) -> Self {
        Self {
            depositor: depositor.into(),
            pool_id: pool_id.into(),
            shares_owned,
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        if self.depositor.trim().is_empty() {
            return Err(RecordError::InvalidDepositor(self.depositor.clone()));
        }
        if split_pool_id(&self.pool_id).is_none() {
            return Err(RecordError::InvalidPoolId(self.pool_id.clone()));
        }
        if self.shares_owned.is_zero() {
            return Err(RecordError::InvalidShares(
                self.depositor.clone(),
                self.shares_owned.to_string(),
            ));
        }
        Ok(())
    }
}
