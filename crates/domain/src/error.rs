//! Error types for pool math and pool state.
//!
//! The two classes are separate types. [`PoolError`] covers conditions a
//! caller can trigger with bad input and recover from. [`InvariantViolation`]
//! signals corrupted state or a programming error and is never retried.

use thiserror::Error;

/// Recoverable, user-triggerable pool errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool is missing or cannot be built from the given reserves.
    #[error("invalid pool: {0}")]
    InvalidPool(String),
    /// The pool pair is not whitelisted for creation.
    #[error("not allowed: {0}")]
    NotAllowed(String),
    /// Share amount is zero or exceeds what the owner holds.
    #[error("invalid shares: {0}")]
    InvalidShares(String),
    /// The owner has no deposit in the pool.
    #[error("deposit not found: {0}")]
    ShareRecordNotFound(String),
    /// Realized amounts deviate from the caller's bound.
    #[error("{0}: slippage exceeded")]
    SlippageExceeded(String),
    /// The request arrived at or after its deadline.
    #[error("{0}: deadline exceeded")]
    DeadlineExceeded(String),
    /// The operation would round an amount down to zero.
    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),
    /// Coins supplied by the caller are malformed.
    #[error("invalid coins: {0}")]
    InvalidCoins(String),
}

/// Fatal error: the pool or its persisted state is inconsistent.
///
/// Produced where the pool math would otherwise have to panic, such as
/// non-positive inputs reaching the core, shares above the total supply, or a
/// decreasing constant product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violation: {0}")]
pub struct InvariantViolation(pub String);

impl InvariantViolation {
    /// Creates a violation with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// Returns the description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Errors raised while validating coins and denominations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoinError {
    /// Denomination does not match `[a-z][a-z0-9/]{2,63}`.
    #[error("invalid denom: {0}")]
    InvalidDenom(String),
    /// Amount string is not a non-negative base-10 integer that fits 256 bits.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// The same denomination appears twice in a coin bag.
    #[error("duplicate denomination: {0}")]
    DuplicateDenom(String),
}

/// Errors raised while building an 18-decimal fixed-point value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecError {
    #[error("invalid decimal: {0}")]
    Parse(String),
    #[error("decimal must not be negative: {0}")]
    Negative(String),
}

/// Errors raised while validating persisted pool and share records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Coin(#[from] CoinError),
    #[error("invalid pool id: {0}")]
    InvalidPoolId(String),
    #[error("reserves must have two denominations")]
    ReserveDenominations,
    #[error("pool '{0}' has invalid reserves: {1}")]
    InvalidReserves(String, String),
    #[error("pool '{0}' has invalid total shares: {1}")]
    InvalidTotalShares(String, String),
    #[error("poolID '{0}' does not match reserves")]
    PoolIdMismatch(String),
    #[error("depositor '{0}' is invalid")]
    InvalidDepositor(String),
    #[error("depositor '{0}' has invalid shares: {1}")]
    InvalidShares(String, String),
}

/// Errors raised while validating an imported genesis state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesisError {
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("duplicate poolID '{0}'")]
    DuplicatePool(String),
    #[error("duplicate depositor '{0}' and poolID '{1}'")]
    DuplicateShare(String, String),
    #[error("total depositor shares {0} not equal to pool '{1}' total shares {2}")]
    ShareMismatch(String, String, String),
}

/// Stateless request validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid coins: {0}")]
    InvalidCoins(String),
    #[error("invalid shares: {0}")]
    InvalidShares(String),
    #[error("invalid slippage: {0}")]
    InvalidSlippage(String),
    #[error("invalid deadline: {0}")]
    InvalidDeadline(String),
}

/// Errors raised by parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error(transparent)]
    Coin(#[from] CoinError),
    #[error("pool cannot have two tokens of the same type, received '{0}' and '{1}'")]
    SameTokens(String, String),
    #[error("invalid token order: '{0}' must come before '{1}'")]
    TokenOrder(String, String),
    #[error("duplicate pool: {0}")]
    DuplicatePool(String),
    #[error("invalid swap fee: {0}")]
    InvalidSwapFee(String),
    #[error("invalid params json: {0}")]
    Json(String),
}
