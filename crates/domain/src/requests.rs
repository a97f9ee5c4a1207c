//! Caller requests with stateless validation.
//!
//! Each request carries a unix-seconds deadline. `validate` checks only what
//! can be decided without reading state; pool lookups, slippage and deadline
//! enforcement happen when the request is executed.

use crate::error::RequestError;
use crate::token::{Coin, amount_serde};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Requests that expire at a block time.
pub trait Deadline {
    /// Deadline in unix seconds.
    fn deadline(&self) -> i64;

    /// True when `block_time` (unix seconds) is at or past the deadline.
    fn deadline_exceeded(&self, block_time: i64) -> bool {
        block_time >= self.deadline()
    }
}

/// Longest address, in bytes, a share record key can hold.
pub const MAX_ADDRESS_LEN: usize = u8::MAX as usize;

/// Rejects blank addresses and addresses too long to key a share record.
pub fn validate_address(address: &str, role: &str) -> Result<(), RequestError> {
    if address.trim().is_empty() {
        return Err(RequestError::InvalidAddress(format!(
            "{role} address cannot be empty"
        )));
    }
    if address.len() > MAX_ADDRESS_LEN {
        return Err(RequestError::InvalidAddress(format!(
            "{role} address is {} bytes, at most {MAX_ADDRESS_LEN} are supported",
            address.len()
        )));
    }
    Ok(())
}

fn validate_coin(coin: &Coin, label: &str) -> Result<(), RequestError> {
    if coin.validate().is_err() || coin.is_zero() {
        return Err(RequestError::InvalidCoins(format!("{label} amount {coin}")));
    }
    Ok(())
}

fn validate_pair(a: &Coin, b: &Coin) -> Result<(), RequestError> {
    if a.denom == b.denom {
        return Err(RequestError::InvalidCoins(
            "denominations can not be equal".into(),
        ));
    }
    Ok(())
}

fn validate_slippage(slippage: Decimal) -> Result<(), RequestError> {
    if slippage.is_sign_negative() && !slippage.is_zero() {
        return Err(RequestError::InvalidSlippage(
            "slippage can not be negative".into(),
        ));
    }
    Ok(())
}

fn validate_deadline(deadline: i64) -> Result<(), RequestError> {
    if deadline <= 0 {
        return Err(RequestError::InvalidDeadline(format!("deadline {deadline}")));
    }
    Ok(())
}

/// Deposit two tokens into a pool, creating it when allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub depositor: String,
    pub token_a: Coin,
    pub token_b: Coin,
    /// Largest accepted deviation of the deposited ratio from the desired one.
    pub slippage: Decimal,
    pub deadline: i64,
}

impl DepositRequest {
    pub fn new(
        depositor: impl Into<String>,
        token_a: Coin,
        token_b: Coin,
        slippage: Decimal,
        deadline: i64,
    ) -> Self {
        Self {
            depositor: depositor.into(),
            token_a,
            token_b,
            slippage,
            deadline,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        validate_address(&self.depositor, "depositor")?;
        validate_coin(&self.token_a, "token a deposit")?;
        validate_coin(&self.token_b, "token b deposit")?;
        validate_pair(&self.token_a, &self.token_b)?;
        validate_slippage(self.slippage)?;
        validate_deadline(self.deadline)
    }
}

impl Deadline for DepositRequest {
    fn deadline(&self) -> i64 {
        self.deadline
    }
}

/// Redeem shares for the underlying reserves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub from: String,
    #[serde(with = "amount_serde")]
    pub shares: U256,
    /// Amounts the caller expects back; the pool id is derived from their
    /// denominations.
    pub expected_token_a: Coin,
    pub expected_token_b: Coin,
    pub slippage: Decimal,
    pub deadline: i64,
}

impl WithdrawRequest {
    pub fn new(
        from: impl Into<String>,
        shares: U256,
        expected_token_a: Coin,
        expected_token_b: Coin,
        slippage: Decimal,
        deadline: i64,
    ) -> Self {
        Self {
            from: from.into(),
            shares,
            expected_token_a,
            expected_token_b,
            slippage,
            deadline,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        validate_address(&self.from, "from")?;
        if self.shares.is_zero() {
            return Err(RequestError::InvalidShares(
                "shares must be greater than zero".into(),
            ));
        }
        validate_coin(&self.expected_token_a, "expected token a")?;
        validate_coin(&self.expected_token_b, "expected token b")?;
        validate_pair(&self.expected_token_a, &self.expected_token_b)?;
        validate_slippage(self.slippage)?;
        validate_deadline(self.deadline)
    }
}

impl Deadline for WithdrawRequest {
    fn deadline(&self) -> i64 {
        self.deadline
    }
}

/// Sell an exact amount of `exact_token_a`, expecting about `token_b` back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExactForTokensRequest {
    pub requester: String,
    pub exact_token_a: Coin,
    pub token_b: Coin,
    pub slippage: Decimal,
    pub deadline: i64,
}

impl SwapExactForTokensRequest {
    pub fn new(
        requester: impl Into<String>,
        exact_token_a: Coin,
        token_b: Coin,
        slippage: Decimal,
        deadline: i64,
    ) -> Self {
        Self {
            requester: requester.into(),
            exact_token_a,
            token_b,
            slippage,
            deadline,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        validate_address(&self.requester, "requester")?;
        validate_coin(&self.exact_token_a, "exact token a deposit")?;
        validate_coin(&self.token_b, "token b deposit")?;
        validate_pair(&self.exact_token_a, &self.token_b)?;
        validate_slippage(self.slippage)?;
        validate_deadline(self.deadline)
    }
}

impl Deadline for SwapExactForTokensRequest {
    fn deadline(&self) -> i64 {
        self.deadline
    }
}

/// Buy an exact amount of `exact_token_b`, expecting to pay about `token_a`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapForExactTokensRequest {
    pub requester: String,
    pub token_a: Coin,
    pub exact_token_b: Coin,
    pub slippage: Decimal,
    pub deadline: i64,
}

impl SwapForExactTokensRequest {
    pub fn new(
        requester: impl Into<String>,
        token_a: Coin,
        exact_token_b: Coin,
        slippage: Decimal,
        deadline: i64,
    ) -> Self {
        Self {
            requester: requester.into(),
            token_a,
            exact_token_b,
            slippage,
            deadline,
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        validate_address(&self.requester, "requester")?;
        validate_coin(&self.token_a, "token a deposit")?;
        validate_coin(&self.exact_token_b, "exact token b deposit")?;
        validate_pair(&self.token_a, &self.exact_token_b)?;
        validate_slippage(self.slippage)?;
        validate_deadline(self.deadline)
    }
}

impl Deadline for SwapForExactTokensRequest {
    fn deadline(&self) -> i64 {
        self.deadline
    }
}

/// Any request the engine executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Deposit(DepositRequest),
    Withdraw(WithdrawRequest),
    SwapExactForTokens(SwapExactForTokensRequest),
    SwapForExactTokens(SwapForExactTokensRequest),
}

impl Request {
    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            Request::Deposit(r) => r.validate(),
            Request::Withdraw(r) => r.validate(),
            Request::SwapExactForTokens(r) => r.validate(),
            Request::SwapForExactTokens(r) => r.validate(),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Deposit(_) => "deposit",
            Request::Withdraw(_) => "withdraw",
            Request::SwapExactForTokens(_) => "swap_exact_for_tokens",
            Request::SwapForExactTokens(_) => "swap_for_exact_tokens",
        }
    }
}

impl Deadline for Request {
    fn deadline(&self) -> i64 {
        match self {
            Request::Deposit(r) => r.deadline,
            Request::Withdraw(r) => r.deadline,
            Request::SwapExactForTokens(r) => r.deadline,
            Request::SwapForExactTokens(r) => r.deadline,
        }
    }
}
