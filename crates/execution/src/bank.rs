//! Balance transfer service between accounts and the pool reserve account.

use amm_domain::token::Coins;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a [`Bank`] transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// The sender does not hold the coins being sent.
    #[error("insufficient funds: {address} has {available}, needs {required}")]
    InsufficientFunds {
        address: String,
        available: String,
        required: String,
    },
    /// A balance would exceed the 256-bit amount range.
    #[error("balance overflow for {0}")]
    Overflow(String),
}

/// Moves coins between user accounts and the single pool reserve account.
///
/// Each transfer either moves every coin or none.
pub trait Bank {
    /// Balance of `address`.
    fn balance(&self, address: &str) -> Coins;

    /// Balance of the pool reserve account.
    fn pool_balance(&self) -> Coins;

    /// Sends `coins` from `address` into the pool reserve account.
    fn send_from_account_to_pool(&mut self, address: &str, coins: &Coins) -> Result<(), BankError>;

    /// Sends `coins` from the pool reserve account to `address`.
    fn send_from_pool_to_account(&mut self, address: &str, coins: &Coins) -> Result<(), BankError>;
}

/// Name under which the reserve account appears in errors.
pub const POOL_ACCOUNT: &str = "swap";

/// In-memory bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryBank {
    accounts: BTreeMap<String, Coins>,
    pool: Coins,
}

impl MemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `coins` into `address`.
    pub fn fund_account(&mut self, address: &str, coins: &Coins) -> Result<(), BankError> {
        let current = self.balance(address);
        let updated = current
            .checked_add(coins)
            .ok_or_else(|| BankError::Overflow(address.to_string()))?;
        self.accounts.insert(address.to_string(), updated);
        Ok(())
    }

    /// Mints `coins` directly into the pool reserve account.
    pub fn fund_pool(&mut self, coins: &Coins) -> Result<(), BankError> {
        self.pool = self
            .pool
            .checked_add(coins)
            .ok_or_else(|| BankError::Overflow(POOL_ACCOUNT.to_string()))?;
        Ok(())
    }

    /// Burns `coins` from the pool reserve account.
    pub fn burn_from_pool(&mut self, coins: &Coins) -> Result<(), BankError> {
        self.pool = debit(POOL_ACCOUNT, &self.pool, coins)?;
        Ok(())
    }
}

impl Bank for MemoryBank {
    fn balance(&self, address: &str) -> Coins {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    fn pool_balance(&self) -> Coins {
        self.pool.clone()
    }

    fn send_from_account_to_pool(&mut self, address: &str, coins: &Coins) -> Result<(), BankError> {
        let remaining = debit(address, &self.balance(address), coins)?;
        let pool = self
            .pool
            .checked_add(coins)
            .ok_or_else(|| BankError::Overflow(POOL_ACCOUNT.to_string()))?;

        debug!(address = address, coins = %coins, "Sent coins to pool");
        self.accounts.insert(address.to_string(), remaining);
        self.pool = pool;
        Ok(())
    }

    fn send_from_pool_to_account(&mut self, address: &str, coins: &Coins) -> Result<(), BankError> {
        let pool = debit(POOL_ACCOUNT, &self.pool, coins)?;
        let received = self
            .balance(address)
            .checked_add(coins)
            .ok_or_else(|| BankError::Overflow(address.to_string()))?;

        debug!(address = address, coins = %coins, "Sent coins from pool");
        self.pool = pool;
        self.accounts.insert(address.to_string(), received);
        Ok(())
    }
}

fn debit(address: &str, balance: &Coins, coins: &Coins) -> Result<Coins, BankError> {
    balance
        .checked_sub(coins)
        .ok_or_else(|| BankError::InsufficientFunds {
            address: address.to_string(),
            available: balance.to_string(),
            required: coins.to_string(),
        })
}
