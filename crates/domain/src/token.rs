use crate::error::CoinError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum denomination length, inclusive.
pub const MAX_DENOM_LEN: usize = 64;
/// Minimum denomination length, inclusive.
pub const MIN_DENOM_LEN: usize = 3;

/// Validates a denomination against `[a-z][a-z0-9/]{2,63}`.
pub fn validate_denom(denom: &str) -> Result<(), CoinError> {
    let bytes = denom.as_bytes();
    let valid_len = (MIN_DENOM_LEN..=MAX_DENOM_LEN).contains(&bytes.len());
    let valid_head = bytes.first().is_some_and(u8::is_ascii_lowercase);
    let valid_tail = bytes
        .iter()
        .skip(1)
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'/');

    if valid_len && valid_head && valid_tail {
        Ok(())
    } else {
        Err(CoinError::InvalidDenom(denom.to_string()))
    }
}

/// Parses a base-10 amount string into a `U256`.
///
/// Signs, whitespace and values above `2^256 - 1` are rejected.
pub fn parse_amount(raw: &str) -> Result<U256, CoinError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoinError::InvalidAmount(raw.to_string()));
    }
    U256::from_dec_str(raw).map_err(|_| CoinError::InvalidAmount(raw.to_string()))
}

/// Serde adapter writing `U256` amounts as decimal strings.
pub mod amount_serde {
    use super::parse_amount;
    use primitive_types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_amount(&raw).map_err(serde::de::Error::custom)
    }
}

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_serde")]
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, U256::zero())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }

    /// Checks the denomination is well formed.
    pub fn validate(&self) -> Result<(), CoinError> {
        validate_denom(&self.denom)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A bag of coins kept sorted by denomination, without zero amounts or
/// duplicate denominations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Builds a normalized coin bag.
    ///
    /// Zero amounts are dropped after duplicate detection, so `[0ukava, 5ukava]`
    /// is still rejected.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Result<Self, CoinError> {
        let mut coins: Vec<Coin> = coins.into_iter().collect();
        for coin in &coins {
            coin.validate()?;
        }
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        if let Some(pair) = coins.windows(2).find(|w| w[0].denom == w[1].denom) {
            return Err(CoinError::DuplicateDenom(pair[0].denom.clone()));
        }
        coins.retain(Coin::is_positive);
        Ok(Self(coins))
    }

    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a bag from two coins whose denominations are already known to
    /// be valid and distinct.
    pub(crate) fn from_pair(a: Coin, b: Coin) -> Self {
        let mut coins = vec![a, b];
        coins.sort_by(|x, y| x.denom.cmp(&y.denom));
        coins.retain(Coin::is_positive);
        Self(coins)
    }

    /// Returns the amount held of `denom`, zero when absent.
    #[must_use]
    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map_or_else(U256::zero, |c| c.amount)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    /// Adds two bags, `None` on overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Coins) -> Option<Coins> {
        let mut merged = self.0.clone();
        for coin in &other.0 {
            match merged.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => existing.amount = existing.amount.checked_add(coin.amount)?,
                None => merged.push(coin.clone()),
            }
        }
        merged.sort_by(|a, b| a.denom.cmp(&b.denom));
        Some(Self(merged))
    }

    /// Subtracts `other`, `None` when any denomination would go negative.
    #[must_use]
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut remaining = self.0.clone();
        for coin in &other.0 {
            let existing = remaining.iter_mut().find(|c| c.denom == coin.denom)?;
            existing.amount = existing.amount.checked_sub(coin.amount)?;
        }
        remaining.retain(Coin::is_positive);
        Some(Self(remaining))
    }

    /// Returns true when every denomination of `other` is covered by `self`.
    #[must_use]
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}
