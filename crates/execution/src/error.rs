//! Errors returned by the pool manager.

use crate::bank::BankError;
use amm_data::StoreError;
use amm_domain::error::{
    GenesisError, InvariantViolation, ParamsError, PoolError, RequestError,
};
use thiserror::Error;

/// Error returned by every [`crate::manager::PoolManager`] operation.
///
/// Everything except [`SwapError::Fatal`] and [`SwapError::Halted`] leaves the
/// engine usable. A fatal error halts the engine and every later call fails
/// with [`SwapError::Halted`] carrying the first violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Genesis(#[from] GenesisError),
    #[error(transparent)]
    Bank(#[from] BankError),
    /// The engine stopped after an earlier invariant violation.
    #[error("engine halted: {0}")]
    Halted(InvariantViolation),
    /// State is inconsistent; the engine halts.
    #[error(transparent)]
    Fatal(#[from] InvariantViolation),
}

impl SwapError {
    /// True for errors that halt the engine.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SwapError::Fatal(_) | SwapError::Halted(_))
    }

    /// The recoverable pool error, if this is one.
    #[must_use]
    pub fn as_pool_error(&self) -> Option<&PoolError> {
        match self {
            SwapError::Pool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SwapError {
    fn from(err: StoreError) -> Self {
        match err {
            // a caller-supplied key, not stored state
            StoreError::DepositorTooLong(_) => {
                SwapError::Request(RequestError::InvalidAddress(err.to_string()))
            }
            _ => SwapError::Fatal(InvariantViolation::new(format!("store corrupted: {err}"))),
        }
    }
}
