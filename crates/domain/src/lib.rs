//! Core domain model for the constant-product AMM engine.
//!
//! This crate contains everything that can be computed without touching
//! storage or moving funds:
//! - Coins, coin bags and denomination rules
//! - 18-decimal fixed-point arithmetic and big-integer helpers
//! - The unitless constant-product pool and its denominated wrapper
//! - Persisted record shapes, params, genesis state and caller requests

/// Error types.
pub mod error;
/// Genesis import and export state.
pub mod genesis;
/// Pool math primitives.
pub mod math;
/// Engine parameters.
pub mod params;
/// Constant-product pools.
pub mod pool;
/// Caller requests.
pub mod requests;
/// Persisted records and pool ids.
pub mod state;
/// Coins and denominations.
pub mod token;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{
        CoinError, DecError, GenesisError, InvariantViolation, ParamsError, PoolError,
        RecordError, RequestError,
    };
    pub use crate::genesis::GenesisState;
    pub use crate::math::Dec;
    pub use crate::params::{AllowedPool, AllowedPools, Params};
    pub use crate::pool::{BasePool, DenominatedPool};
    pub use crate::requests::{
        Deadline, DepositRequest, Request, SwapExactForTokensRequest, SwapForExactTokensRequest,
        WithdrawRequest,
    };
    pub use crate::state::{PoolRecord, ShareRecord, pool_id};
    pub use crate::token::{Coin, Coins};
    pub use primitive_types::U256;
}
