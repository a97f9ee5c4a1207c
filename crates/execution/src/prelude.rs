//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use amm_execution::prelude::*;
//! ```

// Bank
pub use crate::bank::{Bank, BankError, MemoryBank, POOL_ACCOUNT};

// Emergency
pub use crate::emergency::{CircuitBreaker, CircuitBreakerStats, CircuitState};

// Errors
pub use crate::error::SwapError;

// Events
pub use crate::events::{
    DepositData, EventData, EventSink, ExactDirection, MemoryEventSink, SwapEvent, TradeData,
    TracingEventSink, WithdrawData,
};

// Hooks
pub use crate::hooks::{HookCall, Hooks, RecordingHooks, SwapHooks};

// Invariants
pub use crate::invariants::{Invariant, all_invariants};

// Manager
pub use crate::manager::{
    DepositOutcome, MemoryPoolManager, Outcome, PoolInfo, PoolManager, SwapOutcome,
    WithdrawOutcome,
};

// Params
pub use crate::params::{ParamSource, ParamStore};
