//! Pool engine for constant-product liquidity pools.
//!
//! This crate drives every state change of the swap module:
//! - Deposits that create pools or add liquidity for shares
//! - Withdrawals that burn shares for their reserve value
//! - Exact-input and exact-output swaps with slippage limits
//! - Genesis import and export
//! - Invariant checks over records and the reserve account
//! - A circuit breaker that halts the engine on fatal violations

/// Prelude module for convenient imports.
pub mod prelude;

/// Account balances and transfers.
pub mod bank;
/// Circuit breaker for fatal violations.
pub mod emergency;
/// Engine errors.
pub mod error;
/// Events emitted by committed operations.
pub mod events;
/// Callbacks on share record changes.
pub mod hooks;
/// Invariants over the committed state.
pub mod invariants;
/// The pool manager and its operations.
pub mod manager;
/// Parameter sources.
pub mod params;
