//! Emergency controls.
//!
//! The circuit breaker opens on the first invariant violation and keeps the
//! engine halted from then on.

mod circuit_breaker;

pub use circuit_breaker::*;
