//! Integer and fixed-point math backing the pool.

/// Constant product swap formulas.
pub mod constant_product;
/// 18-decimal fixed point.
pub mod dec;
/// Exact integer square root.
pub mod sqrt;

pub use dec::Dec;
