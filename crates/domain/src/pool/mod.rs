/// Unitless constant-product pool.
pub mod base_pool;
/// Pool labelled with two denominations.
pub mod denominated_pool;

pub use base_pool::BasePool;
pub use denominated_pool::{DenominatedPool, normalize_reserves};
