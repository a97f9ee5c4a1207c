use primitive_types::{U256, U512};

/// Floor of the square root of `n`, exact for every 512-bit input.
///
/// Newton's iteration started above the root decreases monotonically and
/// stops at `floor(sqrt(n))`, so there is no iteration cap to tune.
#[must_use]
pub fn isqrt(n: U512) -> U512 {
    if n < U512::from(2u8) {
        return n;
    }

    let mut x = U512::one() << n.bits().div_ceil(2);
    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Geometric mean `floor(sqrt(a * b))` of two 256-bit values.
///
/// The product is formed in 512 bits; the root of a product of two values
/// below `2^256` always fits back into 256 bits.
#[must_use]
pub fn geometric_mean(a: U256, b: U256) -> U256 {
    let root = isqrt(a.full_mul(b));
    // sqrt(a*b) <= max(a, b) < 2^256
    U256::try_from(root).unwrap_or(U256::MAX)
}
