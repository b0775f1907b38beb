/// Utility functions for rewriting passes

/// Check if a number is a positive power of 2.
///
/// Zero and negative values fail the sign guard, so they are never
/// treated as shiftable.
#[inline]
pub fn is_power_of_two(n: i64) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Exact log2 of a positive power of 2.
#[inline]
pub fn log2(n: i64) -> i64 {
    debug_assert!(is_power_of_two(n), "log2 of {n}");
    i64::from(n.trailing_zeros())
}
