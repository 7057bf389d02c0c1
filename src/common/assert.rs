//! Internal invariant checks
//!
//! `ku_assert!` is active only when `debug_assertions` are on (test and dev
//! profiles) and compiles to nothing in release builds. `ku_unreachable!`
//! marks states that can only be reached through a programming error and
//! always aborts the current thread.

/// Assert an internal invariant in debug builds
#[macro_export]
macro_rules! ku_assert {
    ($cond:expr $(,)?) => {
        debug_assert!($cond, "KU_ASSERT failed: {}", stringify!($cond))
    };
    ($cond:expr, $($arg:tt)+) => {
        debug_assert!($cond, $($arg)+)
    };
}

/// Mark an unreachable internal state
#[macro_export]
macro_rules! ku_unreachable {
    () => {
        panic!("KU_UNREACHABLE: reached an unreachable code path")
    };
    ($($arg:tt)+) => {
        panic!("KU_UNREACHABLE: {}", format_args!($($arg)+))
    };
}

/// Divide and round up
pub fn div_round_up(dividend: usize, divisor: usize) -> usize {
    dividend.div_ceil(divisor)
}

/// Next power of two, treating 0 as 1
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}
