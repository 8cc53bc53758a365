//! Time keeping for the TNC.
//!
//! The engine samples a free-running millisecond counter once per tick through
//! the [`Clock`] trait. The counter is a `u32` and wraps after ~49.7 days, so
//! every comparison goes through [`elapsed_ms`], which is correct across the
//! wrap as long as the interval itself is shorter than the wrap period.
//!
//! Contains:
//! - [`Clock`]: millisecond time source, implemented for any `FnMut() -> u32`
//! - [`elapsed_ms`] / [`has_elapsed`]: wraparound-safe interval arithmetic
//! - `run_tnc_loop`: blocking tick loop driven by a `DelayNs` (feature `delay-loop`)

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

/// A monotonic millisecond counter.
pub trait Clock {
    /// Current time in milliseconds; allowed to wrap.
    fn now_ms(&mut self) -> u32;
}

impl<F> Clock for F
where
    F: FnMut() -> u32,
{
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Milliseconds from `since` to `now`, modulo 2^32.
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Whether strictly more than `threshold` ms passed between `since` and `now`.
pub fn has_elapsed(now: u32, since: u32, threshold: u32) -> bool {
    elapsed_ms(now, since) > threshold
}
