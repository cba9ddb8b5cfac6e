//! Q64.96 fixed-point math for ticks, liquidity and swap steps.

/// Sqrt-price and liquidity deltas.
pub mod concentrated_liquidity;
/// Overflow-free multiply-divide.
pub mod full_math;
/// Tick to price conversions and tick alignment.
pub mod price_tick;
/// Single swap step computation.
pub mod swap_math;
