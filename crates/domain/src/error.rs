use thiserror::Error;

/// Errors raised by the fixed-point math and the value objects built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// A result does not fit in its target width.
    #[error("arithmetic overflow")]
    Overflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Tick outside of `[MIN_TICK, MAX_TICK]`.
    #[error("tick {0} is outside of the supported range")]
    TickOutOfRange(i32),

    /// Sqrt price outside of `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
    #[error("sqrt price is outside of the supported range")]
    SqrtPriceOutOfRange,

    /// Price must be strictly positive.
    #[error("price must be positive")]
    NonPositivePrice,

    /// Removing more liquidity than is present.
    #[error("liquidity underflow")]
    LiquidityUnderflow,
}
