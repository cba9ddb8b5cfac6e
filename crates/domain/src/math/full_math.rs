use crate::error::MathError;
use primitive_types::{U256, U512};

/// 2^96, the scale of Q64.96 sqrt prices.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// 2^128, the scale of per-liquidity fee growth accumulators.
pub const Q128: U256 = U256([0, 0, 1, 0]);

/// Computes `floor(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Computes `ceil(a * b / denominator)` with a 512-bit intermediate.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.full_mul(b).div_mod(U512::from(denominator));
    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    U256::try_from(quotient).map_err(|_| MathError::Overflow)
}

/// Computes `ceil(a / b)`.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let (quotient, remainder) = a.div_mod(b);
    if remainder.is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or(MathError::Overflow)
    }
}

/// Narrows a 256-bit value into a `u128`.
pub fn to_u128(value: U256) -> Result<u128, MathError> {
    if value.bits() > 128 {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}
