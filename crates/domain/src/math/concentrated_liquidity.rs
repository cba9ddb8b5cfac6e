use super::full_math::{Q96, div_rounding_up, mul_div, mul_div_rounding_up, to_u128};
use crate::error::MathError;
use primitive_types::{U256, U512};

fn sorted(sqrt_price_a: U256, sqrt_price_b: U256) -> (U256, U256) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

/// Calculates the amount of token0 (x) spanned by `liquidity` between two
/// sqrt prices.
/// delta_x = L * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_a) * sqrt(P_b))
pub fn get_amount0_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower.is_zero() {
        return Err(MathError::NonPositivePrice);
    }

    let numerator1 = U256::from(liquidity) << 96;
    let numerator2 = upper - lower;

    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Calculates the amount of token1 (y) spanned by `liquidity` between two
/// sqrt prices.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
pub fn get_amount1_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    let liquidity = U256::from(liquidity);
    if round_up {
        mul_div_rounding_up(liquidity, upper - lower, Q96)
    } else {
        mul_div(liquidity, upper - lower, Q96)
    }
}

/// Sqrt price reached after `amount_in` enters the pool at `sqrt_price`.
///
/// Rounds in the pool's favor: down when token0 comes in, so the price does
/// not move past what was paid for, and down when token1 comes in.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, MathError> {
    if sqrt_price.is_zero() {
        return Err(MathError::NonPositivePrice);
    }
    if liquidity == 0 {
        return Err(MathError::DivisionByZero);
    }
    if amount_in.is_zero() {
        return Ok(sqrt_price);
    }

    if zero_for_one {
        // ceil(L * 2^96 * P / (L * 2^96 + amount * P))
        let numerator1 = U512::from(U256::from(liquidity) << 96);
        let denominator = numerator1 + amount_in.full_mul(sqrt_price);
        let (quotient, remainder) = (numerator1 * U512::from(sqrt_price)).div_mod(denominator);
        let quotient = if remainder.is_zero() {
            quotient
        } else {
            quotient + U512::one()
        };
        U256::try_from(quotient).map_err(|_| MathError::Overflow)
    } else {
        let quotient = mul_div(amount_in, Q96, U256::from(liquidity))?;
        sqrt_price.checked_add(quotient).ok_or(MathError::Overflow)
    }
}

/// Calculates liquidity for a given amount of token0 and price range
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount0: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    let intermediate = mul_div(lower, upper, Q96)?;
    to_u128(mul_div(amount0, intermediate, upper - lower)?)
}

/// Calculates liquidity for a given amount of token1 and price range
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    to_u128(mul_div(amount1, Q96, upper - lower)?)
}

/// Largest liquidity that the given amounts can back over `[sqrt_a, sqrt_b]`
/// at the current sqrt price.
pub fn get_liquidity_for_amounts(
    sqrt_price: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount0: U256,
    amount1: U256,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if sqrt_price <= lower {
        get_liquidity_for_amount0(lower, upper, amount0)
    } else if sqrt_price < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price, upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amount1)
    }
}

/// Token amounts backing `liquidity` over `[sqrt_a, sqrt_b]` at the current
/// sqrt price, rounded as requested.
pub fn get_amounts_for_liquidity(
    sqrt_price: U256,
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<(U256, U256), MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if sqrt_price <= lower {
        Ok((
            get_amount0_delta(lower, upper, liquidity, round_up)?,
            U256::zero(),
        ))
    } else if sqrt_price < upper {
        Ok((
            get_amount0_delta(sqrt_price, upper, liquidity, round_up)?,
            get_amount1_delta(lower, sqrt_price, liquidity, round_up)?,
        ))
    } else {
        Ok((
            U256::zero(),
            get_amount1_delta(lower, upper, liquidity, round_up)?,
        ))
    }
}

/// Applies a signed liquidity change.
pub fn add_liquidity_delta(liquidity: u128, delta: i128) -> Result<u128, MathError> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(MathError::LiquidityUnderflow)
    } else {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or(MathError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(value: u64) -> U256 {
        Q96 * U256::from(value)
    }

    #[test]
    fn test_amount_deltas() {
        // Liquidity 1000, price 1 to 4 (sqrt 1 to 2)
        // delta_y = 1000 * (2 - 1) = 1000
        // delta_x = 1000 * (1/1 - 1/2) = 500
        let dy = get_amount1_delta(q(1), q(2), 1000, false).unwrap();
        assert_eq!(dy, U256::from(1000u64));

        let dx = get_amount0_delta(q(1), q(2), 1000, false).unwrap();
        assert_eq!(dx, U256::from(500u64));

        // Argument order does not matter.
        assert_eq!(get_amount0_delta(q(2), q(1), 1000, true).unwrap(), dx);
    }

    #[test]
    fn test_rounding_direction() {
        let a = get_sqrt_ratio(0);
        let b = get_sqrt_ratio(10);
        let down = get_amount0_delta(a, b, 1_000_000, false).unwrap();
        let up = get_amount0_delta(a, b, 1_000_000, true).unwrap();
        assert_eq!(up, down + U256::one());

        let down = get_amount1_delta(a, b, 1_000_000, false).unwrap();
        let up = get_amount1_delta(a, b, 1_000_000, true).unwrap();
        assert_eq!(up, down + U256::one());
    }

    fn get_sqrt_ratio(tick: i32) -> U256 {
        crate::math::price_tick::get_sqrt_ratio_at_tick(tick).unwrap()
    }

    #[test]
    fn test_get_liquidity() {
        // If dx = 500, L should be 1000
        let l = get_liquidity_for_amount0(q(1), q(2), U256::from(500u64)).unwrap();
        assert_eq!(l, 1000);

        // If dy = 1000, L should be 1000
        let l2 = get_liquidity_for_amount1(q(1), q(2), U256::from(1000u64)).unwrap();
        assert_eq!(l2, 1000);
    }

    #[test]
    fn test_liquidity_for_amounts_picks_side() {
        let below = get_liquidity_for_amounts(
            q(1),
            q(1),
            q(2),
            U256::from(500u64),
            U256::zero(),
        )
        .unwrap();
        assert_eq!(below, 1000);

        let above = get_liquidity_for_amounts(
            q(3),
            q(1),
            q(2),
            U256::zero(),
            U256::from(1000u64),
        )
        .unwrap();
        assert_eq!(above, 1000);
    }

    #[test]
    fn test_amounts_for_liquidity_round_trip() {
        let (amount0, amount1) =
            get_amounts_for_liquidity(q(1), q(1), q(2), 1000, true).unwrap();
        assert_eq!(amount0, U256::from(500u64));
        assert!(amount1.is_zero());
    }

    #[test]
    fn test_next_sqrt_price_from_input() {
        // One-for-zero: 1000 of token1 into L=1000 lifts sqrt price by one.
        let next = get_next_sqrt_price_from_input(q(1), 1000, U256::from(1000u64), false).unwrap();
        assert_eq!(next, q(2));

        // Zero-for-one: 500 of token0 brings sqrt price 2 back to 1.
        let back = get_next_sqrt_price_from_input(q(2), 1000, U256::from(500u64), true).unwrap();
        assert_eq!(back, q(1));

        assert_eq!(
            get_next_sqrt_price_from_input(q(1), 1000, U256::zero(), true).unwrap(),
            q(1)
        );
        assert_eq!(
            get_next_sqrt_price_from_input(q(1), 0, U256::one(), true),
            Err(MathError::DivisionByZero)
        );
    }

    #[test]
    fn test_add_liquidity_delta() {
        assert_eq!(add_liquidity_delta(10, -4).unwrap(), 6);
        assert_eq!(add_liquidity_delta(10, 4).unwrap(), 14);
        assert_eq!(add_liquidity_delta(3, -4), Err(MathError::LiquidityUnderflow));
    }
}
