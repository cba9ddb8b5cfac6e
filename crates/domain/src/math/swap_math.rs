use super::concentrated_liquidity::{
    get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input,
};
use super::full_math::{mul_div, mul_div_rounding_up};
use crate::error::MathError;
use crate::fees::FEE_DENOMINATOR_PPM;
use primitive_types::U256;

/// Outcome of swapping within a single stretch of constant liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStep {
    /// Sqrt price after the step.
    pub sqrt_price_next: U256,
    /// Input consumed, excluding the fee.
    pub amount_in: U256,
    /// Output released.
    pub amount_out: U256,
    /// Fee charged on the input.
    pub fee_amount: U256,
}

/// Swaps an exact input toward `sqrt_price_target`, stopping at the target or
/// when `amount_remaining` (fee included) runs out.
pub fn compute_swap_step(
    sqrt_price_current: U256,
    sqrt_price_target: U256,
    liquidity: u128,
    amount_remaining: U256,
    fee_ppm: u32,
) -> Result<SwapStep, MathError> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;
    let denominator = U256::from(FEE_DENOMINATOR_PPM);
    let fee = U256::from(fee_ppm);
    if fee >= denominator {
        return Err(MathError::Overflow);
    }

    let amount_remaining_less_fee = mul_div(amount_remaining, denominator - fee, denominator)?;
    let amount_in_to_target = if zero_for_one {
        get_amount0_delta(sqrt_price_target, sqrt_price_current, liquidity, true)?
    } else {
        get_amount1_delta(sqrt_price_current, sqrt_price_target, liquidity, true)?
    };

    let sqrt_price_next = if amount_remaining_less_fee >= amount_in_to_target {
        sqrt_price_target
    } else {
        get_next_sqrt_price_from_input(
            sqrt_price_current,
            liquidity,
            amount_remaining_less_fee,
            zero_for_one,
        )?
    };
    let reached_target = sqrt_price_next == sqrt_price_target;

    let (amount_in, amount_out) = if zero_for_one {
        (
            if reached_target {
                amount_in_to_target
            } else {
                get_amount0_delta(sqrt_price_next, sqrt_price_current, liquidity, true)?
            },
            get_amount1_delta(sqrt_price_next, sqrt_price_current, liquidity, false)?,
        )
    } else {
        (
            if reached_target {
                amount_in_to_target
            } else {
                get_amount1_delta(sqrt_price_current, sqrt_price_next, liquidity, true)?
            },
            get_amount0_delta(sqrt_price_current, sqrt_price_next, liquidity, false)?,
        )
    };

    // Whatever is left over when stopping short of the target is the fee.
    let fee_amount = if reached_target {
        mul_div_rounding_up(amount_in, fee, denominator - fee)?
    } else {
        amount_remaining
            .checked_sub(amount_in)
            .ok_or(MathError::Overflow)?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::price_tick::get_sqrt_ratio_at_tick;

    const LIQUIDITY: u128 = 2_000_000_000_000_000_000;

    #[test]
    fn test_step_capped_at_target() {
        let current = get_sqrt_ratio_at_tick(0).unwrap();
        let target = get_sqrt_ratio_at_tick(10).unwrap();
        let step = compute_swap_step(
            current,
            target,
            LIQUIDITY,
            U256::from(1_000_000_000_000_000_000u128),
            600,
        )
        .unwrap();

        assert_eq!(step.sqrt_price_next, target);
        let needed = get_amount1_delta(current, target, LIQUIDITY, true).unwrap();
        assert_eq!(step.amount_in, needed);
        assert!(step.fee_amount > U256::zero());
        assert!(step.amount_in + step.fee_amount < U256::from(1_000_000_000_000_000_000u128));
    }

    #[test]
    fn test_step_exhausts_input_before_target() {
        let current = get_sqrt_ratio_at_tick(0).unwrap();
        let target = get_sqrt_ratio_at_tick(-1000).unwrap();
        let remaining = U256::from(1_000_000u64);
        let step = compute_swap_step(current, target, LIQUIDITY, remaining, 3000).unwrap();

        assert!(step.sqrt_price_next < current);
        assert!(step.sqrt_price_next > target);
        assert_eq!(step.amount_in + step.fee_amount, remaining);
        // Price barely moves, so output tracks input closely.
        assert!(step.amount_out <= step.amount_in);
    }

    #[test]
    fn test_zero_liquidity_jumps_to_target() {
        let current = get_sqrt_ratio_at_tick(0).unwrap();
        let target = get_sqrt_ratio_at_tick(60).unwrap();
        let step = compute_swap_step(current, target, 0, U256::from(100u64), 3000).unwrap();

        assert_eq!(step.sqrt_price_next, target);
        assert!(step.amount_in.is_zero());
        assert!(step.amount_out.is_zero());
        assert!(step.fee_amount.is_zero());
    }
}
