use crate::error::MathError;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Lowest tick whose price is representable.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick whose price is representable.
pub const MAX_TICK: i32 = 887_272;

/// `sqrt(1.0001^-i) * 2^128` for each bit `i` of the absolute tick.
const TICK_RATIO_FACTORS: [(u32, u128); 19] = [
    (0x2, 0xfff97272373d413259a46990580e213a),
    (0x4, 0xfff2e50f5f656932ef12357cf3c7fdcc),
    (0x8, 0xffe5caca7e10e4e61c3624eaa0941cd0),
    (0x10, 0xffcb9843d60f6159c9db58835c926644),
    (0x20, 0xff973b41fa98c081472e6896dfb254c0),
    (0x40, 0xff2ea16466c96a3843ec78b326b52861),
    (0x80, 0xfe5dee046a99a2a811c461f1969c3053),
    (0x100, 0xfcbe86c7900a88aedcffc83b479aa3a4),
    (0x200, 0xf987a7253ac413176f2b074cf7815e54),
    (0x400, 0xf3392b0822b70005940c7a398e4b70f3),
    (0x800, 0xe7159475a2c29b7443b29c7fa6e889d9),
    (0x1000, 0xd097f3bdfd2022b8845ad8f792aa5825),
    (0x2000, 0xa9f746462d870fdf8a65dc1f90e061e5),
    (0x4000, 0x70d869a156d2a1b890bb3df62baf32f7),
    (0x8000, 0x31be135f97d08fd981231505542fcfa6),
    (0x10000, 0x9aa508b5b7a84e1c677de54f3e99bc9),
    (0x20000, 0x5d6af8dedb81196699c329225ee604),
    (0x40000, 0x2216e584f5fa1ea926041bedfe98),
    (0x80000, 0x48a170391f7dc42444e8fa2),
];

/// Sqrt price at [`MIN_TICK`].
#[must_use]
pub fn min_sqrt_ratio() -> U256 {
    U256::from(4_295_128_739u64)
}

/// Sqrt price at [`MAX_TICK`], the exclusive upper bound accepted by
/// [`get_tick_at_sqrt_ratio`].
#[must_use]
pub fn max_sqrt_ratio() -> U256 {
    // 1461446703485210103287273052203988822378723970342
    U256([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0])
}

/// Returns `sqrt(1.0001^tick)` as a Q64.96 value.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfRange(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::one() << 128
    };
    for (bit, factor) in TICK_RATIO_FACTORS {
        if abs_tick & bit != 0 {
            ratio = mul_shift_128(ratio, factor)?;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Round up so that get_tick_at_sqrt_ratio(get_sqrt_ratio_at_tick(t)) == t.
    let shifted = ratio >> 32;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

fn mul_shift_128(ratio: U256, factor: u128) -> Result<U256, MathError> {
    let product = ratio.full_mul(U256::from(factor)) >> 128;
    U256::try_from(product).map_err(|_| MathError::Overflow)
}

/// Returns the greatest tick whose sqrt price is at most `sqrt_price_x96`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, MathError> {
    if sqrt_price_x96 < min_sqrt_ratio() || sqrt_price_x96 >= max_sqrt_ratio() {
        return Err(MathError::SqrtPriceOutOfRange);
    }
    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

/// Rounds `tick` down to a multiple of `tick_spacing`, toward negative infinity.
#[must_use]
pub fn align_tick_down(tick: i32, tick_spacing: i32) -> i32 {
    tick.div_euclid(tick_spacing) * tick_spacing
}

/// Whether `tick` is a multiple of `tick_spacing`.
#[must_use]
pub fn is_aligned(tick: i32, tick_spacing: i32) -> bool {
    tick.rem_euclid(tick_spacing) == 0
}

/// Lowest tick usable with `tick_spacing`.
#[must_use]
pub fn min_usable_tick(tick_spacing: i32) -> i32 {
    (MIN_TICK / tick_spacing) * tick_spacing
}

/// Highest tick usable with `tick_spacing`.
#[must_use]
pub fn max_usable_tick(tick_spacing: i32) -> i32 {
    (MAX_TICK / tick_spacing) * tick_spacing
}

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfRange(tick));
    }
    let price_f64 = 1.0001f64.powi(tick);
    Decimal::from_f64(price_f64).ok_or(MathError::Overflow)
}

/// Returns the tick corresponding to a given price.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::NonPositivePrice);
    }
    let price_f64 = price.to_f64().ok_or(MathError::Overflow)?;
    let tick = price_f64.log(1.0001f64).round();
    if tick < f64::from(MIN_TICK) || tick > f64::from(MAX_TICK) {
        return Err(MathError::Overflow);
    }
    Ok(tick as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::full_math::Q96;

    #[test]
    fn test_sqrt_ratio_bounds() {
        assert_eq!(get_sqrt_ratio_at_tick(0).unwrap(), Q96);
        assert_eq!(get_sqrt_ratio_at_tick(MIN_TICK).unwrap(), min_sqrt_ratio());
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK).unwrap(),
            U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap()
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK).unwrap(),
            max_sqrt_ratio()
        );
        assert_eq!(
            get_sqrt_ratio_at_tick(MAX_TICK + 1),
            Err(MathError::TickOutOfRange(MAX_TICK + 1))
        );
    }

    #[test]
    fn test_sqrt_ratio_is_monotonic() {
        let mut previous = get_sqrt_ratio_at_tick(-200).unwrap();
        for tick in -199..=200 {
            let current = get_sqrt_ratio_at_tick(tick).unwrap();
            assert!(current > previous, "tick {tick}");
            previous = current;
        }
    }

    #[test]
    fn test_tick_at_sqrt_ratio_inverts() {
        for tick in [-887_000, -60_000, -61, -1, 0, 1, 10, 59, 60_000, 887_000] {
            let sqrt = get_sqrt_ratio_at_tick(tick).unwrap();
            assert_eq!(get_tick_at_sqrt_ratio(sqrt).unwrap(), tick);
            assert_eq!(get_tick_at_sqrt_ratio(sqrt + U256::one()).unwrap(), tick);
            assert_eq!(get_tick_at_sqrt_ratio(sqrt - U256::one()).unwrap(), tick - 1);
        }
        assert_eq!(get_tick_at_sqrt_ratio(min_sqrt_ratio()).unwrap(), MIN_TICK);
        assert_eq!(
            get_tick_at_sqrt_ratio(max_sqrt_ratio()),
            Err(MathError::SqrtPriceOutOfRange)
        );
    }

    #[test]
    fn test_alignment() {
        assert_eq!(align_tick_down(25, 10), 20);
        assert_eq!(align_tick_down(-5, 10), -10);
        assert_eq!(align_tick_down(-10, 10), -10);
        assert!(is_aligned(-20, 10));
        assert!(!is_aligned(-21, 10));
        assert_eq!(min_usable_tick(60), -887_220);
        assert_eq!(max_usable_tick(60), 887_220);
    }

    #[test]
    fn test_tick_to_price() {
        // Tick 0 -> Price 1
        let p = tick_to_price(0).unwrap();
        assert_eq!(p, Decimal::from(1));

        // Tick 100 -> 1.0001^100 ~= 1.010049
        let p100 = tick_to_price(100).unwrap();
        let expected = 1.01004966;
        let diff = (p100.to_f64().unwrap() - expected).abs();
        assert!(diff < 0.000001);
    }

    #[test]
    fn test_price_to_tick() {
        let t = price_to_tick(Decimal::from(1)).unwrap();
        assert_eq!(t, 0);

        let t2 = price_to_tick(Decimal::from_f64(1.01004966).unwrap()).unwrap();
        assert_eq!(t2, 100);

        assert_eq!(price_to_tick(Decimal::ZERO), Err(MathError::NonPositivePrice));
    }
}
