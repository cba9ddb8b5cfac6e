use crate::error::MathError;
use crate::math::price_tick::tick_to_price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Human-readable price of currency0 in units of currency1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Price at the given tick.
    pub fn from_tick(tick: i32) -> Result<Self, MathError> {
        tick_to_price(tick).map(Self::new)
    }

    pub fn invert(&self) -> Self {
        if self.value.is_zero() {
            return Self {
                value: Decimal::ZERO,
            };
        }
        Self {
            value: Decimal::ONE / self.value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_from_tick_zero_is_one() {
        let price = Price::from_tick(0).unwrap();
        assert_eq!(price.value, dec!(1));
        assert_eq!(price.invert().value, dec!(1));
    }

    #[test]
    fn test_invert_zero_stays_zero() {
        assert_eq!(Price::new(Decimal::ZERO).invert().value, Decimal::ZERO);
        assert_eq!(Price::new(dec!(4)).invert().value, dec!(0.25));
    }
}
