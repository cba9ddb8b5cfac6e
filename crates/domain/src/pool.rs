use crate::fees::FeeTier;
use crate::token::{Address, Currency};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one market: two currencies, a fee, a tick spacing and the hook
/// contract attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    /// The lower-sorted currency.
    pub currency0: Currency,
    /// The higher-sorted currency.
    pub currency1: Currency,
    /// Swap fee in parts per million.
    pub fee: u32,
    /// Granularity of usable ticks.
    pub tick_spacing: i32,
    /// Hook contract, or the zero address for none.
    pub hooks: Address,
}

impl PoolKey {
    /// Creates a pool key from a fee tier.
    #[must_use]
    pub fn new(currency0: Currency, currency1: Currency, tier: FeeTier, hooks: Address) -> Self {
        Self {
            currency0,
            currency1,
            fee: tier.fee_ppm,
            tick_spacing: tier.tick_spacing,
            hooks,
        }
    }

    /// Deterministic identifier for this key.
    #[must_use]
    pub fn id(&self) -> PoolId {
        PoolId(Uuid::new_v5(&Uuid::NAMESPACE_OID, self.to_string().as_bytes()))
    }

    /// Returns true when a hook contract is attached.
    #[must_use]
    pub fn has_hooks(&self) -> bool {
        !self.hooks.is_zero()
    }

    /// Currency paid in by a swap, or deposited by an order, in `zero_for_one`
    /// direction when true.
    #[must_use]
    pub fn input_currency(&self, zero_for_one: bool) -> Currency {
        if zero_for_one {
            self.currency0
        } else {
            self.currency1
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}",
            self.currency0, self.currency1, self.fee, self.tick_spacing, self.hooks
        )
    }
}

/// Opaque pool handle derived from a [`PoolKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolId(pub Uuid);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hooks: Address) -> PoolKey {
        PoolKey::new(
            Currency::Native,
            Currency::Token(Address::from_low_u64(7)),
            FeeTier::LOW,
            hooks,
        )
    }

    #[test]
    fn test_pool_id_is_deterministic() {
        let a = key(Address::from_low_u64(9));
        let b = key(Address::from_low_u64(9));
        let c = key(Address::ZERO);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert!(a.has_hooks());
        assert!(!c.has_hooks());
    }

    #[test]
    fn test_input_currency() {
        let k = key(Address::ZERO);
        assert_eq!(k.input_currency(true), Currency::Native);
        assert_eq!(k.input_currency(false), k.currency1);
    }
}
