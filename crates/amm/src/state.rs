//! Pool, tick and position state.
//!
//! Fee growth values are Q128.128 per unit of liquidity and wrap on overflow;
//! only differences between them are meaningful.

use limit_order_domain::math::concentrated_liquidity::add_liquidity_delta;
use limit_order_domain::math::price_tick::{MAX_TICK, MIN_TICK};
use limit_order_domain::{MathError, PoolKey, PositionKey, TickRange};
use primitive_types::U256;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Price snapshot of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot0 {
    /// Current sqrt price as Q64.96.
    pub sqrt_price_x96: U256,
    /// Greatest tick whose sqrt price is at most the current one.
    pub tick: i32,
    /// Swap fee in parts per million.
    pub fee_ppm: u32,
}

/// Per-tick bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickInfo {
    /// Total liquidity referencing this tick as a boundary.
    pub liquidity_gross: u128,
    /// Liquidity added when the tick is crossed left to right.
    pub liquidity_net: i128,
    /// Fee growth of currency0 on the side of the tick away from the price.
    pub fee_growth_outside0_x128: U256,
    /// Fee growth of currency1 on the side of the tick away from the price.
    pub fee_growth_outside1_x128: U256,
}

/// Per-position bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionInfo {
    /// Liquidity owned by the position.
    pub liquidity: u128,
    /// Fee growth inside the range of currency0 at the last modification.
    pub fee_growth_inside0_last_x128: U256,
    /// Fee growth inside the range of currency1 at the last modification.
    pub fee_growth_inside1_last_x128: U256,
}

/// Live state of one initialized pool.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// Key the pool was created with.
    pub key: PoolKey,
    /// Current sqrt price as Q64.96.
    pub sqrt_price_x96: U256,
    /// Current tick.
    pub tick: i32,
    /// Liquidity active at the current tick.
    pub liquidity: u128,
    /// Accumulated currency0 fees per unit of liquidity.
    pub fee_growth_global0_x128: U256,
    /// Accumulated currency1 fees per unit of liquidity.
    pub fee_growth_global1_x128: U256,
    /// Initialized ticks in ascending order.
    pub ticks: BTreeMap<i32, TickInfo>,
    /// Open positions.
    pub positions: HashMap<PositionKey, PositionInfo>,
}

impl PoolState {
    /// Creates a pool with no liquidity at the given price.
    #[must_use]
    pub fn new(key: PoolKey, sqrt_price_x96: U256, tick: i32) -> Self {
        Self {
            key,
            sqrt_price_x96,
            tick,
            liquidity: 0,
            fee_growth_global0_x128: U256::zero(),
            fee_growth_global1_x128: U256::zero(),
            ticks: BTreeMap::new(),
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn slot0(&self) -> Slot0 {
        Slot0 {
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
            fee_ppm: self.key.fee,
        }
    }

    /// Fee growth accrued strictly inside `range`, per unit of liquidity.
    #[must_use]
    pub fn fee_growth_inside(&self, range: TickRange) -> (U256, U256) {
        let outside = |tick: i32| {
            self.ticks
                .get(&tick)
                .map(|info| (info.fee_growth_outside0_x128, info.fee_growth_outside1_x128))
                .unwrap_or_default()
        };
        let global = (self.fee_growth_global0_x128, self.fee_growth_global1_x128);
        let (lower0, lower1) = outside(range.lower);
        let (upper0, upper1) = outside(range.upper);

        let (below0, below1) = if self.tick >= range.lower {
            (lower0, lower1)
        } else {
            (wrapping_sub(global.0, lower0), wrapping_sub(global.1, lower1))
        };
        let (above0, above1) = if self.tick < range.upper {
            (upper0, upper1)
        } else {
            (wrapping_sub(global.0, upper0), wrapping_sub(global.1, upper1))
        };

        (
            wrapping_sub(wrapping_sub(global.0, below0), above0),
            wrapping_sub(wrapping_sub(global.1, below1), above1),
        )
    }

    /// Applies a liquidity change to one boundary tick. Returns true when the
    /// tick flips between initialized and uninitialized.
    pub fn update_tick(
        &mut self,
        tick: i32,
        liquidity_delta: i128,
        upper: bool,
    ) -> Result<bool, MathError> {
        let current_tick = self.tick;
        let global = (self.fee_growth_global0_x128, self.fee_growth_global1_x128);
        let info = self.ticks.entry(tick).or_default();

        let gross_before = info.liquidity_gross;
        let gross_after = add_liquidity_delta(gross_before, liquidity_delta)?;
        let net_after = if upper {
            info.liquidity_net.checked_sub(liquidity_delta)
        } else {
            info.liquidity_net.checked_add(liquidity_delta)
        }
        .ok_or(MathError::Overflow)?;

        // Growth below the price is assumed to have happened below the tick.
        if gross_before == 0 && tick <= current_tick {
            info.fee_growth_outside0_x128 = global.0;
            info.fee_growth_outside1_x128 = global.1;
        }
        info.liquidity_gross = gross_after;
        info.liquidity_net = net_after;

        Ok((gross_before == 0) != (gross_after == 0))
    }

    /// Drops a tick no position references anymore.
    pub fn clear_tick(&mut self, tick: i32) {
        self.ticks.remove(&tick);
    }

    /// Flips a tick's outside fee growth as the price moves across it and
    /// returns its net liquidity.
    pub fn cross_tick(&mut self, tick: i32) -> i128 {
        let global = (self.fee_growth_global0_x128, self.fee_growth_global1_x128);
        match self.ticks.get_mut(&tick) {
            Some(info) => {
                info.fee_growth_outside0_x128 = wrapping_sub(global.0, info.fee_growth_outside0_x128);
                info.fee_growth_outside1_x128 = wrapping_sub(global.1, info.fee_growth_outside1_x128);
                info.liquidity_net
            }
            None => 0,
        }
    }

    /// Next initialized tick at or below `tick` when `lte`, or strictly above
    /// it otherwise. Falls back to the tick range bounds, reported as
    /// uninitialized.
    #[must_use]
    pub fn next_initialized_tick(&self, tick: i32, lte: bool) -> (i32, bool) {
        if lte {
            self.ticks
                .range(..=tick)
                .next_back()
                .map_or((MIN_TICK, false), |(next, _)| (*next, true))
        } else {
            self.ticks
                .range(tick.saturating_add(1)..)
                .next()
                .map_or((MAX_TICK, false), |(next, _)| (*next, true))
        }
    }
}

/// Subtraction modulo 2^256.
#[must_use]
pub fn wrapping_sub(a: U256, b: U256) -> U256 {
    a.overflowing_sub(b).0
}

/// Addition modulo 2^256.
#[must_use]
pub fn wrapping_add(a: U256, b: U256) -> U256 {
    a.overflowing_add(b).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use limit_order_domain::{Address, Currency, FeeTier};

    fn pool(tick: i32) -> PoolState {
        let key = PoolKey::new(
            Currency::Native,
            Currency::Token(Address::from_low_u64(1)),
            FeeTier::LOW,
            Address::ZERO,
        );
        PoolState::new(key, U256::one() << 96, tick)
    }

    #[test]
    fn test_update_tick_flips() {
        let mut state = pool(0);
        assert!(state.update_tick(10, 100, false).unwrap());
        assert!(!state.update_tick(10, 50, true).unwrap());
        let info = &state.ticks[&10];
        assert_eq!(info.liquidity_gross, 150);
        assert_eq!(info.liquidity_net, 50);
        assert!(state.update_tick(10, -150, false).is_ok());
        assert_eq!(state.ticks[&10].liquidity_gross, 0);
    }

    #[test]
    fn test_outside_growth_seeded_below_price() {
        let mut state = pool(0);
        state.fee_growth_global0_x128 = U256::from(500u64);
        state.update_tick(-10, 1, false).unwrap();
        state.update_tick(10, 1, true).unwrap();

        assert_eq!(state.ticks[&-10].fee_growth_outside0_x128, U256::from(500u64));
        assert!(state.ticks[&10].fee_growth_outside0_x128.is_zero());

        // Nothing accrued since the range was opened.
        let (inside0, _) = state.fee_growth_inside(TickRange::new(-10, 10));
        assert!(inside0.is_zero());

        state.fee_growth_global0_x128 = U256::from(800u64);
        let (inside0, _) = state.fee_growth_inside(TickRange::new(-10, 10));
        assert_eq!(inside0, U256::from(300u64));
    }

    #[test]
    fn test_next_initialized_tick() {
        let mut state = pool(0);
        state.update_tick(-20, 1, false).unwrap();
        state.update_tick(30, 1, true).unwrap();

        assert_eq!(state.next_initialized_tick(0, true), (-20, true));
        assert_eq!(state.next_initialized_tick(-20, true), (-20, true));
        assert_eq!(state.next_initialized_tick(-21, true), (MIN_TICK, false));
        assert_eq!(state.next_initialized_tick(0, false), (30, true));
        assert_eq!(state.next_initialized_tick(30, false), (MAX_TICK, false));
    }

    #[test]
    fn test_cross_tick_flips_outside() {
        let mut state = pool(0);
        state.update_tick(10, 7, false).unwrap();
        state.fee_growth_global1_x128 = U256::from(40u64);

        assert_eq!(state.cross_tick(10), 7);
        assert_eq!(state.ticks[&10].fee_growth_outside1_x128, U256::from(40u64));
        assert_eq!(state.cross_tick(99), 0);
    }
}
