//! Last observed tick per pool and the range a swap swept through.

use crate::error::OrderBookError;
use limit_order_domain::PoolId;
use limit_order_domain::math::price_tick::align_tick_down;
use std::collections::HashMap;

/// Records the spacing-aligned tick each pool was last seen at.
#[derive(Debug, Clone, Default)]
pub struct TickTracker {
    ticks: HashMap<PoolId, i32>,
}

impl TickTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a pool right after it is created.
    pub fn record_initial_tick(
        &mut self,
        pool: PoolId,
        tick: i32,
        tick_spacing: i32,
    ) -> Result<(), OrderBookError> {
        if self.ticks.contains_key(&pool) {
            return Err(OrderBookError::PoolAlreadyTracked(pool));
        }
        self.ticks.insert(pool, align_tick_down(tick, tick_spacing));
        Ok(())
    }

    /// Last recorded tick, aligned down to the pool's spacing.
    #[must_use]
    pub fn last_tick(&self, pool: &PoolId) -> Option<i32> {
        self.ticks.get(pool).copied()
    }

    /// Whether the pool was seeded.
    #[must_use]
    pub fn is_tracked(&self, pool: &PoolId) -> bool {
        self.ticks.contains_key(pool)
    }

    /// Inclusive range of aligned ticks whose whole interval was traversed
    /// between the recorded tick and `new_tick`.
    ///
    /// Moving up, the interval the price ends in was only partially entered,
    /// so the range stops one spacing below it. Moving down, the interval
    /// the price ends in is excluded the same way. Returns `None` when
    /// nothing was fully crossed.
    pub fn compute_crossed_range(
        &self,
        pool: &PoolId,
        new_tick: i32,
        tick_spacing: i32,
    ) -> Result<Option<(i32, i32)>, OrderBookError> {
        let last = self
            .last_tick(pool)
            .ok_or(OrderBookError::UnknownPool(*pool))?;
        let new = align_tick_down(new_tick, tick_spacing);

        let (lower, upper) = if new > last {
            (last, new - tick_spacing)
        } else if new < last {
            (new + tick_spacing, last)
        } else {
            return Ok(None);
        };
        Ok((lower <= upper).then_some((lower, upper)))
    }

    /// Overwrites the recorded tick.
    pub fn update_tick(
        &mut self,
        pool: PoolId,
        new_tick: i32,
        tick_spacing: i32,
    ) -> Result<(), OrderBookError> {
        let last = self
            .ticks
            .get_mut(&pool)
            .ok_or(OrderBookError::UnknownPool(pool))?;
        *last = align_tick_down(new_tick, tick_spacing);
        Ok(())
    }
}
