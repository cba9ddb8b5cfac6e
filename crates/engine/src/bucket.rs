//! Bucket accounting.
//!
//! A bucket aggregates every resting order at one (pool, tick, direction)
//! coordinate within one generation ("slot"). Records live in a dense arena;
//! an index maps `(key, slot)` to the arena position and per-depositor sizes
//! live in a side table keyed by that position.

use crate::error::OrderBookError;
use limit_order_domain::math::full_math::{mul_div, to_u128};
use limit_order_domain::{Address, Direction, MathError, PoolId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coordinate of a bucket, independent of its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BucketKey {
    pub pool: PoolId,
    pub tick: i32,
    pub direction: Direction,
}

impl BucketKey {
    #[must_use]
    pub fn new(pool: PoolId, tick: i32, direction: Direction) -> Self {
        Self {
            pool,
            tick,
            direction,
        }
    }
}

/// Aggregate resting order of one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Set once the price swept through the bucket's interval.
    pub filled: bool,
    /// Currency0 held for claimants: fill proceeds, or fees retained from
    /// cancellations.
    pub amount0: u128,
    /// Currency1 held for claimants.
    pub amount1: u128,
    /// Sum of the sizes still recorded in the bucket.
    pub liquidity: u128,
}

/// Arena-backed table of buckets.
#[derive(Debug, Clone, Default)]
pub struct BucketStore {
    buckets: Vec<Bucket>,
    index: HashMap<(BucketKey, u64), usize>,
    sizes: HashMap<(usize, Address), u128>,
    slots: HashMap<BucketKey, u64>,
}

impl BucketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bucket records ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Slot new deposits at `key` land in.
    #[must_use]
    pub fn active_slot(&self, key: &BucketKey) -> u64 {
        self.slots.get(key).copied().unwrap_or_default()
    }

    /// The active bucket at `key`, created empty if it does not exist yet.
    pub fn get_or_create(&mut self, key: BucketKey) -> (u64, &Bucket) {
        let slot = self.active_slot(&key);
        let position = self.position_or_insert(key, slot);
        (slot, &self.buckets[position])
    }

    /// Bucket at a given generation, if anything was ever recorded there.
    #[must_use]
    pub fn bucket(&self, key: &BucketKey, slot: u64) -> Option<&Bucket> {
        self.index
            .get(&(*key, slot))
            .map(|position| &self.buckets[*position])
    }

    /// Every recorded bucket with its coordinate and generation, in no
    /// particular order.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, u64, &Bucket)> {
        self.index
            .iter()
            .map(|((key, slot), position)| (*key, *slot, &self.buckets[*position]))
    }

    /// Moves `key` to a fresh generation and returns the new slot.
    pub fn advance_slot(&mut self, key: BucketKey) -> u64 {
        let slot = self.slots.entry(key).or_default();
        *slot += 1;
        *slot
    }

    /// Size recorded for `depositor` in a given generation.
    #[must_use]
    pub fn size_of(&self, key: &BucketKey, slot: u64, depositor: Address) -> u128 {
        self.index
            .get(&(*key, slot))
            .and_then(|position| self.sizes.get(&(*position, depositor)))
            .copied()
            .unwrap_or_default()
    }

    /// Every depositor with a non-zero size in a given generation, sorted.
    #[must_use]
    pub fn depositors(&self, key: &BucketKey, slot: u64) -> Vec<(Address, u128)> {
        let Some(position) = self.index.get(&(*key, slot)) else {
            return Vec::new();
        };
        let mut depositors: Vec<_> = self
            .sizes
            .iter()
            .filter(|((at, _), _)| at == position)
            .map(|((_, depositor), size)| (*depositor, *size))
            .collect();
        depositors.sort();
        depositors
    }

    /// Credits `amount` to `depositor` in the active bucket. Returns the slot.
    pub fn add_liquidity(
        &mut self,
        key: BucketKey,
        depositor: Address,
        amount: u128,
    ) -> Result<u64, OrderBookError> {
        if amount == 0 {
            return Err(OrderBookError::InvalidAmount);
        }
        let slot = self.active_slot(&key);
        let position = self.position_or_insert(key, slot);
        let bucket = &self.buckets[position];
        if bucket.filled {
            return Err(OrderBookError::OrderAlreadyFilled);
        }

        let liquidity = bucket
            .liquidity
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        let size = self.sizes.get(&(position, depositor)).copied().unwrap_or_default();
        let size = size.checked_add(amount).ok_or(MathError::Overflow)?;

        self.buckets[position].liquidity = liquidity;
        self.sizes.insert((position, depositor), size);
        Ok(slot)
    }

    /// Debits `amount` from `depositor` in the active bucket. Returns the
    /// liquidity left in the bucket.
    pub fn remove_liquidity(
        &mut self,
        key: BucketKey,
        depositor: Address,
        amount: u128,
    ) -> Result<u128, OrderBookError> {
        if amount == 0 {
            return Err(OrderBookError::InvalidAmount);
        }
        let slot = self.active_slot(&key);
        let position = self
            .index
            .get(&(key, slot))
            .copied()
            .ok_or(OrderBookError::ZeroSize)?;
        let bucket = &mut self.buckets[position];
        if bucket.filled {
            return Err(OrderBookError::OrderAlreadyFilled);
        }

        let available = self.sizes.get(&(position, depositor)).copied().unwrap_or_default();
        if amount > available {
            return Err(OrderBookError::InsufficientSize {
                requested: amount,
                available,
            });
        }
        bucket.liquidity -= amount;
        if available == amount {
            self.sizes.remove(&(position, depositor));
        } else {
            self.sizes.insert((position, depositor), available - amount);
        }
        Ok(bucket.liquidity)
    }

    /// Marks a generation filled and adds the proceeds to it.
    pub fn record_fill(
        &mut self,
        key: BucketKey,
        slot: u64,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), OrderBookError> {
        self.deposit_amounts(key, slot, amount0, amount1)?;
        let position = self.position_or_insert(key, slot);
        self.buckets[position].filled = true;
        Ok(())
    }

    /// Keeps fees withdrawn by a cancellation in the bucket for whoever
    /// drains it.
    pub fn retain_fees(
        &mut self,
        key: BucketKey,
        slot: u64,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), OrderBookError> {
        self.deposit_amounts(key, slot, amount0, amount1)
    }

    /// Empties a generation's carry-over and returns it.
    pub fn sweep_carry_over(&mut self, key: &BucketKey, slot: u64) -> (u128, u128) {
        match self.index.get(&(*key, slot)) {
            Some(position) => {
                let bucket = &mut self.buckets[*position];
                let swept = (bucket.amount0, bucket.amount1);
                bucket.amount0 = 0;
                bucket.amount1 = 0;
                swept
            }
            None => (0, 0),
        }
    }

    /// What [`claim`](Self::claim) would pay `depositor` right now.
    pub fn claimable(
        &self,
        key: &BucketKey,
        slot: u64,
        depositor: Address,
    ) -> Result<(u128, u128), OrderBookError> {
        let bucket = self
            .bucket(key, slot)
            .ok_or(OrderBookError::OrderNotFilled)?;
        if !bucket.filled {
            return Err(OrderBookError::OrderNotFilled);
        }
        let size = self.size_of(key, slot, depositor);
        if size == 0 {
            return Err(OrderBookError::ZeroSize);
        }
        Ok((
            pro_rata(bucket.amount0, size, bucket.liquidity)?,
            pro_rata(bucket.amount1, size, bucket.liquidity)?,
        ))
    }

    /// Pays `depositor` its pro-rata share of a filled generation and clears
    /// its size.
    pub fn claim(
        &mut self,
        key: &BucketKey,
        slot: u64,
        depositor: Address,
    ) -> Result<(u128, u128), OrderBookError> {
        let (claim0, claim1) = self.claimable(key, slot, depositor)?;
        let size = self.size_of(key, slot, depositor);
        let position = self
            .index
            .get(&(*key, slot))
            .copied()
            .ok_or(OrderBookError::OrderNotFilled)?;

        let bucket = &mut self.buckets[position];
        bucket.amount0 -= claim0;
        bucket.amount1 -= claim1;
        bucket.liquidity -= size;
        self.sizes.remove(&(position, depositor));
        Ok((claim0, claim1))
    }

    fn deposit_amounts(
        &mut self,
        key: BucketKey,
        slot: u64,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), OrderBookError> {
        let position = self.position_or_insert(key, slot);
        let bucket = &mut self.buckets[position];
        let next0 = bucket.amount0.checked_add(amount0).ok_or(MathError::Overflow)?;
        let next1 = bucket.amount1.checked_add(amount1).ok_or(MathError::Overflow)?;
        bucket.amount0 = next0;
        bucket.amount1 = next1;
        Ok(())
    }

    fn position_or_insert(&mut self, key: BucketKey, slot: u64) -> usize {
        if let Some(position) = self.index.get(&(key, slot)) {
            return *position;
        }
        let position = self.buckets.len();
        self.buckets.push(Bucket::default());
        self.index.insert((key, slot), position);
        position
    }
}

/// `amount * size / liquidity`, truncated.
fn pro_rata(amount: u128, size: u128, liquidity: u128) -> Result<u128, OrderBookError> {
    let share = mul_div(U256::from(amount), U256::from(size), U256::from(liquidity))?;
    Ok(to_u128(share)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn key() -> BucketKey {
        BucketKey::new(PoolId(Uuid::nil()), 10, Direction::ZeroForOne)
    }

    fn user(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn test_add_and_remove_track_sizes() {
        let mut store = BucketStore::new();
        assert_eq!(store.add_liquidity(key(), user(1), 100).unwrap(), 0);
        store.add_liquidity(key(), user(2), 50).unwrap();
        store.add_liquidity(key(), user(1), 25).unwrap();

        assert_eq!(store.size_of(&key(), 0, user(1)), 125);
        assert_eq!(store.get_or_create(key()).1.liquidity, 175);

        assert_eq!(store.remove_liquidity(key(), user(1), 125).unwrap(), 50);
        assert_eq!(store.size_of(&key(), 0, user(1)), 0);
        assert_eq!(store.depositors(&key(), 0), vec![(user(2), 50)]);
    }

    #[test]
    fn test_zero_amounts_are_rejected() {
        let mut store = BucketStore::new();
        assert_eq!(
            store.add_liquidity(key(), user(1), 0),
            Err(OrderBookError::InvalidAmount)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_more_than_size() {
        let mut store = BucketStore::new();
        store.add_liquidity(key(), user(1), 10).unwrap();
        assert_eq!(
            store.remove_liquidity(key(), user(1), 11),
            Err(OrderBookError::InsufficientSize {
                requested: 11,
                available: 10,
            })
        );
    }

    #[test]
    fn test_fill_moves_deposits_to_new_slot() {
        let mut store = BucketStore::new();
        store.add_liquidity(key(), user(1), 10).unwrap();

        assert_eq!(store.advance_slot(key()), 1);
        store.record_fill(key(), 0, 0, 30).unwrap();

        // The old generation is frozen.
        assert!(store.bucket(&key(), 0).unwrap().filled);
        assert_eq!(
            store.remove_liquidity(key(), user(1), 10),
            Err(OrderBookError::ZeroSize)
        );

        // New deposits land in slot 1.
        assert_eq!(store.add_liquidity(key(), user(1), 5).unwrap(), 1);
        let (slot, bucket) = store.get_or_create(key());
        assert_eq!(slot, 1);
        assert!(!bucket.filled);
        assert_eq!(bucket.liquidity, 5);
    }

    #[test]
    fn test_claims_are_pro_rata() {
        let mut store = BucketStore::new();
        store.add_liquidity(key(), user(1), 1).unwrap();
        store.add_liquidity(key(), user(2), 2).unwrap();
        store.advance_slot(key());
        store.record_fill(key(), 0, 0, 100).unwrap();

        assert_eq!(store.claimable(&key(), 0, user(1)).unwrap(), (0, 33));
        assert_eq!(store.claim(&key(), 0, user(1)).unwrap(), (0, 33));
        // The remaining claimant absorbs the rounding dust.
        assert_eq!(store.claim(&key(), 0, user(2)).unwrap(), (0, 67));
        assert_eq!(store.claim(&key(), 0, user(2)), Err(OrderBookError::ZeroSize));

        let bucket = store.bucket(&key(), 0).unwrap();
        assert_eq!((bucket.amount0, bucket.amount1, bucket.liquidity), (0, 0, 0));
    }

    #[test]
    fn test_claim_requires_fill() {
        let mut store = BucketStore::new();
        store.add_liquidity(key(), user(1), 1).unwrap();
        assert_eq!(store.claim(&key(), 0, user(1)), Err(OrderBookError::OrderNotFilled));
        assert_eq!(store.claim(&key(), 7, user(1)), Err(OrderBookError::OrderNotFilled));
    }

    #[test]
    fn test_carry_over_sweep() {
        let mut store = BucketStore::new();
        store.add_liquidity(key(), user(1), 1).unwrap();
        store.retain_fees(key(), 0, 3, 4).unwrap();
        store.retain_fees(key(), 0, 1, 0).unwrap();

        assert_eq!(store.sweep_carry_over(&key(), 0), (4, 4));
        assert_eq!(store.sweep_carry_over(&key(), 0), (0, 0));
    }

    proptest! {
        #[test]
        fn prop_sizes_sum_to_liquidity(
            ops in prop::collection::vec((0u64..5, 1u128..1_000, any::<bool>()), 1..60)
        ) {
            let mut store = BucketStore::new();
            for (who, amount, add) in ops {
                if add {
                    store.add_liquidity(key(), user(who), amount).unwrap();
                } else {
                    let size = store.size_of(&key(), 0, user(who));
                    if size > 0 {
                        store.remove_liquidity(key(), user(who), amount.min(size)).unwrap();
                    }
                }
                let total: u128 = store.depositors(&key(), 0).iter().map(|(_, s)| s).sum();
                prop_assert_eq!(total, store.get_or_create(key()).1.liquidity);
            }
        }

        #[test]
        fn prop_claims_never_exceed_proceeds(
            sizes in prop::collection::vec(1u128..1_000_000, 1..12),
            amount0 in 0u128..1_000_000_000,
            amount1 in 0u128..1_000_000_000,
            reverse in any::<bool>(),
        ) {
            let mut store = BucketStore::new();
            for (who, size) in sizes.iter().enumerate() {
                store.add_liquidity(key(), user(who as u64), *size).unwrap();
            }
            store.advance_slot(key());
            store.record_fill(key(), 0, amount0, amount1).unwrap();

            let mut order: Vec<u64> = (0..sizes.len() as u64).collect();
            if reverse {
                order.reverse();
            }
            let (mut claimed0, mut claimed1) = (0u128, 0u128);
            for who in order {
                let (c0, c1) = store.claim(&key(), 0, user(who)).unwrap();
                claimed0 += c0;
                claimed1 += c1;
                prop_assert!(claimed0 <= amount0 && claimed1 <= amount1);
            }
            // The last claimant takes whatever truncation left behind.
            prop_assert_eq!((claimed0, claimed1), (amount0, amount1));
            let bucket = store.bucket(&key(), 0).unwrap();
            prop_assert_eq!(bucket.liquidity, 0);
        }
    }
}
