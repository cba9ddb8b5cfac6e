//! Bounded journal of order lifecycle events.

use super::{CanceledData, EventData, FilledData, OrderEvent, PlacedData, TakenData};
use crate::bucket::BucketKey;
use limit_order_domain::{Address, PoolId};
use std::collections::VecDeque;
use tracing::info;
use uuid::Uuid;

/// Keeps the most recent lifecycle events, oldest first.
///
/// Recording does not log. The owner of the surrounding transaction calls
/// [`log_since`](EventJournal::log_since) once the events are committed.
#[derive(Debug, Clone)]
pub struct EventJournal {
    events: VecDeque<OrderEvent>,
    retention: usize,
    recorded: u64,
}

impl EventJournal {
    /// Creates a journal keeping at most `retention` events. With a retention
    /// of zero events are still counted but not kept.
    #[must_use]
    pub fn new(retention: usize) -> Self {
        Self {
            events: VecDeque::new(),
            retention,
            recorded: 0,
        }
    }

    /// Records a placed event.
    pub fn record_placed(&mut self, key: &BucketKey, slot: u64, data: PlacedData) -> Uuid {
        self.push(OrderEvent::new(key, slot, EventData::Placed(data)))
    }

    /// Records a canceled event.
    pub fn record_canceled(
        &mut self,
        key: &BucketKey,
        slot: u64,
        data: CanceledData,
    ) -> Uuid {
        self.push(OrderEvent::new(key, slot, EventData::Canceled(data)))
    }

    /// Records a filled event.
    pub fn record_filled(&mut self, key: &BucketKey, slot: u64, data: FilledData) -> Uuid {
        self.push(OrderEvent::new(key, slot, EventData::Filled(data)))
    }

    /// Records a taken event.
    pub fn record_taken(&mut self, key: &BucketKey, slot: u64, data: TakenData) -> Uuid {
        self.push(OrderEvent::new(key, slot, EventData::Taken(data)))
    }

    fn push(&mut self, event: OrderEvent) -> Uuid {
        self.recorded += 1;
        let id = event.id;
        self.events.push_back(event);
        while self.events.len() > self.retention {
            self.events.pop_front();
        }
        id
    }

    /// Retained events recorded after the first `mark`, where `mark` is a
    /// previous [`total_recorded`](Self::total_recorded).
    pub fn since(&self, mark: u64) -> impl Iterator<Item = &OrderEvent> {
        let first_retained = self.recorded - self.events.len() as u64;
        let skip = mark.saturating_sub(first_retained);
        self.events
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
    }

    /// Logs every retained event recorded after `mark`.
    pub fn log_since(&self, mark: u64) {
        for event in self.since(mark) {
            let (pool, tick, direction, slot) =
                (event.pool, event.tick, event.direction, event.slot);
            match &event.data {
                EventData::Placed(data) => info!(
                    pool = %pool,
                    tick,
                    direction = %direction,
                    slot,
                    depositor = %data.depositor,
                    liquidity = data.liquidity,
                    amount0 = data.amount0,
                    amount1 = data.amount1,
                    "Order placed"
                ),
                EventData::Canceled(data) => info!(
                    pool = %pool,
                    tick,
                    direction = %direction,
                    slot,
                    depositor = %data.depositor,
                    liquidity = data.liquidity,
                    fees0 = data.fees0,
                    fees1 = data.fees1,
                    swept = data.swept,
                    "Order canceled"
                ),
                EventData::Filled(data) => info!(
                    pool = %pool,
                    tick,
                    direction = %direction,
                    slot,
                    liquidity = data.liquidity,
                    amount0 = data.amount0,
                    amount1 = data.amount1,
                    "Bucket filled"
                ),
                EventData::Taken(data) => info!(
                    pool = %pool,
                    tick,
                    direction = %direction,
                    slot,
                    depositor = %data.depositor,
                    amount0 = data.amount0,
                    amount1 = data.amount1,
                    "Proceeds taken"
                ),
            }
        }
    }

    /// Retained events, oldest first.
    pub fn events(&self) -> impl Iterator<Item = &OrderEvent> {
        self.events.iter()
    }

    /// Retained events of one pool.
    #[must_use]
    pub fn for_pool(&self, pool: &PoolId) -> Vec<&OrderEvent> {
        self.events.iter().filter(|e| e.pool == *pool).collect()
    }

    /// Retained events concerning one depositor.
    #[must_use]
    pub fn for_depositor(&self, depositor: Address) -> Vec<&OrderEvent> {
        self.events
            .iter()
            .filter(|e| e.depositor() == Some(depositor))
            .collect()
    }

    /// Most recent event.
    #[must_use]
    pub fn latest(&self) -> Option<&OrderEvent> {
        self.events.back()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events recorded since creation, including those no longer retained.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.recorded
    }
}

impl Default for EventJournal {
    fn default() -> Self {
        Self::new(10_000)
    }
}
