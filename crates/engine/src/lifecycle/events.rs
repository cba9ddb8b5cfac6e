//! Lifecycle events for resting orders.

use crate::bucket::BucketKey;
use chrono::{DateTime, Utc};
use limit_order_domain::{Address, Direction, PoolId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderEventType {
    /// A depositor added to a bucket.
    Placed,
    /// A depositor withdrew its size before the fill.
    Canceled,
    /// A swap swept through a bucket.
    Filled,
    /// A depositor claimed its share of a filled bucket.
    Taken,
}

/// A lifecycle event for one bucket generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event ID.
    pub id: Uuid,
    /// Event type.
    pub event_type: OrderEventType,
    /// Pool the bucket belongs to.
    pub pool: PoolId,
    /// Lower tick of the bucket's interval.
    pub tick: i32,
    /// Direction of the orders in the bucket.
    pub direction: Direction,
    /// Generation the event applies to.
    pub slot: u64,
    /// Timestamp.
    pub timestamp: DateTime<Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl OrderEvent {
    /// Creates a new event; the type follows from `data`.
    #[must_use]
    pub fn new(key: &BucketKey, slot: u64, data: EventData) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: data.event_type(),
            pool: key.pool,
            tick: key.tick,
            direction: key.direction,
            slot,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Depositor the event concerns. Fills concern every depositor and
    /// return `None`.
    #[must_use]
    pub fn depositor(&self) -> Option<Address> {
        match &self.data {
            EventData::Placed(data) => Some(data.depositor),
            EventData::Canceled(data) => Some(data.depositor),
            EventData::Taken(data) => Some(data.depositor),
            EventData::Filled(_) => None,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    Placed(PlacedData),
    Canceled(CanceledData),
    Filled(FilledData),
    Taken(TakenData),
}

impl EventData {
    #[must_use]
    pub fn event_type(&self) -> OrderEventType {
        match self {
            Self::Placed(_) => OrderEventType::Placed,
            Self::Canceled(_) => OrderEventType::Canceled,
            Self::Filled(_) => OrderEventType::Filled,
            Self::Taken(_) => OrderEventType::Taken,
        }
    }
}

/// Data for placed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedData {
    pub depositor: Address,
    /// Liquidity added to the bucket.
    pub liquidity: u128,
    /// Currency0 paid in.
    pub amount0: u128,
    /// Currency1 paid in.
    pub amount1: u128,
}

/// Data for canceled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanceledData {
    pub depositor: Address,
    /// Liquidity withdrawn.
    pub liquidity: u128,
    /// Currency0 principal returned.
    pub principal0: u128,
    /// Currency1 principal returned.
    pub principal1: u128,
    /// Currency0 fees paid to the depositor.
    pub fees0: u128,
    /// Currency1 fees paid to the depositor.
    pub fees1: u128,
    /// Whether this cancellation drained the bucket and swept its carry-over.
    pub swept: bool,
}

/// Data for filled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledData {
    /// Liquidity converted.
    pub liquidity: u128,
    /// Currency0 withdrawn, fees included.
    pub amount0: u128,
    /// Currency1 withdrawn, fees included.
    pub amount1: u128,
}

/// Data for taken event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakenData {
    pub depositor: Address,
    /// Currency0 claimed.
    pub amount0: u128,
    /// Currency1 claimed.
    pub amount1: u128,
}
