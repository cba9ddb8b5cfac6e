//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use limit_order_engine::prelude::*;
//! ```

pub use crate::bucket::{Bucket, BucketKey, BucketStore};
pub use crate::config::{MarketConfig, OrderBookConfig};
pub use crate::error::{ErrorKind, OrderBookError};
pub use crate::hook::{CancelReceipt, OrderBookHook, PlaceParams, PlaceReceipt};
pub use crate::lifecycle::{EventData, EventJournal, OrderEvent, OrderEventType};
pub use crate::market::Market;
pub use crate::router::{LiquiditySession, SwapSession};
pub use crate::settlement::SettlementAdapter;
pub use crate::tick_tracker::TickTracker;
pub use limit_order_amm::manager::{ManagerConfig, SwapParams};
pub use limit_order_domain::{
    Address, BalanceDelta, Currency, Direction, FeeTier, PoolId, PoolKey, TickRange,
};
