//! Resting limit orders on a concentrated-liquidity pool.
//!
//! The order book is a pool hook. Depositors rest single-sided liquidity on
//! one tick interval, swaps that sweep through the interval convert it, and
//! depositors take their share of the converted proceeds afterwards.
//!
//! - [`bucket`]: per-generation aggregates of resting orders and depositor sizes
//! - [`tick_tracker`]: last observed tick per pool and the range a swap crossed
//! - [`settlement`]: payments to and from the pool manager
//! - [`hook`]: placement, cancellation, fills and claims
//! - [`market`]: the manager and the hook wired together behind transactional calls
//!
//! # Example
//!
//! ```rust
//! use limit_order_engine::prelude::*;
//!
//! let mut market = Market::default();
//! let key = market.pool_key(
//!     Currency::Token(Address::from_low_u64(1)),
//!     Currency::Token(Address::from_low_u64(2)),
//!     FeeTier::LOW,
//! );
//! market.initialize_pool(&key, 0).unwrap();
//! assert_eq!(market.hook().last_tick(&key.id()), Some(0));
//! ```

/// Prelude module for convenient imports.
pub mod prelude;

/// Bucket accounting.
pub mod bucket;
/// Configuration.
pub mod config;
/// Error types.
pub mod error;
/// The order book hook.
pub mod hook;
/// Order lifecycle events.
pub mod lifecycle;
/// Transactional façade over the manager and the hook.
pub mod market;
/// Trader and liquidity provider sessions.
pub mod router;
/// Session commands dispatched by the hook.
pub mod session;
/// Payments to and from the pool manager.
pub mod settlement;
/// Per-pool tick tracking.
pub mod tick_tracker;
