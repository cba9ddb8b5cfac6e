//! Domain model for resting limit orders on a concentrated-liquidity AMM.
//!
//! This crate holds the types shared by the pool manager and the order engine:
//! - Addresses, currencies and pool keys
//! - Order and swap directions
//! - Signed balance deltas exchanged with the pool manager
//! - Q64.96 fixed-point tick, liquidity and swap-step math

/// Order and swap directions.
pub mod enums;
/// Error types.
pub mod error;
/// Fee tiers.
pub mod fees;
/// Fixed-point math.
pub mod math;
/// Pool keys and identifiers.
pub mod pool;
/// Position keys and tick ranges.
pub mod position;
/// Addresses and currencies.
pub mod token;
/// Value objects.
pub mod value_objects;

pub use enums::Direction;
pub use error::MathError;
pub use fees::FeeTier;
pub use pool::{PoolId, PoolKey};
pub use position::{PositionKey, TickRange};
pub use token::{Address, Currency};
pub use value_objects::balance_delta::BalanceDelta;
