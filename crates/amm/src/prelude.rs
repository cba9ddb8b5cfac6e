//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use limit_order_amm::prelude::*;
//! ```

pub use crate::error::{AmmError, LedgerError};
pub use crate::hooks::{NoHooks, PoolHooks, SessionParticipant};
pub use crate::ledger::Ledger;
pub use crate::manager::{ManagerConfig, ModifyLiquidityParams, PoolManager, SwapParams};
pub use crate::state::{PoolState, PositionInfo, Slot0, TickInfo};
