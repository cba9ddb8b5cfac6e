//! Callback traits through which the manager hands control to other code.

use crate::error::AmmError;
use crate::manager::{PoolManager, SwapParams};
use limit_order_domain::{Address, BalanceDelta, PoolKey};
use primitive_types::U256;

/// Code attached to a pool and invoked by the manager around pool actions.
///
/// The manager passes itself in so the hook can act inside the caller's
/// session, for example by modifying its own liquidity after a swap.
pub trait PoolHooks {
    type Error: From<AmmError>;

    /// Address the hook is deployed at. Must equal `PoolKey::hooks`.
    fn address(&self) -> Address;

    fn after_initialize(
        &mut self,
        _manager: &mut PoolManager,
        _key: &PoolKey,
        _sqrt_price_x96: U256,
        _tick: i32,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn after_swap(
        &mut self,
        _manager: &mut PoolManager,
        _sender: Address,
        _key: &PoolKey,
        _params: &SwapParams,
        _delta: BalanceDelta,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Hook implementation for pools without a hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl PoolHooks for NoHooks {
    type Error = AmmError;

    fn address(&self) -> Address {
        Address::ZERO
    }
}

/// Code run by [`PoolManager::unlock`] while the manager is unlocked.
///
/// Every currency delta accrued during the callback must be settled before it
/// returns, otherwise the whole session fails.
pub trait SessionParticipant {
    type Output;
    type Error: From<AmmError>;

    fn on_unlock(&mut self, manager: &mut PoolManager) -> Result<Self::Output, Self::Error>;
}
