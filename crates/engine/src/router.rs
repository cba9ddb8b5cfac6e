//! Sessions run on behalf of traders and liquidity providers.
//!
//! The router opens the session and owns the manager-side deltas; the end
//! user pays and receives the funds.

use crate::error::OrderBookError;
use crate::settlement::SettlementAdapter;
use limit_order_amm::hooks::{PoolHooks, SessionParticipant};
use limit_order_amm::manager::{ModifyLiquidityParams, PoolManager, SwapParams};
use limit_order_domain::{Address, BalanceDelta, PoolKey};

/// Swaps for `trader` and settles both legs against the trader's balances.
pub struct SwapSession<'a, H> {
    router: Address,
    trader: Address,
    key: PoolKey,
    params: SwapParams,
    hooks: &'a mut H,
}

impl<'a, H: PoolHooks> SwapSession<'a, H> {
    #[must_use]
    pub fn new(
        router: Address,
        trader: Address,
        key: PoolKey,
        params: SwapParams,
        hooks: &'a mut H,
    ) -> Self {
        Self {
            router,
            trader,
            key,
            params,
            hooks,
        }
    }
}

impl<H> SessionParticipant for SwapSession<'_, H>
where
    H: PoolHooks,
    OrderBookError: From<H::Error>,
{
    type Output = BalanceDelta;
    type Error = OrderBookError;

    fn on_unlock(&mut self, manager: &mut PoolManager) -> Result<BalanceDelta, OrderBookError> {
        let delta = manager.swap(self.router, &self.key, &self.params, &mut *self.hooks)?;
        SettlementAdapter::new(self.router).settle(
            manager,
            &self.key,
            delta,
            self.trader,
            self.trader,
        )?;
        Ok(delta)
    }
}

/// Modifies a plain range position of `owner` and settles it in full.
///
/// Returns the principal and fee deltas from the owner's side.
#[derive(Debug, Clone, Copy)]
pub struct LiquiditySession {
    owner: Address,
    key: PoolKey,
    params: ModifyLiquidityParams,
}

impl LiquiditySession {
    #[must_use]
    pub fn new(owner: Address, key: PoolKey, params: ModifyLiquidityParams) -> Self {
        Self { owner, key, params }
    }
}

impl SessionParticipant for LiquiditySession {
    type Output = (BalanceDelta, BalanceDelta);
    type Error = OrderBookError;

    fn on_unlock(
        &mut self,
        manager: &mut PoolManager,
    ) -> Result<(BalanceDelta, BalanceDelta), OrderBookError> {
        let (principal, fees) = manager.modify_liquidity(self.owner, &self.key, &self.params)?;
        let total = principal.checked_add(fees)?;
        SettlementAdapter::new(self.owner).settle(manager, &self.key, total, self.owner, self.owner)?;
        Ok((principal, fees))
    }
}
