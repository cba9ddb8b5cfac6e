//! A pool manager and the order book hook wired together.
//!
//! Every mutating call runs as one transaction: the state is snapshotted up
//! front and restored when the call fails, so an error never leaves a partial
//! effect behind.

use crate::bucket::{Bucket, BucketKey};
use crate::config::MarketConfig;
use crate::error::OrderBookError;
use crate::hook::{CancelReceipt, OrderBookHook, PlaceParams, PlaceReceipt};
use crate::lifecycle::EventJournal;
use crate::router::{LiquiditySession, SwapSession};
use limit_order_amm::hooks::{NoHooks, PoolHooks};
use limit_order_amm::manager::{ModifyLiquidityParams, PoolManager, SwapParams};
use limit_order_amm::state::Slot0;
use limit_order_domain::math::price_tick::get_sqrt_ratio_at_tick;
use limit_order_domain::value_objects::balance_delta::to_signed;
use limit_order_domain::{
    Address, BalanceDelta, Currency, Direction, FeeTier, PoolKey, TickRange,
};
use tracing::{info, warn};

/// Owns the pool manager and the order book hook.
#[derive(Debug, Clone)]
pub struct Market {
    config: MarketConfig,
    manager: PoolManager,
    hook: OrderBookHook,
}

impl Market {
    #[must_use]
    pub fn new(config: MarketConfig) -> Self {
        let manager = PoolManager::new(config.manager.clone());
        let hook = OrderBookHook::new(config.order_book.clone());
        info!(
            manager = %manager.address(),
            hook = %hook.address(),
            router = %config.router,
            "Market created"
        );
        Self {
            config,
            manager,
            hook,
        }
    }

    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    #[must_use]
    pub fn manager(&self) -> &PoolManager {
        &self.manager
    }

    #[must_use]
    pub fn hook(&self) -> &OrderBookHook {
        &self.hook
    }

    #[must_use]
    pub fn hook_address(&self) -> Address {
        self.hook.address()
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        self.hook.journal()
    }

    /// Key of a pool routed through the order book, currencies sorted.
    #[must_use]
    pub fn pool_key(&self, a: Currency, b: Currency, tier: FeeTier) -> PoolKey {
        let (currency0, currency1) = if a <= b { (a, b) } else { (b, a) };
        PoolKey::new(currency0, currency1, tier, self.hook.address())
    }

    /// Creates a pool priced at `tick`. Pools whose key names the hook are
    /// tracked by the order book from then on.
    pub fn initialize_pool(&mut self, key: &PoolKey, tick: i32) -> Result<i32, OrderBookError> {
        let sqrt_price_x96 = get_sqrt_ratio_at_tick(tick)?;
        let key = *key;
        self.transact("initialize_pool", |manager, hook| {
            if key.has_hooks() {
                manager.initialize(key, sqrt_price_x96, hook)
            } else {
                Ok(manager.initialize(key, sqrt_price_x96, &mut NoHooks)?)
            }
        })
    }

    /// Credits `amount` of `currency` to `owner`.
    pub fn mint(
        &mut self,
        owner: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), OrderBookError> {
        Ok(self.manager.mint(owner, currency, amount)?)
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, currency: Currency) -> u128 {
        self.manager.balance_of(owner, currency)
    }

    pub fn place(
        &mut self,
        sender: Address,
        params: &PlaceParams,
    ) -> Result<PlaceReceipt, OrderBookError> {
        let params = *params;
        self.transact("place", |manager, hook| hook.place(manager, sender, &params))
    }

    pub fn cancel(
        &mut self,
        sender: Address,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
    ) -> Result<CancelReceipt, OrderBookError> {
        self.transact("cancel", |manager, hook| {
            hook.cancel(manager, sender, key, tick, direction)
        })
    }

    pub fn take(
        &mut self,
        sender: Address,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
        slot: u64,
    ) -> Result<(u128, u128), OrderBookError> {
        self.transact("take", |manager, hook| {
            hook.take(manager, sender, key, tick, direction, slot)
        })
    }

    /// Swaps for `trader` through the router. Resting orders the swap sweeps
    /// through are filled before the call returns.
    pub fn swap(
        &mut self,
        trader: Address,
        key: &PoolKey,
        params: SwapParams,
    ) -> Result<BalanceDelta, OrderBookError> {
        let router = self.config.router;
        let key = *key;
        self.transact("swap", |manager, hook| {
            if key.has_hooks() {
                manager.unlock(
                    router,
                    &mut SwapSession::new(router, trader, key, params, hook),
                )
            } else {
                manager.unlock(
                    router,
                    &mut SwapSession::new(router, trader, key, params, &mut NoHooks),
                )
            }
        })
    }

    /// Adds background range liquidity owned by `owner`. Returns the
    /// principal paid (negative amounts).
    pub fn add_liquidity(
        &mut self,
        owner: Address,
        key: &PoolKey,
        range: TickRange,
        liquidity: u128,
    ) -> Result<BalanceDelta, OrderBookError> {
        let params = ModifyLiquidityParams::new(range, to_signed(liquidity)?, 0);
        let (principal, _) = self.modify_range(owner, key, params)?;
        Ok(principal)
    }

    /// Removes background range liquidity. Returns the principal and the
    /// fees paid out.
    pub fn remove_liquidity(
        &mut self,
        owner: Address,
        key: &PoolKey,
        range: TickRange,
        liquidity: u128,
    ) -> Result<(BalanceDelta, BalanceDelta), OrderBookError> {
        let params = ModifyLiquidityParams::new(range, -to_signed(liquidity)?, 0);
        self.modify_range(owner, key, params)
    }

    pub fn current_tick(&self, key: &PoolKey) -> Result<i32, OrderBookError> {
        Ok(self.manager.current_tick(&key.id())?)
    }

    pub fn slot0(&self, key: &PoolKey) -> Result<Slot0, OrderBookError> {
        Ok(self.manager.slot0(&key.id())?)
    }

    #[must_use]
    pub fn active_slot(&self, key: &PoolKey, tick: i32, direction: Direction) -> u64 {
        self.hook
            .active_slot(&BucketKey::new(key.id(), tick, direction))
    }

    #[must_use]
    pub fn bucket(
        &self,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
        slot: u64,
    ) -> Option<&Bucket> {
        self.hook
            .bucket(&BucketKey::new(key.id(), tick, direction), slot)
    }

    pub fn claimable(
        &self,
        depositor: Address,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
        slot: u64,
    ) -> Result<(u128, u128), OrderBookError> {
        self.hook
            .claimable(&BucketKey::new(key.id(), tick, direction), slot, depositor)
    }

    /// Claims the hook holds on the manager in `currency`.
    #[must_use]
    pub fn hook_claims(&self, currency: Currency) -> u128 {
        self.manager.claim_balance(self.hook.address(), currency)
    }

    /// Hook claims on the pool's currencies beyond what depositors can still
    /// take. Zero when the books balance.
    pub fn unaccounted(&self, key: &PoolKey) -> Result<(u128, u128), OrderBookError> {
        let (owed0, owed1) = self.hook.owed_to_depositors(&key.id())?;
        let held0 = self.hook_claims(key.currency0);
        let held1 = self.hook_claims(key.currency1);
        Ok((held0.saturating_sub(owed0), held1.saturating_sub(owed1)))
    }

    fn modify_range(
        &mut self,
        owner: Address,
        key: &PoolKey,
        params: ModifyLiquidityParams,
    ) -> Result<(BalanceDelta, BalanceDelta), OrderBookError> {
        let key = *key;
        self.transact("modify_liquidity", |manager, _| {
            manager.unlock(owner, &mut LiquiditySession::new(owner, key, params))
        })
    }

    fn transact<T>(
        &mut self,
        operation: &str,
        run: impl FnOnce(&mut PoolManager, &mut OrderBookHook) -> Result<T, OrderBookError>,
    ) -> Result<T, OrderBookError> {
        let snapshot = (self.manager.clone(), self.hook.clone());
        let mark = self.hook.journal().total_recorded();
        match run(&mut self.manager, &mut self.hook) {
            Ok(value) => {
                self.hook.journal().log_since(mark);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    operation,
                    error = %err,
                    kind = %err.kind(),
                    retryable = err.is_retryable(),
                    "Operation rolled back"
                );
                (self.manager, self.hook) = snapshot;
                Err(err)
            }
        }
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new(MarketConfig::default())
    }
}
