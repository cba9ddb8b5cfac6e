//! The order book hook.
//!
//! Users rest single-sided liquidity at a tick through [`OrderBookHook::place`].
//! Every swap on a tracked pool runs [`PoolHooks::after_swap`], which withdraws
//! each bucket the price fully swept through and keeps the proceeds as claims
//! on the manager until depositors [`take`](OrderBookHook::take) them.

use crate::bucket::{Bucket, BucketKey, BucketStore};
use crate::config::OrderBookConfig;
use crate::error::OrderBookError;
use crate::lifecycle::{CanceledData, EventJournal, FilledData, PlacedData, TakenData};
use crate::session::{HookSession, SessionCommand, SessionOutcome};
use crate::settlement::SettlementAdapter;
use crate::tick_tracker::TickTracker;
use limit_order_amm::hooks::PoolHooks;
use limit_order_amm::manager::{ModifyLiquidityParams, PoolManager, SwapParams};
use limit_order_domain::math::price_tick::is_aligned;
use limit_order_domain::value_objects::balance_delta::to_signed;
use limit_order_domain::{
    Address, BalanceDelta, Currency, Direction, MathError, PoolId, PoolKey, TickRange,
};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A request to rest liquidity at one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceParams {
    pub key: PoolKey,
    /// Lower tick of the interval; must be aligned to the pool's spacing.
    pub tick: i32,
    pub direction: Direction,
    pub liquidity: u128,
    /// Native currency attached to the call. Whatever the deposit does not
    /// use is refunded.
    pub native_value: u128,
}

impl PlaceParams {
    #[must_use]
    pub fn new(key: PoolKey, tick: i32, direction: Direction, liquidity: u128) -> Self {
        Self {
            key,
            tick,
            direction,
            liquidity,
            native_value: 0,
        }
    }

    /// Attaches native value to the call.
    #[must_use]
    pub fn with_native_value(mut self, value: u128) -> Self {
        self.native_value = value;
        self
    }
}

/// Result of a successful placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceReceipt {
    /// Generation the deposit landed in.
    pub slot: u64,
    /// Currency0 paid in.
    pub amount0: u128,
    /// Currency1 paid in.
    pub amount1: u128,
    /// Native value returned to the sender.
    pub refund: u128,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub slot: u64,
    /// Liquidity withdrawn.
    pub liquidity: u128,
    pub principal0: u128,
    pub principal1: u128,
    /// Fees paid to the canceler; zero unless it drained the bucket.
    pub fees0: u128,
    pub fees1: u128,
    /// Whether the bucket's carry-over was swept to the canceler.
    pub swept: bool,
}

/// Hook owning every resting order of the pools routed through it.
#[derive(Debug, Clone)]
pub struct OrderBookHook {
    config: OrderBookConfig,
    pools: HashMap<PoolId, PoolKey>,
    buckets: BucketStore,
    ticks: TickTracker,
    journal: EventJournal,
}

impl OrderBookHook {
    #[must_use]
    pub fn new(config: OrderBookConfig) -> Self {
        let journal = EventJournal::new(config.event_retention);
        Self {
            config,
            pools: HashMap::new(),
            buckets: BucketStore::new(),
            ticks: TickTracker::new(),
            journal,
        }
    }

    #[must_use]
    pub fn config(&self) -> &OrderBookConfig {
        &self.config
    }

    #[must_use]
    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    #[must_use]
    pub fn buckets(&self) -> &BucketStore {
        &self.buckets
    }

    /// Key of a pool routed through this hook.
    #[must_use]
    pub fn pool_key(&self, pool: &PoolId) -> Option<&PoolKey> {
        self.pools.get(pool)
    }

    /// Aligned tick the pool was last observed at.
    #[must_use]
    pub fn last_tick(&self, pool: &PoolId) -> Option<i32> {
        self.ticks.last_tick(pool)
    }

    #[must_use]
    pub fn active_slot(&self, key: &BucketKey) -> u64 {
        self.buckets.active_slot(key)
    }

    #[must_use]
    pub fn bucket(&self, key: &BucketKey, slot: u64) -> Option<&Bucket> {
        self.buckets.bucket(key, slot)
    }

    #[must_use]
    pub fn size_of(&self, key: &BucketKey, slot: u64, depositor: Address) -> u128 {
        self.buckets.size_of(key, slot, depositor)
    }

    /// What [`take`](Self::take) would pay `depositor` right now.
    pub fn claimable(
        &self,
        key: &BucketKey,
        slot: u64,
        depositor: Address,
    ) -> Result<(u128, u128), OrderBookError> {
        self.buckets.claimable(key, slot, depositor)
    }

    /// Claims the hook must keep for depositors of `pool`: unclaimed fill
    /// proceeds plus retained fees.
    pub fn owed_to_depositors(&self, pool: &PoolId) -> Result<(u128, u128), OrderBookError> {
        self.buckets
            .iter()
            .filter(|(key, _, _)| key.pool == *pool)
            .try_fold(
                (0u128, 0u128),
                |(owed0, owed1), (_, _, bucket)| -> Result<(u128, u128), OrderBookError> {
                    Ok((
                        owed0.checked_add(bucket.amount0).ok_or(MathError::Overflow)?,
                        owed1.checked_add(bucket.amount1).ok_or(MathError::Overflow)?,
                    ))
                },
            )
    }

    /// Rests `params.liquidity` over `[tick, tick + spacing)` on behalf of
    /// `sender`.
    pub fn place(
        &mut self,
        manager: &mut PoolManager,
        sender: Address,
        params: &PlaceParams,
    ) -> Result<PlaceReceipt, OrderBookError> {
        let key = params.key;
        let id = self.tracked(&key)?;
        if !is_aligned(params.tick, key.tick_spacing) {
            return Err(OrderBookError::WrongTickSpacing {
                tick: params.tick,
                spacing: key.tick_spacing,
            });
        }
        let last_tick = self
            .ticks
            .last_tick(&id)
            .ok_or(OrderBookError::UnknownPool(id))?;
        if params.tick == last_tick {
            return Err(OrderBookError::NotAllowedAtCurrentTick(params.tick));
        }
        if params.liquidity == 0 {
            return Err(OrderBookError::InvalidAmount);
        }

        if params.native_value > 0 {
            let supplied = manager.balance_of(sender, Currency::Native);
            if supplied < params.native_value {
                return Err(OrderBookError::UnderfundedCall {
                    currency: Currency::Native,
                    required: params.native_value,
                    supplied,
                });
            }
            manager.transfer(sender, self.address(), Currency::Native, params.native_value)?;
        }

        let command = SessionCommand::AddLiquidity {
            key,
            tick: params.tick,
            direction: params.direction,
            liquidity: params.liquidity,
            sender,
            native_value: params.native_value,
        };
        let hook = self.address();
        let outcome = manager.unlock(hook, &mut HookSession::new(self, command))?;
        let (amount0, amount1) = (outcome.principal.owed0(), outcome.principal.owed1());

        let native_paid = if key.currency0.is_native() { amount0 } else { 0 };
        let refund = params
            .native_value
            .checked_sub(native_paid)
            .ok_or(MathError::Overflow)?;
        if refund > 0 {
            manager.transfer(self.address(), sender, Currency::Native, refund)?;
        }

        let bucket_key = BucketKey::new(id, params.tick, params.direction);
        let slot = self
            .buckets
            .add_liquidity(bucket_key, sender, params.liquidity)?;
        if !outcome.fees.is_zero() {
            self.buckets.retain_fees(
                bucket_key,
                slot,
                outcome.fees.credit0(),
                outcome.fees.credit1(),
            )?;
        }

        self.journal.record_placed(
            &bucket_key,
            slot,
            PlacedData {
                depositor: sender,
                liquidity: params.liquidity,
                amount0,
                amount1,
            },
        );
        Ok(PlaceReceipt {
            slot,
            amount0,
            amount1,
            refund,
        })
    }

    /// Withdraws the whole size `sender` holds in the active bucket.
    ///
    /// Fees the withdrawal collects stay in the bucket while other depositors
    /// remain. The cancellation that drains the bucket receives its own fees
    /// plus everything retained so far.
    pub fn cancel(
        &mut self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
    ) -> Result<CancelReceipt, OrderBookError> {
        let id = self.tracked(key)?;
        let bucket_key = BucketKey::new(id, tick, direction);
        let slot = self.buckets.active_slot(&bucket_key);
        if self
            .buckets
            .bucket(&bucket_key, slot)
            .is_some_and(|bucket| bucket.filled)
        {
            return Err(OrderBookError::OrderAlreadyFilled);
        }

        let size = self.buckets.size_of(&bucket_key, slot, sender);
        if size == 0 {
            let filled_earlier =
                (0..slot).any(|earlier| self.buckets.size_of(&bucket_key, earlier, sender) > 0);
            return Err(if filled_earlier {
                OrderBookError::OrderAlreadyFilled
            } else {
                OrderBookError::ZeroSize
            });
        }

        let command = SessionCommand::RemoveLiquidity {
            key: *key,
            tick,
            direction,
            liquidity: size,
            recipient: sender,
        };
        let hook = self.address();
        let outcome = manager.unlock(hook, &mut HookSession::new(self, command))?;

        let remaining = self.buckets.remove_liquidity(bucket_key, sender, size)?;
        let (fees0, fees1) = (outcome.fees.credit0(), outcome.fees.credit1());
        let swept = remaining == 0;
        let (paid0, paid1) = if swept {
            let (carry0, carry1) = self.buckets.sweep_carry_over(&bucket_key, slot);
            let total0 = carry0.checked_add(fees0).ok_or(MathError::Overflow)?;
            let total1 = carry1.checked_add(fees1).ok_or(MathError::Overflow)?;
            self.pay_out(manager, key, sender, total0, total1)?;
            (total0, total1)
        } else {
            self.buckets.retain_fees(bucket_key, slot, fees0, fees1)?;
            (0, 0)
        };

        let receipt = CancelReceipt {
            slot,
            liquidity: size,
            principal0: outcome.principal.credit0(),
            principal1: outcome.principal.credit1(),
            fees0: paid0,
            fees1: paid1,
            swept,
        };
        self.journal.record_canceled(
            &bucket_key,
            slot,
            CanceledData {
                depositor: sender,
                liquidity: size,
                principal0: receipt.principal0,
                principal1: receipt.principal1,
                fees0: paid0,
                fees1: paid1,
                swept,
            },
        );
        Ok(receipt)
    }

    /// Pays `sender` its pro-rata share of a filled generation.
    pub fn take(
        &mut self,
        manager: &mut PoolManager,
        sender: Address,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
        slot: u64,
    ) -> Result<(u128, u128), OrderBookError> {
        let id = self.tracked(key)?;
        let bucket_key = BucketKey::new(id, tick, direction);
        let (amount0, amount1) = self.buckets.claim(&bucket_key, slot, sender)?;
        self.pay_out(manager, key, sender, amount0, amount1)?;

        self.journal.record_taken(
            &bucket_key,
            slot,
            TakenData {
                depositor: sender,
                amount0,
                amount1,
            },
        );
        Ok((amount0, amount1))
    }

    /// Executes a session command. Only reachable through
    /// [`PoolManager::unlock`] via [`HookSession`].
    pub(crate) fn dispatch(
        &mut self,
        manager: &mut PoolManager,
        command: SessionCommand,
    ) -> Result<SessionOutcome, OrderBookError> {
        self.ensure_manager(manager)?;
        if !manager.is_unlocked() {
            return Err(OrderBookError::NotInSession);
        }
        let hook = self.address();
        let adapter = SettlementAdapter::new(hook);

        match command {
            SessionCommand::AddLiquidity {
                key,
                tick,
                direction,
                liquidity,
                sender,
                native_value,
            } => {
                let params = ModifyLiquidityParams::new(
                    TickRange::single(tick, key.tick_spacing),
                    to_signed(liquidity)?,
                    position_salt(direction),
                );
                let (principal, fees) = manager.modify_liquidity(hook, &key, &params)?;
                if principal.amount0() != 0 && principal.amount1() != 0 {
                    warn!(pool = %key.id(), tick, delta = %principal, "Deposit is two-sided");
                    return Err(OrderBookError::StaleTick);
                }

                let (owed_currency, owed) = if principal.owed0() > 0 {
                    (key.currency0, principal.owed0())
                } else if principal.owed1() > 0 {
                    (key.currency1, principal.owed1())
                } else {
                    return Err(OrderBookError::InvalidAmount);
                };
                let expected = key.input_currency(direction.is_zero_for_one());
                if owed_currency != expected {
                    return Err(OrderBookError::WrongSideOfPrice {
                        expected,
                        actual: owed_currency,
                    });
                }

                if owed_currency.is_native() {
                    if native_value < owed {
                        return Err(OrderBookError::UnderfundedCall {
                            currency: owed_currency,
                            required: owed,
                            supplied: native_value,
                        });
                    }
                    adapter.pay(manager, hook, owed_currency, owed)?;
                } else {
                    adapter.pay(manager, sender, owed_currency, owed)?;
                }
                adapter.claim_credit(manager, &key, fees, hook)?;
                Ok(SessionOutcome { principal, fees })
            }
            SessionCommand::RemoveLiquidity {
                key,
                tick,
                direction,
                liquidity,
                recipient,
            } => {
                let params = ModifyLiquidityParams::new(
                    TickRange::single(tick, key.tick_spacing),
                    -to_signed(liquidity)?,
                    position_salt(direction),
                );
                let (principal, fees) = manager.modify_liquidity(hook, &key, &params)?;
                adapter.take_credit(manager, &key, principal, recipient)?;
                adapter.claim_credit(manager, &key, fees, hook)?;
                Ok(SessionOutcome { principal, fees })
            }
            SessionCommand::Redeem {
                key,
                recipient,
                amount0,
                amount1,
            } => {
                adapter.redeem(manager, key.currency0, hook, recipient, amount0)?;
                adapter.redeem(manager, key.currency1, hook, recipient, amount1)?;
                Ok(SessionOutcome::default())
            }
        }
    }

    /// Converts the active bucket at `tick` if it holds liquidity. Returns
    /// whether anything was filled.
    fn fill(
        &mut self,
        manager: &mut PoolManager,
        key: &PoolKey,
        tick: i32,
        direction: Direction,
    ) -> Result<bool, OrderBookError> {
        let bucket_key = BucketKey::new(key.id(), tick, direction);
        let slot = self.buckets.active_slot(&bucket_key);
        let liquidity = match self.buckets.bucket(&bucket_key, slot) {
            Some(bucket) if bucket.liquidity > 0 => bucket.liquidity,
            _ => return Ok(false),
        };
        self.buckets.advance_slot(bucket_key);

        let hook = self.address();
        let params = ModifyLiquidityParams::new(
            TickRange::single(tick, key.tick_spacing),
            -to_signed(liquidity)?,
            position_salt(direction),
        );
        let (principal, fees) = manager.modify_liquidity(hook, key, &params)?;
        let proceeds = principal.checked_add(fees)?;
        // The swapper has not paid in yet, so the proceeds stay as claims.
        SettlementAdapter::new(hook).claim_credit(manager, key, proceeds, hook)?;
        self.buckets
            .record_fill(bucket_key, slot, proceeds.credit0(), proceeds.credit1())?;

        self.journal.record_filled(
            &bucket_key,
            slot,
            FilledData {
                liquidity,
                amount0: proceeds.credit0(),
                amount1: proceeds.credit1(),
            },
        );
        Ok(true)
    }

    /// Redeems the hook's claims for `to` in a session of its own.
    fn pay_out(
        &mut self,
        manager: &mut PoolManager,
        key: &PoolKey,
        to: Address,
        amount0: u128,
        amount1: u128,
    ) -> Result<(), OrderBookError> {
        if amount0 == 0 && amount1 == 0 {
            return Ok(());
        }
        let command = SessionCommand::Redeem {
            key: *key,
            recipient: to,
            amount0,
            amount1,
        };
        let hook = self.address();
        manager.unlock(hook, &mut HookSession::new(self, command))?;
        Ok(())
    }

    fn tracked(&self, key: &PoolKey) -> Result<PoolId, OrderBookError> {
        let id = key.id();
        if self.ticks.is_tracked(&id) {
            Ok(id)
        } else {
            Err(OrderBookError::UnknownPool(id))
        }
    }

    fn ensure_manager(&self, manager: &PoolManager) -> Result<(), OrderBookError> {
        if manager.address() == self.config.manager {
            Ok(())
        } else {
            warn!(caller = %manager.address(), "Callback from an unknown pool manager");
            Err(OrderBookError::NotPoolManager)
        }
    }
}

impl PoolHooks for OrderBookHook {
    type Error = OrderBookError;

    fn address(&self) -> Address {
        self.config.address
    }

    fn after_initialize(
        &mut self,
        manager: &mut PoolManager,
        key: &PoolKey,
        _sqrt_price_x96: U256,
        tick: i32,
    ) -> Result<(), OrderBookError> {
        self.ensure_manager(manager)?;
        let id = key.id();
        self.ticks.record_initial_tick(id, tick, key.tick_spacing)?;
        self.pools.insert(id, *key);
        debug!(pool = %id, tick, "Pool tracked");
        Ok(())
    }

    fn after_swap(
        &mut self,
        manager: &mut PoolManager,
        _sender: Address,
        key: &PoolKey,
        params: &SwapParams,
        _delta: BalanceDelta,
    ) -> Result<(), OrderBookError> {
        self.ensure_manager(manager)?;
        let id = self.tracked(key)?;
        let spacing = key.tick_spacing;
        let new_tick = manager.current_tick(&id)?;
        // A swap pushing the price up fills orders resting above it, which
        // are the ones selling currency0, and vice versa.
        let direction = Direction::from_zero_for_one(params.zero_for_one).opposite();

        if let Some((lower, upper)) = self.ticks.compute_crossed_range(&id, new_tick, spacing)? {
            let mut filled = 0usize;
            for tick in (lower..=upper).step_by(spacing.unsigned_abs() as usize) {
                if self.fill(manager, key, tick, direction)? {
                    filled += 1;
                }
            }
            debug!(pool = %id, lower, upper, direction = %direction, filled, "Crossed range scanned");
        }
        self.ticks.update_tick(id, new_tick, spacing)
    }
}

/// Salt separating the hook's two positions over the same interval.
fn position_salt(direction: Direction) -> u64 {
    match direction {
        Direction::ZeroForOne => 0,
        Direction::OneForZero => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::SwapSession;
    use limit_order_amm::manager::ManagerConfig;
    use limit_order_domain::FeeTier;
    use limit_order_domain::math::price_tick::get_sqrt_ratio_at_tick;

    const DEPOSITOR: Address = Address([0xa1; 20]);

    fn key(hook: &OrderBookHook) -> PoolKey {
        PoolKey::new(
            Currency::Token(Address([7u8; 20])),
            Currency::Token(Address([8u8; 20])),
            FeeTier::LOW,
            hook.address(),
        )
    }

    fn tracked() -> (PoolManager, OrderBookHook, PoolKey) {
        let mut manager = PoolManager::new(ManagerConfig::default());
        let mut hook = OrderBookHook::new(OrderBookConfig::default());
        let key = key(&hook);
        let sqrt = get_sqrt_ratio_at_tick(25).unwrap();
        let tick = manager.initialize(key, sqrt, &mut hook).unwrap();
        assert_eq!(tick, 25);
        (manager, hook, key)
    }

    #[test]
    fn test_after_initialize_records_aligned_tick() {
        let (_, hook, key) = tracked();
        assert_eq!(hook.last_tick(&key.id()), Some(20));
        assert_eq!(hook.pool_key(&key.id()), Some(&key));
    }

    #[test]
    fn test_rejects_unknown_manager() {
        let mut manager =
            PoolManager::new(ManagerConfig::default().with_address(Address::from_low_u64(0x9999)));
        let mut hook = OrderBookHook::new(OrderBookConfig::default());
        let key = key(&hook);
        let sqrt = get_sqrt_ratio_at_tick(0).unwrap();
        assert_eq!(
            manager.initialize(key, sqrt, &mut hook),
            Err(OrderBookError::NotPoolManager)
        );
        assert!(hook.last_tick(&key.id()).is_none());

        let (_, mut tracked_hook, tracked_key) = tracked();
        let params = SwapParams::exact_in(true, 1);
        assert_eq!(
            tracked_hook.after_swap(&mut manager, DEPOSITOR, &tracked_key, &params, BalanceDelta::ZERO),
            Err(OrderBookError::NotPoolManager)
        );
    }

    #[test]
    fn test_dispatch_requires_open_session() {
        let (mut manager, mut hook, key) = tracked();
        let command = SessionCommand::RemoveLiquidity {
            key,
            tick: 40,
            direction: Direction::ZeroForOne,
            liquidity: 1,
            recipient: DEPOSITOR,
        };
        assert_eq!(
            hook.dispatch(&mut manager, command),
            Err(OrderBookError::NotInSession)
        );
    }

    #[test]
    fn test_two_sided_deposit_is_stale() {
        let (mut manager, mut hook, key) = tracked();
        let router = Address::from_low_u64(0x0300);
        let params =
            SwapParams::exact_in(true, 1_000).with_price_limit(get_sqrt_ratio_at_tick(5).unwrap());
        let moved = manager
            .unlock(router, &mut SwapSession::new(router, router, key, params, &mut hook))
            .unwrap();
        assert!(moved.is_zero());
        assert_eq!(manager.current_tick(&key.id()), Ok(5));
        assert_eq!(hook.last_tick(&key.id()), Some(0));

        let command = SessionCommand::AddLiquidity {
            key,
            tick: 0,
            direction: Direction::ZeroForOne,
            liquidity: 1_000_000_000_000_000_000,
            sender: DEPOSITOR,
            native_value: 0,
        };
        let address = hook.address();
        assert_eq!(
            manager.unlock(address, &mut HookSession::new(&mut hook, command)),
            Err(OrderBookError::StaleTick)
        );
        assert!(!manager.is_unlocked());
    }

    #[test]
    fn test_place_on_untracked_pool() {
        let (mut manager, mut hook, key) = tracked();
        let mut other = key;
        other.fee = 3_000;
        let params = PlaceParams::new(other, 40, Direction::ZeroForOne, 1_000);
        assert_eq!(
            hook.place(&mut manager, DEPOSITOR, &params),
            Err(OrderBookError::UnknownPool(other.id()))
        );
        assert_eq!(
            hook.take(&mut manager, DEPOSITOR, &other, 40, Direction::ZeroForOne, 0),
            Err(OrderBookError::UnknownPool(other.id()))
        );
    }

    #[test]
    fn test_directions_use_separate_positions() {
        assert_ne!(
            position_salt(Direction::ZeroForOne),
            position_salt(Direction::OneForZero)
        );
    }

    #[test]
    fn test_owed_to_depositors_starts_empty() {
        let (_, hook, key) = tracked();
        assert_eq!(hook.owed_to_depositors(&key.id()), Ok((0, 0)));
    }
}
