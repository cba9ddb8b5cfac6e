//! Singleton pool manager.
//!
//! Every pool lives in one [`PoolManager`], which also custodies the pool
//! reserves in its own [`Ledger`] account. State-changing pool operations are
//! only allowed inside [`PoolManager::unlock`]; they record signed currency
//! deltas per caller that must be cleared through `sync`/`settle`, `take` or
//! claim minting before the session closes.
//!
//! Claims are balances held inside the manager. Minting one clears a credit
//! without moving reserves, which lets code running mid-swap keep its output
//! until the swapper has paid in; burning one turns it back into a credit.

use crate::error::AmmError;
use crate::hooks::{PoolHooks, SessionParticipant};
use crate::ledger::Ledger;
use crate::state::{PoolState, PositionInfo, Slot0, wrapping_add, wrapping_sub};
use limit_order_domain::fees::FEE_DENOMINATOR_PPM;
use limit_order_domain::math::concentrated_liquidity::{
    add_liquidity_delta, get_amounts_for_liquidity,
};
use limit_order_domain::math::full_math::{Q128, mul_div, to_u128};
use limit_order_domain::math::price_tick::{
    MAX_TICK, MIN_TICK, get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio, is_aligned,
    max_sqrt_ratio, min_sqrt_ratio,
};
use limit_order_domain::math::swap_math::compute_swap_step;
use limit_order_domain::value_objects::balance_delta::to_signed;
use limit_order_domain::{
    Address, BalanceDelta, Currency, MathError, PoolId, PoolKey, PositionKey, TickRange,
};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Largest tick spacing a pool may use.
pub const MAX_TICK_SPACING: i32 = 32_767;

/// Pool manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Account holding the pool reserves.
    pub address: Address,
    /// Upper bound on the steps a single swap may take.
    pub max_swap_steps: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            address: Address::from_low_u64(0x0400),
            max_swap_steps: 4_096,
        }
    }
}

impl ManagerConfig {
    /// Sets the manager address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

}

/// Arguments of [`PoolManager::modify_liquidity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifyLiquidityParams {
    pub range: TickRange,
    /// Positive to add, negative to remove.
    pub liquidity_delta: i128,
    pub salt: u64,
}

impl ModifyLiquidityParams {
    #[must_use]
    pub fn new(range: TickRange, liquidity_delta: i128, salt: u64) -> Self {
        Self {
            range,
            liquidity_delta,
            salt,
        }
    }
}

/// Arguments of [`PoolManager::swap`]. Swaps are exact-input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    pub zero_for_one: bool,
    /// Input amount, fee included.
    pub amount_in: u128,
    /// The swap stops once the sqrt price reaches this value.
    pub sqrt_price_limit_x96: U256,
}

impl SwapParams {
    /// Exact-input swap bounded only by the price range of the pool.
    #[must_use]
    pub fn exact_in(zero_for_one: bool, amount_in: u128) -> Self {
        let sqrt_price_limit_x96 = if zero_for_one {
            min_sqrt_ratio() + U256::one()
        } else {
            max_sqrt_ratio() - U256::one()
        };
        Self {
            zero_for_one,
            amount_in,
            sqrt_price_limit_x96,
        }
    }

    /// Stops the swap at `sqrt_price_limit_x96`.
    #[must_use]
    pub fn with_price_limit(mut self, sqrt_price_limit_x96: U256) -> Self {
        self.sqrt_price_limit_x96 = sqrt_price_limit_x96;
        self
    }
}

/// Holds every pool, the reserves backing them and the open session.
#[derive(Debug, Clone, Default)]
pub struct PoolManager {
    config: ManagerConfig,
    ledger: Ledger,
    claims: Ledger,
    pools: HashMap<PoolId, PoolState>,
    deltas: HashMap<(Address, Currency), i128>,
    synced: Option<(Currency, u128)>,
    unlocked: bool,
}

impl PoolManager {
    /// Creates a manager with no pools and an empty ledger.
    #[must_use]
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.config.address
    }

    #[must_use]
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, currency: Currency) -> u128 {
        self.ledger.balance_of(owner, currency)
    }

    /// Currency held by the manager on behalf of all pools.
    #[must_use]
    pub fn reserves(&self, currency: Currency) -> u128 {
        self.ledger.balance_of(self.config.address, currency)
    }

    /// Credits `amount` to `owner` without a counterparty.
    pub fn mint(&mut self, owner: Address, currency: Currency, amount: u128) -> Result<(), AmmError> {
        Ok(self.ledger.mint(owner, currency, amount)?)
    }

    /// Moves funds between two ledger accounts.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), AmmError> {
        Ok(self.ledger.transfer(from, to, currency, amount)?)
    }

    /// Claim on the reserves of `currency` held by `owner`.
    #[must_use]
    pub fn claim_balance(&self, owner: Address, currency: Currency) -> u128 {
        self.claims.balance_of(owner, currency)
    }

    /// Outstanding delta of `owner` in `currency` for the open session.
    #[must_use]
    pub fn currency_delta(&self, owner: Address, currency: Currency) -> i128 {
        self.deltas
            .get(&(owner, currency))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pool(&self, id: &PoolId) -> Option<&PoolState> {
        self.pools.get(id)
    }

    pub fn slot0(&self, id: &PoolId) -> Result<Slot0, AmmError> {
        self.pools
            .get(id)
            .map(PoolState::slot0)
            .ok_or(AmmError::PoolNotInitialized(*id))
    }

    pub fn current_tick(&self, id: &PoolId) -> Result<i32, AmmError> {
        Ok(self.slot0(id)?.tick)
    }

    #[must_use]
    pub fn position(&self, id: &PoolId, key: &PositionKey) -> Option<&PositionInfo> {
        self.pools.get(id).and_then(|pool| pool.positions.get(key))
    }

    /// Creates a pool at `sqrt_price_x96` and returns its tick.
    pub fn initialize<H: PoolHooks>(
        &mut self,
        key: PoolKey,
        sqrt_price_x96: U256,
        hooks: &mut H,
    ) -> Result<i32, H::Error> {
        validate_key(&key)?;
        check_hook(&key, hooks.address())?;

        let id = key.id();
        if self.pools.contains_key(&id) {
            return Err(AmmError::PoolAlreadyInitialized(id).into());
        }
        let tick = get_tick_at_sqrt_ratio(sqrt_price_x96).map_err(AmmError::from)?;
        self.pools
            .insert(id, PoolState::new(key, sqrt_price_x96, tick));

        info!(pool = %id, tick, fee = key.fee, spacing = key.tick_spacing, "Pool initialized");

        if key.has_hooks() {
            hooks.after_initialize(self, &key, sqrt_price_x96, tick)?;
        }
        Ok(tick)
    }

    /// Adds or removes liquidity of the position owned by `caller`.
    ///
    /// Returns the principal delta and the fees collected, both from the
    /// caller's side. Accrued fees are always collected in full; the caller's
    /// session delta grows by their sum.
    pub fn modify_liquidity(
        &mut self,
        caller: Address,
        key: &PoolKey,
        params: &ModifyLiquidityParams,
    ) -> Result<(BalanceDelta, BalanceDelta), AmmError> {
        self.require_unlocked()?;
        let range = params.range;
        check_range(range, key.tick_spacing)?;

        let id = key.id();
        let delta = params.liquidity_delta;
        let pool = self
            .pools
            .get_mut(&id)
            .ok_or(AmmError::PoolNotInitialized(id))?;

        let position_key = PositionKey::new(caller, range, params.salt);
        let position = pool
            .positions
            .get(&position_key)
            .cloned()
            .unwrap_or_default();
        if delta == 0 && position.liquidity == 0 {
            return Err(AmmError::CannotUpdateEmptyPosition);
        }
        let liquidity_after = add_liquidity_delta(position.liquidity, delta)?;

        let (mut flipped_lower, mut flipped_upper) = (false, false);
        if delta != 0 {
            flipped_lower = pool.update_tick(range.lower, delta, false)?;
            flipped_upper = pool.update_tick(range.upper, delta, true)?;
        }

        let (inside0, inside1) = pool.fee_growth_inside(range);
        let owned = U256::from(position.liquidity);
        let fees0 = to_u128(mul_div(
            wrapping_sub(inside0, position.fee_growth_inside0_last_x128),
            owned,
            Q128,
        )?)?;
        let fees1 = to_u128(mul_div(
            wrapping_sub(inside1, position.fee_growth_inside1_last_x128),
            owned,
            Q128,
        )?)?;

        if liquidity_after == 0 {
            pool.positions.remove(&position_key);
        } else {
            pool.positions.insert(
                position_key,
                PositionInfo {
                    liquidity: liquidity_after,
                    fee_growth_inside0_last_x128: inside0,
                    fee_growth_inside1_last_x128: inside1,
                },
            );
        }
        if delta < 0 {
            if flipped_lower {
                pool.clear_tick(range.lower);
            }
            if flipped_upper {
                pool.clear_tick(range.upper);
            }
        }

        let principal = if delta == 0 {
            BalanceDelta::ZERO
        } else {
            let (amount0, amount1) = get_amounts_for_liquidity(
                pool.sqrt_price_x96,
                get_sqrt_ratio_at_tick(range.lower)?,
                get_sqrt_ratio_at_tick(range.upper)?,
                delta.unsigned_abs(),
                delta > 0,
            )?;
            let (amount0, amount1) = (to_u128(amount0)?, to_u128(amount1)?);
            if range.is_in_range(pool.tick) {
                pool.liquidity = add_liquidity_delta(pool.liquidity, delta)?;
            }
            if delta > 0 {
                BalanceDelta::owing(amount0, amount1)?
            } else {
                BalanceDelta::crediting(amount0, amount1)?
            }
        };
        let fees = BalanceDelta::crediting(fees0, fees1)?;

        self.account_delta(caller, key, principal.checked_add(fees)?)?;

        debug!(
            pool = %id,
            owner = %caller,
            lower = range.lower,
            upper = range.upper,
            liquidity_delta = delta,
            principal = %principal,
            fees = %fees,
            "Liquidity modified"
        );
        Ok((principal, fees))
    }

    /// Swaps an exact input through the pool, then runs the pool's hook.
    ///
    /// The returned delta is from the caller's side: the input is owed, the
    /// output is credited.
    pub fn swap<H: PoolHooks>(
        &mut self,
        caller: Address,
        key: &PoolKey,
        params: &SwapParams,
        hooks: &mut H,
    ) -> Result<BalanceDelta, H::Error> {
        check_hook(key, hooks.address())?;
        let delta = self.swap_inner(caller, key, params)?;
        if key.has_hooks() {
            hooks.after_swap(self, caller, key, params, delta)?;
        }
        Ok(delta)
    }

    fn swap_inner(
        &mut self,
        caller: Address,
        key: &PoolKey,
        params: &SwapParams,
    ) -> Result<BalanceDelta, AmmError> {
        self.require_unlocked()?;
        if params.amount_in == 0 {
            return Err(AmmError::ZeroSwapAmount);
        }

        let id = key.id();
        let max_steps = self.config.max_swap_steps;
        let pool = self
            .pools
            .get_mut(&id)
            .ok_or(AmmError::PoolNotInitialized(id))?;

        let zero_for_one = params.zero_for_one;
        let limit = params.sqrt_price_limit_x96;
        let valid_limit = if zero_for_one {
            limit < pool.sqrt_price_x96 && limit > min_sqrt_ratio()
        } else {
            limit > pool.sqrt_price_x96 && limit < max_sqrt_ratio()
        };
        if !valid_limit {
            return Err(AmmError::InvalidPriceLimit);
        }

        let tick_before = pool.tick;
        let mut remaining = U256::from(params.amount_in);
        let mut amount_out = U256::zero();
        let mut steps = 0usize;

        while !remaining.is_zero() && pool.sqrt_price_x96 != limit {
            steps += 1;
            if steps > max_steps {
                return Err(AmmError::SwapStepLimit(max_steps));
            }

            let sqrt_price_start = pool.sqrt_price_x96;
            let (tick_next, initialized) = pool.next_initialized_tick(pool.tick, zero_for_one);
            let sqrt_price_next = get_sqrt_ratio_at_tick(tick_next)?;
            let target = if zero_for_one {
                sqrt_price_next.max(limit)
            } else {
                sqrt_price_next.min(limit)
            };

            let step = compute_swap_step(
                sqrt_price_start,
                target,
                pool.liquidity,
                remaining,
                key.fee,
            )?;
            remaining = remaining
                .checked_sub(step.amount_in + step.fee_amount)
                .ok_or(MathError::Overflow)?;
            amount_out = amount_out
                .checked_add(step.amount_out)
                .ok_or(MathError::Overflow)?;

            if pool.liquidity > 0 {
                let growth = mul_div(step.fee_amount, Q128, U256::from(pool.liquidity))?;
                if zero_for_one {
                    pool.fee_growth_global0_x128 = wrapping_add(pool.fee_growth_global0_x128, growth);
                } else {
                    pool.fee_growth_global1_x128 = wrapping_add(pool.fee_growth_global1_x128, growth);
                }
            }

            pool.sqrt_price_x96 = step.sqrt_price_next;
            if step.sqrt_price_next == sqrt_price_next {
                if initialized {
                    let net = pool.cross_tick(tick_next);
                    let net = if zero_for_one {
                        net.checked_neg().ok_or(MathError::Overflow)?
                    } else {
                        net
                    };
                    pool.liquidity = add_liquidity_delta(pool.liquidity, net)?;
                }
                pool.tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else if step.sqrt_price_next != sqrt_price_start {
                pool.tick = get_tick_at_sqrt_ratio(step.sqrt_price_next)?;
            }
        }

        let tick_after = pool.tick;
        let amount_in = to_signed(to_u128(U256::from(params.amount_in) - remaining)?)?;
        let amount_out = to_signed(to_u128(amount_out)?)?;
        let delta = if zero_for_one {
            BalanceDelta::new(-amount_in, amount_out)
        } else {
            BalanceDelta::new(amount_out, -amount_in)
        };

        self.account_delta(caller, key, delta)?;

        debug!(
            pool = %id,
            zero_for_one,
            tick_before,
            tick_after,
            delta = %delta,
            "Swapped"
        );
        Ok(delta)
    }

    /// Pays `amount` of `currency` out of the reserves to `to`, debiting the
    /// caller's session delta.
    pub fn take(
        &mut self,
        caller: Address,
        currency: Currency,
        to: Address,
        amount: u128,
    ) -> Result<(), AmmError> {
        self.require_unlocked()?;
        if amount == 0 {
            return Ok(());
        }
        self.ledger
            .transfer(self.config.address, to, currency, amount)?;
        self.account(caller, currency, -to_signed(amount)?)?;
        debug!(caller = %caller, currency = %currency, to = %to, amount, "Taken");
        Ok(())
    }

    /// Issues `amount` of `currency` to `to` as a claim, debiting the caller's
    /// session delta. Reserves stay where they are.
    pub fn mint_claim(
        &mut self,
        caller: Address,
        currency: Currency,
        to: Address,
        amount: u128,
    ) -> Result<(), AmmError> {
        self.require_unlocked()?;
        if amount == 0 {
            return Ok(());
        }
        self.claims.mint(to, currency, amount)?;
        self.account(caller, currency, -to_signed(amount)?)?;
        debug!(caller = %caller, currency = %currency, to = %to, amount, "Claim minted");
        Ok(())
    }

    /// Burns `amount` of the claim `from` holds in `currency`, crediting the
    /// caller's session delta.
    pub fn burn_claim(
        &mut self,
        caller: Address,
        currency: Currency,
        from: Address,
        amount: u128,
    ) -> Result<(), AmmError> {
        self.require_unlocked()?;
        if amount == 0 {
            return Ok(());
        }
        self.claims.burn(from, currency, amount)?;
        self.account(caller, currency, to_signed(amount)?)?;
        debug!(caller = %caller, currency = %currency, from = %from, amount, "Claim burned");
        Ok(())
    }

    /// Snapshots the reserves of `currency` ahead of a payment.
    pub fn sync(&mut self, currency: Currency) {
        self.synced = Some((currency, self.reserves(currency)));
    }

    /// Credits `caller` with whatever reached the reserves of the synced
    /// currency since [`sync`](Self::sync). Returns the amount credited.
    pub fn settle(&mut self, caller: Address) -> Result<u128, AmmError> {
        self.require_unlocked()?;
        let (currency, before) = self.synced.take().ok_or(AmmError::NothingSynced)?;
        let paid = self.reserves(currency).saturating_sub(before);
        self.account(caller, currency, to_signed(paid)?)?;
        debug!(caller = %caller, currency = %currency, paid, "Settled");
        Ok(paid)
    }

    /// Opens a session, runs `participant`, then requires every currency
    /// delta to be zero. The lock is released on every exit path.
    pub fn unlock<P: SessionParticipant>(
        &mut self,
        locker: Address,
        participant: &mut P,
    ) -> Result<P::Output, P::Error> {
        if self.unlocked {
            return Err(AmmError::AlreadyUnlocked.into());
        }
        self.unlocked = true;
        debug!(locker = %locker, "Session opened");

        let outcome = participant.on_unlock(self);
        let settled = self.close_session();

        let output = outcome?;
        settled?;
        debug!(locker = %locker, "Session closed");
        Ok(output)
    }

    fn close_session(&mut self) -> Result<(), AmmError> {
        let unsettled = self
            .deltas
            .iter()
            .min_by_key(|(key, _)| **key)
            .map(|((owner, currency), delta)| (*owner, *currency, *delta));
        self.deltas.clear();
        self.synced = None;
        self.unlocked = false;

        match unsettled {
            Some((owner, currency, delta)) => {
                warn!(owner = %owner, currency = %currency, delta, "Session left unsettled deltas");
                Err(AmmError::CurrencyNotSettled {
                    owner,
                    currency,
                    delta,
                })
            }
            None => Ok(()),
        }
    }

    fn require_unlocked(&self) -> Result<(), AmmError> {
        if self.unlocked {
            Ok(())
        } else {
            Err(AmmError::ManagerLocked)
        }
    }

    fn account_delta(
        &mut self,
        owner: Address,
        key: &PoolKey,
        delta: BalanceDelta,
    ) -> Result<(), AmmError> {
        self.account(owner, key.currency0, delta.amount0())?;
        self.account(owner, key.currency1, delta.amount1())
    }

    fn account(&mut self, owner: Address, currency: Currency, amount: i128) -> Result<(), AmmError> {
        if amount == 0 {
            return Ok(());
        }
        let entry = self.deltas.entry((owner, currency)).or_default();
        *entry = entry.checked_add(amount).ok_or(MathError::Overflow)?;
        if *entry == 0 {
            self.deltas.remove(&(owner, currency));
        }
        Ok(())
    }
}

fn validate_key(key: &PoolKey) -> Result<(), AmmError> {
    if key.currency0 >= key.currency1 {
        return Err(AmmError::CurrenciesOutOfOrder);
    }
    if !(1..=MAX_TICK_SPACING).contains(&key.tick_spacing) {
        return Err(AmmError::InvalidTickSpacing(key.tick_spacing));
    }
    if key.fee >= FEE_DENOMINATOR_PPM {
        return Err(AmmError::InvalidFee(key.fee));
    }
    Ok(())
}

fn check_hook(key: &PoolKey, actual: Address) -> Result<(), AmmError> {
    if key.has_hooks() && key.hooks != actual {
        return Err(AmmError::HookAddressMismatch {
            expected: key.hooks,
            actual,
        });
    }
    Ok(())
}

fn check_range(range: TickRange, spacing: i32) -> Result<(), AmmError> {
    if range.lower >= range.upper || range.lower < MIN_TICK || range.upper > MAX_TICK {
        return Err(AmmError::InvalidTickRange {
            lower: range.lower,
            upper: range.upper,
        });
    }
    for tick in [range.lower, range.upper] {
        if !is_aligned(tick, spacing) {
            return Err(AmmError::TickMisaligned { tick, spacing });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::hooks::NoHooks;
    use limit_order_domain::FeeTier;

    const LP: Address = Address([1u8; 20]);
    const TRADER: Address = Address([2u8; 20]);
    const TOKEN: Address = Address([7u8; 20]);

    struct Session<F>(F);

    impl<T, F> SessionParticipant for Session<F>
    where
        F: FnMut(&mut PoolManager) -> Result<T, AmmError>,
    {
        type Output = T;
        type Error = AmmError;

        fn on_unlock(&mut self, manager: &mut PoolManager) -> Result<T, AmmError> {
            (self.0)(manager)
        }
    }

    fn session<T, F>(f: F) -> Session<F>
    where
        F: FnMut(&mut PoolManager) -> Result<T, AmmError>,
    {
        Session(f)
    }

    fn key() -> PoolKey {
        PoolKey::new(
            Currency::Native,
            Currency::Token(TOKEN),
            FeeTier::LOW,
            Address::ZERO,
        )
    }

    fn setup() -> PoolManager {
        let mut manager = PoolManager::new(ManagerConfig::default());
        manager
            .initialize(key(), get_sqrt_ratio_at_tick(0).unwrap(), &mut NoHooks)
            .unwrap();
        for owner in [LP, TRADER] {
            manager.mint(owner, Currency::Native, 1_000_000_000_000).unwrap();
            manager
                .mint(owner, Currency::Token(TOKEN), 1_000_000_000_000)
                .unwrap();
        }
        manager
    }

    /// Pays what `owner` owes and takes what it is owed.
    fn clear(manager: &mut PoolManager, owner: Address) -> Result<(), AmmError> {
        for currency in [Currency::Native, Currency::Token(TOKEN)] {
            let delta = manager.currency_delta(owner, currency);
            if delta < 0 {
                manager.sync(currency);
                manager.transfer(owner, manager.address(), currency, delta.unsigned_abs())?;
                manager.settle(owner)?;
            } else if delta > 0 {
                manager.take(owner, currency, owner, delta.unsigned_abs())?;
            }
        }
        Ok(())
    }

    fn modify(manager: &mut PoolManager, range: TickRange, delta: i128) -> (BalanceDelta, BalanceDelta) {
        let params = ModifyLiquidityParams::new(range, delta, 0);
        manager
            .unlock(
                LP,
                &mut session(|m| {
                    let result = m.modify_liquidity(LP, &key(), &params)?;
                    clear(m, LP)?;
                    Ok(result)
                }),
            )
            .unwrap()
    }

    fn swap(manager: &mut PoolManager, params: SwapParams) -> BalanceDelta {
        manager
            .unlock(
                TRADER,
                &mut session(|m| {
                    let delta = m.swap(TRADER, &key(), &params, &mut NoHooks)?;
                    clear(m, TRADER)?;
                    Ok(delta)
                }),
            )
            .unwrap()
    }

    #[test]
    fn test_initialize_validates_key() {
        let mut manager = setup();
        let sqrt = get_sqrt_ratio_at_tick(0).unwrap();
        assert_eq!(
            manager.initialize(key(), sqrt, &mut NoHooks),
            Err(AmmError::PoolAlreadyInitialized(key().id()))
        );

        let mut reversed = key();
        std::mem::swap(&mut reversed.currency0, &mut reversed.currency1);
        assert_eq!(
            manager.initialize(reversed, sqrt, &mut NoHooks),
            Err(AmmError::CurrenciesOutOfOrder)
        );

        let hooked = PoolKey::new(
            Currency::Native,
            Currency::Token(TOKEN),
            FeeTier::MEDIUM,
            Address::from_low_u64(99),
        );
        assert_eq!(
            manager.initialize(hooked, sqrt, &mut NoHooks),
            Err(AmmError::HookAddressMismatch {
                expected: Address::from_low_u64(99),
                actual: Address::ZERO,
            })
        );
        assert_eq!(manager.current_tick(&key().id()).unwrap(), 0);
    }

    #[test]
    fn test_modify_requires_session() {
        let mut manager = setup();
        let params = ModifyLiquidityParams::new(TickRange::new(-10, 10), 1_000, 0);
        assert_eq!(
            manager.modify_liquidity(LP, &key(), &params),
            Err(AmmError::ManagerLocked)
        );
    }

    #[test]
    fn test_unsettled_session_fails_and_relocks() {
        let mut manager = setup();
        let params = ModifyLiquidityParams::new(TickRange::new(-10, 10), 1_000_000, 0);
        let result = manager.unlock(
            LP,
            &mut session(|m| m.modify_liquidity(LP, &key(), &params)),
        );

        assert!(matches!(result, Err(AmmError::CurrencyNotSettled { owner, .. }) if owner == LP));
        assert!(!manager.is_unlocked());
        assert_eq!(manager.currency_delta(LP, Currency::Native), 0);
    }

    #[test]
    fn test_nested_unlock_is_rejected() {
        let mut manager = setup();
        let result = manager.unlock(
            LP,
            &mut session(|m| {
                m.unlock(LP, &mut session(|_| Ok(())))
            }),
        );
        assert_eq!(result, Err(AmmError::AlreadyUnlocked));
        assert!(!manager.is_unlocked());
    }

    #[test]
    fn test_claims_hold_credit_until_redeemed() {
        let mut manager = setup();
        let token = Currency::Token(TOKEN);
        assert_eq!(
            manager.mint_claim(LP, token, LP, 1),
            Err(AmmError::ManagerLocked)
        );

        manager
            .unlock(
                LP,
                &mut session(|m| {
                    m.sync(token);
                    m.transfer(LP, m.address(), token, 500)?;
                    m.settle(LP)?;
                    m.mint_claim(LP, token, LP, 500)
                }),
            )
            .unwrap();
        assert_eq!(manager.claim_balance(LP, token), 500);
        assert_eq!(manager.reserves(token), 500);

        manager
            .unlock(
                LP,
                &mut session(|m| {
                    m.burn_claim(LP, token, LP, 200)?;
                    m.take(LP, token, TRADER, 200)
                }),
            )
            .unwrap();
        assert_eq!(manager.claim_balance(LP, token), 300);
        assert_eq!(manager.reserves(token), 300);
        assert_eq!(manager.balance_of(TRADER, token), 1_000_000_000_200);

        let overdrawn = manager.unlock(LP, &mut session(|m| m.burn_claim(LP, token, LP, 301)));
        assert!(matches!(
            overdrawn,
            Err(AmmError::Ledger(LedgerError::InsufficientBalance { available: 300, .. }))
        ));
        assert_eq!(manager.claim_balance(LP, token), 300);
    }

    #[test]
    fn test_single_sided_deposits() {
        let mut manager = setup();

        let (above, _) = modify(&mut manager, TickRange::new(10, 20), 1_000_000);
        assert!(above.owed0() > 0);
        assert_eq!(above.amount1(), 0);

        let (below, _) = modify(&mut manager, TickRange::new(-20, -10), 1_000_000);
        assert_eq!(below.amount0(), 0);
        assert!(below.owed1() > 0);

        assert_eq!(manager.reserves(Currency::Native), above.owed0());
        assert_eq!(manager.reserves(Currency::Token(TOKEN)), below.owed1());
        // Out-of-range liquidity is not active.
        assert_eq!(manager.pool(&key().id()).unwrap().liquidity, 0);
    }

    #[test]
    fn test_round_trip_returns_principal() {
        let mut manager = setup();
        let range = TickRange::new(-100, 100);
        let (added, _) = modify(&mut manager, range, 5_000_000);
        let (removed, fees) = modify(&mut manager, range, -5_000_000);

        assert!(fees.is_zero());
        assert!(added.owed0() - removed.credit0() <= 1);
        assert!(added.owed1() - removed.credit1() <= 1);
        assert!(manager.pool(&key().id()).unwrap().ticks.is_empty());
    }

    #[test]
    fn test_swap_accrues_fees_to_in_range_liquidity() {
        let mut manager = setup();
        let range = TickRange::new(-1_000, 1_000);
        modify(&mut manager, range, 1_000_000_000);

        let delta = swap(&mut manager, SwapParams::exact_in(true, 1_000_000));
        assert_eq!(delta.owed0(), 1_000_000);
        assert!(delta.credit1() > 0 && delta.credit1() < 1_000_000);
        assert!(manager.current_tick(&key().id()).unwrap() < 0);

        let (_, fees) = modify(&mut manager, range, -1_000_000_000);
        // 0.05% of the input, less rounding.
        assert!(fees.credit0() >= 499 && fees.credit0() <= 501);
        assert_eq!(fees.credit1(), 0);
    }

    #[test]
    fn test_swap_through_range_converts_position() {
        let mut manager = setup();
        let range = TickRange::new(10, 20);
        let (added, _) = modify(&mut manager, range, 1_000_000_000_000);

        let limit = get_sqrt_ratio_at_tick(30).unwrap();
        let delta = swap(
            &mut manager,
            SwapParams::exact_in(false, 1_000_000_000).with_price_limit(limit),
        );
        // The limit stops the swap before the whole input is used.
        assert!(delta.owed1() < 1_000_000_000);
        assert_eq!(manager.current_tick(&key().id()).unwrap(), 30);
        assert_eq!(manager.pool(&key().id()).unwrap().liquidity, 0);
        // Everything deposited was bought out, minus rounding.
        assert!(added.owed0() - delta.credit0() <= 1);

        let (principal, fees) = modify(&mut manager, range, -1_000_000_000_000);
        assert_eq!(principal.amount0(), 0);
        assert!(principal.credit1() > 0);
        assert!(fees.credit1() > 0);
        assert!(principal.credit1() + fees.credit1() <= delta.owed1());
    }

    #[test]
    fn test_swap_price_limit_is_validated() {
        let mut manager = setup();
        let params = SwapParams::exact_in(true, 10).with_price_limit(get_sqrt_ratio_at_tick(5).unwrap());
        let result = manager.unlock(
            TRADER,
            &mut session(|m| m.swap(TRADER, &key(), &params, &mut NoHooks)),
        );
        assert_eq!(result, Err(AmmError::InvalidPriceLimit));
    }

    struct RecordingHook {
        address: Address,
        seen_ticks: Vec<i32>,
    }

    impl PoolHooks for RecordingHook {
        type Error = AmmError;

        fn address(&self) -> Address {
            self.address
        }

        fn after_initialize(
            &mut self,
            _manager: &mut PoolManager,
            _key: &PoolKey,
            _sqrt_price_x96: U256,
            tick: i32,
        ) -> Result<(), AmmError> {
            self.seen_ticks.push(tick);
            Ok(())
        }

        fn after_swap(
            &mut self,
            manager: &mut PoolManager,
            _sender: Address,
            key: &PoolKey,
            _params: &SwapParams,
            _delta: BalanceDelta,
        ) -> Result<(), AmmError> {
            self.seen_ticks.push(manager.current_tick(&key.id())?);
            Ok(())
        }
    }

    #[test]
    fn test_hooks_observe_final_state() {
        let mut manager = setup();
        let mut hook = RecordingHook {
            address: Address::from_low_u64(0xbeef),
            seen_ticks: Vec::new(),
        };
        let hooked = PoolKey::new(
            Currency::Native,
            Currency::Token(TOKEN),
            FeeTier::LOW,
            hook.address,
        );
        manager
            .initialize(hooked, get_sqrt_ratio_at_tick(0).unwrap(), &mut hook)
            .unwrap();

        let limit = get_sqrt_ratio_at_tick(40).unwrap();
        let params = SwapParams::exact_in(false, 1_000).with_price_limit(limit);
        manager
            .unlock(
                TRADER,
                &mut session(|m| {
                    m.swap(TRADER, &hooked, &params, &mut hook)?;
                    clear(m, TRADER)
                }),
            )
            .unwrap();

        assert_eq!(hook.seen_ticks, vec![0, 40]);
    }
}
