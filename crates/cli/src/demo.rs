//! A sell order above the price, filled by a swap that sweeps through it.

use anyhow::Result;
use limit_order_domain::math::price_tick::get_sqrt_ratio_at_tick;
use limit_order_engine::prelude::*;
use tracing::info;

const SELLER: Address = Address([0xa1; 20]);
const TRADER: Address = Address([0xee; 20]);
const ORDER_TICK: i32 = 10;
const ORDER_LIQUIDITY: u128 = 1_000_000_000_000_000_000_000;
const FUNDS: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Runs the scenario and returns every event it produced.
pub fn run(config: MarketConfig) -> Result<Vec<OrderEvent>> {
    let mut market = Market::new(config);
    let key = market.pool_key(
        Currency::Token(Address::from_low_u64(0xa)),
        Currency::Token(Address::from_low_u64(0xb)),
        FeeTier::LOW,
    );
    market.initialize_pool(&key, 0)?;
    for owner in [SELLER, TRADER] {
        market.mint(owner, key.currency0, FUNDS)?;
        market.mint(owner, key.currency1, FUNDS)?;
    }

    let order = PlaceParams::new(key, ORDER_TICK, Direction::ZeroForOne, ORDER_LIQUIDITY);
    let receipt = market.place(SELLER, &order)?;
    info!(amount0 = receipt.amount0, slot = receipt.slot, "Sell order resting");

    let target = ORDER_TICK + key.tick_spacing;
    let params = SwapParams::exact_in(false, FUNDS / 1_000)
        .with_price_limit(get_sqrt_ratio_at_tick(target)?);
    let delta = market.swap(TRADER, &key, params)?;
    info!(delta = %delta, tick = market.current_tick(&key)?, "Trader swapped");

    let (amount0, amount1) = market.take(SELLER, &key, ORDER_TICK, Direction::ZeroForOne, receipt.slot)?;
    info!(amount0, amount1, "Proceeds taken");

    Ok(market.journal().events().cloned().collect())
}
