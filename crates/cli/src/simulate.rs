//! Random participants trading against resting orders along a simulated
//! price path.

use crate::price_path::{GeometricBrownianMotion, PricePathGenerator};
use anyhow::{Result, bail};
use limit_order_domain::math::price_tick::{align_tick_down, get_sqrt_ratio_at_tick, price_to_tick};
use limit_order_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info};

const TRADER: Address = Address([0xee; 20]);
const BACKGROUND_LP: Address = Address([0xbb; 20]);
const FUNDS: u128 = 1_000_000_000_000_000_000_000_000_000_000;
const BACKGROUND_LIQUIDITY: u128 = 1_000_000_000_000_000_000_000;
const TICK_BOUND: i32 = 9_000;

/// Knobs of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub steps: usize,
    pub participants: u64,
    pub seed: u64,
    /// Annualized volatility of the price path.
    pub volatility: f64,
    /// Probability per step and participant of acting at all.
    pub activity: f64,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub steps: usize,
    pub swaps: u64,
    pub placed: u64,
    pub canceled: u64,
    pub filled: u64,
    pub taken: u64,
    pub rejected: u64,
    pub final_tick: i32,
    /// Currency held by the hook for claims that were never taken.
    pub dust: (u128, u128),
}

#[derive(Debug, Clone, Copy)]
struct OpenOrder {
    owner: Address,
    tick: i32,
    direction: Direction,
    slot: u64,
}

pub fn run(config: MarketConfig, params: &SimulationParams) -> Result<SimulationSummary> {
    let mut market = Market::new(config);
    let key = market.pool_key(
        Currency::Token(Address::from_low_u64(0xa)),
        Currency::Token(Address::from_low_u64(0xb)),
        FeeTier::LOW,
    );
    market.initialize_pool(&key, 0)?;

    let participants: Vec<Address> = (0..params.participants)
        .map(|n| Address::from_low_u64(0x2000 + n))
        .collect();
    for owner in participants.iter().chain([&TRADER, &BACKGROUND_LP]) {
        market.mint(*owner, key.currency0, FUNDS)?;
        market.mint(*owner, key.currency1, FUNDS)?;
    }
    let bound = align_tick_down(TICK_BOUND, key.tick_spacing);
    market.add_liquidity(
        BACKGROUND_LP,
        &key,
        TickRange::new(-bound - key.tick_spacing, bound + key.tick_spacing),
        BACKGROUND_LIQUIDITY,
    )?;

    let mut path = GeometricBrownianMotion::new(
        Decimal::ONE,
        0.0,
        params.volatility,
        1.0 / 8_760.0,
        params.seed,
    );
    let prices = path.generate(params.steps)?;
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut summary = SimulationSummary {
        steps: params.steps,
        ..SimulationSummary::default()
    };
    let mut open: Vec<OpenOrder> = Vec::new();
    let mut filled: Vec<OpenOrder> = Vec::new();

    for price in prices.iter().skip(1) {
        for owner in &participants {
            if !rng.random_bool(params.activity) {
                continue;
            }
            match rng.random_range(0..3) {
                0 => place(&mut market, &key, *owner, &mut rng, &mut open, &mut summary),
                1 => cancel(&mut market, &key, *owner, &mut open, &mut summary),
                _ => take(&mut market, &key, *owner, &mut filled, &mut summary),
            }
        }

        let target = price_to_tick(price.value)?.clamp(-bound, bound);
        if swap_to(&mut market, &key, target)? {
            summary.swaps += 1;
        }

        let (now_filled, still_open): (Vec<_>, Vec<_>) = open.into_iter().partition(|order| {
            market
                .bucket(&key, order.tick, order.direction, order.slot)
                .is_some_and(|bucket| bucket.filled)
        });
        summary.filled += now_filled.len() as u64;
        filled.extend(now_filled);
        open = still_open;
    }

    for order in open.drain(..) {
        market.cancel(order.owner, &key, order.tick, order.direction)?;
        summary.canceled += 1;
    }
    for order in filled.drain(..) {
        market.take(order.owner, &key, order.tick, order.direction, order.slot)?;
        summary.taken += 1;
    }

    let unaccounted = market.unaccounted(&key)?;
    if unaccounted != (0, 0) {
        bail!("hook holds unaccounted balance {unaccounted:?}");
    }
    summary.dust = market.hook().owed_to_depositors(&key.id())?;
    summary.final_tick = market.current_tick(&key)?;
    info!(
        swaps = summary.swaps,
        placed = summary.placed,
        filled = summary.filled,
        final_tick = summary.final_tick,
        "Simulation finished"
    );
    Ok(summary)
}

fn place(
    market: &mut Market,
    key: &PoolKey,
    owner: Address,
    rng: &mut StdRng,
    open: &mut Vec<OpenOrder>,
    summary: &mut SimulationSummary,
) {
    let Some(last_tick) = market.hook().last_tick(&key.id()) else {
        return;
    };
    let offset = rng.random_range(1..=10) * key.tick_spacing;
    let (tick, direction) = if rng.random_bool(0.5) {
        (last_tick + offset, Direction::ZeroForOne)
    } else {
        (last_tick - offset, Direction::OneForZero)
    };
    let liquidity = rng.random_range(1_000_000_000_000_000_000u128..=100_000_000_000_000_000_000);

    match market.place(owner, &PlaceParams::new(*key, tick, direction, liquidity)) {
        Ok(receipt) => {
            summary.placed += 1;
            let order = OpenOrder {
                owner,
                tick,
                direction,
                slot: receipt.slot,
            };
            if !open.iter().any(|o| same_position(o, &order)) {
                open.push(order);
            }
        }
        Err(err) => {
            debug!(owner = %owner, tick, error = %err, "Placement rejected");
            summary.rejected += 1;
        }
    }
}

fn cancel(
    market: &mut Market,
    key: &PoolKey,
    owner: Address,
    open: &mut Vec<OpenOrder>,
    summary: &mut SimulationSummary,
) {
    let Some(index) = open.iter().position(|order| order.owner == owner) else {
        return;
    };
    let order = open.swap_remove(index);
    match market.cancel(owner, key, order.tick, order.direction) {
        Ok(_) => summary.canceled += 1,
        Err(err) => {
            debug!(owner = %owner, tick = order.tick, error = %err, "Cancel rejected");
            summary.rejected += 1;
            open.push(order);
        }
    }
}

fn take(
    market: &mut Market,
    key: &PoolKey,
    owner: Address,
    filled: &mut Vec<OpenOrder>,
    summary: &mut SimulationSummary,
) {
    let Some(index) = filled.iter().position(|order| order.owner == owner) else {
        return;
    };
    let order = filled.swap_remove(index);
    match market.take(owner, key, order.tick, order.direction, order.slot) {
        Ok(_) => summary.taken += 1,
        Err(err) => {
            debug!(owner = %owner, tick = order.tick, error = %err, "Take rejected");
            summary.rejected += 1;
        }
    }
}

/// Moves the price to `target`. Returns false when it is already there.
fn swap_to(market: &mut Market, key: &PoolKey, target: i32) -> Result<bool> {
    let current = market.current_tick(key)?;
    if target == current {
        return Ok(false);
    }
    let params = SwapParams::exact_in(target < current, FUNDS / 1_000)
        .with_price_limit(get_sqrt_ratio_at_tick(target)?);
    market.swap(TRADER, key, params)?;
    Ok(true)
}

fn same_position(a: &OpenOrder, b: &OpenOrder) -> bool {
    a.owner == b.owner && a.tick == b.tick && a.direction == b.direction && a.slot == b.slot
}
