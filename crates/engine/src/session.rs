//! Session commands handed to the hook's dispatch routine.
//!
//! `place`, `cancel` and `take` build a [`SessionCommand`], wrap it with the hook in a
//! [`HookSession`] and pass that to `PoolManager::unlock`. The command is
//! consumed on the first dispatch and dropped with the session on every exit
//! path; nothing about it outlives the call.

use crate::error::OrderBookError;
use crate::hook::OrderBookHook;
use limit_order_amm::hooks::SessionParticipant;
use limit_order_amm::manager::PoolManager;
use limit_order_domain::{Address, BalanceDelta, Direction, PoolKey};

/// Work the hook performs while the manager is unlocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Adds liquidity over `[tick, tick + spacing)` and pays for it.
    AddLiquidity {
        key: PoolKey,
        tick: i32,
        direction: Direction,
        liquidity: u128,
        /// Depositor paying for a token deposit.
        sender: Address,
        /// Native value already moved into the hook's custody for this call.
        native_value: u128,
    },
    /// Removes liquidity over `[tick, tick + spacing)` and pays the principal
    /// to `recipient`.
    RemoveLiquidity {
        key: PoolKey,
        tick: i32,
        direction: Direction,
        liquidity: u128,
        recipient: Address,
    },
    /// Pays `amount0`/`amount1` out of the hook's claims to `recipient`.
    Redeem {
        key: PoolKey,
        recipient: Address,
        amount0: u128,
        amount1: u128,
    },
}

/// What a dispatched command did, from the hook's side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Principal paid in (negative) or withdrawn (positive).
    pub principal: BalanceDelta,
    /// Fees collected into the hook's claims.
    pub fees: BalanceDelta,
}

/// Pairs the hook with one command for a single `unlock`.
pub struct HookSession<'a> {
    hook: &'a mut OrderBookHook,
    command: Option<SessionCommand>,
}

impl<'a> HookSession<'a> {
    #[must_use]
    pub fn new(hook: &'a mut OrderBookHook, command: SessionCommand) -> Self {
        Self {
            hook,
            command: Some(command),
        }
    }
}

impl SessionParticipant for HookSession<'_> {
    type Output = SessionOutcome;
    type Error = OrderBookError;

    fn on_unlock(&mut self, manager: &mut PoolManager) -> Result<SessionOutcome, OrderBookError> {
        let command = self.command.take().ok_or(OrderBookError::NotInSession)?;
        self.hook.dispatch(manager, command)
    }
}
