//! Turns signed balance deltas into concrete payments to and from the pool
//! manager.

use crate::error::OrderBookError;
use limit_order_amm::manager::PoolManager;
use limit_order_domain::{Address, BalanceDelta, Currency, PoolKey};
use tracing::debug;

/// Settles the session deltas of one locker.
///
/// Pay-ins follow the `sync` → transfer → `settle` sequence so the manager
/// credits exactly what reached its reserves; pay-outs use `take`. Credits
/// that must stay with the locker are minted as claims and redeemed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAdapter {
    locker: Address,
}

impl SettlementAdapter {
    /// Adapter settling on behalf of `locker`, the account the manager
    /// records deltas against.
    #[must_use]
    pub fn new(locker: Address) -> Self {
        Self { locker }
    }

    /// Pays `amount` of `currency` from `payer` into the manager.
    ///
    /// Fails with `UnderfundedCall` when `payer` cannot cover the amount.
    pub fn pay(
        &self,
        manager: &mut PoolManager,
        payer: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), OrderBookError> {
        if amount == 0 {
            return Ok(());
        }
        let supplied = manager.balance_of(payer, currency);
        if supplied < amount {
            return Err(OrderBookError::UnderfundedCall {
                currency,
                required: amount,
                supplied,
            });
        }
        manager.sync(currency);
        manager.transfer(payer, manager.address(), currency, amount)?;
        let paid = manager.settle(self.locker)?;
        debug!(locker = %self.locker, payer = %payer, currency = %currency, paid, "Paid in");
        Ok(())
    }

    /// Takes `amount` of `currency` out of the manager to `recipient`.
    pub fn take(
        &self,
        manager: &mut PoolManager,
        currency: Currency,
        recipient: Address,
        amount: u128,
    ) -> Result<(), OrderBookError> {
        if amount == 0 {
            return Ok(());
        }
        manager.take(self.locker, currency, recipient, amount)?;
        debug!(locker = %self.locker, recipient = %recipient, currency = %currency, amount, "Paid out");
        Ok(())
    }

    /// Pays whatever `delta` says the locker owes, from `payer`.
    pub fn settle_owed(
        &self,
        manager: &mut PoolManager,
        key: &PoolKey,
        delta: BalanceDelta,
        payer: Address,
    ) -> Result<(), OrderBookError> {
        self.pay(manager, payer, key.currency0, delta.owed0())?;
        self.pay(manager, payer, key.currency1, delta.owed1())
    }

    /// Takes whatever `delta` says the locker is owed, to `recipient`.
    pub fn take_credit(
        &self,
        manager: &mut PoolManager,
        key: &PoolKey,
        delta: BalanceDelta,
        recipient: Address,
    ) -> Result<(), OrderBookError> {
        self.take(manager, key.currency0, recipient, delta.credit0())?;
        self.take(manager, key.currency1, recipient, delta.credit1())
    }

    /// Mints whatever `delta` says the locker is owed as claims held by
    /// `holder`. Reserves are not touched, so this is safe while a swapper has
    /// yet to pay in.
    pub fn claim_credit(
        &self,
        manager: &mut PoolManager,
        key: &PoolKey,
        delta: BalanceDelta,
        holder: Address,
    ) -> Result<(), OrderBookError> {
        for (currency, amount) in [
            (key.currency0, delta.credit0()),
            (key.currency1, delta.credit1()),
        ] {
            manager.mint_claim(self.locker, currency, holder, amount)?;
        }
        Ok(())
    }

    /// Burns `amount` of `holder`'s claim in `currency` and pays it out to
    /// `recipient`.
    pub fn redeem(
        &self,
        manager: &mut PoolManager,
        currency: Currency,
        holder: Address,
        recipient: Address,
        amount: u128,
    ) -> Result<(), OrderBookError> {
        if amount == 0 {
            return Ok(());
        }
        manager.burn_claim(self.locker, currency, holder, amount)?;
        self.take(manager, currency, recipient, amount)
    }

    /// Settles both sides of `delta`: pays what is owed from `payer`, sends
    /// what is credited to `recipient`.
    pub fn settle(
        &self,
        manager: &mut PoolManager,
        key: &PoolKey,
        delta: BalanceDelta,
        payer: Address,
        recipient: Address,
    ) -> Result<(), OrderBookError> {
        self.settle_owed(manager, key, delta, payer)?;
        self.take_credit(manager, key, delta, recipient)
    }
}
