use crate::error::LedgerError;
use limit_order_domain::{Address, Currency};
use std::collections::HashMap;
use tracing::debug;

/// Balances of every account in every currency, native included.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balances: HashMap<(Address, Currency), u128>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, currency: Currency) -> u128 {
        self.balances
            .get(&(owner, currency))
            .copied()
            .unwrap_or_default()
    }

    /// Creates `amount` of `currency` out of thin air for `owner`.
    pub fn mint(
        &mut self,
        owner: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.credit(owner, currency, amount)?;
        debug!(owner = %owner, currency = %currency, amount, "Minted");
        Ok(())
    }

    /// Destroys `amount` of `owner`'s `currency`.
    pub fn burn(
        &mut self,
        owner: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.debit_check(owner, currency, amount)?;
        if amount == 0 {
            return Ok(());
        }
        self.debit(owner, currency, amount);
        debug!(owner = %owner, currency = %currency, amount, "Burned");
        Ok(())
    }

    /// Moves `amount` of `currency` between two accounts.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.debit_check(from, currency, amount)?;
        if amount == 0 || from == to {
            return Ok(());
        }
        let receiving = self.balance_of(to, currency);
        if receiving.checked_add(amount).is_none() {
            return Err(LedgerError::BalanceOverflow {
                owner: to,
                currency,
            });
        }
        self.debit(from, currency, amount);
        self.credit(to, currency, amount)?;
        debug!(from = %from, to = %to, currency = %currency, amount, "Transferred");
        Ok(())
    }

    fn debit_check(
        &self,
        owner: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(owner, currency);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                owner,
                currency,
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn debit(&mut self, owner: Address, currency: Currency, amount: u128) {
        if let Some(balance) = self.balances.get_mut(&(owner, currency)) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(&(owner, currency));
            }
        }
    }

    fn credit(
        &mut self,
        owner: Address,
        currency: Currency,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.balances.entry((owner, currency)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { owner, currency })?;
        Ok(())
    }
}
