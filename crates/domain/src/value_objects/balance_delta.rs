use crate::error::MathError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signed pair of currency amounts seen from the caller's side of the pool.
///
/// Negative means the caller owes the pool, positive means the pool owes the
/// caller. Read amounts through the sign-checked accessors ([`owed0`],
/// [`credit0`], ...) instead of inspecting signs by hand.
///
/// [`owed0`]: BalanceDelta::owed0
/// [`credit0`]: BalanceDelta::credit0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    amount0: i128,
    amount1: i128,
}

impl BalanceDelta {
    pub const ZERO: Self = Self {
        amount0: 0,
        amount1: 0,
    };

    #[must_use]
    pub const fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }

    /// A delta where the caller owes both amounts.
    pub fn owing(amount0: u128, amount1: u128) -> Result<Self, MathError> {
        Ok(Self::new(-to_signed(amount0)?, -to_signed(amount1)?))
    }

    /// A delta where the caller is owed both amounts.
    pub fn crediting(amount0: u128, amount1: u128) -> Result<Self, MathError> {
        Ok(Self::new(to_signed(amount0)?, to_signed(amount1)?))
    }

    #[must_use]
    pub fn amount0(&self) -> i128 {
        self.amount0
    }

    #[must_use]
    pub fn amount1(&self) -> i128 {
        self.amount1
    }

    /// Currency0 the caller must pay in.
    #[must_use]
    pub fn owed0(&self) -> u128 {
        owed(self.amount0)
    }

    /// Currency1 the caller must pay in.
    #[must_use]
    pub fn owed1(&self) -> u128 {
        owed(self.amount1)
    }

    /// Currency0 the caller may take out.
    #[must_use]
    pub fn credit0(&self) -> u128 {
        credit(self.amount0)
    }

    /// Currency1 the caller may take out.
    #[must_use]
    pub fn credit1(&self) -> u128 {
        credit(self.amount1)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }

    /// At most one currency moves.
    #[must_use]
    pub fn is_one_sided(&self) -> bool {
        self.amount0 == 0 || self.amount1 == 0
    }

    pub fn checked_add(self, other: Self) -> Result<Self, MathError> {
        Ok(Self::new(
            self.amount0
                .checked_add(other.amount0)
                .ok_or(MathError::Overflow)?,
            self.amount1
                .checked_add(other.amount1)
                .ok_or(MathError::Overflow)?,
        ))
    }

    pub fn checked_neg(self) -> Result<Self, MathError> {
        Ok(Self::new(
            self.amount0.checked_neg().ok_or(MathError::Overflow)?,
            self.amount1.checked_neg().ok_or(MathError::Overflow)?,
        ))
    }
}

impl fmt::Display for BalanceDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.amount0, self.amount1)
    }
}

/// Converts an unsigned amount into the signed domain.
pub fn to_signed(amount: u128) -> Result<i128, MathError> {
    i128::try_from(amount).map_err(|_| MathError::Overflow)
}

fn owed(amount: i128) -> u128 {
    if amount < 0 { amount.unsigned_abs() } else { 0 }
}

fn credit(amount: i128) -> u128 {
    if amount > 0 { amount.unsigned_abs() } else { 0 }
}
