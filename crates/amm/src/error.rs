use limit_order_domain::{Address, Currency, MathError, PoolId};
use thiserror::Error;

/// Errors raised by the currency ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The source account cannot cover a debit.
    #[error("{owner} holds {available} of {currency}, {requested} requested")]
    InsufficientBalance {
        owner: Address,
        currency: Currency,
        available: u128,
        requested: u128,
    },

    /// A credit would overflow the account.
    #[error("balance overflow for {owner} in {currency}")]
    BalanceOverflow { owner: Address, currency: Currency },
}

/// Errors raised by the pool manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error(transparent)]
    Math(#[from] MathError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("pool {0} is already initialized")]
    PoolAlreadyInitialized(PoolId),

    #[error("pool {0} is not initialized")]
    PoolNotInitialized(PoolId),

    #[error("currencies must be strictly sorted")]
    CurrenciesOutOfOrder,

    #[error("tick spacing {0} is not supported")]
    InvalidTickSpacing(i32),

    #[error("fee {0} ppm is not supported")]
    InvalidFee(u32),

    #[error("hook {actual} does not match pool hook {expected}")]
    HookAddressMismatch { expected: Address, actual: Address },

    #[error("invalid tick range [{lower}, {upper})")]
    InvalidTickRange { lower: i32, upper: i32 },

    #[error("tick {tick} is not a multiple of spacing {spacing}")]
    TickMisaligned { tick: i32, spacing: i32 },

    #[error("cannot poke a position without liquidity")]
    CannotUpdateEmptyPosition,

    #[error("swap amount must be positive")]
    ZeroSwapAmount,

    #[error("sqrt price limit is on the wrong side of the price or out of bounds")]
    InvalidPriceLimit,

    #[error("swap exceeded {0} steps")]
    SwapStepLimit(usize),

    #[error("manager is locked")]
    ManagerLocked,

    #[error("manager is already unlocked")]
    AlreadyUnlocked,

    #[error("settle called without a synced currency")]
    NothingSynced,

    #[error("{owner} left {delta} of {currency} unsettled")]
    CurrencyNotSettled {
        owner: Address,
        currency: Currency,
        delta: i128,
    },
}
