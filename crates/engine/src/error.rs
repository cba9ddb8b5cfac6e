use limit_order_amm::error::AmmError;
use limit_order_domain::{Currency, MathError, PoolId};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Broad category of an [`OrderBookError`], telling the caller how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The request itself is invalid; fix the arguments or the caller.
    PreconditionViolation,
    /// Live state disagrees with the request; re-read state before resubmitting.
    StateConflict,
    /// Not enough was paid for the asset the order requires.
    UnderfundedCall,
    /// The pool manager or the math below it failed.
    Collaborator,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreconditionViolation => write!(f, "precondition violation"),
            Self::StateConflict => write!(f, "state conflict"),
            Self::UnderfundedCall => write!(f, "underfunded call"),
            Self::Collaborator => write!(f, "collaborator failure"),
        }
    }
}

/// Errors raised by the order book.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderBookError {
    #[error("tick {tick} is not a multiple of spacing {spacing}")]
    WrongTickSpacing { tick: i32, spacing: i32 },

    #[error("orders cannot rest at the live tick {0}")]
    NotAllowedAtCurrentTick(i32),

    #[error("caller is not the pool manager")]
    NotPoolManager,

    #[error("callback invoked outside of a session")]
    NotInSession,

    #[error("amount must be positive")]
    InvalidAmount,

    #[error("pool {0} is not tracked by this hook")]
    UnknownPool(PoolId),

    #[error("pool {0} is already tracked by this hook")]
    PoolAlreadyTracked(PoolId),

    #[error("order is already filled")]
    OrderAlreadyFilled,

    #[error("order is not filled yet")]
    OrderNotFilled,

    #[error("caller has no size in this order")]
    ZeroSize,

    #[error("requested {requested} but only {available} is recorded")]
    InsufficientSize { requested: u128, available: u128 },

    #[error("both currencies moved; the live tick changed")]
    StaleTick,

    #[error("order asks for {expected} but the pool wants {actual}")]
    WrongSideOfPrice { expected: Currency, actual: Currency },

    #[error("{required} of {currency} required, {supplied} supplied")]
    UnderfundedCall {
        currency: Currency,
        required: u128,
        supplied: u128,
    },

    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error(transparent)]
    Math(#[from] MathError),
}

impl OrderBookError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::WrongTickSpacing { .. }
            | Self::NotAllowedAtCurrentTick(_)
            | Self::NotPoolManager
            | Self::NotInSession
            | Self::InvalidAmount
            | Self::UnknownPool(_)
            | Self::PoolAlreadyTracked(_) => ErrorKind::PreconditionViolation,
            Self::OrderAlreadyFilled
            | Self::OrderNotFilled
            | Self::ZeroSize
            | Self::InsufficientSize { .. }
            | Self::StaleTick
            | Self::WrongSideOfPrice { .. } => ErrorKind::StateConflict,
            Self::UnderfundedCall { .. } => ErrorKind::UnderfundedCall,
            Self::Amm(_) | Self::Math(_) => ErrorKind::Collaborator,
        }
    }

    /// Whether re-reading live state and resubmitting may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleTick | Self::NotAllowedAtCurrentTick(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            OrderBookError::NotAllowedAtCurrentTick(0).kind(),
            ErrorKind::PreconditionViolation
        );
        assert_eq!(OrderBookError::NotPoolManager.kind(), ErrorKind::PreconditionViolation);
        assert_eq!(OrderBookError::StaleTick.kind(), ErrorKind::StateConflict);
        assert_eq!(OrderBookError::OrderNotFilled.kind(), ErrorKind::StateConflict);
        assert_eq!(
            OrderBookError::UnderfundedCall {
                currency: Currency::Native,
                required: 2,
                supplied: 1,
            }
            .kind(),
            ErrorKind::UnderfundedCall
        );
        assert_eq!(
            OrderBookError::from(AmmError::ManagerLocked).kind(),
            ErrorKind::Collaborator
        );
    }

    #[test]
    fn test_retryable() {
        assert!(OrderBookError::StaleTick.is_retryable());
        assert!(!OrderBookError::OrderAlreadyFilled.is_retryable());
    }
}
