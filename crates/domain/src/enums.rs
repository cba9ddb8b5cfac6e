use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a swap or of a resting order.
///
/// For a swap this is the way currencies flow through the pool. For a resting
/// order it names the conversion the order performs once filled: a
/// `ZeroForOne` order deposits currency0 above the price (a sell of
/// currency0) and is filled by swaps that push the price up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Currency0 in, currency1 out. Moves the price down.
    ZeroForOne,
    /// Currency1 in, currency0 out. Moves the price up.
    OneForZero,
}

impl Direction {
    /// Maps the conventional `zero_for_one` flag onto a direction.
    #[must_use]
    pub fn from_zero_for_one(zero_for_one: bool) -> Self {
        if zero_for_one {
            Self::ZeroForOne
        } else {
            Self::OneForZero
        }
    }

    /// Returns true for `ZeroForOne`.
    #[must_use]
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, Self::ZeroForOne)
    }

    /// The other direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::ZeroForOne => Self::OneForZero,
            Self::OneForZero => Self::ZeroForOne,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroForOne => write!(f, "zero_for_one"),
            Self::OneForZero => write!(f, "one_for_zero"),
        }
    }
}
