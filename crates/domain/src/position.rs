use crate::token::Address;
use serde::{Deserialize, Serialize};

/// Half-open tick interval `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    pub lower: i32,
    pub upper: i32,
}

impl TickRange {
    #[must_use]
    pub fn new(lower: i32, upper: i32) -> Self {
        Self { lower, upper }
    }

    /// The single spacing-wide interval starting at `lower`.
    #[must_use]
    pub fn single(lower: i32, tick_spacing: i32) -> Self {
        Self {
            lower,
            upper: lower + tick_spacing,
        }
    }

    /// Whether the current tick sits inside the interval.
    #[must_use]
    pub fn is_in_range(&self, current_tick: i32) -> bool {
        current_tick >= self.lower && current_tick < self.upper
    }
}

/// Identifies one liquidity position inside a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub owner: Address,
    pub range: TickRange,
    /// Lets one owner hold several positions over the same range.
    pub salt: u64,
}

impl PositionKey {
    #[must_use]
    pub fn new(owner: Address, range: TickRange, salt: u64) -> Self {
        Self { owner, range, salt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_membership() {
        let range = TickRange::single(10, 10);
        assert_eq!(range.upper, 20);
        assert!(range.is_in_range(10));
        assert!(range.is_in_range(19));
        assert!(!range.is_in_range(20));
        assert!(!range.is_in_range(9));
    }
}
