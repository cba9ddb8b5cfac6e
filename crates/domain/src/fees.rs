use serde::{Deserialize, Serialize};

/// Swap fee denominator: fees are expressed in parts per million.
pub const FEE_DENOMINATOR_PPM: u32 = 1_000_000;

/// A swap fee paired with the tick spacing conventionally used with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub fee_ppm: u32,
    pub tick_spacing: i32,
}

impl FeeTier {
    pub const LOWEST: Self = Self::new(100, 1);
    pub const LOW: Self = Self::new(500, 10);
    pub const MEDIUM: Self = Self::new(3_000, 60);
    pub const HIGH: Self = Self::new(10_000, 200);

    #[must_use]
    pub const fn new(fee_ppm: u32, tick_spacing: i32) -> Self {
        Self {
            fee_ppm,
            tick_spacing,
        }
    }

    /// Fee expressed in basis points, truncated.
    #[must_use]
    pub fn bps(&self) -> u32 {
        self.fee_ppm / 100
    }
}

impl Default for FeeTier {
    fn default() -> Self {
        Self::MEDIUM
    }
}
