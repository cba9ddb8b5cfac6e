use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account or contract address.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Used as "no hooks" in pool keys.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Builds an address whose trailing eight bytes hold `value`.
    #[must_use]
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Returns true for the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// An asset that can be held in the ledger.
///
/// `Native` orders before every token, so a native pool always has it as
/// `currency0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// The chain's native asset.
    Native,
    /// A fungible token identified by its contract address.
    Token(Address),
}

impl Currency {
    /// Returns true for the native asset.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Token(address) => write!(f, "{address}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        let address = Address::from_low_u64(0xabcd);
        assert_eq!(
            address.to_string(),
            "0x000000000000000000000000000000000000abcd"
        );
        assert!(!address.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_native_sorts_first() {
        let token = Currency::Token(Address::from_low_u64(1));
        assert!(Currency::Native < token);
        assert!(Currency::Native.is_native());
        assert!(!token.is_native());
    }
}
