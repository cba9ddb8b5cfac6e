//! Configuration for the order book and the market around it.

use limit_order_amm::manager::ManagerConfig;
use limit_order_domain::Address;
use serde::{Deserialize, Serialize};

/// Order book hook configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookConfig {
    /// Address the hook is deployed at; pools route through it via
    /// `PoolKey::hooks`.
    pub address: Address,
    /// The only pool manager allowed to invoke the hook's callbacks.
    pub manager: Address,
    /// Maximum number of events kept in the journal.
    pub event_retention: usize,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            address: Address::from_low_u64(0x1000),
            manager: ManagerConfig::default().address,
            event_retention: 10_000,
        }
    }
}

impl OrderBookConfig {
    /// Sets the hook address.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    /// Sets the trusted pool manager.
    #[must_use]
    pub fn with_manager(mut self, manager: Address) -> Self {
        self.manager = manager;
        self
    }

    /// Sets the journal retention.
    #[must_use]
    pub fn with_event_retention(mut self, retention: usize) -> Self {
        self.event_retention = retention;
        self
    }
}

/// Configuration of a [`Market`](crate::market::Market).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Pool manager settings.
    pub manager: ManagerConfig,
    /// Order book settings.
    pub order_book: OrderBookConfig,
    /// Address the market's swap and liquidity router acts under.
    pub router: Address,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            manager: ManagerConfig::default(),
            order_book: OrderBookConfig::default(),
            router: Address::from_low_u64(0x0500),
        }
    }
}

impl MarketConfig {
    /// Sets the pool manager settings and points the order book at it.
    #[must_use]
    pub fn with_manager(mut self, manager: ManagerConfig) -> Self {
        self.order_book.manager = manager.address;
        self.manager = manager;
        self
    }

    /// Sets the order book settings.
    #[must_use]
    pub fn with_order_book(mut self, order_book: OrderBookConfig) -> Self {
        self.order_book = order_book;
        self
    }

    /// Sets the router address.
    #[must_use]
    pub fn with_router(mut self, router: Address) -> Self {
        self.router = router;
        self
    }
}
