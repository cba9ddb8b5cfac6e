pub mod balance_delta;
pub mod price;

pub use balance_delta::BalanceDelta;
pub use price::Price;
