//! In-process concentrated-liquidity pool manager.
//!
//! This crate provides the AMM collaborator the order engine talks to:
//! - A currency ledger holding every account's balances
//! - Pool state with ticks, positions and fee growth accounting
//! - Exact-input swaps that step across initialized ticks
//! - Lock-scoped sessions that must net every currency delta to zero
//! - Hook and session-participant traits for privileged callbacks

/// Prelude module for convenient imports.
pub mod prelude;

/// Error types.
pub mod error;
/// Hook and session callback traits.
pub mod hooks;
/// Currency balances.
pub mod ledger;
/// The pool manager.
pub mod manager;
/// Pool, tick and position state.
pub mod state;
