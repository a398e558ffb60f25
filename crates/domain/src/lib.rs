//! Core domain model for concentrated-liquidity position analytics.
//!
//! Entities, tick-grid math, and derived financial metrics. Everything in
//! this crate is pure and synchronous; fetching lives in the chain and data
//! crates.

pub mod entities;
pub mod math;
pub mod metrics;

pub use entities::pool::PoolSnapshot;
pub use entities::position::{PoolKey, Position, PositionId};
pub use entities::token::{Address, AddressParseError, Token, DEFAULT_DECIMALS};
