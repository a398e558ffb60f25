use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Pricing state of a pool captured once per refresh.
///
/// All figures derived for a position are computed from a single snapshot;
/// tick and sqrt price are never mixed across reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub current_tick: i32,
    /// Square root of the pool price in Q64.96 fixed point.
    pub sqrt_price_x96: U256,
    /// Total in-range liquidity across all positions.
    pub liquidity: u128,
    /// Liquidity staked into the pool's gauge; the denominator for reward
    /// attribution.
    pub staked_liquidity: u128,
}
