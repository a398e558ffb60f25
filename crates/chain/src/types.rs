//! Typed results of the contract view calls the pipeline reads.

use cl_lens_domain::{Address, PositionId};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Structural fields of a position token, from the position manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDetails {
    pub token0: Address,
    pub token1: Address,
    pub tick_spacing: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
}

/// Emission parameters of a gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeParams {
    /// Reward token units emitted per second for the whole gauge, in
    /// smallest units.
    pub reward_rate: u128,
    pub reward_token: Address,
    /// Unix timestamp at which the current emission period ends.
    pub period_finish: u64,
}

/// Symbol and decimals reads for one token, each independently fallible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
}

/// Exact current token amounts for a position, from the on-chain helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalAmounts {
    pub amount0: u128,
    pub amount1: u128,
}

/// Exact unclaimed fee amounts for a position, from the on-chain helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAmounts {
    pub amount0: u128,
    pub amount1: u128,
}

/// One `principal` helper query: a position valued at a specific price.
#[derive(Debug, Clone)]
pub struct PrincipalQuery {
    pub position: PositionId,
    pub sqrt_price_x96: U256,
}

/// One `earned` query for a staked position.
#[derive(Debug, Clone)]
pub struct EarnedQuery {
    pub gauge: Address,
    pub owner: Address,
    pub position: PositionId,
}
