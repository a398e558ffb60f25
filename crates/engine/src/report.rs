//! Output record types for one refresh.
//!
//! Every field that could not be computed is omitted, never zero-filled:
//! a position with no data is distinguishable from a position worth zero.

use crate::diagnostics::Diagnostics;
use cl_lens_domain::math::liquidity::TokenAmounts;
use cl_lens_domain::math::tick_price::RangeBounds;
use cl_lens_domain::metrics::rewards::RewardProjection;
use cl_lens_domain::{Address, PoolSnapshot, Position, PositionId, Token};
use rust_decimal::Decimal;
use serde::Serialize;

/// How a position's token amounts were computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValuationSource {
    /// On-chain helper result, exact to the pool's rounding semantics.
    Exact,
    /// Closed-form computation from tick data; approximates the helper.
    Approximate,
}

/// Token amounts with their provenance and USD value.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    pub source: ValuationSource,
    pub amounts: TokenAmounts,
    /// Present when at least one of the pair's unit prices resolved; an
    /// unpriced token contributes nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<Decimal>,
}

/// Current price and configured range, in both quote directions.
#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub token1_per_token0: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token0_per_token1: Option<Decimal>,
    pub range: RangeBounds,
}

/// Unclaimed trading fees from the on-chain helper.
#[derive(Debug, Clone, Serialize)]
pub struct UnclaimedFees {
    pub amount0: Decimal,
    pub amount1: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_value: Option<Decimal>,
}

/// Reward attribution for a staked position.
///
/// The block exists only when the gauge, its rate, its reward token, and
/// the staked-liquidity denominator all resolved; a partially known reward
/// would read as a misleading zero.
#[derive(Debug, Clone, Serialize)]
pub struct RewardReport {
    pub reward_token: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_symbol: Option<String>,
    /// Gauge-wide emission rate in reward token units per second.
    pub pool_rate_per_second: Decimal,
    pub liquidity_share: Decimal,
    pub projection: RewardProjection,
    /// Unix timestamp at which the current emission period ends.
    pub period_finish: u64,
    /// Accrued, claimable reward read from the gauge; independent of the
    /// rate projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earned_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_price_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_year_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apr_percent: Option<Decimal>,
}

/// Pool-level indexer aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatsReport {
    pub tvl_usd: Decimal,
    pub volume_24h_usd: Decimal,
    pub volume_7d_usd: Decimal,
    pub fees_24h_usd: Decimal,
    pub fees_7d_usd: Decimal,
    /// Fee-based APR; distinct from the staking APR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_apr_percent: Option<Decimal>,
}

/// Lifetime position history from the indexer.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub created_at: u64,
    pub age_days: u64,
    pub deposited0: Decimal,
    pub deposited1: Decimal,
    pub withdrawn0: Decimal,
    pub withdrawn1: Decimal,
    pub collected_fees0: Decimal,
    pub collected_fees1: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposited_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected_fees_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_percent: Option<Decimal>,
}

/// One fully enriched position.
#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub id: PositionId,
    pub token0: Token,
    pub token1: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_symbol: Option<String>,
    pub tick_spacing: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub is_staked: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PoolSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token0_price_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token1_price_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unclaimed_fees: Option<UnclaimedFees>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards: Option<RewardReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_stats: Option<PoolStatsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryReport>,
}

impl PositionReport {
    /// Base report carrying only the fetched structural fields.
    #[must_use]
    pub fn from_position(position: &Position) -> Self {
        let pair_symbol = match (&position.token0.symbol, &position.token1.symbol) {
            (Some(a), Some(b)) => Some(format!("{a}/{b}")),
            _ => None,
        };
        Self {
            id: position.id,
            token0: position.token0.clone(),
            token1: position.token1.clone(),
            pair_symbol,
            tick_spacing: position.tick_spacing,
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            is_staked: position.is_staked,
            is_active: position.is_active(),
            pool: position.pool.clone(),
            snapshot: None,
            price: None,
            token0_price_usd: None,
            token1_price_usd: None,
            valuation: None,
            unclaimed_fees: None,
            rewards: None,
            pool_stats: None,
            history: None,
        }
    }
}

/// Everything one refresh produced.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub owner: Address,
    pub positions: Vec<PositionReport>,
    pub diagnostics: Diagnostics,
}
