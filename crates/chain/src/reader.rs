//! The chain read interface consumed by the pipeline.

use crate::types::{
    EarnedQuery, FeeAmounts, GaugeParams, PositionDetails, PrincipalAmounts, PrincipalQuery,
    TokenMetadata,
};
use anyhow::Result;
use async_trait::async_trait;
use cl_lens_domain::{Address, PoolKey, PoolSnapshot, PositionId};

/// Batched, partial-failure-tolerant reads of contract view functions.
///
/// Every batch method mirrors a multicall with per-item failure flags: the
/// outer `Result` is transport-level (the node itself unreachable), while a
/// `None` element is an individual read that reverted or failed. Output
/// vectors are always index-aligned with the input slice.
///
/// Retry policy belongs to the transport, not to callers of this trait.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Number of position tokens held directly by `owner`.
    async fn owned_position_count(&self, owner: &Address) -> Result<u64>;

    /// Token id at each enumeration index for `owner`.
    async fn owned_position_ids(
        &self,
        owner: &Address,
        indices: &[u64],
    ) -> Result<Vec<Option<PositionId>>>;

    /// Structural fields for each position id.
    async fn position_details(
        &self,
        ids: &[PositionId],
    ) -> Result<Vec<Option<PositionDetails>>>;

    /// Factory lookup of each pool key; `None` for keys with no pool.
    async fn pool_addresses(&self, keys: &[PoolKey]) -> Result<Vec<Option<Address>>>;

    /// Current pricing state of each pool.
    async fn pool_snapshots(&self, pools: &[Address]) -> Result<Vec<Option<PoolSnapshot>>>;

    /// Gauge attached to each pool. `None` also covers pools that simply
    /// have no gauge, which is a valid state rather than a failure.
    async fn gauge_addresses(&self, pools: &[Address]) -> Result<Vec<Option<Address>>>;

    /// Position ids `owner` has staked in each gauge.
    async fn staked_position_ids(
        &self,
        gauges: &[Address],
        owner: &Address,
    ) -> Result<Vec<Option<Vec<PositionId>>>>;

    /// Emission parameters of each gauge.
    async fn gauge_params(&self, gauges: &[Address]) -> Result<Vec<Option<GaugeParams>>>;

    /// Accrued, claimable reward for each (gauge, owner, position) triple.
    async fn earned(&self, queries: &[EarnedQuery]) -> Result<Vec<Option<u128>>>;

    /// Symbol and decimals for each token, each field independently
    /// fallible.
    async fn token_metadata(&self, tokens: &[Address]) -> Result<Vec<TokenMetadata>>;

    /// Exact token amounts for each position at the supplied price.
    async fn principal_amounts(
        &self,
        queries: &[PrincipalQuery],
    ) -> Result<Vec<Option<PrincipalAmounts>>>;

    /// Exact unclaimed fee amounts for each position.
    async fn unclaimed_fees(&self, ids: &[PositionId]) -> Result<Vec<Option<FeeAmounts>>>;
}
