//! Stage 1: enumerate position ids held and staked by an owner.

use crate::diagnostics::Diagnostics;
use crate::error::PipelineError;
use cl_lens_chain::{ChainReader, PoolRegistry};
use cl_lens_domain::{Address, PositionId};
use std::collections::HashSet;
use tracing::warn;

/// Ids discovered for an owner, in discovery order, with the staked subset.
#[derive(Debug, Default)]
pub struct ResolvedPositions {
    pub ids: Vec<PositionId>,
    pub staked: HashSet<PositionId>,
}

/// Resolves the deduplicated union of wallet-held and gauge-staked position
/// ids.
///
/// Each side tolerates its own failures; the resolver only fails when both
/// enumerations failed at the transport level, because then there is
/// nothing left to report on.
pub async fn resolve_positions(
    chain: &dyn ChainReader,
    registry: &PoolRegistry,
    owner: &Address,
    diagnostics: &mut Diagnostics,
) -> Result<ResolvedPositions, PipelineError> {
    let (wallet_ids, wallet_error) = wallet_positions(chain, owner, diagnostics).await;
    let (staked_ids, staked_error) = staked_positions(chain, registry, owner, diagnostics).await;

    if let (Some(wallet), Some(staked)) = (&wallet_error, &staked_error) {
        return Err(PipelineError::UpstreamUnavailable(format!(
            "wallet enumeration failed ({wallet}); staked enumeration failed ({staked})"
        )));
    }

    let staked: HashSet<PositionId> = staked_ids.iter().copied().collect();
    let mut seen = HashSet::new();
    let ids: Vec<PositionId> = wallet_ids
        .into_iter()
        .chain(staked_ids)
        .filter(|id| seen.insert(*id))
        .collect();

    diagnostics.record("resolve.total", ids.len(), ids.len());
    Ok(ResolvedPositions { ids, staked })
}

/// Ids enumerable from the wallet's balance. Per-index failures are
/// skipped; a transport failure degrades the whole side.
async fn wallet_positions(
    chain: &dyn ChainReader,
    owner: &Address,
    diagnostics: &mut Diagnostics,
) -> (Vec<PositionId>, Option<String>) {
    let count = match chain.owned_position_count(owner).await {
        Ok(count) => count,
        Err(error) => {
            warn!(owner = %owner, error = %error, "wallet balance read failed");
            return (Vec::new(), Some(error.to_string()));
        }
    };
    diagnostics.record("wallet.balance", 1, 1);
    if count == 0 {
        return (Vec::new(), None);
    }

    let indices: Vec<u64> = (0..count).collect();
    match chain.owned_position_ids(owner, &indices).await {
        Ok(ids) => {
            let resolved: Vec<PositionId> = ids.into_iter().flatten().collect();
            diagnostics.record("wallet.token_ids", indices.len(), resolved.len());
            (resolved, None)
        }
        Err(error) => {
            warn!(owner = %owner, error = %error, "wallet enumeration failed");
            (Vec::new(), Some(error.to_string()))
        }
    }
}

/// Ids staked across the registry's candidate pools. Pools without a
/// gauge are valid and skipped; per-pool and per-gauge failures are
/// tolerated.
async fn staked_positions(
    chain: &dyn ChainReader,
    registry: &PoolRegistry,
    owner: &Address,
    diagnostics: &mut Diagnostics,
) -> (Vec<PositionId>, Option<String>) {
    let keys = registry.candidates();
    if keys.is_empty() {
        return (Vec::new(), None);
    }

    let pools = match chain.pool_addresses(&keys).await {
        Ok(pools) => pools,
        Err(error) => {
            warn!(error = %error, "candidate pool resolution failed");
            return (Vec::new(), Some(error.to_string()));
        }
    };
    let pools: Vec<Address> = pools
        .into_iter()
        .flatten()
        .filter(|address| !address.is_zero())
        .collect();
    diagnostics.record("gauge.pools", keys.len(), pools.len());
    if pools.is_empty() {
        return (Vec::new(), None);
    }

    let gauges = match chain.gauge_addresses(&pools).await {
        Ok(gauges) => gauges,
        Err(error) => {
            warn!(error = %error, "gauge address lookup failed");
            return (Vec::new(), Some(error.to_string()));
        }
    };
    let gauges: Vec<Address> = gauges
        .into_iter()
        .flatten()
        .filter(|address| !address.is_zero())
        .collect();
    diagnostics.record("gauge.addresses", pools.len(), gauges.len());
    if gauges.is_empty() {
        return (Vec::new(), None);
    }

    match chain.staked_position_ids(&gauges, owner).await {
        Ok(lists) => {
            let succeeded = lists.iter().filter(|list| list.is_some()).count();
            let ids: Vec<PositionId> = lists.into_iter().flatten().flatten().collect();
            diagnostics.record("gauge.staked_ids", gauges.len(), succeeded);
            (ids, None)
        }
        Err(error) => {
            warn!(error = %error, "staked id enumeration failed");
            (Vec::new(), Some(error.to_string()))
        }
    }
}
