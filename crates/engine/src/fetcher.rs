//! Stage 2: structural fields, pool state, and token metadata.

use crate::diagnostics::Diagnostics;
use crate::error::PipelineError;
use crate::resolver::ResolvedPositions;
use cl_lens_chain::{ChainReader, PositionDetails, TokenMetadata};
use cl_lens_domain::{Address, DEFAULT_DECIMALS, PoolKey, PoolSnapshot, Position, PositionId, Token};
use std::collections::HashMap;
use tracing::warn;

/// Everything stage 2 produced: positions plus one snapshot per pool.
#[derive(Debug, Default)]
pub struct FetchedState {
    pub positions: Vec<Position>,
    pub snapshots: HashMap<Address, PoolSnapshot>,
}

/// Fetches structural fields for every id, resolves pools, and reads one
/// snapshot per unique pool plus metadata per unique token.
///
/// Per-item failures leave the dependent fields absent. Positions whose
/// tick bounds are inverted are rejected outright; that datum is
/// contradictory rather than missing.
pub async fn fetch_details(
    chain: &dyn ChainReader,
    resolved: &ResolvedPositions,
    diagnostics: &mut Diagnostics,
) -> Result<FetchedState, PipelineError> {
    if resolved.ids.is_empty() {
        return Ok(FetchedState::default());
    }

    let details = chain.position_details(&resolved.ids).await.map_err(|error| {
        PipelineError::UpstreamUnavailable(format!("position details read failed: {error}"))
    })?;
    diagnostics.record(
        "positions.details",
        resolved.ids.len(),
        details.iter().filter(|d| d.is_some()).count(),
    );

    let raw = screen_details(&resolved.ids, details, diagnostics);

    // unique pool keys in first-seen order
    let mut keys: Vec<PoolKey> = Vec::new();
    for (_, details) in &raw {
        let key = pool_key_of(details);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let pools_by_key = resolve_pools(chain, &keys, diagnostics).await;
    let unique_pools: Vec<Address> = keys
        .iter()
        .filter_map(|key| pools_by_key.get(key).cloned())
        .collect();

    let unique_tokens = unique_tokens_of(&raw);
    let (snapshots, metadata) = futures::join!(
        chain.pool_snapshots(&unique_pools),
        chain.token_metadata(&unique_tokens),
    );

    let snapshots = collect_snapshots(&unique_pools, snapshots, diagnostics);
    let metadata = collect_metadata(&unique_tokens, metadata, diagnostics);

    let positions = raw
        .into_iter()
        .map(|(id, details)| {
            let key = pool_key_of(&details);
            Position {
                id,
                token0: token_of(&details.token0, &metadata),
                token1: token_of(&details.token1, &metadata),
                tick_spacing: details.tick_spacing,
                tick_lower: details.tick_lower,
                tick_upper: details.tick_upper,
                liquidity: details.liquidity,
                is_staked: resolved.staked.contains(&id),
                pool: pools_by_key.get(&key).cloned(),
            }
        })
        .collect();

    Ok(FetchedState {
        positions,
        snapshots,
    })
}

/// Drops failed reads and rejects inverted tick ranges.
fn screen_details(
    ids: &[PositionId],
    details: Vec<Option<PositionDetails>>,
    diagnostics: &mut Diagnostics,
) -> Vec<(PositionId, PositionDetails)> {
    let mut kept = Vec::new();
    let mut rejected = 0usize;
    for (&id, details) in ids.iter().zip(details) {
        match details {
            Some(details) if details.tick_lower < details.tick_upper => {
                kept.push((id, details));
            }
            Some(details) => {
                rejected += 1;
                warn!(
                    position = %id,
                    tick_lower = details.tick_lower,
                    tick_upper = details.tick_upper,
                    "rejected position with inverted tick range"
                );
            }
            None => {}
        }
    }
    if rejected > 0 {
        diagnostics.record("positions.rejected_tick_range", rejected, 0);
    }
    kept
}

async fn resolve_pools(
    chain: &dyn ChainReader,
    keys: &[PoolKey],
    diagnostics: &mut Diagnostics,
) -> HashMap<PoolKey, Address> {
    if keys.is_empty() {
        return HashMap::new();
    }
    let addresses = match chain.pool_addresses(keys).await {
        Ok(addresses) => addresses,
        Err(error) => {
            warn!(error = %error, "factory pool resolution failed");
            vec![None; keys.len()]
        }
    };
    let resolved: HashMap<PoolKey, Address> = keys
        .iter()
        .zip(addresses)
        .filter_map(|(key, address)| {
            address
                .filter(|address| !address.is_zero())
                .map(|address| (key.clone(), address))
        })
        .collect();
    diagnostics.record("pools.resolve", keys.len(), resolved.len());
    resolved
}

fn collect_snapshots(
    pools: &[Address],
    snapshots: anyhow::Result<Vec<Option<PoolSnapshot>>>,
    diagnostics: &mut Diagnostics,
) -> HashMap<Address, PoolSnapshot> {
    let snapshots = match snapshots {
        Ok(snapshots) => snapshots,
        Err(error) => {
            warn!(error = %error, "pool snapshot read failed");
            vec![None; pools.len()]
        }
    };
    let collected: HashMap<Address, PoolSnapshot> = pools
        .iter()
        .zip(snapshots)
        .filter_map(|(pool, snapshot)| snapshot.map(|snapshot| (pool.clone(), snapshot)))
        .collect();
    diagnostics.record("pools.snapshots", pools.len(), collected.len());
    collected
}

fn collect_metadata(
    tokens: &[Address],
    metadata: anyhow::Result<Vec<TokenMetadata>>,
    diagnostics: &mut Diagnostics,
) -> HashMap<Address, TokenMetadata> {
    let metadata = match metadata {
        Ok(metadata) => metadata,
        Err(error) => {
            warn!(error = %error, "token metadata read failed");
            vec![TokenMetadata::default(); tokens.len()]
        }
    };
    let succeeded = metadata.iter().filter(|m| m.decimals.is_some()).count();
    diagnostics.record("tokens.metadata", tokens.len(), succeeded);
    tokens.iter().cloned().zip(metadata).collect()
}

fn unique_tokens_of(raw: &[(PositionId, PositionDetails)]) -> Vec<Address> {
    let mut tokens: Vec<Address> = Vec::new();
    for (_, details) in raw {
        for address in [&details.token0, &details.token1] {
            if !tokens.contains(address) {
                tokens.push(address.clone());
            }
        }
    }
    tokens
}

fn pool_key_of(details: &PositionDetails) -> PoolKey {
    PoolKey {
        token0: details.token0.clone(),
        token1: details.token1.clone(),
        tick_spacing: details.tick_spacing,
    }
}

fn token_of(address: &Address, metadata: &HashMap<Address, TokenMetadata>) -> Token {
    let meta = metadata.get(address).cloned().unwrap_or_default();
    Token::new(
        address.clone(),
        meta.symbol,
        meta.decimals.unwrap_or(DEFAULT_DECIMALS),
    )
}
