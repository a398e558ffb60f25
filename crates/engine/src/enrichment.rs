//! Stage 5: indexer-sourced pool stats and position history.
//!
//! This stage is best-effort: indexer unavailability degrades to omitted
//! fields and never blocks the on-chain part of the report.

use crate::diagnostics::Diagnostics;
use crate::report::{HistoryReport, PoolStatsReport};
use cl_lens_data::{IndexerApi, PoolAggregates, PositionAggregates};
use cl_lens_domain::metrics::returns::{age_in_days, pool_fee_apr, position_roi};
use cl_lens_domain::{Address, Position, PositionId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

/// Stage output: pool stats keyed by pool, one optional history per
/// position, index-aligned.
#[derive(Debug, Default)]
pub struct EnrichmentOutput {
    pub pool_stats: HashMap<Address, PoolStatsReport>,
    pub history: Vec<Option<HistoryReport>>,
}

pub async fn enrich(
    indexer: &dyn IndexerApi,
    positions: &[Position],
    token_prices: &HashMap<Address, Decimal>,
    now: u64,
    diagnostics: &mut Diagnostics,
) -> EnrichmentOutput {
    if positions.is_empty() {
        return EnrichmentOutput::default();
    }

    let mut pools: Vec<Address> = Vec::new();
    for position in positions {
        if let Some(pool) = &position.pool {
            if !pools.contains(pool) {
                pools.push(pool.clone());
            }
        }
    }
    let ids: Vec<PositionId> = positions.iter().map(|p| p.id).collect();

    let (pool_aggregates, position_aggregates) = futures::join!(
        indexer.pool_aggregates(&pools),
        indexer.position_aggregates(&ids),
    );

    let pool_aggregates = match pool_aggregates {
        Ok(aggregates) => aggregates,
        Err(error) => {
            warn!(error = %error, "pool aggregates unavailable");
            HashMap::new()
        }
    };
    diagnostics.record("indexer.pools", pools.len(), pool_aggregates.len());

    let position_aggregates = match position_aggregates {
        Ok(aggregates) => aggregates,
        Err(error) => {
            warn!(error = %error, "position aggregates unavailable");
            HashMap::new()
        }
    };
    diagnostics.record("indexer.positions", ids.len(), position_aggregates.len());

    let pool_stats = pool_aggregates
        .into_iter()
        .map(|(pool, aggregates)| (pool, pool_stats_of(aggregates)))
        .collect();

    let history = positions
        .iter()
        .map(|position| {
            position_aggregates
                .get(&position.id)
                .map(|aggregates| history_of(position, aggregates, token_prices, now))
        })
        .collect();

    EnrichmentOutput {
        pool_stats,
        history,
    }
}

fn pool_stats_of(aggregates: PoolAggregates) -> PoolStatsReport {
    PoolStatsReport {
        fee_apr_percent: pool_fee_apr(aggregates.fees_7d_usd, aggregates.tvl_usd),
        tvl_usd: aggregates.tvl_usd,
        volume_24h_usd: aggregates.volume_24h_usd,
        volume_7d_usd: aggregates.volume_7d_usd,
        fees_24h_usd: aggregates.fees_24h_usd,
        fees_7d_usd: aggregates.fees_7d_usd,
    }
}

fn history_of(
    position: &Position,
    aggregates: &PositionAggregates,
    token_prices: &HashMap<Address, Decimal>,
    now: u64,
) -> HistoryReport {
    let price0 = token_prices.get(&position.token0.address).copied();
    let price1 = token_prices.get(&position.token1.address).copied();

    let priced_sum = |amount0: Decimal, amount1: Decimal| -> Option<Decimal> {
        if price0.is_none() && price1.is_none() {
            return None;
        }
        let part0 = price0.map(|price| amount0 * price).unwrap_or_default();
        let part1 = price1.map(|price| amount1 * price).unwrap_or_default();
        Some(part0 + part1)
    };

    let deposited_usd = priced_sum(aggregates.deposited0, aggregates.deposited1);
    let collected_fees_usd = priced_sum(aggregates.collected_fees0, aggregates.collected_fees1);
    let roi_percent = match (collected_fees_usd, deposited_usd) {
        (Some(collected), Some(deposited)) => position_roi(collected, deposited),
        _ => None,
    };

    HistoryReport {
        created_at: aggregates.created_at,
        age_days: age_in_days(aggregates.created_at, now),
        deposited0: aggregates.deposited0,
        deposited1: aggregates.deposited1,
        withdrawn0: aggregates.withdrawn0,
        withdrawn1: aggregates.withdrawn1,
        collected_fees0: aggregates.collected_fees0,
        collected_fees1: aggregates.collected_fees1,
        deposited_usd,
        collected_fees_usd,
        roi_percent,
    }
}
