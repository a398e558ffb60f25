//! Stage 4: gauge reward attribution for staked positions.

use crate::diagnostics::Diagnostics;
use crate::report::RewardReport;
use crate::valuation::PositionValuation;
use cl_lens_chain::{ChainReader, EarnedQuery, GaugeParams};
use cl_lens_data::PriceOracle;
use cl_lens_domain::math::liquidity::scale_raw_amount;
use cl_lens_domain::metrics::rewards::{liquidity_share, project_rewards, staking_apr};
use cl_lens_domain::{Address, DEFAULT_DECIMALS, PoolSnapshot, Position};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::warn;

/// Attaches a reward block to every staked position whose gauge data fully
/// resolved.
///
/// The block is all-or-absent: a known rate with an unknown reward token
/// or staked-liquidity denominator would imply a zero APR instead of an
/// unknown one, so partial data produces no block at all.
pub async fn attach_rewards(
    chain: &dyn ChainReader,
    oracle: &dyn PriceOracle,
    owner: &Address,
    positions: &[Position],
    snapshots: &HashMap<Address, PoolSnapshot>,
    valuations: &[PositionValuation],
    diagnostics: &mut Diagnostics,
) -> Vec<Option<RewardReport>> {
    let mut reports: Vec<Option<RewardReport>> = vec![None; positions.len()];

    // staked positions that still know their pool
    let staked: Vec<usize> = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_staked && p.pool.is_some())
        .map(|(index, _)| index)
        .collect();
    if staked.is_empty() {
        return reports;
    }

    let mut pools: Vec<Address> = Vec::new();
    for &index in &staked {
        if let Some(pool) = positions[index].pool.clone() {
            if !pools.contains(&pool) {
                pools.push(pool);
            }
        }
    }

    let gauges_by_pool = resolve_gauges(chain, &pools, diagnostics).await;
    let gauges: Vec<Address> = pools
        .iter()
        .filter_map(|pool| gauges_by_pool.get(pool).cloned())
        .collect();
    if gauges.is_empty() {
        return reports;
    }

    let params_by_gauge = resolve_params(chain, &gauges, diagnostics).await;

    // earned is read per position, independently of the rate projection
    let earned_queries: Vec<EarnedQuery> = staked
        .iter()
        .filter_map(|&index| {
            let pool = positions[index].pool.as_ref()?;
            let gauge = gauges_by_pool.get(pool)?;
            Some(EarnedQuery {
                gauge: gauge.clone(),
                owner: owner.clone(),
                position: positions[index].id,
            })
        })
        .collect();

    let reward_tokens: Vec<Address> = {
        let mut tokens = Vec::new();
        for params in params_by_gauge.values() {
            if !tokens.contains(&params.reward_token) {
                tokens.push(params.reward_token.clone());
            }
        }
        tokens
    };

    let (earned, metadata, prices) = futures::join!(
        chain.earned(&earned_queries),
        chain.token_metadata(&reward_tokens),
        oracle.usd_prices(&reward_tokens),
    );

    let earned = match earned {
        Ok(earned) => earned,
        Err(error) => {
            warn!(error = %error, "earned reads failed");
            vec![None; earned_queries.len()]
        }
    };
    diagnostics.record(
        "rewards.earned",
        earned_queries.len(),
        earned.iter().filter(|e| e.is_some()).count(),
    );

    let metadata_by_token: HashMap<Address, _> = match metadata {
        Ok(metadata) => reward_tokens.iter().cloned().zip(metadata).collect(),
        Err(error) => {
            warn!(error = %error, "reward token metadata reads failed");
            HashMap::new()
        }
    };
    let prices = match prices {
        Ok(prices) => prices,
        Err(error) => {
            warn!(error = %error, "reward token pricing failed");
            HashMap::new()
        }
    };
    diagnostics.record("rewards.prices", reward_tokens.len(), prices.len());

    // earned results align with earned_queries, which follow `staked` order
    let mut earned_iter = earned.into_iter();
    for &index in &staked {
        let position = &positions[index];
        let pool = match position.pool.as_ref() {
            Some(pool) => pool,
            None => continue,
        };
        let gauge = match gauges_by_pool.get(pool) {
            Some(gauge) => gauge,
            None => continue,
        };
        let earned_raw = earned_iter.next().flatten();
        let params = match params_by_gauge.get(gauge) {
            Some(params) => params,
            None => continue,
        };
        let snapshot = match snapshots.get(pool) {
            Some(snapshot) => snapshot,
            None => continue,
        };

        let meta = metadata_by_token.get(&params.reward_token);
        let reward_decimals = meta
            .and_then(|meta| meta.decimals)
            .unwrap_or(DEFAULT_DECIMALS);
        let reward_symbol = meta.and_then(|meta| meta.symbol.clone());

        let pool_rate = match scale_raw_amount(params.reward_rate, reward_decimals) {
            Ok(rate) => rate,
            Err(reason) => {
                warn!(gauge = %gauge, reason, "gauge rate exceeded the decimal range");
                continue;
            }
        };

        let share = liquidity_share(position.liquidity, snapshot.staked_liquidity);
        let projection = project_rewards(pool_rate, share);

        let reward_price = prices.get(&params.reward_token).copied();
        let usd_value = valuations[index]
            .valuation
            .as_ref()
            .and_then(|valuation| valuation.usd_value);

        let earned_amount =
            earned_raw.and_then(|raw| scale_raw_amount(raw, reward_decimals).ok());
        let earned_usd = match (earned_amount, reward_price) {
            (Some(amount), Some(price)) if price > Decimal::ZERO => Some(amount * price),
            _ => None,
        };
        let per_year_usd = reward_price
            .filter(|price| *price > Decimal::ZERO)
            .map(|price| projection.per_year * price);
        let apr_percent = match (reward_price, usd_value) {
            (Some(price), Some(value)) => staking_apr(projection.per_year, price, value),
            _ => None,
        };

        reports[index] = Some(RewardReport {
            reward_token: params.reward_token.clone(),
            reward_symbol,
            pool_rate_per_second: pool_rate,
            liquidity_share: share,
            projection,
            period_finish: params.period_finish,
            earned: earned_amount,
            earned_usd,
            reward_price_usd: reward_price,
            per_year_usd,
            apr_percent,
        });
    }

    reports
}

async fn resolve_gauges(
    chain: &dyn ChainReader,
    pools: &[Address],
    diagnostics: &mut Diagnostics,
) -> HashMap<Address, Address> {
    let gauges = match chain.gauge_addresses(pools).await {
        Ok(gauges) => gauges,
        Err(error) => {
            warn!(error = %error, "gauge lookup for staked pools failed");
            vec![None; pools.len()]
        }
    };
    let resolved: HashMap<Address, Address> = pools
        .iter()
        .zip(gauges)
        .filter_map(|(pool, gauge)| {
            gauge
                .filter(|gauge| !gauge.is_zero())
                .map(|gauge| (pool.clone(), gauge))
        })
        .collect();
    diagnostics.record("rewards.gauges", pools.len(), resolved.len());
    resolved
}

async fn resolve_params(
    chain: &dyn ChainReader,
    gauges: &[Address],
    diagnostics: &mut Diagnostics,
) -> HashMap<Address, GaugeParams> {
    let params = match chain.gauge_params(gauges).await {
        Ok(params) => params,
        Err(error) => {
            warn!(error = %error, "gauge parameter reads failed");
            vec![None; gauges.len()]
        }
    };
    let resolved: HashMap<Address, GaugeParams> = gauges
        .iter()
        .zip(params)
        .filter_map(|(gauge, params)| params.map(|params| (gauge.clone(), params)))
        .collect();
    diagnostics.record("rewards.params", gauges.len(), resolved.len());
    resolved
}
