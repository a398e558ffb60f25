//! Stage 3: token amounts, prices, and USD value.
//!
//! Two-tier valuation: the on-chain principal/fees helper is exact and
//! preferred; the closed-form decomposition steps in per position when a
//! helper read failed. Provenance is carried on the result so callers can
//! tell the two apart.

use crate::diagnostics::Diagnostics;
use crate::report::{PriceReport, UnclaimedFees, ValuationReport, ValuationSource};
use cl_lens_chain::{ChainReader, PrincipalQuery};
use cl_lens_data::PriceOracle;
use cl_lens_domain::math::liquidity::{
    TokenAmounts, position_token_amounts, scale_raw_amount,
};
use cl_lens_domain::math::tick_price::{price_pair, range_bounds};
use cl_lens_domain::{Address, PoolSnapshot, Position, PositionId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Valuation output for one position. Fields stay `None` when the data
/// they depend on was absent; absence is never rendered as zero.
#[derive(Debug, Clone, Default)]
pub struct PositionValuation {
    pub price: Option<PriceReport>,
    pub valuation: Option<ValuationReport>,
    pub unclaimed_fees: Option<UnclaimedFees>,
    pub token0_price_usd: Option<Decimal>,
    pub token1_price_usd: Option<Decimal>,
}

/// Stage output: one valuation per position, index-aligned, plus the unit
/// prices for reuse by later stages.
#[derive(Debug, Default)]
pub struct ValuationOutput {
    pub outcomes: Vec<PositionValuation>,
    pub token_prices: HashMap<Address, Decimal>,
}

pub async fn value_positions(
    chain: &dyn ChainReader,
    oracle: &dyn PriceOracle,
    positions: &[Position],
    snapshots: &HashMap<Address, PoolSnapshot>,
    diagnostics: &mut Diagnostics,
) -> ValuationOutput {
    if positions.is_empty() {
        return ValuationOutput::default();
    }

    // helper queries only make sense at a known price
    let mut principal_queries: Vec<PrincipalQuery> = Vec::new();
    let mut principal_slots: Vec<Option<usize>> = vec![None; positions.len()];
    for (index, position) in positions.iter().enumerate() {
        if let Some(snapshot) = snapshot_of(position, snapshots) {
            principal_slots[index] = Some(principal_queries.len());
            principal_queries.push(PrincipalQuery {
                position: position.id,
                sqrt_price_x96: snapshot.sqrt_price_x96,
            });
        }
    }
    let fee_ids: Vec<PositionId> = positions.iter().map(|p| p.id).collect();
    let unique_tokens = unique_pair_tokens(positions);

    let (principals, fees, prices) = futures::join!(
        chain.principal_amounts(&principal_queries),
        chain.unclaimed_fees(&fee_ids),
        oracle.usd_prices(&unique_tokens),
    );

    let principals = match principals {
        Ok(principals) => principals,
        Err(error) => {
            warn!(error = %error, "principal helper unavailable, falling back to closed form");
            vec![None; principal_queries.len()]
        }
    };
    diagnostics.record(
        "valuation.principal",
        principal_queries.len(),
        principals.iter().filter(|p| p.is_some()).count(),
    );

    let fees = match fees {
        Ok(fees) => fees,
        Err(error) => {
            warn!(error = %error, "fees helper unavailable");
            vec![None; fee_ids.len()]
        }
    };
    diagnostics.record(
        "valuation.fees",
        fee_ids.len(),
        fees.iter().filter(|f| f.is_some()).count(),
    );

    let token_prices = match prices {
        Ok(prices) => prices,
        Err(error) => {
            warn!(error = %error, "price oracle unavailable");
            HashMap::new()
        }
    };
    diagnostics.record("valuation.prices", unique_tokens.len(), token_prices.len());

    let outcomes = positions
        .iter()
        .enumerate()
        .map(|(index, position)| {
            let snapshot = snapshot_of(position, snapshots);
            let principal = principal_slots[index].and_then(|slot| principals[slot]);
            value_one(
                position,
                snapshot,
                principal,
                fees[index],
                &token_prices,
            )
        })
        .collect();

    ValuationOutput {
        outcomes,
        token_prices,
    }
}

fn value_one(
    position: &Position,
    snapshot: Option<&PoolSnapshot>,
    principal: Option<cl_lens_chain::PrincipalAmounts>,
    fees: Option<cl_lens_chain::FeeAmounts>,
    token_prices: &HashMap<Address, Decimal>,
) -> PositionValuation {
    let decimals0 = position.token0.decimals;
    let decimals1 = position.token1.decimals;
    let price0 = token_prices.get(&position.token0.address).copied();
    let price1 = token_prices.get(&position.token1.address).copied();

    let amounts = match principal {
        Some(exact) => match (
            scale_raw_amount(exact.amount0, decimals0),
            scale_raw_amount(exact.amount1, decimals1),
        ) {
            (Ok(amount0), Ok(amount1)) => Some((
                ValuationSource::Exact,
                TokenAmounts { amount0, amount1 },
            )),
            _ => {
                warn!(position = %position.id, "helper amounts exceeded the decimal range");
                fallback_amounts(position, snapshot)
            }
        },
        None => fallback_amounts(position, snapshot),
    };

    let valuation = amounts.map(|(source, amounts)| ValuationReport {
        source,
        amounts,
        usd_value: usd_value(amounts.amount0, amounts.amount1, price0, price1),
    });

    // price and range need tick data and a live position, absence stays
    // absent
    let price = snapshot.filter(|_| position.liquidity > 0).and_then(|snapshot| {
        let pair = price_pair(snapshot.current_tick, decimals0, decimals1).ok()?;
        let range =
            range_bounds(position.tick_lower, position.tick_upper, decimals0, decimals1).ok()?;
        Some(PriceReport {
            token1_per_token0: pair.token1_per_token0,
            token0_per_token1: pair.token0_per_token1,
            range,
        })
    });

    let unclaimed_fees = fees.and_then(|fees| {
        let amount0 = scale_raw_amount(fees.amount0, decimals0).ok()?;
        let amount1 = scale_raw_amount(fees.amount1, decimals1).ok()?;
        Some(UnclaimedFees {
            amount0,
            amount1,
            usd_value: usd_value(amount0, amount1, price0, price1),
        })
    });

    PositionValuation {
        price,
        valuation,
        unclaimed_fees,
        token0_price_usd: price0,
        token1_price_usd: price1,
    }
}

/// Closed-form amounts when the helper had nothing. Needs a snapshot and a
/// nonzero liquidity figure; otherwise the valuation stays absent.
fn fallback_amounts(
    position: &Position,
    snapshot: Option<&PoolSnapshot>,
) -> Option<(ValuationSource, TokenAmounts)> {
    let snapshot = snapshot?;
    if position.liquidity == 0 {
        return None;
    }
    match position_token_amounts(
        position.liquidity,
        position.tick_lower,
        position.tick_upper,
        snapshot.current_tick,
        snapshot.sqrt_price_x96,
        position.token0.decimals,
        position.token1.decimals,
    ) {
        Ok(amounts) => Some((ValuationSource::Approximate, amounts)),
        Err(reason) => {
            debug!(position = %position.id, reason, "closed-form valuation failed");
            None
        }
    }
}

/// Sums the priced contributions. `None` only when neither unit price
/// resolved; a single unpriced token contributes nothing without blocking
/// the other.
fn usd_value(
    amount0: Decimal,
    amount1: Decimal,
    price0: Option<Decimal>,
    price1: Option<Decimal>,
) -> Option<Decimal> {
    if price0.is_none() && price1.is_none() {
        return None;
    }
    let part0 = price0.map(|price| amount0 * price).unwrap_or_default();
    let part1 = price1.map(|price| amount1 * price).unwrap_or_default();
    Some(part0 + part1)
}

fn snapshot_of<'a>(
    position: &Position,
    snapshots: &'a HashMap<Address, PoolSnapshot>,
) -> Option<&'a PoolSnapshot> {
    position
        .pool
        .as_ref()
        .and_then(|pool| snapshots.get(pool))
}

fn unique_pair_tokens(positions: &[Position]) -> Vec<Address> {
    let mut tokens: Vec<Address> = Vec::new();
    for position in positions {
        for address in [&position.token0.address, &position.token1.address] {
            if !tokens.contains(address) {
                tokens.push(address.clone());
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn usd_value_needs_at_least_one_price() {
        assert_eq!(usd_value(dec!(1), dec!(2), None, None), None);
    }

    #[test]
    fn one_missing_price_contributes_nothing() {
        let value = usd_value(dec!(3), dec!(5), None, Some(dec!(2))).unwrap();
        assert_eq!(value, dec!(10));
    }

    #[test]
    fn both_prices_sum() {
        let value = usd_value(dec!(3), dec!(5), Some(dec!(4)), Some(dec!(2))).unwrap();
        assert_eq!(value, dec!(22));
    }
}
