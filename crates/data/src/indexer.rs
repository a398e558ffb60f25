//! Indexer (subgraph) client for pool and position aggregates.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use cl_lens_domain::{Address, PositionId};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

/// Trailing pool-level aggregates, all USD denominated.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolAggregates {
    pub tvl_usd: Decimal,
    pub volume_24h_usd: Decimal,
    pub volume_7d_usd: Decimal,
    pub fees_24h_usd: Decimal,
    pub fees_7d_usd: Decimal,
}

/// Lifetime aggregates of one position, in human token units.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionAggregates {
    /// Timestamp of the creation transaction.
    pub created_at: u64,
    pub deposited0: Decimal,
    pub deposited1: Decimal,
    pub withdrawn0: Decimal,
    pub withdrawn1: Decimal,
    pub collected_fees0: Decimal,
    pub collected_fees1: Decimal,
}

/// Query-by-id-list access to the indexer.
///
/// Batches tolerate unknown ids; ids the indexer does not know are simply
/// absent from the result maps.
#[async_trait]
pub trait IndexerApi: Send + Sync {
    async fn pool_aggregates(
        &self,
        pools: &[Address],
    ) -> Result<HashMap<Address, PoolAggregates>>;

    async fn position_aggregates(
        &self,
        ids: &[PositionId],
    ) -> Result<HashMap<PositionId, PositionAggregates>>;
}

const POOL_QUERY: &str = r#"
query PoolAggregates($ids: [String!]!) {
  pools(where: { id_in: $ids }) {
    id
    totalValueLockedUSD
    poolDayData(first: 7, orderBy: date, orderDirection: desc) {
      volumeUSD
      feesUSD
    }
  }
}
"#;

const POSITION_QUERY: &str = r#"
query PositionAggregates($ids: [String!]!) {
  positions(where: { id_in: $ids }) {
    id
    depositedToken0
    depositedToken1
    withdrawnToken0
    withdrawnToken1
    collectedFeesToken0
    collectedFeesToken1
    transaction { timestamp }
    token0 { decimals }
    token1 { decimals }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PoolsData {
    pools: Vec<PoolDto>,
}

#[derive(Debug, Deserialize)]
struct PoolDto {
    id: String,
    #[serde(rename = "totalValueLockedUSD")]
    total_value_locked_usd: String,
    #[serde(rename = "poolDayData", default)]
    pool_day_data: Vec<DayBucketDto>,
}

#[derive(Debug, Deserialize)]
struct DayBucketDto {
    #[serde(rename = "volumeUSD")]
    volume_usd: String,
    #[serde(rename = "feesUSD")]
    fees_usd: String,
}

#[derive(Debug, Deserialize)]
struct PositionsData {
    positions: Vec<PositionDto>,
}

#[derive(Debug, Deserialize)]
struct PositionDto {
    id: String,
    #[serde(rename = "depositedToken0")]
    deposited_token0: String,
    #[serde(rename = "depositedToken1")]
    deposited_token1: String,
    #[serde(rename = "withdrawnToken0")]
    withdrawn_token0: String,
    #[serde(rename = "withdrawnToken1")]
    withdrawn_token1: String,
    #[serde(rename = "collectedFeesToken0")]
    collected_fees_token0: String,
    #[serde(rename = "collectedFeesToken1")]
    collected_fees_token1: String,
    transaction: Option<TransactionDto>,
    token0: Option<IndexedTokenDto>,
    token1: Option<IndexedTokenDto>,
}

#[derive(Debug, Deserialize)]
struct TransactionDto {
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct IndexedTokenDto {
    decimals: String,
}

/// Numeric strings from the indexer default to zero, matching the
/// best-effort contract of this stage.
fn parse_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or(Decimal::ZERO)
}

/// Scales a raw smallest-unit figure down by `decimals`.
fn shift_down(value: Decimal, decimals: u32) -> Decimal {
    Decimal::try_from_i128_with_scale(1, decimals)
        .map(|unit| value * unit)
        .unwrap_or(Decimal::ZERO)
}

fn fold_pool(dto: PoolDto) -> Option<(Address, PoolAggregates)> {
    let address: Address = match dto.id.parse() {
        Ok(address) => address,
        Err(_) => {
            warn!(id = %dto.id, "indexer returned an unparseable pool id");
            return None;
        }
    };
    let buckets = &dto.pool_day_data;
    let latest = buckets.first();
    let aggregates = PoolAggregates {
        tvl_usd: parse_decimal(&dto.total_value_locked_usd),
        volume_24h_usd: latest
            .map(|b| parse_decimal(&b.volume_usd))
            .unwrap_or_default(),
        fees_24h_usd: latest
            .map(|b| parse_decimal(&b.fees_usd))
            .unwrap_or_default(),
        volume_7d_usd: buckets.iter().map(|b| parse_decimal(&b.volume_usd)).sum(),
        fees_7d_usd: buckets.iter().map(|b| parse_decimal(&b.fees_usd)).sum(),
    };
    Some((address, aggregates))
}

fn fold_position(dto: PositionDto) -> Option<(PositionId, PositionAggregates)> {
    let id = match dto.id.parse::<u64>() {
        Ok(id) => PositionId(id),
        Err(_) => {
            warn!(id = %dto.id, "indexer returned an unparseable position id");
            return None;
        }
    };
    let created_at = dto
        .transaction
        .and_then(|t| t.timestamp.parse::<u64>().ok())
        .unwrap_or(0);
    let decimals = |token: &Option<IndexedTokenDto>| {
        token
            .as_ref()
            .and_then(|t| t.decimals.parse::<u32>().ok())
            .unwrap_or(18)
    };
    let decimals0 = decimals(&dto.token0);
    let decimals1 = decimals(&dto.token1);
    let aggregates = PositionAggregates {
        created_at,
        deposited0: shift_down(parse_decimal(&dto.deposited_token0), decimals0),
        deposited1: shift_down(parse_decimal(&dto.deposited_token1), decimals1),
        withdrawn0: shift_down(parse_decimal(&dto.withdrawn_token0), decimals0),
        withdrawn1: shift_down(parse_decimal(&dto.withdrawn_token1), decimals1),
        collected_fees0: shift_down(parse_decimal(&dto.collected_fees_token0), decimals0),
        collected_fees1: shift_down(parse_decimal(&dto.collected_fees_token1), decimals1),
    };
    Some((id, aggregates))
}

/// GraphQL-over-HTTP indexer client.
pub struct SubgraphClient {
    endpoint: String,
    client: reqwest::Client,
}

impl SubgraphClient {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, ids: Vec<String>) -> Result<T> {
        let body = json!({ "query": query, "variables": { "ids": ids } });
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("indexer request failed")?
            .error_for_status()
            .context("indexer rejected the request")?;
        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .context("indexer response was not valid JSON")?;
        if let Some(error) = envelope.errors.first() {
            bail!("indexer query error: {}", error.message);
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("indexer response carried no data"))
    }
}

#[async_trait]
impl IndexerApi for SubgraphClient {
    async fn pool_aggregates(
        &self,
        pools: &[Address],
    ) -> Result<HashMap<Address, PoolAggregates>> {
        if pools.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = pools.iter().map(|p| p.as_str().to_owned()).collect();
        let data: PoolsData = self.execute(POOL_QUERY, ids).await?;
        Ok(data.pools.into_iter().filter_map(fold_pool).collect())
    }

    async fn position_aggregates(
        &self,
        ids: &[PositionId],
    ) -> Result<HashMap<PositionId, PositionAggregates>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids = ids.iter().map(|id| id.to_string()).collect();
        let data: PositionsData = self.execute(POSITION_QUERY, ids).await?;
        Ok(data
            .positions
            .into_iter()
            .filter_map(fold_position)
            .collect())
    }
}

/// Indexer that knows nothing; used when no endpoint is configured. The
/// pipeline then reports on-chain data alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopIndexer;

#[async_trait]
impl IndexerApi for NoopIndexer {
    async fn pool_aggregates(
        &self,
        _pools: &[Address],
    ) -> Result<HashMap<Address, PoolAggregates>> {
        Ok(HashMap::new())
    }

    async fn position_aggregates(
        &self,
        _ids: &[PositionId],
    ) -> Result<HashMap<PositionId, PositionAggregates>> {
        Ok(HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn pool_payload_folds_into_trailing_windows() {
        let dto: PoolDto = serde_json::from_str(
            r#"{
                "id": "0x1111111111111111111111111111111111111111",
                "totalValueLockedUSD": "250000.5",
                "poolDayData": [
                    { "volumeUSD": "1000", "feesUSD": "3" },
                    { "volumeUSD": "2000", "feesUSD": "6" },
                    { "volumeUSD": "500",  "feesUSD": "1.5" }
                ]
            }"#,
        )
        .unwrap();
        let (address, aggregates) = fold_pool(dto).unwrap();
        assert_eq!(address.as_str(), "0x1111111111111111111111111111111111111111");
        assert_eq!(aggregates.tvl_usd, dec!(250000.5));
        assert_eq!(aggregates.volume_24h_usd, dec!(1000));
        assert_eq!(aggregates.fees_24h_usd, dec!(3));
        assert_eq!(aggregates.volume_7d_usd, dec!(3500));
        assert_eq!(aggregates.fees_7d_usd, dec!(10.5));
    }

    #[test]
    fn position_payload_scales_by_indexed_decimals() {
        let dto: PositionDto = serde_json::from_str(
            r#"{
                "id": "41",
                "depositedToken0": "1500000000000000000",
                "depositedToken1": "2500000",
                "withdrawnToken0": "0",
                "withdrawnToken1": "0",
                "collectedFeesToken0": "30000000000000000",
                "collectedFeesToken1": "40000",
                "transaction": { "timestamp": "1700000000" },
                "token0": { "decimals": "18" },
                "token1": { "decimals": "6" }
            }"#,
        )
        .unwrap();
        let (id, aggregates) = fold_position(dto).unwrap();
        assert_eq!(id, PositionId(41));
        assert_eq!(aggregates.created_at, 1_700_000_000);
        assert_eq!(aggregates.deposited0, dec!(1.5));
        assert_eq!(aggregates.deposited1, dec!(2.5));
        assert_eq!(aggregates.collected_fees0, dec!(0.03));
        assert_eq!(aggregates.collected_fees1, dec!(0.04));
    }

    #[test]
    fn malformed_figures_default_to_zero() {
        let dto: PositionDto = serde_json::from_str(
            r#"{
                "id": "7",
                "depositedToken0": "not-a-number",
                "depositedToken1": "1000000",
                "withdrawnToken0": "0",
                "withdrawnToken1": "0",
                "collectedFeesToken0": "0",
                "collectedFeesToken1": "0",
                "transaction": null,
                "token0": null,
                "token1": { "decimals": "6" }
            }"#,
        )
        .unwrap();
        let (_, aggregates) = fold_position(dto).unwrap();
        assert_eq!(aggregates.deposited0, Decimal::ZERO);
        assert_eq!(aggregates.deposited1, dec!(1));
        assert_eq!(aggregates.created_at, 0);
    }

    #[test]
    fn graphql_errors_are_detected_in_the_envelope() {
        let envelope: GraphQlResponse<PoolsData> = serde_json::from_str(
            r#"{ "data": null, "errors": [{ "message": "rate limited" }] }"#,
        )
        .unwrap();
        assert_eq!(envelope.errors.len(), 1);
        assert!(envelope.data.is_none());
    }
}
