//! Canned chain state for offline analysis and integration tests.
//!
//! A [`SnapshotChain`] is a serde document holding everything the pipeline
//! would read from a node. Entries absent from the document behave exactly
//! like individual failed reads (`None` items), which is how the engine's
//! partial-failure tolerance gets exercised without a network.

use crate::reader::ChainReader;
use crate::types::{
    EarnedQuery, FeeAmounts, GaugeParams, PositionDetails, PrincipalAmounts, PrincipalQuery,
    TokenMetadata,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use cl_lens_domain::{Address, PoolKey, PoolSnapshot, PositionId};
use serde::{Deserialize, Serialize};

/// Position ids enumerable from one wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub owner: Address,
    pub positions: Vec<PositionId>,
}

/// Everything recorded about one position token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionEntry {
    pub id: PositionId,
    pub details: Option<PositionDetails>,
    /// Helper amounts at the recorded pool price.
    #[serde(default)]
    pub principal: Option<PrincipalAmounts>,
    #[serde(default)]
    pub fees: Option<FeeAmounts>,
}

/// One pool with its factory key, state, and optional gauge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub address: Address,
    pub key: PoolKey,
    pub snapshot: Option<PoolSnapshot>,
    #[serde(default)]
    pub gauge: Option<Address>,
}

/// Staked position ids for one owner in a gauge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeEntry {
    pub owner: Address,
    pub positions: Vec<PositionId>,
}

/// Accrued reward for one (owner, position) pair in a gauge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedEntry {
    pub owner: Address,
    pub position: PositionId,
    pub amount: u128,
}

/// One gauge with its parameters, stakes, and accrued rewards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeEntry {
    pub address: Address,
    pub params: Option<GaugeParams>,
    #[serde(default)]
    pub stakes: Vec<StakeEntry>,
    #[serde(default)]
    pub earned: Vec<EarnedEntry>,
}

/// Metadata recorded for one token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: Address,
    #[serde(default)]
    pub metadata: TokenMetadata,
}

/// A full canned chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotChain {
    #[serde(default)]
    pub wallets: Vec<WalletEntry>,
    #[serde(default)]
    pub positions: Vec<PositionEntry>,
    #[serde(default)]
    pub pools: Vec<PoolEntry>,
    #[serde(default)]
    pub gauges: Vec<GaugeEntry>,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

impl SnapshotChain {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("snapshot file is not valid snapshot JSON")
    }

    /// Factory keys of every recorded pool, usable as a registry
    /// allow-list.
    #[must_use]
    pub fn pool_keys(&self) -> Vec<PoolKey> {
        self.pools.iter().map(|pool| pool.key.clone()).collect()
    }

    fn wallet(&self, owner: &Address) -> Option<&WalletEntry> {
        self.wallets.iter().find(|w| &w.owner == owner)
    }

    fn position(&self, id: PositionId) -> Option<&PositionEntry> {
        self.positions.iter().find(|p| p.id == id)
    }

    fn pool(&self, address: &Address) -> Option<&PoolEntry> {
        self.pools.iter().find(|p| &p.address == address)
    }

    fn gauge(&self, address: &Address) -> Option<&GaugeEntry> {
        self.gauges.iter().find(|g| &g.address == address)
    }
}

#[async_trait]
impl ChainReader for SnapshotChain {
    async fn owned_position_count(&self, owner: &Address) -> Result<u64> {
        Ok(self
            .wallet(owner)
            .map(|w| w.positions.len() as u64)
            .unwrap_or(0))
    }

    async fn owned_position_ids(
        &self,
        owner: &Address,
        indices: &[u64],
    ) -> Result<Vec<Option<PositionId>>> {
        let wallet = self.wallet(owner);
        Ok(indices
            .iter()
            .map(|&index| {
                wallet.and_then(|w| w.positions.get(index as usize).copied())
            })
            .collect())
    }

    async fn position_details(
        &self,
        ids: &[PositionId],
    ) -> Result<Vec<Option<PositionDetails>>> {
        Ok(ids
            .iter()
            .map(|&id| self.position(id).and_then(|p| p.details.clone()))
            .collect())
    }

    async fn pool_addresses(&self, keys: &[PoolKey]) -> Result<Vec<Option<Address>>> {
        Ok(keys
            .iter()
            .map(|key| {
                self.pools
                    .iter()
                    .find(|p| &p.key == key)
                    .map(|p| p.address.clone())
            })
            .collect())
    }

    async fn pool_snapshots(&self, pools: &[Address]) -> Result<Vec<Option<PoolSnapshot>>> {
        Ok(pools
            .iter()
            .map(|address| self.pool(address).and_then(|p| p.snapshot.clone()))
            .collect())
    }

    async fn gauge_addresses(&self, pools: &[Address]) -> Result<Vec<Option<Address>>> {
        Ok(pools
            .iter()
            .map(|address| self.pool(address).and_then(|p| p.gauge.clone()))
            .collect())
    }

    async fn staked_position_ids(
        &self,
        gauges: &[Address],
        owner: &Address,
    ) -> Result<Vec<Option<Vec<PositionId>>>> {
        Ok(gauges
            .iter()
            .map(|address| {
                self.gauge(address).map(|gauge| {
                    gauge
                        .stakes
                        .iter()
                        .find(|stake| &stake.owner == owner)
                        .map(|stake| stake.positions.clone())
                        .unwrap_or_default()
                })
            })
            .collect())
    }

    async fn gauge_params(&self, gauges: &[Address]) -> Result<Vec<Option<GaugeParams>>> {
        Ok(gauges
            .iter()
            .map(|address| self.gauge(address).and_then(|g| g.params.clone()))
            .collect())
    }

    async fn earned(&self, queries: &[EarnedQuery]) -> Result<Vec<Option<u128>>> {
        Ok(queries
            .iter()
            .map(|query| {
                self.gauge(&query.gauge).and_then(|gauge| {
                    gauge
                        .earned
                        .iter()
                        .find(|e| e.owner == query.owner && e.position == query.position)
                        .map(|e| e.amount)
                })
            })
            .collect())
    }

    async fn token_metadata(&self, tokens: &[Address]) -> Result<Vec<TokenMetadata>> {
        Ok(tokens
            .iter()
            .map(|address| {
                self.tokens
                    .iter()
                    .find(|t| &t.address == address)
                    .map(|t| t.metadata.clone())
                    .unwrap_or_default()
            })
            .collect())
    }

    async fn principal_amounts(
        &self,
        queries: &[PrincipalQuery],
    ) -> Result<Vec<Option<PrincipalAmounts>>> {
        // Canned amounts were recorded at the stored pool price, so the
        // query's sqrt price operand is not re-applied here.
        Ok(queries
            .iter()
            .map(|query| self.position(query.position).and_then(|p| p.principal))
            .collect())
    }

    async fn unclaimed_fees(&self, ids: &[PositionId]) -> Result<Vec<Option<FeeAmounts>>> {
        Ok(ids
            .iter()
            .map(|&id| self.position(id).and_then(|p| p.fees))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn fixture() -> SnapshotChain {
        SnapshotChain::from_json_str(
            r#"{
                "wallets": [
                    { "owner": "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "positions": [41, 42] }
                ],
                "positions": [
                    {
                        "id": 41,
                        "details": {
                            "token0": "0x1111111111111111111111111111111111111111",
                            "token1": "0x2222222222222222222222222222222222222222",
                            "tick_spacing": 100,
                            "tick_lower": -1000,
                            "tick_upper": 1000,
                            "liquidity": 5000000
                        },
                        "fees": { "amount0": 10, "amount1": 20 }
                    },
                    { "id": 42, "details": null }
                ],
                "pools": [],
                "gauges": [],
                "tokens": [
                    {
                        "address": "0x1111111111111111111111111111111111111111",
                        "metadata": { "symbol": "WETH", "decimals": 18 }
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn wallet_enumeration_follows_the_document() {
        let chain = fixture();
        let owner: Address = OWNER.parse().unwrap();
        assert_eq!(chain.owned_position_count(&owner).await.unwrap(), 2);
        let ids = chain.owned_position_ids(&owner, &[0, 1, 9]).await.unwrap();
        assert_eq!(
            ids,
            vec![Some(PositionId(41)), Some(PositionId(42)), None]
        );
    }

    #[tokio::test]
    async fn missing_entries_read_as_failed_items() {
        let chain = fixture();
        let details = chain
            .position_details(&[PositionId(41), PositionId(42), PositionId(7)])
            .await
            .unwrap();
        assert!(details[0].is_some());
        assert!(details[1].is_none());
        assert!(details[2].is_none());

        let unknown: Address = "0x9999999999999999999999999999999999999999".parse().unwrap();
        let metadata = chain.token_metadata(&[unknown]).await.unwrap();
        assert_eq!(metadata[0], TokenMetadata::default());
    }

    #[tokio::test]
    async fn addresses_in_the_document_are_normalized() {
        // the wallet key was written in uppercase; lookups are by the
        // normalized form
        let chain = fixture();
        let owner: Address = OWNER.parse().unwrap();
        assert_eq!(chain.owned_position_count(&owner).await.unwrap(), 2);
    }
}
