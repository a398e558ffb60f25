//! One refresh cycle: the five stages wired strictly in order.

use crate::diagnostics::Diagnostics;
use crate::error::PipelineError;
use crate::report::{PositionReport, RefreshReport};
use crate::{enrichment, fetcher, resolver, rewards, valuation};
use cl_lens_chain::{ChainReader, PoolRegistry};
use cl_lens_data::{IndexerApi, PriceOracle};
use cl_lens_domain::{Address, AddressParseError};
use std::sync::Arc;
use tracing::info;

/// The position analytics pipeline.
///
/// Holds the three collaborators plus the candidate pool registry. Every
/// call to [`refresh`](Self::refresh) re-reads everything; results are
/// never cached here. Cross-refresh throttling belongs to the caller (see
/// [`crate::cooldown::RefreshGuard`]).
pub struct PositionPipeline {
    chain: Arc<dyn ChainReader>,
    indexer: Arc<dyn IndexerApi>,
    oracle: Arc<dyn PriceOracle>,
    registry: PoolRegistry,
}

impl PositionPipeline {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        indexer: Arc<dyn IndexerApi>,
        oracle: Arc<dyn PriceOracle>,
        registry: PoolRegistry,
    ) -> Self {
        Self {
            chain,
            indexer,
            oracle,
            registry,
        }
    }

    /// Runs one full refresh for `owner`.
    ///
    /// Stages run strictly in sequence because each consumes the full
    /// output of the previous one; reads inside a stage run concurrently
    /// and settle before the next stage starts. Only a malformed address
    /// or a fully unreachable chain fails the call; everything else
    /// degrades to absent fields, visible in the diagnostics trace.
    pub async fn refresh(&self, owner: &str) -> Result<RefreshReport, PipelineError> {
        let owner: Address = owner
            .parse()
            .map_err(|error: AddressParseError| PipelineError::InvalidInput(error.to_string()))?;
        let mut diagnostics = Diagnostics::default();

        let resolved =
            resolver::resolve_positions(self.chain.as_ref(), &self.registry, &owner, &mut diagnostics)
                .await?;
        if resolved.ids.is_empty() {
            info!(owner = %owner, "no positions found");
            return Ok(RefreshReport {
                owner,
                positions: Vec::new(),
                diagnostics,
            });
        }

        let fetched =
            fetcher::fetch_details(self.chain.as_ref(), &resolved, &mut diagnostics).await?;

        let valued = valuation::value_positions(
            self.chain.as_ref(),
            self.oracle.as_ref(),
            &fetched.positions,
            &fetched.snapshots,
            &mut diagnostics,
        )
        .await;

        let reward_blocks = rewards::attach_rewards(
            self.chain.as_ref(),
            self.oracle.as_ref(),
            &owner,
            &fetched.positions,
            &fetched.snapshots,
            &valued.outcomes,
            &mut diagnostics,
        )
        .await;

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        let enriched = enrichment::enrich(
            self.indexer.as_ref(),
            &fetched.positions,
            &valued.token_prices,
            now,
            &mut diagnostics,
        )
        .await;

        let positions = fetched
            .positions
            .iter()
            .zip(valued.outcomes)
            .zip(reward_blocks)
            .zip(enriched.history)
            .map(|(((position, valuation), rewards), history)| {
                let mut report = PositionReport::from_position(position);
                report.snapshot = position
                    .pool
                    .as_ref()
                    .and_then(|pool| fetched.snapshots.get(pool).cloned());
                report.pool_stats = position
                    .pool
                    .as_ref()
                    .and_then(|pool| enriched.pool_stats.get(pool).cloned());
                report.price = valuation.price;
                report.valuation = valuation.valuation;
                report.unclaimed_fees = valuation.unclaimed_fees;
                report.token0_price_usd = valuation.token0_price_usd;
                report.token1_price_usd = valuation.token1_price_usd;
                report.rewards = rewards;
                report.history = history;
                report
            })
            .collect();

        info!(owner = %owner, positions = fetched.positions.len(), "refresh complete");
        Ok(RefreshReport {
            owner,
            positions,
            diagnostics,
        })
    }
}
