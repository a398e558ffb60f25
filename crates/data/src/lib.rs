//! Off-chain collaborators: indexer aggregates and USD price resolution.

pub mod indexer;
pub mod oracle;

pub use indexer::{IndexerApi, NoopIndexer, PoolAggregates, PositionAggregates, SubgraphClient};
pub use oracle::{HttpPriceOracle, NoopPriceOracle, PriceOracle};
