//! The chain read interface and its supporting state.
//!
//! This crate defines what the pipeline consumes from a chain node:
//! - [`ChainReader`], the batched, partial-failure-tolerant view-call trait
//! - the typed results those calls produce
//! - [`PoolRegistry`], the candidate pool set for staked-position discovery
//! - [`SnapshotChain`], a serde-loaded implementation for offline analysis
//!   and integration tests
//!
//! Real RPC transport (encoding, retries, timeouts) lives outside this
//! workspace and plugs in by implementing [`ChainReader`].

pub mod reader;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use reader::ChainReader;
pub use registry::PoolRegistry;
pub use snapshot::SnapshotChain;
pub use types::{
    EarnedQuery, FeeAmounts, GaugeParams, PositionDetails, PrincipalAmounts, PrincipalQuery,
    TokenMetadata,
};
