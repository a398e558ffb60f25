//! Prelude module for convenient imports.
//!
//! ```rust
//! use cl_lens_engine::prelude::*;
//! ```

pub use crate::cooldown::{RefreshGuard, RefreshGuardConfig};
pub use crate::diagnostics::{Diagnostics, StepTrace};
pub use crate::error::PipelineError;
pub use crate::pipeline::PositionPipeline;
pub use crate::report::{
    HistoryReport, PoolStatsReport, PositionReport, PriceReport, RefreshReport, RewardReport,
    UnclaimedFees, ValuationReport, ValuationSource,
};
