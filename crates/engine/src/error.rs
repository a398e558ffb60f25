use thiserror::Error;

/// Failures that abort a refresh.
///
/// Everything else is recovered at the smallest possible scope: per-item
/// read failures become absent fields and a whole collaborator outage
/// degrades one stage. A valid address therefore always yields a report
/// unless the chain itself is unreachable.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The owner address failed validation; nothing was fetched.
    #[error("invalid owner address: {0}")]
    InvalidInput(String),

    /// The chain read interface is unreachable; no report can be built.
    #[error("chain interface unavailable: {0}")]
    UpstreamUnavailable(String),
}
