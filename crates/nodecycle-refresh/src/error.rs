//! Refresh protocol error types.

use nodecycle_model::GatewayError;
use thiserror::Error;

/// Errors raised by the refresh state machine and orchestrator.
///
/// Mutation failures mid-protocol always trigger a rollback attempt; a
/// rollback failure is reported as `RollbackFailed` with the original
/// cause preserved as primary.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to resolve node {node}: {source}")]
    Resolve { node: String, source: GatewayError },

    #[error("failed to cordon node {node}: {source}")]
    Cordon { node: String, source: GatewayError },

    #[error("failed to probe eviction api: {0}")]
    Probe(GatewayError),

    #[error("failed to evict pod {pod} on node {node}: {source}")]
    Evict {
        node: String,
        pod: String,
        source: GatewayError,
    },

    #[error("gave up evicting pod {pod} on node {node} after {attempts} attempts: {source}")]
    EvictionBudgetExhausted {
        node: String,
        pod: String,
        attempts: u32,
        source: GatewayError,
    },

    #[error("node {node} is unexpectedly schedulable, aborting termination")]
    UnexpectedSchedulableState { node: String },

    #[error("failed to delete node {node}: {source}")]
    DeleteNode { node: String, source: GatewayError },

    #[error("failed to stop instance {node} in zone {zone}: {source}")]
    StopInstance {
        node: String,
        zone: String,
        source: GatewayError,
    },

    #[error("failed to uncordon node {node}: {source}")]
    Uncordon { node: String, source: GatewayError },

    #[error("failed to uncordon node {node}: {source}; primary error: {primary}")]
    RollbackFailed {
        node: String,
        source: GatewayError,
        primary: Box<RefreshError>,
    },

    #[error("refresh cancelled")]
    Cancelled,
}

pub type RefreshResult<T> = Result<T, RefreshError>;
