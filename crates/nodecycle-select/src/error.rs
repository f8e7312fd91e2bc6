//! Selection error types.
//!
//! All of these are precondition failures: fatal, surfaced verbatim,
//! and guaranteed to occur before any mutating gateway call.

use nodecycle_model::{ClusterStatus, NodePoolStatus};
use thiserror::Error;

/// Errors that can occur while computing refresh targets.
#[derive(Debug, Clone, Error)]
pub enum SelectError {
    #[error("cluster status is not running: {0:?}")]
    ClusterNotRunning(ClusterStatus),

    #[error("node pool {pool} is not running: {status:?}")]
    PoolNotRunning { pool: String, status: NodePoolStatus },

    #[error("no preemptible node pool exists")]
    NoPreemptiblePool,

    #[error("cluster has no nodes")]
    NoNodes,

    #[error("node is not ready: {0}")]
    NodeNotReady(String),

    #[error("preemptible capacity floor violated: required={required}, actual={actual}")]
    InsufficientPreemptibleCapacity { required: u32, actual: u32 },
}

pub type SelectResult<T> = Result<T, SelectError>;
