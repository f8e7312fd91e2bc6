//! Gateway error type.

use thiserror::Error;

/// Errors surfaced by inventory and lifecycle gateway implementations.
///
/// `DisruptionBudget` is structural: adapters that only see a textual
/// eviction failure must map it to this variant themselves, so the core
/// never matches on error-message strings.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("eviction of pod {pod} would violate its disruption budget")]
    DisruptionBudget { pod: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("gateway call cancelled")]
    Cancelled,

    #[error("gateway error: {0}")]
    Api(String),
}

impl GatewayError {
    /// True when this error is a retryable disruption-budget violation.
    pub fn is_disruption_budget(&self) -> bool {
        matches!(self, GatewayError::DisruptionBudget { .. })
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
