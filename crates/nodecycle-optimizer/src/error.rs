//! Run-level error type.

use nodecycle_model::GatewayError;
use nodecycle_refresh::RefreshError;
use nodecycle_select::SelectError;
use thiserror::Error;

/// The final error of an optimize run.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("failed to fetch cluster inventory: {0}")]
    Inventory(#[from] GatewayError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),
}
