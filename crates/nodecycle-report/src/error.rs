//! Report delivery errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("slack api rejected the message: {0}")]
    Slack(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
