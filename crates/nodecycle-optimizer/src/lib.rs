//! nodecycle-optimizer — the run coordinator.
//!
//! One `Optimizer::run` call per externally triggered run: fetch the
//! cluster snapshot, let the selection engine compute targets, hand them
//! to the refresh orchestrator, and fold everything into a `RunOutcome`
//! for reporting. Selection failures stop the run before any mutation;
//! refresh failures keep their partial eviction results.
//!
//! # Components
//!
//! - **`optimizer`** — `Optimizer`, `OptimizerOptions`, `RunOutcome`
//! - **`error`** — `OptimizeError`

pub mod error;
pub mod optimizer;

pub use error::OptimizeError;
pub use optimizer::{Optimizer, OptimizerOptions, RunOutcome};
