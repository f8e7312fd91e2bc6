//! nodecycle-select — the selection engine.
//!
//! A pure function of one cluster snapshot: enforce the capacity
//! preconditions, then pick at most one preemptible node (the oldest)
//! and one autoscaled on-demand node (the least loaded) as refresh
//! targets. No side effects; the caller decides what to do with the
//! result.
//!
//! # Components
//!
//! - **`engine`** — precondition checks and target choice
//! - **`error`** — `SelectError`

pub mod engine;
pub mod error;

pub use engine::{SelectionPolicy, SelectionResult, select_targets};
pub use error::{SelectError, SelectResult};
