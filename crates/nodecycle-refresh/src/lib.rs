//! nodecycle-refresh — the node refresh protocol.
//!
//! Executes the cordon → drain → terminate sequence against one node at
//! a time, with rollback so a failed run never leaves a healthy node
//! stuck unschedulable. The orchestrator sequences the protocol over an
//! ordered target list (preemptible first) with inter-node pacing, so a
//! run never removes capacity from two nodes at once.
//!
//! # Components
//!
//! - **`machine`** — single-node refresh state machine (phase tracking)
//! - **`orchestrator`** — multi-node sequencing, pending-rollback set
//! - **`config`** — retry/pacing knobs and the cancellation signal
//! - **`error`** — `RefreshError`

pub mod config;
pub mod error;
pub mod machine;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{CancelSignal, RefreshConfig, cancel_pair};
pub use error::{RefreshError, RefreshResult};
pub use machine::{NodeOutcome, NodeRefresh, RefreshPhase};
pub use orchestrator::{Orchestrator, RefreshOutcome};
