//! nodecycle-model — shared data model for the node refresh control loop.
//!
//! Holds the read-only cluster snapshot types (`Cluster`, `NodePool`,
//! `Node`, `Pod`), the raw-node validation that builds them, and the
//! capability traits the core consumes for inventory reads and node
//! lifecycle mutations.
//!
//! # Components
//!
//! - **`types`** — snapshot types and lifecycle status enums
//! - **`convert`** — `RawNode` → `Node` validation (label + naming checks)
//! - **`gateway`** — `InventoryGateway` / `NodeLifecycleGateway` traits
//! - **`error`** — `GatewayError`

pub mod convert;
pub mod error;
pub mod gateway;
pub mod types;

pub use convert::{NodeCondition, RawNode, node_from_raw, nodes_from_raw};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{InventoryGateway, NodeLifecycleGateway};
pub use types::*;
