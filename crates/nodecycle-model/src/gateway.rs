//! Capability traits for cluster I/O.
//!
//! The core consumes these two capability sets and nothing else; live
//! adapters (orchestrator API, cloud control plane) and in-memory fakes
//! implement the same contract. Every call must observe the caller's
//! cancellation signal and return [`GatewayError::Cancelled`] promptly
//! when it fires.

use std::future::Future;

use crate::error::GatewayResult;
use crate::types::{Cluster, Node};

/// Read-only cluster/node/pod inventory.
pub trait InventoryGateway: Send + Sync {
    /// Fetch the owned cluster, including its node pools.
    fn get_cluster(&self) -> impl Future<Output = GatewayResult<Cluster>> + Send;

    /// Fetch all validated nodes with their bound pods.
    fn get_node_list(&self) -> impl Future<Output = GatewayResult<Vec<Node>>> + Send;

    /// Fetch a single node with its bound pods.
    fn get_node(&self, name: &str) -> impl Future<Output = GatewayResult<Node>> + Send;
}

/// Node lifecycle mutations.
pub trait NodeLifecycleGateway: Send + Sync {
    /// Mark a node unschedulable. Idempotent: already-cordoned is success.
    fn cordon(&self, node: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Mark a node schedulable again. Idempotent: already-schedulable is
    /// success.
    fn uncordon(&self, node: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Probe the cluster for its disruption-budget-aware eviction API
    /// generation. `None` means no such API is available; eviction then
    /// proceeds without a constraint version, which is not an error.
    fn probe_eviction_api(&self) -> impl Future<Output = GatewayResult<Option<String>>> + Send;

    /// Request graceful eviction of one pod.
    fn evict_pod(
        &self,
        namespace: &str,
        name: &str,
        api_version: Option<&str>,
    ) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Delete the node object from the orchestrator.
    fn delete_node(&self, name: &str) -> impl Future<Output = GatewayResult<()>> + Send;

    /// Stop the compute instance backing a node.
    fn stop_instance(
        &self,
        zone: &str,
        name: &str,
    ) -> impl Future<Output = GatewayResult<()>> + Send;
}
