//! Cluster snapshot types.
//!
//! These are read-only views of the managed cluster taken once per run.
//! The core never mutates them in place; after a lifecycle action it
//! re-reads state through the gateway.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a managed cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterStatus {
    Unspecified,
    Provisioning,
    Running,
    Reconciling,
    Stopping,
    Error,
    Degraded,
}

/// Lifecycle status of a node pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodePoolStatus {
    Unspecified,
    Provisioning,
    Running,
    RunningWithError,
    Reconciling,
    Stopping,
    Error,
}

/// A managed cluster and its node pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub region: String,
    pub status: ClusterStatus,
    pub pools: Vec<NodePool>,
}

/// A node pool within a cluster.
///
/// `min_node_count`/`max_node_count` are meaningful only when `autoscale`
/// is set. Each backing instance group contributes `min_node_count` nodes
/// to the cluster-wide preemptible capacity floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePool {
    pub name: String,
    pub preemptible: bool,
    pub autoscale: bool,
    pub min_node_count: u32,
    pub max_node_count: u32,
    pub status: NodePoolStatus,
    pub instance_group_urls: Vec<String>,
}

impl NodePool {
    /// This pool's contribution to the preemptible capacity floor.
    pub fn floor_contribution(&self) -> u32 {
        self.min_node_count * self.instance_group_urls.len() as u32
    }
}

/// A validated cluster node.
///
/// `ready` is true only when the node's last reported condition is Ready
/// *and* the node is currently schedulable — a node mid-drain is excluded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub pool: String,
    pub region: String,
    pub zone: String,
    pub ready: bool,
    /// False once the node is cordoned. Termination re-checks this to
    /// defend against concurrent external mutation.
    pub schedulable: bool,
    pub preemptible: bool,
    /// Wall-clock time since the node was created.
    pub age: Duration,
    /// Pods currently bound to this node.
    pub pods: Vec<Pod>,
}

/// Lifecycle phase of a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

/// A pod bound to a node. Evicted pods are recorded, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    pub node_name: String,
    pub phase: PodPhase,
}
