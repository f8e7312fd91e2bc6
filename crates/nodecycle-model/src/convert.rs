//! Raw-node validation.
//!
//! Nodes arrive from the orchestrator API as labelled objects. A node
//! missing a required label, or whose name does not match the owning
//! cluster's naming convention, is not a valid [`Node`] and is dropped
//! from the snapshot with a warning — never a fatal error.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Node, Pod};

/// Label carrying the owning node pool name.
pub const NODE_POOL_LABEL: &str = "cloud.google.com/gke-nodepool";
/// Label marking a preemptible node.
pub const PREEMPTIBLE_LABEL: &str = "cloud.google.com/gke-preemptible";
/// Label carrying the node's region.
pub const NODE_REGION_LABEL: &str = "failure-domain.beta.kubernetes.io/region";
/// Label carrying the node's zone.
pub const NODE_ZONE_LABEL: &str = "failure-domain.beta.kubernetes.io/zone";

/// Node condition kinds reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCondition {
    Ready,
    MemoryPressure,
    DiskPressure,
    PidPressure,
    NetworkUnavailable,
}

/// A node as reported by the orchestrator API, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub name: String,
    pub labels: HashMap<String, String>,
    /// Conditions in report order; readiness is judged on the last one.
    pub conditions: Vec<NodeCondition>,
    pub unschedulable: bool,
    pub age: Duration,
    pub pods: Vec<Pod>,
}

/// Validate a raw node against the owning cluster.
///
/// Returns `None` (after logging) when the node lacks the pool, region,
/// or zone labels, or when its name does not carry the cluster naming
/// prefix. An empty `cluster_name` skips the prefix check.
pub fn node_from_raw(raw: RawNode, cluster_name: &str) -> Option<Node> {
    let Some(pool) = raw.labels.get(NODE_POOL_LABEL).cloned() else {
        warn!(node = %raw.name, label = NODE_POOL_LABEL, "dropping node, required label missing");
        return None;
    };
    if !cluster_name.is_empty() {
        let prefix = format!("gke-{cluster_name}-{pool}");
        if !raw.name.starts_with(&prefix) {
            warn!(node = %raw.name, %prefix, "dropping node, unexpected name prefix");
            return None;
        }
    }
    let Some(region) = raw.labels.get(NODE_REGION_LABEL).cloned() else {
        warn!(node = %raw.name, label = NODE_REGION_LABEL, "dropping node, required label missing");
        return None;
    };
    let Some(zone) = raw.labels.get(NODE_ZONE_LABEL).cloned() else {
        warn!(node = %raw.name, label = NODE_ZONE_LABEL, "dropping node, required label missing");
        return None;
    };

    // The unschedulable flag is set while a node drains; such a node must
    // not count as ready even when its Ready condition still holds.
    let schedulable = !raw.unschedulable;
    let ready = raw.conditions.last() == Some(&NodeCondition::Ready) && schedulable;
    let preemptible = raw.labels.get(PREEMPTIBLE_LABEL).map(String::as_str) == Some("true");

    Some(Node {
        name: raw.name,
        pool,
        region,
        zone,
        ready,
        schedulable,
        preemptible,
        age: raw.age,
        pods: raw.pods,
    })
}

/// Validate a list of raw nodes, dropping invalid entries.
pub fn nodes_from_raw(raw: Vec<RawNode>, cluster_name: &str) -> Vec<Node> {
    raw.into_iter()
        .filter_map(|r| node_from_raw(r, cluster_name))
        .collect()
}
