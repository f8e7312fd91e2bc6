//! Refresh target selection.
//!
//! Selection refuses to act on a cluster that is already degraded: every
//! pool must be running, every node ready, and removing a preemptible
//! node must not drop the cluster below its capacity floor. Within those
//! bounds the oldest preemptible node is refreshed first (it is
//! statistically closest to preemption anyway) and the least-loaded
//! autoscaled on-demand node is rebalanced (smallest eviction blast
//! radius).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use nodecycle_model::{Cluster, ClusterStatus, Node, NodePool, NodePoolStatus};

use crate::error::{SelectError, SelectResult};

/// Policy options for one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Configured lower bound on preemptible node count; the effective
    /// floor is the larger of this and the pool-derived floor.
    pub minimum_preemptible_nodes: u32,
    /// Include the selected preemptible node in the refresh target list.
    pub refresh_preemptible: bool,
    /// Include the selected on-demand node in the refresh target list.
    pub refresh_ondemand: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            minimum_preemptible_nodes: 0,
            refresh_preemptible: true,
            refresh_ondemand: true,
        }
    }
}

/// Outcome of a selection run.
///
/// A target node is recorded here even when its policy flag excludes it
/// from `refresh_targets`, so reports can show what would have been
/// refreshed.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Effective preemptible capacity floor (pool-derived vs. configured).
    pub preemptible_floor: u32,
    /// Preemptible nodes actually present.
    pub preemptible_actual: u32,
    /// Pools that currently back at least one node.
    pub active_pools: Vec<NodePool>,
    /// Oldest preemptible node, if any exist.
    pub target_preemptible: Option<Node>,
    /// Least-loaded autoscaled on-demand node, if any exist.
    pub target_ondemand: Option<Node>,
    /// Ordered refresh targets after policy gating: preemptible first.
    pub refresh_targets: Vec<String>,
}

/// Compute refresh targets for one cluster snapshot.
///
/// Pure: consumes inventory data only. Any violated precondition fails
/// the whole run; a clean snapshot with both policy flags disabled
/// yields an empty target list, which the caller treats as success.
pub fn select_targets(
    cluster: &Cluster,
    nodes: &[Node],
    policy: &SelectionPolicy,
) -> SelectResult<SelectionResult> {
    if cluster.status != ClusterStatus::Running {
        return Err(SelectError::ClusterNotRunning(cluster.status));
    }

    // Partition pools; any non-running pool aborts the run outright.
    let mut preemptible_pools = Vec::new();
    let mut ondemand_autoscale_pools = Vec::new();
    for pool in &cluster.pools {
        if pool.status != NodePoolStatus::Running {
            return Err(SelectError::PoolNotRunning {
                pool: pool.name.clone(),
                status: pool.status,
            });
        }
        if pool.preemptible {
            preemptible_pools.push(pool);
        } else if pool.autoscale {
            ondemand_autoscale_pools.push(pool);
        }
        debug!(
            pool = %pool.name,
            preemptible = pool.preemptible,
            autoscale = pool.autoscale,
            "fetched node pool"
        );
    }
    if preemptible_pools.is_empty() {
        return Err(SelectError::NoPreemptiblePool);
    }

    if nodes.is_empty() {
        return Err(SelectError::NoNodes);
    }
    for node in nodes {
        if !node.ready {
            return Err(SelectError::NodeNotReady(node.name.clone()));
        }
        debug!(
            node = %node.name,
            preemptible = node.preemptible,
            age_secs = node.age.as_secs(),
            pods = node.pods.len(),
            "fetched node"
        );
    }

    let active_pools: Vec<NodePool> = cluster
        .pools
        .iter()
        .filter(|p| nodes.iter().any(|n| n.pool == p.name))
        .cloned()
        .collect();

    // Capacity floor: removing a preemptible node must not create a
    // shortfall once combined with drain-time unavailability.
    let pool_floor: u32 = preemptible_pools.iter().map(|p| p.floor_contribution()).sum();
    let floor = pool_floor.max(policy.minimum_preemptible_nodes);
    let preemptible_nodes: Vec<&Node> = nodes
        .iter()
        .filter(|n| preemptible_pools.iter().any(|p| p.name == n.pool))
        .collect();
    let actual = preemptible_nodes.len() as u32;
    if actual < floor {
        return Err(SelectError::InsufficientPreemptibleCapacity {
            required: floor,
            actual,
        });
    }

    let ondemand_nodes: Vec<&Node> = nodes
        .iter()
        .filter(|n| ondemand_autoscale_pools.iter().any(|p| p.name == n.pool))
        .collect();

    // Strict comparisons: the first-seen node wins exact ties.
    let mut target_preemptible: Option<&Node> = None;
    for node in &preemptible_nodes {
        match target_preemptible {
            Some(current) if current.age >= node.age => {}
            _ => target_preemptible = Some(node),
        }
    }
    let mut target_ondemand: Option<&Node> = None;
    for node in &ondemand_nodes {
        match target_ondemand {
            Some(current) if current.pods.len() <= node.pods.len() => {}
            _ => target_ondemand = Some(node),
        }
    }

    let mut refresh_targets = Vec::with_capacity(2);
    if let Some(node) = target_preemptible {
        info!(
            node = %node.name,
            pool = %node.pool,
            age_secs = node.age.as_secs(),
            gated = !policy.refresh_preemptible,
            "selected oldest preemptible node"
        );
        if policy.refresh_preemptible {
            refresh_targets.push(node.name.clone());
        }
    }
    if let Some(node) = target_ondemand {
        info!(
            node = %node.name,
            pool = %node.pool,
            pods = node.pods.len(),
            gated = !policy.refresh_ondemand,
            "selected least-loaded autoscaled on-demand node"
        );
        if policy.refresh_ondemand {
            refresh_targets.push(node.name.clone());
        }
    }

    Ok(SelectionResult {
        preemptible_floor: floor,
        preemptible_actual: actual,
        active_pools,
        target_preemptible: target_preemptible.cloned(),
        target_ondemand: target_ondemand.cloned(),
        refresh_targets,
    })
}
