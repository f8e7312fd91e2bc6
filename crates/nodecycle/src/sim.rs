//! In-memory cluster simulation.
//!
//! Loads a JSON snapshot of a cluster and implements both gateway
//! capabilities over it, so a full run can be rehearsed without
//! touching anything real. Mutations are applied to the in-memory
//! state: cordons flip schedulability, evictions remove pods,
//! deletions drop the node from inventory.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use nodecycle_model::{
    Cluster, GatewayError, GatewayResult, InventoryGateway, Node, NodeLifecycleGateway,
};

/// A serializable cluster state used as simulation input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub cluster: Cluster,
    pub nodes: Vec<Node>,
    /// Pods whose eviction is refused this many times before it is
    /// allowed through, to rehearse disruption-budget backoff.
    #[serde(default)]
    pub budget_blocks: HashMap<String, u32>,
}

impl ClusterSnapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

struct SimState {
    cluster: Cluster,
    nodes: HashMap<String, Node>,
    cordoned: HashSet<String>,
    deleted: HashSet<String>,
    stopped: HashSet<String>,
    budget_blocks: HashMap<String, u32>,
}

/// Gateway pair backed by a mutable in-memory cluster.
pub struct SimGateway {
    state: Mutex<SimState>,
}

impl SimGateway {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        let nodes = snapshot
            .nodes
            .into_iter()
            .map(|n| (n.name.clone(), n))
            .collect();
        Self {
            state: Mutex::new(SimState {
                cluster: snapshot.cluster,
                nodes,
                cordoned: HashSet::new(),
                deleted: HashSet::new(),
                stopped: HashSet::new(),
                budget_blocks: snapshot.budget_blocks,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A panic while holding the lock would already have failed the
        // rehearsal; recovering the state is still the right move.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn view(state: &SimState, node: &Node) -> Node {
        let mut node = node.clone();
        node.schedulable = !state.cordoned.contains(&node.name);
        node.ready = node.ready && node.schedulable;
        node
    }

    /// Node names that were deleted during the rehearsal.
    pub fn deleted_nodes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().deleted.iter().cloned().collect();
        names.sort();
        names
    }

    /// Instance names that were stopped during the rehearsal.
    pub fn stopped_instances(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().stopped.iter().cloned().collect();
        names.sort();
        names
    }

    /// Node names still cordoned once the rehearsal finished.
    pub fn cordoned_nodes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().cordoned.iter().cloned().collect();
        names.sort();
        names
    }
}

impl InventoryGateway for SimGateway {
    async fn get_cluster(&self) -> GatewayResult<Cluster> {
        Ok(self.lock().cluster.clone())
    }

    async fn get_node_list(&self) -> GatewayResult<Vec<Node>> {
        let state = self.lock();
        let mut nodes: Vec<Node> = state.nodes.values().map(|n| Self::view(&state, n)).collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    async fn get_node(&self, name: &str) -> GatewayResult<Node> {
        let state = self.lock();
        state
            .nodes
            .get(name)
            .map(|n| Self::view(&state, n))
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }
}

impl NodeLifecycleGateway for SimGateway {
    async fn cordon(&self, node: &str) -> GatewayResult<()> {
        let mut state = self.lock();
        if !state.nodes.contains_key(node) {
            return Err(GatewayError::NotFound(node.to_string()));
        }
        state.cordoned.insert(node.to_string());
        debug!(node, "sim: cordoned");
        Ok(())
    }

    async fn uncordon(&self, node: &str) -> GatewayResult<()> {
        let mut state = self.lock();
        state.cordoned.remove(node);
        debug!(node, "sim: uncordoned");
        Ok(())
    }

    async fn probe_eviction_api(&self) -> GatewayResult<Option<String>> {
        Ok(Some("policy/v1".to_string()))
    }

    async fn evict_pod(
        &self,
        namespace: &str,
        name: &str,
        _api_version: Option<&str>,
    ) -> GatewayResult<()> {
        let mut state = self.lock();
        if let Some(remaining) = state.budget_blocks.get_mut(name) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!(pod = name, "sim: eviction refused by disruption budget");
                return Err(GatewayError::DisruptionBudget {
                    pod: name.to_string(),
                });
            }
        }
        for node in state.nodes.values_mut() {
            node.pods
                .retain(|p| !(p.namespace == namespace && p.name == name));
        }
        debug!(pod = name, namespace, "sim: evicted");
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> GatewayResult<()> {
        let mut state = self.lock();
        if state.nodes.remove(name).is_none() {
            return Err(GatewayError::NotFound(name.to_string()));
        }
        state.cordoned.remove(name);
        state.deleted.insert(name.to_string());
        debug!(node = name, "sim: node deleted");
        Ok(())
    }

    async fn stop_instance(&self, zone: &str, name: &str) -> GatewayResult<()> {
        let mut state = self.lock();
        state.stopped.insert(name.to_string());
        debug!(instance = name, zone, "sim: instance stopped");
        Ok(())
    }
}
