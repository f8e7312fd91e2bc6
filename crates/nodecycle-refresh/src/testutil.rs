//! In-memory gateway fake shared by the refresh tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use nodecycle_model::{
    Cluster, ClusterStatus, GatewayError, GatewayResult, InventoryGateway, Node,
    NodeLifecycleGateway, Pod, PodPhase,
};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Cordon(String),
    Uncordon(String),
    Probe,
    Evict(String),
    Delete(String),
    Stop(String),
}

#[derive(Default)]
struct Inner {
    nodes: HashMap<String, Node>,
    cordoned: HashSet<String>,
    deleted: HashSet<String>,
    calls: Vec<Call>,
    /// pod name → remaining disruption-budget violations to report.
    budget_blocks: HashMap<String, u32>,
    /// pod name → persistent non-budget eviction failure.
    evict_failures: HashMap<String, GatewayError>,
    cordon_failures: HashSet<String>,
    uncordon_failures: HashSet<String>,
    stop_failures: HashSet<String>,
    eviction_api: Option<String>,
}

/// A scriptable in-memory cluster implementing both gateway traits.
pub struct FakeCluster {
    inner: Mutex<Inner>,
}

impl FakeCluster {
    pub fn new(nodes: Vec<Node>) -> Self {
        let inner = Inner {
            nodes: nodes.into_iter().map(|n| (n.name.clone(), n)).collect(),
            eviction_api: Some("policy/v1".to_string()),
            ..Inner::default()
        };
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn block_evictions(&self, pod: &str, violations: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.budget_blocks.insert(pod.to_string(), violations);
    }

    pub fn fail_eviction(&self, pod: &str, error: GatewayError) {
        let mut inner = self.inner.lock().unwrap();
        inner.evict_failures.insert(pod.to_string(), error);
    }

    pub fn fail_cordon(&self, node: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.cordon_failures.insert(node.to_string());
    }

    pub fn fail_uncordon(&self, node: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.uncordon_failures.insert(node.to_string());
    }

    pub fn fail_stop_instance(&self, node: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.stop_failures.insert(node.to_string());
    }

    pub fn set_eviction_api(&self, api: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.eviction_api = api;
    }

    /// Simulate an external actor flipping the node schedulable again.
    pub fn force_uncordon(&self, node: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.cordoned.remove(node);
    }

    pub fn is_cordoned(&self, node: &str) -> bool {
        self.inner.lock().unwrap().cordoned.contains(node)
    }

    pub fn is_deleted(&self, node: &str) -> bool {
        self.inner.lock().unwrap().deleted.contains(node)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.inner.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn mutation_count(&self) -> usize {
        self.count_calls(|c| !matches!(c, Call::Probe))
    }
}

impl InventoryGateway for FakeCluster {
    async fn get_cluster(&self) -> GatewayResult<Cluster> {
        Ok(Cluster {
            name: "prod".to_string(),
            region: "asia-northeast1".to_string(),
            status: ClusterStatus::Running,
            pools: Vec::new(),
        })
    }

    async fn get_node_list(&self) -> GatewayResult<Vec<Node>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .values()
            .filter(|n| !inner.deleted.contains(&n.name))
            .map(|n| view(n, &inner))
            .collect())
    }

    async fn get_node(&self, name: &str) -> GatewayResult<Node> {
        let inner = self.inner.lock().unwrap();
        if inner.deleted.contains(name) {
            return Err(GatewayError::NotFound(name.to_string()));
        }
        inner
            .nodes
            .get(name)
            .map(|n| view(n, &inner))
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }
}

fn view(node: &Node, inner: &Inner) -> Node {
    let mut node = node.clone();
    node.schedulable = !inner.cordoned.contains(&node.name);
    node.ready = node.ready && node.schedulable;
    node
}

impl NodeLifecycleGateway for FakeCluster {
    async fn cordon(&self, node: &str) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Cordon(node.to_string()));
        if inner.cordon_failures.contains(node) {
            return Err(GatewayError::Api(format!("cordon refused for {node}")));
        }
        inner.cordoned.insert(node.to_string());
        Ok(())
    }

    async fn uncordon(&self, node: &str) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Uncordon(node.to_string()));
        if inner.uncordon_failures.contains(node) {
            return Err(GatewayError::Api(format!("uncordon refused for {node}")));
        }
        inner.cordoned.remove(node);
        Ok(())
    }

    async fn probe_eviction_api(&self) -> GatewayResult<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Probe);
        Ok(inner.eviction_api.clone())
    }

    async fn evict_pod(
        &self,
        _namespace: &str,
        name: &str,
        _api_version: Option<&str>,
    ) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Evict(name.to_string()));
        if let Some(error) = inner.evict_failures.get(name) {
            return Err(error.clone());
        }
        if let Some(remaining) = inner.budget_blocks.get_mut(name) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(GatewayError::DisruptionBudget {
                    pod: name.to_string(),
                });
            }
        }
        for node in inner.nodes.values_mut() {
            node.pods.retain(|p| p.name != name);
        }
        Ok(())
    }

    async fn delete_node(&self, name: &str) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Delete(name.to_string()));
        inner.deleted.insert(name.to_string());
        Ok(())
    }

    async fn stop_instance(&self, _zone: &str, name: &str) -> GatewayResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Stop(name.to_string()));
        if inner.stop_failures.contains(name) {
            return Err(GatewayError::Api(format!("stop refused for {name}")));
        }
        Ok(())
    }
}

/// Build a ready node in the given pool flavor with named pods.
pub fn test_node(name: &str, preemptible: bool, pods: &[&str]) -> Node {
    Node {
        name: name.to_string(),
        pool: if preemptible { "spot" } else { "ondemand" }.to_string(),
        region: "asia-northeast1".to_string(),
        zone: "asia-northeast1-a".to_string(),
        ready: true,
        schedulable: true,
        preemptible,
        age: Duration::from_secs(3600),
        pods: pods.iter().map(|p| test_pod(p, name)).collect(),
    }
}

pub fn test_pod(name: &str, node: &str) -> Pod {
    Pod {
        name: name.to_string(),
        namespace: "default".to_string(),
        node_name: node.to_string(),
        phase: PodPhase::Running,
    }
}
