//! The optimize run.

use tracing::{info, warn};

use nodecycle_model::{Cluster, InventoryGateway, Node, NodeLifecycleGateway, Pod};
use nodecycle_refresh::{CancelSignal, NodeOutcome, Orchestrator, RefreshConfig};
use nodecycle_select::{SelectionPolicy, SelectionResult, select_targets};

use crate::error::OptimizeError;

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct OptimizerOptions {
    pub policy: SelectionPolicy,
    pub refresh: RefreshConfig,
}

/// Everything a run produced, successful or not.
///
/// Evicted pods are merged in even when the run failed; reporting must
/// see partial progress.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// The cluster snapshot the run acted on, once fetched.
    pub cluster: Option<Cluster>,
    /// The validated node snapshot, once fetched.
    pub nodes: Vec<Node>,
    /// Selection result, once computed.
    pub selection: Option<SelectionResult>,
    /// Per-node refresh records in processing order.
    pub node_outcomes: Vec<NodeOutcome>,
    /// Every pod evicted during the run.
    pub evicted_pods: Vec<Pod>,
    pub error: Option<OptimizeError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Evicted pods that were bound to the named node.
    pub fn evicted_pods_on(&self, node: &str) -> Vec<&Pod> {
        self.evicted_pods
            .iter()
            .filter(|p| p.node_name == node)
            .collect()
    }

    fn fail(mut self, error: impl Into<OptimizeError>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Top-level coordinator: selection, then refresh, then aggregation.
pub struct Optimizer<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    inventory: &'a I,
    lifecycle: &'a L,
    options: OptimizerOptions,
}

impl<'a, I, L> Optimizer<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    pub fn new(inventory: &'a I, lifecycle: &'a L, options: OptimizerOptions) -> Self {
        Self {
            inventory,
            lifecycle,
            options,
        }
    }

    /// Execute one run. Never panics, never loses partial results; the
    /// outcome carries the final error if there was one.
    pub async fn run(&self, cancel: &mut CancelSignal) -> RunOutcome {
        let mut outcome = RunOutcome::default();

        let cluster = match self.inventory.get_cluster().await {
            Ok(cluster) => cluster,
            Err(e) => return outcome.fail(e),
        };
        info!(cluster = %cluster.name, pools = cluster.pools.len(), "fetched cluster");
        outcome.cluster = Some(cluster.clone());

        let nodes = match self.inventory.get_node_list().await {
            Ok(nodes) => nodes,
            Err(e) => return outcome.fail(e),
        };
        info!(nodes = nodes.len(), "fetched node snapshot");
        outcome.nodes = nodes.clone();

        let selection = match select_targets(&cluster, &nodes, &self.options.policy) {
            Ok(selection) => selection,
            Err(e) => {
                warn!(error = %e, "selection refused to act");
                return outcome.fail(e);
            }
        };
        let targets = selection.refresh_targets.clone();
        outcome.selection = Some(selection);

        if targets.is_empty() {
            info!("no refresh targets, nothing to do");
            return outcome;
        }

        let orchestrator =
            Orchestrator::new(self.inventory, self.lifecycle, self.options.refresh.clone());
        let refresh = orchestrator.refresh_nodes(&targets, cancel).await;
        outcome.node_outcomes = refresh.nodes;
        outcome.evicted_pods = refresh.evicted_pods;
        if let Some(e) = refresh.error {
            return outcome.fail(e);
        }

        info!(
            targets = targets.len(),
            evicted = outcome.evicted_pods.len(),
            "optimize run succeeded"
        );
        outcome
    }
}
