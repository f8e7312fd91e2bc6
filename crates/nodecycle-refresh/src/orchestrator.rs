//! Multi-node refresh orchestration.
//!
//! Targets are processed strictly sequentially — never concurrently —
//! so a run can only ever lose one node's capacity at a time. All
//! targets are cordoned before the first drain; a pending-rollback set
//! guarantees that every node still cordoned and not yet deleted is
//! uncordoned on the way out, whether the run succeeded or not.

use tracing::{error, info};

use nodecycle_model::{GatewayError, InventoryGateway, NodeLifecycleGateway, Pod};

use crate::config::{CancelSignal, RefreshConfig, check_cancelled, wait};
use crate::error::RefreshError;
use crate::machine::{NodeOutcome, NodeRefresh};

/// Aggregated result of one orchestrated refresh run.
///
/// Failures abort further progress, but pods evicted before the failure
/// are never discarded — callers must not infer "no error" from a
/// non-empty eviction list.
#[derive(Debug)]
pub struct RefreshOutcome {
    /// Per-node records in processing order.
    pub nodes: Vec<NodeOutcome>,
    /// Every pod evicted during the run, across all nodes.
    pub evicted_pods: Vec<Pod>,
    pub error: Option<RefreshError>,
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    fn failed(error: RefreshError) -> Self {
        Self {
            nodes: Vec::new(),
            evicted_pods: Vec::new(),
            error: Some(error),
        }
    }
}

/// Sequences the single-node state machine over an ordered target list.
pub struct Orchestrator<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    inventory: &'a I,
    lifecycle: &'a L,
    config: RefreshConfig,
}

impl<'a, I, L> Orchestrator<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    pub fn new(inventory: &'a I, lifecycle: &'a L, config: RefreshConfig) -> Self {
        Self {
            inventory,
            lifecycle,
            config,
        }
    }

    /// Refresh the named nodes in order (preemptible first by
    /// convention of the selection engine).
    pub async fn refresh_nodes(
        &self,
        targets: &[String],
        cancel: &mut CancelSignal,
    ) -> RefreshOutcome {
        // Resolve every target before touching any node.
        let mut machines = Vec::with_capacity(targets.len());
        for name in targets {
            match self.inventory.get_node(name).await {
                Ok(node) => machines.push(NodeRefresh::new(
                    node,
                    self.inventory,
                    self.lifecycle,
                    &self.config,
                )),
                Err(GatewayError::Cancelled) => {
                    return RefreshOutcome::failed(RefreshError::Cancelled);
                }
                Err(source) => {
                    return RefreshOutcome::failed(RefreshError::Resolve {
                        node: name.clone(),
                        source,
                    });
                }
            }
        }

        // One capability probe per run, shared by every drain.
        let api_version = match self.lifecycle.probe_eviction_api().await {
            Ok(version) => {
                if version.is_none() {
                    info!("eviction api unavailable, draining without a constraint version");
                }
                version
            }
            Err(GatewayError::Cancelled) => {
                return RefreshOutcome::failed(RefreshError::Cancelled);
            }
            Err(source) => return RefreshOutcome::failed(RefreshError::Probe(source)),
        };

        // Cordon every target first; a failure mid-way stops here and
        // the cleanup below uncordons whatever was already cordoned.
        let mut run_error: Option<RefreshError> = None;
        for machine in machines.iter_mut() {
            if let Err(e) = check_cancelled(cancel) {
                run_error = Some(e);
                break;
            }
            if let Err(e) = machine.cordon().await {
                run_error = Some(e);
                break;
            }
        }

        // Drain and (if preemptible) terminate, one node at a time.
        if run_error.is_none() {
            for index in 0..machines.len() {
                if index > 0 {
                    info!(
                        pacing_secs = self.config.pacing.as_secs(),
                        "waiting for evicted pods to reschedule before the next node"
                    );
                    if let Err(e) = wait(self.config.pacing, cancel).await {
                        run_error = Some(e);
                        break;
                    }
                }
                let machine = &mut machines[index];
                if let Err(e) = machine.drain(api_version.as_deref(), cancel).await {
                    run_error = Some(e);
                    break;
                }
                if let Err(e) = machine.maybe_terminate().await {
                    run_error = Some(e);
                    break;
                }
            }
        }

        // Deferred rollback: uncordon every node still cordoned and not
        // deleted. Runs on success too — a drained on-demand node goes
        // back to the autoscaler schedulable.
        for machine in machines.iter_mut() {
            if let Err(source) = machine.uncordon().await {
                let node = machine.node().name.clone();
                error!(node = %node, error = %source, "rollback uncordon failed");
                run_error = Some(match run_error.take() {
                    None => RefreshError::Uncordon { node, source },
                    Some(primary) => RefreshError::RollbackFailed {
                        node,
                        source,
                        primary: Box::new(primary),
                    },
                });
            }
        }

        let nodes: Vec<NodeOutcome> = machines.into_iter().map(NodeRefresh::into_outcome).collect();
        let evicted_pods: Vec<Pod> = nodes.iter().flat_map(|n| n.evicted.iter().cloned()).collect();
        if let Some(ref e) = run_error {
            error!(error = %e, evicted = evicted_pods.len(), "refresh run failed");
        } else {
            info!(
                nodes = nodes.len(),
                evicted = evicted_pods.len(),
                "refresh run completed"
            );
        }
        RefreshOutcome {
            nodes,
            evicted_pods,
            error: run_error,
        }
    }
}
