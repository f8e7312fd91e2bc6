//! Single-node refresh state machine.
//!
//! Drives one node through `Pending → Cordoned → Drained → {Terminated |
//! CordonRolledBack}`. Only preemptible nodes are terminated; autoscaled
//! on-demand nodes are drained and handed back to the native autoscaler.
//! Partial progress (pods evicted before a failure) stays observable on
//! the machine.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use nodecycle_model::{GatewayError, InventoryGateway, Node, NodeLifecycleGateway, Pod};

use crate::config::{CancelSignal, RefreshConfig, wait};
use crate::error::{RefreshError, RefreshResult};

/// Phase of a single node's refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshPhase {
    /// Not touched yet.
    Pending,
    /// Marked unschedulable.
    Cordoned,
    /// All pods evicted.
    Drained,
    /// Node deleted and instance stop requested. Irreversible.
    Terminated,
    /// Cordon undone, node schedulable again.
    CordonRolledBack,
}

/// Final per-node record of a refresh run, kept for reporting.
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    pub node: String,
    pub phase: RefreshPhase,
    pub evicted: Vec<Pod>,
}

/// The refresh state machine for one node.
pub struct NodeRefresh<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    node: Node,
    inventory: &'a I,
    lifecycle: &'a L,
    config: &'a RefreshConfig,
    phase: RefreshPhase,
    evicted: Vec<Pod>,
}

impl<'a, I, L> NodeRefresh<'a, I, L>
where
    I: InventoryGateway,
    L: NodeLifecycleGateway,
{
    pub fn new(node: Node, inventory: &'a I, lifecycle: &'a L, config: &'a RefreshConfig) -> Self {
        Self {
            node,
            inventory,
            lifecycle,
            config,
            phase: RefreshPhase::Pending,
            evicted: Vec::new(),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    /// Pods evicted so far, including partial progress after a failure.
    pub fn evicted(&self) -> &[Pod] {
        &self.evicted
    }

    /// True while the node is cordoned but not deleted, i.e. a failed
    /// run must uncordon it on the way out.
    pub fn needs_uncordon(&self) -> bool {
        matches!(self.phase, RefreshPhase::Cordoned | RefreshPhase::Drained)
    }

    pub fn into_outcome(self) -> NodeOutcome {
        NodeOutcome {
            node: self.node.name,
            phase: self.phase,
            evicted: self.evicted,
        }
    }

    /// Mark the node unschedulable. The gateway treats an already
    /// cordoned node as success.
    pub async fn cordon(&mut self) -> RefreshResult<()> {
        match self.lifecycle.cordon(&self.node.name).await {
            Ok(()) => {
                self.phase = RefreshPhase::Cordoned;
                info!(node = %self.node.name, "cordoned node");
                Ok(())
            }
            Err(GatewayError::Cancelled) => Err(RefreshError::Cancelled),
            Err(source) => Err(RefreshError::Cordon {
                node: self.node.name.clone(),
                source,
            }),
        }
    }

    /// Evict every pod bound to the node.
    ///
    /// A disruption-budget violation is retried with a fixed backoff up
    /// to the configured attempt budget; any other eviction failure is
    /// fatal immediately. Pods evicted before a failure remain recorded.
    pub async fn drain(
        &mut self,
        api_version: Option<&str>,
        cancel: &mut CancelSignal,
    ) -> RefreshResult<()> {
        let pods = self.node.pods.clone();
        for pod in pods {
            self.evict_with_retry(&pod, api_version, cancel).await?;
            info!(pod = %pod.name, node = %self.node.name, "evicted pod");
            self.evicted.push(pod);
        }
        self.phase = RefreshPhase::Drained;
        info!(node = %self.node.name, evicted = self.evicted.len(), "drained node");
        Ok(())
    }

    async fn evict_with_retry(
        &self,
        pod: &Pod,
        api_version: Option<&str>,
        cancel: &mut CancelSignal,
    ) -> RefreshResult<()> {
        let mut attempt = 1u32;
        loop {
            match self
                .lifecycle
                .evict_pod(&pod.namespace, &pod.name, api_version)
                .await
            {
                Ok(()) => return Ok(()),
                Err(source) if source.is_disruption_budget() => {
                    if attempt >= self.config.max_eviction_attempts {
                        return Err(RefreshError::EvictionBudgetExhausted {
                            node: self.node.name.clone(),
                            pod: pod.name.clone(),
                            attempts: attempt,
                            source,
                        });
                    }
                    warn!(
                        pod = %pod.name,
                        node = %self.node.name,
                        attempt,
                        backoff_secs = self.config.eviction_backoff.as_secs(),
                        "eviction blocked by disruption budget, backing off"
                    );
                    wait(self.config.eviction_backoff, cancel).await?;
                    attempt += 1;
                }
                Err(GatewayError::Cancelled) => return Err(RefreshError::Cancelled),
                Err(source) => {
                    return Err(RefreshError::Evict {
                        node: self.node.name.clone(),
                        pod: pod.name.clone(),
                        source,
                    });
                }
            }
        }
    }

    /// Terminate the node if it is preemptible; otherwise leave its
    /// removal to the native autoscaler.
    ///
    /// The node is re-fetched first: if some external actor made it
    /// schedulable again mid-protocol, termination aborts without
    /// deleting. Once the node object is deleted the machine is in
    /// `Terminated` regardless of the instance-stop result — deletion is
    /// not rolled back.
    pub async fn maybe_terminate(&mut self) -> RefreshResult<()> {
        if !self.node.preemptible {
            debug!(node = %self.node.name, "on-demand node, skipping termination");
            return Ok(());
        }

        let current = match self.inventory.get_node(&self.node.name).await {
            Ok(node) => node,
            Err(GatewayError::Cancelled) => return Err(RefreshError::Cancelled),
            Err(source) => {
                return Err(RefreshError::Resolve {
                    node: self.node.name.clone(),
                    source,
                });
            }
        };
        if current.schedulable {
            return Err(RefreshError::UnexpectedSchedulableState {
                node: self.node.name.clone(),
            });
        }

        match self.lifecycle.delete_node(&self.node.name).await {
            Ok(()) => {}
            Err(GatewayError::Cancelled) => return Err(RefreshError::Cancelled),
            Err(source) => {
                return Err(RefreshError::DeleteNode {
                    node: self.node.name.clone(),
                    source,
                });
            }
        }
        self.phase = RefreshPhase::Terminated;
        info!(node = %self.node.name, "deleted node object");

        match self
            .lifecycle
            .stop_instance(&self.node.zone, &self.node.name)
            .await
        {
            Ok(()) => {
                info!(node = %self.node.name, zone = %self.node.zone, "stopped instance");
                Ok(())
            }
            Err(GatewayError::Cancelled) => Err(RefreshError::Cancelled),
            Err(source) => Err(RefreshError::StopInstance {
                node: self.node.name.clone(),
                zone: self.node.zone.clone(),
                source,
            }),
        }
    }

    /// Undo the cordon. Skipped (success) once the node is deleted.
    pub async fn uncordon(&mut self) -> Result<(), GatewayError> {
        if !self.needs_uncordon() {
            return Ok(());
        }
        self.lifecycle.uncordon(&self.node.name).await?;
        self.phase = RefreshPhase::CordonRolledBack;
        info!(node = %self.node.name, "uncordoned node");
        Ok(())
    }
}
