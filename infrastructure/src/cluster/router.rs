//! Health-aware routing
//!
//! Probes nodes, records their health in the shared [`ClusterContext`] and
//! picks a node for a model. Probing never fails: every problem is folded
//! into the node's health record.

use super::context::ClusterContext;
use crate::transport::{Endpoint, NodeTransport, TransportError};
use council_domain::{ClusterStatus, Node, NodeHealth};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct HealthRouter {
    context: Arc<ClusterContext>,
    transport: Arc<dyn NodeTransport>,
    probe_timeout: Duration,
}

impl HealthRouter {
    pub fn new(
        context: Arc<ClusterContext>,
        transport: Arc<dyn NodeTransport>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            context,
            transport,
            probe_timeout,
        }
    }

    pub fn context(&self) -> &Arc<ClusterContext> {
        &self.context
    }

    /// Probe one node and record the outcome.
    pub async fn probe(&self, node: &Node) -> NodeHealth {
        let endpoint = Endpoint::for_node(node);
        let outcome =
            match tokio::time::timeout(self.probe_timeout, self.transport.probe(&endpoint)).await {
                Ok(Ok(report)) => match report.degraded {
                    Some(status) => Err(format!("node reports status '{}'", status)),
                    None => Ok(report.available_models),
                },
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err(TransportError::Timeout.to_string()),
            };

        match outcome {
            Ok(models) => {
                debug!("Node {} healthy, advertising {} models", node.name, models.len());
                self.context.record_success(&node.name, &models)
            }
            Err(error) => {
                warn!("Node {} is unhealthy: {}", node.name, error);
                self.context.record_failure(&node.name, error)
            }
        }
    }

    /// Probe every enabled node concurrently
    pub async fn probe_all(&self) -> Vec<NodeHealth> {
        let registry = self.context.registry();
        let results = join_all(registry.list_enabled().map(|node| self.probe(node))).await;
        let healthy = results.iter().filter(|h| h.healthy).count();
        info!("Probed {} nodes: {} healthy", results.len(), healthy);
        results
    }

    /// Pick a node for `model`.
    ///
    /// Nodes whose configured models match (exactly or tag-stripped) win if
    /// they are healthy or never probed. Otherwise any healthy node that
    /// advertised the model at its last probe is used.
    pub fn resolve_node_for_model(&self, model: &str) -> Option<Node> {
        let registry = self.context.registry();

        let configured = registry.list_enabled().find(|node| {
            node.serves_model(model) && self.context.health_state(&node.name).is_routable()
        });

        let node = configured.or_else(|| {
            registry.list_enabled().find(|node| {
                self.context
                    .health(&node.name)
                    .is_some_and(|health| health.healthy && health.advertises(model))
            })
        });

        match node {
            Some(node) => {
                debug!("Routing model {} to node {}", model, node.name);
                Some(node.clone())
            }
            None => {
                warn!("No healthy node found for model {}", model);
                None
            }
        }
    }

    /// Enabled nodes that are healthy or unchecked
    pub fn healthy_nodes(&self) -> Vec<Node> {
        self.context
            .registry()
            .list_enabled()
            .filter(|node| self.context.health_state(&node.name).is_routable())
            .cloned()
            .collect()
    }

    pub fn cluster_status(&self) -> ClusterStatus {
        self.context.status()
    }
}
