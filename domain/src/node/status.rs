//! Cluster status snapshot for diagnostics

use super::entities::{ArbiterRoute, CouncilMember, NodeHealth};
use super::registry::NodeRegistry;
use crate::core::model::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health state of a node as seen by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Never probed; routable until a probe says otherwise
    Unchecked,
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn from_health(health: Option<&NodeHealth>) -> Self {
        match health {
            None => HealthState::Unchecked,
            Some(h) if h.healthy => HealthState::Healthy,
            Some(_) => HealthState::Unhealthy,
        }
    }

    /// Healthy or unchecked
    pub fn is_routable(&self) -> bool {
        !matches!(self, HealthState::Unhealthy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unchecked => "unchecked",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Status line for one enabled node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub url: String,
    pub state: HealthState,
    pub last_check: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub configured_models: Vec<ModelId>,
    pub available_models: Vec<String>,
    pub arbiter: bool,
    pub arbiter_model: Option<ModelId>,
}

/// Snapshot of the whole cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub total_nodes: usize,
    pub healthy_nodes: usize,
    pub nodes: Vec<NodeStatus>,
    pub arbiter: Option<ArbiterRoute>,
    pub council: Vec<CouncilMember>,
}

impl ClusterStatus {
    /// Combine the registry with per-node health looked up by node name
    pub fn build<F>(registry: &NodeRegistry, health_of: F) -> Self
    where
        F: Fn(&str) -> Option<NodeHealth>,
    {
        let nodes: Vec<NodeStatus> = registry
            .list_enabled()
            .map(|node| {
                let health = health_of(&node.name);
                NodeStatus {
                    name: node.name.clone(),
                    url: node.base_url(),
                    state: HealthState::from_health(health.as_ref()),
                    last_check: health.as_ref().map(|h| h.last_check),
                    last_error: health.as_ref().and_then(|h| h.last_error.clone()),
                    consecutive_failures: health.as_ref().map_or(0, |h| h.consecutive_failures),
                    configured_models: node.models.clone(),
                    available_models: health.map(|h| h.available_models).unwrap_or_default(),
                    arbiter: node.arbiter,
                    arbiter_model: node.arbiter_model.clone(),
                }
            })
            .collect();

        Self {
            total_nodes: nodes.len(),
            healthy_nodes: nodes.iter().filter(|n| n.state.is_routable()).count(),
            nodes,
            arbiter: registry.resolve_arbiter(),
            council: registry.council_members(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::entities::Node;

    #[test]
    fn test_status_counts_unchecked_as_healthy() {
        let registry = NodeRegistry::from_nodes(vec![
            Node::new("a", "localhost", 8080).with_models(["m1"]),
            Node::new("b", "localhost", 8081).with_models(["m2"]),
            Node::new("c", "localhost", 8082).disabled(),
        ])
        .unwrap();

        let status = ClusterStatus::build(&registry, |name| {
            (name == "b").then(|| {
                let mut h = NodeHealth::new("b");
                h.record_failure("connection refused");
                h
            })
        });

        assert_eq!(status.total_nodes, 2);
        assert_eq!(status.healthy_nodes, 1);
        assert_eq!(status.nodes[0].state, HealthState::Unchecked);
        assert_eq!(status.nodes[1].state, HealthState::Unhealthy);
        assert_eq!(status.nodes[1].consecutive_failures, 1);
        assert_eq!(status.arbiter.unwrap().node, "a");
        assert_eq!(status.council.len(), 2);
    }
}
