//! Shared cluster state
//!
//! The registry is an immutable snapshot swapped atomically on every change;
//! readers never block and may observe a slightly stale registry. Health is
//! kept per node in a concurrent map and is dropped when its node goes away.

use arc_swap::ArcSwap;
use council_domain::{ClusterStatus, HealthState, Node, NodeHealth, NodeRegistry, RegistryError};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Registry snapshot plus ephemeral health, shared by router and dispatcher
pub struct ClusterContext {
    registry: ArcSwap<NodeRegistry>,
    /// Serializes clone-modify-store so concurrent writers do not lose updates
    write_lock: Mutex<()>,
    health: DashMap<String, NodeHealth>,
}

impl ClusterContext {
    pub fn new(registry: NodeRegistry) -> Self {
        Self {
            registry: ArcSwap::from_pointee(registry),
            write_lock: Mutex::new(()),
            health: DashMap::new(),
        }
    }

    /// Current registry snapshot
    pub fn registry(&self) -> Arc<NodeRegistry> {
        self.registry.load_full()
    }

    /// Replace the whole registry (configuration reload).
    ///
    /// Health of nodes that still exist is kept.
    pub fn replace(&self, registry: NodeRegistry) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.health.retain(|name, _| registry.get(name).is_some());
        info!("Registry replaced with {} nodes", registry.len());
        self.registry.store(Arc::new(registry));
    }

    pub fn add_node(&self, node: Node) -> Result<(), RegistryError> {
        self.modify(|registry| registry.add(node))
    }

    pub fn update_node(&self, name: &str, node: Node) -> Result<(), RegistryError> {
        let renamed = node.name != name;
        self.modify(|registry| registry.update(name, node))?;
        if renamed {
            self.health.remove(name);
        }
        Ok(())
    }

    pub fn remove_node(&self, name: &str) -> Result<Node, RegistryError> {
        let removed = self.modify(|registry| registry.remove(name))?;
        self.health.remove(name);
        Ok(removed)
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut NodeRegistry) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = NodeRegistry::clone(&self.registry.load());
        let out = change(&mut next)?;
        self.registry.store(Arc::new(next));
        Ok(out)
    }

    /// Last observed health; `None` until the node is first probed
    pub fn health(&self, name: &str) -> Option<NodeHealth> {
        self.health.get(name).map(|entry| entry.value().clone())
    }

    pub fn health_state(&self, name: &str) -> HealthState {
        HealthState::from_health(self.health(name).as_ref())
    }

    pub fn record_success(&self, name: &str, advertised: &[String]) -> NodeHealth {
        self.record(name, |health| health.record_success(advertised))
    }

    pub fn record_failure(&self, name: &str, error: impl Into<String>) -> NodeHealth {
        self.record(name, |health| health.record_failure(error))
    }

    /// Apply a health check outcome. Nodes no longer in the registry get a detached
    /// record that is returned but never stored.
    fn record(&self, name: &str, update: impl FnOnce(&mut NodeHealth)) -> NodeHealth {
        if self.registry().get(name).is_none() {
            debug!("Ignoring health result for removed node {}", name);
            let mut detached = NodeHealth::new(name);
            update(&mut detached);
            return detached;
        }

        let health = {
            let mut entry = self
                .health
                .entry(name.to_string())
                .or_insert_with(|| NodeHealth::new(name));
            update(entry.value_mut());
            entry.value().clone()
        };

        // The node may have been removed while the entry was written
        if self.registry().get(name).is_none() {
            self.health.remove(name);
        }
        health
    }

    /// Snapshot of every enabled node with its health
    pub fn status(&self) -> ClusterStatus {
        let registry = self.registry();
        ClusterStatus::build(&registry, |name| self.health(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> NodeRegistry {
        NodeRegistry::from_nodes(vec![
            Node::new("a", "localhost", 8080).with_models(["qwen3:4b"]),
            Node::new("b", "localhost", 8081).with_models(["gemma3:4b"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_mutations_publish_new_snapshot() {
        let context = ClusterContext::new(registry());
        let before = context.registry();

        context
            .add_node(Node::new("c", "localhost", 8082).with_models(["phi4"]))
            .unwrap();

        assert_eq!(before.len(), 2);
        assert_eq!(context.registry().len(), 3);
        assert!(matches!(
            context.add_node(Node::new("c", "x", 1)),
            Err(RegistryError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_remove_drops_health() {
        let context = ClusterContext::new(registry());
        context.record_failure("a", "connection refused");
        assert_eq!(context.health_state("a"), HealthState::Unhealthy);

        context.remove_node("a").unwrap();
        assert!(context.health("a").is_none());
        assert!(matches!(
            context.remove_node("a"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_late_health_result_for_removed_node_is_not_stored() {
        let context = ClusterContext::new(registry());
        context.remove_node("b").unwrap();

        let late = context.record_success("b", &["gemma3:4b".to_string()]);
        assert!(late.healthy);
        assert!(context.health("b").is_none());

        context.record_failure("b", "timeout");
        assert!(context.health("b").is_none());
        assert_eq!(context.health_state("b"), HealthState::Unchecked);
    }

    #[test]
    fn test_health_transitions() {
        let context = ClusterContext::new(registry());
        assert_eq!(context.health_state("b"), HealthState::Unchecked);

        let failed = context.record_failure("b", "timeout");
        assert_eq!(failed.consecutive_failures, 1);
        let failed = context.record_failure("b", "timeout");
        assert_eq!(failed.consecutive_failures, 2);

        let healthy = context.record_success("b", &["gemma3:latest".to_string()]);
        assert!(healthy.healthy);
        assert_eq!(healthy.consecutive_failures, 0);
        assert_eq!(healthy.available_models, vec!["gemma3".to_string()]);
        assert_eq!(context.health_state("b"), HealthState::Healthy);
    }

    #[test]
    fn test_replace_keeps_surviving_health() {
        let context = ClusterContext::new(registry());
        context.record_success("a", &[]);
        context.record_failure("b", "down");

        let reloaded = NodeRegistry::from_nodes(vec![
            Node::new("a", "localhost", 9000).with_models(["qwen3:4b"]),
        ])
        .unwrap();
        context.replace(reloaded);

        assert!(context.health("a").is_some());
        assert!(context.health("b").is_none());
        assert_eq!(context.status().total_nodes, 1);
    }
}
