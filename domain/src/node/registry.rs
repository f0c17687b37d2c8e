//! In-memory node registry

use super::entities::{ArbiterRoute, CouncilMember, Node};
use thiserror::Error;

/// Errors raised by registry mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Node '{0}' already exists")]
    DuplicateName(String),

    #[error("Node '{0}' not found")]
    NotFound(String),
}

/// Roster of configured nodes, in declaration order
///
/// Node names are unique. The registry is not durable: it is rebuilt from
/// configuration on every start and replaced wholesale on reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a loaded node list, rejecting duplicate names
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for node in nodes {
            registry.add(node)?;
        }
        Ok(registry)
    }

    pub fn add(&mut self, node: Node) -> Result<(), RegistryError> {
        if self.get(&node.name).is_some() {
            return Err(RegistryError::DuplicateName(node.name));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Replace the node called `name`; `node` may carry a new name
    pub fn update(&mut self, name: &str, node: Node) -> Result<(), RegistryError> {
        let index = self
            .position(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if node.name != name && self.get(&node.name).is_some() {
            return Err(RegistryError::DuplicateName(node.name));
        }
        self.nodes[index] = node;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Node, RegistryError> {
        let index = self
            .position(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        Ok(self.nodes.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn list(&self) -> &[Node] {
        &self.nodes
    }

    pub fn list_enabled(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.enabled)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve the arbiter.
    ///
    /// The first enabled node flagged as arbiter wins, using its arbiter model
    /// (or its first model). Without a flagged node, the first model of the
    /// first enabled node that has models is used. `None` only when no
    /// enabled node hosts any model.
    pub fn resolve_arbiter(&self) -> Option<ArbiterRoute> {
        let flagged = self
            .list_enabled()
            .filter(|n| n.arbiter)
            .find_map(|n| n.arbiter_route_model().map(|m| (n, m)));

        let (node, model) = flagged.or_else(|| {
            self.list_enabled()
                .find_map(|n| n.models.first().map(|m| (n, m)))
        })?;

        Some(ArbiterRoute {
            node: node.name.clone(),
            model: model.clone(),
        })
    }

    /// Council roster: every distinct model across enabled nodes.
    ///
    /// Order follows node declaration order, then each node's model order.
    /// A model hosted by several nodes is seated once, with its first host.
    pub fn council_members(&self) -> Vec<CouncilMember> {
        let mut members: Vec<CouncilMember> = Vec::new();
        for node in self.list_enabled() {
            for model in &node.models {
                if members.iter().any(|m| &m.model == model) {
                    continue;
                }
                members.push(CouncilMember {
                    model: model.clone(),
                    node: node.name.clone(),
                });
            }
        }
        members
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ModelId;

    fn node(name: &str, models: &[&str]) -> Node {
        Node::new(name, "localhost", 8080).with_models(models.iter().copied())
    }

    #[test]
    fn test_add_rejects_duplicate_name() {
        let mut registry = NodeRegistry::new();
        registry.add(node("a", &["llama3.2"])).unwrap();
        let err = registry.add(node("a", &["mistral"])).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("a".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_nodes_validates_uniqueness() {
        let result = NodeRegistry::from_nodes(vec![node("a", &[]), node("a", &[])]);
        assert!(matches!(result, Err(RegistryError::DuplicateName(_))));
    }

    #[test]
    fn test_update_not_found_and_rename_conflict() {
        let mut registry =
            NodeRegistry::from_nodes(vec![node("a", &["m1"]), node("b", &["m2"])]).unwrap();

        assert_eq!(
            registry.update("zzz", node("zzz", &[])),
            Err(RegistryError::NotFound("zzz".to_string()))
        );
        assert_eq!(
            registry.update("a", node("b", &[])),
            Err(RegistryError::DuplicateName("b".to_string()))
        );

        registry.update("a", node("c", &["m3"])).unwrap();
        assert!(registry.get("a").is_none());
        assert_eq!(registry.list()[0].name, "c");
    }

    #[test]
    fn test_update_same_name_keeps_position() {
        let mut registry =
            NodeRegistry::from_nodes(vec![node("a", &["m1"]), node("b", &["m2"])]).unwrap();
        registry.update("b", node("b", &["m9"])).unwrap();
        assert_eq!(registry.list()[1].models, vec![ModelId::from("m9")]);
    }

    #[test]
    fn test_remove() {
        let mut registry = NodeRegistry::from_nodes(vec![node("a", &[])]).unwrap();
        assert_eq!(
            registry.remove("b"),
            Err(RegistryError::NotFound("b".to_string()))
        );
        let removed = registry.remove("a").unwrap();
        assert_eq!(removed.name, "a");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_enabled_skips_disabled() {
        let registry =
            NodeRegistry::from_nodes(vec![node("a", &[]).disabled(), node("b", &[])]).unwrap();
        let names: Vec<_> = registry.list_enabled().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
        assert_eq!(registry.list().len(), 2);
    }

    #[test]
    fn test_resolve_arbiter_prefers_flagged_node() {
        let registry = NodeRegistry::from_nodes(vec![
            node("a", &["qwen3:4b"]),
            node("b", &["gemma3:4b"]).as_arbiter("mistral"),
        ])
        .unwrap();

        let arbiter = registry.resolve_arbiter().unwrap();
        assert_eq!(arbiter.node, "b");
        assert_eq!(arbiter.model, ModelId::from("mistral"));
    }

    #[test]
    fn test_resolve_arbiter_ignores_disabled_flagged_node() {
        let registry = NodeRegistry::from_nodes(vec![
            node("a", &["qwen3:4b"]),
            node("b", &["gemma3:4b"]).as_arbiter("mistral").disabled(),
        ])
        .unwrap();

        let arbiter = registry.resolve_arbiter().unwrap();
        assert_eq!(arbiter.node, "a");
        assert_eq!(arbiter.model, ModelId::from("qwen3:4b"));
    }

    #[test]
    fn test_resolve_arbiter_falls_back_to_first_enabled_model() {
        let registry = NodeRegistry::from_nodes(vec![
            node("empty", &[]),
            node("a", &["qwen3:4b", "gemma3:4b"]),
        ])
        .unwrap();

        let arbiter = registry.resolve_arbiter().unwrap();
        assert_eq!(arbiter.node, "a");
        assert_eq!(arbiter.model, ModelId::from("qwen3:4b"));
    }

    #[test]
    fn test_resolve_arbiter_none_without_enabled_models() {
        let registry =
            NodeRegistry::from_nodes(vec![node("a", &["m"]).disabled(), node("b", &[])]).unwrap();
        assert!(registry.resolve_arbiter().is_none());
        assert!(NodeRegistry::new().resolve_arbiter().is_none());
    }

    #[test]
    fn test_council_members_dedupes_models() {
        let registry = NodeRegistry::from_nodes(vec![
            node("a", &["qwen3:4b", "gemma3:4b"]),
            node("b", &["gemma3:4b", "mistral"]),
            node("c", &["phi4"]).disabled(),
        ])
        .unwrap();

        let members = registry.council_members();
        let seats: Vec<_> = members
            .iter()
            .map(|m| (m.model.as_str(), m.node.as_str()))
            .collect();
        assert_eq!(
            seats,
            vec![("qwen3:4b", "a"), ("gemma3:4b", "a"), ("mistral", "b")]
        );
    }
}
