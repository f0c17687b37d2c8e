//! Council gateway port
//!
//! Defines how the deliberation reaches council members and the arbiter.
//! The distributed implementation (routing, retries, health) lives in the
//! infrastructure layer.

use async_trait::async_trait;
use council_domain::{ArbiterRoute, ChatMessage, CouncilMember, ModelId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where a request should be sent
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// Resolve a node through the health-aware router
    #[default]
    Routed,
    /// Pin to a named registry node
    Node(String),
    /// Raw Ollama server URL, bypassing the registry
    Endpoint(String),
}

/// One chat request for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub model: ModelId,
    pub target: Target,
    /// Overrides the node and dispatcher timeouts
    pub timeout: Option<Duration>,
}

impl QueryRequest {
    pub fn routed(model: impl Into<ModelId>) -> Self {
        Self {
            model: model.into(),
            target: Target::Routed,
            timeout: None,
        }
    }

    pub fn on_node(model: impl Into<ModelId>, node: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            target: Target::Node(node.into()),
            timeout: None,
        }
    }

    pub fn at_endpoint(model: impl Into<ModelId>, url: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            target: Target::Endpoint(url.into()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Normalized answer of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub content: String,
    /// Name of the node that answered (or the endpoint URL for raw targets)
    pub node: String,
    pub model: ModelId,
}

/// Fan-out outcome per requested model, in request order
pub type FanOutResults = Vec<(ModelId, Option<QueryResult>)>;

/// Gateway to the council
///
/// Failures never surface as errors: a request that cannot be routed or
/// exhausts its retries yields `None`.
#[async_trait]
pub trait CouncilGateway: Send + Sync {
    /// Current council roster: distinct models with their hosting node
    fn council(&self) -> Vec<CouncilMember>;

    /// Resolved arbiter, if any enabled node serves a model
    fn arbiter(&self) -> Option<ArbiterRoute>;

    /// Send one request with bounded retries
    async fn query_one(&self, request: &QueryRequest, messages: &[ChatMessage])
    -> Option<QueryResult>;

    /// Send the same messages to every request concurrently; one failure
    /// never affects the others
    async fn query_many_parallel(
        &self,
        requests: Vec<QueryRequest>,
        messages: &[ChatMessage],
    ) -> FanOutResults;

    /// Send messages to the resolved arbiter
    async fn query_arbiter(&self, messages: &[ChatMessage]) -> Option<QueryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builders() {
        let routed = QueryRequest::routed("qwen3:4b");
        assert_eq!(routed.target, Target::Routed);
        assert_eq!(routed.timeout, None);

        let pinned =
            QueryRequest::on_node("qwen3:4b", "gpu-1").with_timeout(Duration::from_secs(30));
        assert_eq!(pinned.target, Target::Node("gpu-1".to_string()));
        assert_eq!(pinned.timeout, Some(Duration::from_secs(30)));

        let raw = QueryRequest::at_endpoint("llama3.2", "http://10.0.0.5:11434");
        assert_eq!(raw.target, Target::Endpoint("http://10.0.0.5:11434".to_string()));
    }
}
