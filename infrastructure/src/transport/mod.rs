//! Node transport
//!
//! [`NodeTransport`] is the seam between routing/dispatch logic and the
//! network. [`HttpNodeTransport`] speaks both node dialects over reqwest;
//! tests substitute a scripted transport.

mod error;
mod http;
pub(crate) mod wire;

pub use error::TransportError;
pub use http::HttpNodeTransport;

use async_trait::async_trait;
use council_domain::{ChatMessage, DEFAULT_OLLAMA_PORT, Node, NodeAddress, NodeApi};
use serde_json::{Map, Value};

/// Resolved address and credentials of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Registry name, or the URL itself for raw endpoints
    pub name: String,
    pub base_url: String,
    pub api: NodeApi,
    pub api_key: Option<String>,
}

impl Endpoint {
    pub fn for_node(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            base_url: node.base_url(),
            api: node.api,
            api_key: node.api_key.clone(),
        }
    }

    /// Unregistered Ollama server, e.g. `http://192.168.1.9` or `gpu.lan:11434`.
    ///
    /// The port defaults to 11434 and the scheme to `http`.
    pub fn raw(url: &str) -> Self {
        let base_url = NodeAddress::parse(url).url(DEFAULT_OLLAMA_PORT);
        Self {
            name: base_url.clone(),
            base_url,
            api: NodeApi::Ollama,
            api_key: None,
        }
    }
}

/// One chat call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Backend sampling options, passed through verbatim
    pub options: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: Map::new(),
        }
    }
}

/// Answer of one chat call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    /// Node name reported by a node server
    pub node: Option<String>,
}

/// Outcome of a liveness probe that reached the node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Set when the node answered but reports its backend as unusable
    pub degraded: Option<String>,
    /// Advertised model names as reported (tags not stripped)
    pub available_models: Vec<String>,
}

/// Transport to inference nodes
#[async_trait]
pub trait NodeTransport: Send + Sync {
    /// Liveness call; any error means the node is unreachable
    async fn probe(&self, endpoint: &Endpoint) -> Result<ProbeReport, TransportError>;

    /// Send one non-streaming chat request
    async fn chat(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<ChatReply, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_for_node() {
        let node = Node::new("gpu-1", "10.0.0.2", 8081)
            .with_api_key("secret")
            .with_api(NodeApi::Ollama);
        let endpoint = Endpoint::for_node(&node);
        assert_eq!(endpoint.name, "gpu-1");
        assert_eq!(endpoint.base_url, "http://10.0.0.2:8081");
        assert_eq!(endpoint.api, NodeApi::Ollama);
        assert_eq!(endpoint.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_raw_endpoint() {
        let endpoint = Endpoint::raw("http://localhost:11434/");
        assert_eq!(endpoint.base_url, "http://localhost:11434");
        assert_eq!(endpoint.name, "http://localhost:11434");
        assert_eq!(endpoint.api, NodeApi::Ollama);
        assert!(endpoint.api_key.is_none());

        assert_eq!(Endpoint::raw("192.168.1.9").base_url, "http://192.168.1.9:11434");
        assert_eq!(Endpoint::raw("https://gpu.lan:8443").base_url, "https://gpu.lan:8443");
    }
}
