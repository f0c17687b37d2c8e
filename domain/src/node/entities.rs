//! Node entities: configured endpoints and their observed health

use crate::core::model::{ModelId, base_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default port of the council node server
pub const DEFAULT_NODE_PORT: u16 = 8080;

/// Default port of a raw Ollama server
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Default per-request timeout for a node
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 120;

/// HTTP dialect spoken by a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeApi {
    /// Council node server (`GET /health`, `POST /chat`)
    #[default]
    Node,
    /// Raw Ollama API (`GET /api/tags`, `POST /api/chat`)
    Ollama,
}

/// Scheme, host and optional port of an address such as
/// `https://gpu.lan:8443/` or `10.0.0.5`
///
/// A missing scheme means `http`. Any path is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAddress<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub port: Option<u16>,
}

impl<'a> NodeAddress<'a> {
    pub fn parse(address: &'a str) -> Self {
        let address = address.trim();
        let (scheme, rest) = address.split_once("://").unwrap_or(("http", address));
        let authority = rest.split('/').next().unwrap_or(rest);

        // `host:port`, or `[v6]:port`; a bare IPv6 literal has no port
        let split = authority.rsplit_once(':').and_then(|(host, port)| {
            let bracketed = host.starts_with('[') && host.ends_with(']');
            if host.contains(':') && !bracketed {
                return None;
            }
            port.parse::<u16>().ok().map(|port| (host, port))
        });

        match split {
            Some((host, port)) => Self {
                scheme,
                host,
                port: Some(port),
            },
            None => Self {
                scheme,
                host: authority,
                port: None,
            },
        }
    }

    /// `scheme://host:port`, using `default_port` when none was given
    pub fn url(&self, default_port: u16) -> String {
        let port = self.port.unwrap_or(default_port);
        format!("{}://{}:{}", self.scheme, self.host, port)
    }
}

/// A configured inference endpoint (Entity, identified by `name`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Host name or IP, optionally with an `http://` / `https://` scheme.
    /// A port embedded here takes precedence over `port`.
    pub address: String,
    pub port: u16,
    pub models: Vec<ModelId>,
    pub enabled: bool,
    pub arbiter: bool,
    pub arbiter_model: Option<ModelId>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api: NodeApi,
}

impl Node {
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port,
            models: Vec::new(),
            enabled: true,
            arbiter: false,
            arbiter_model: None,
            timeout_secs: DEFAULT_NODE_TIMEOUT_SECS,
            api_key: None,
            api: NodeApi::default(),
        }
    }

    pub fn with_models<I, M>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<ModelId>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Flag this node as the arbiter, synthesizing with `model`
    pub fn as_arbiter(mut self, model: impl Into<ModelId>) -> Self {
        self.arbiter = true;
        self.arbiter_model = Some(model.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api(mut self, api: NodeApi) -> Self {
        self.api = api;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL of the node, e.g. `http://10.0.0.5:8080`
    pub fn base_url(&self) -> String {
        NodeAddress::parse(&self.address).url(self.port)
    }

    /// Whether the configured model list contains `model`, exactly or tag-stripped
    pub fn serves_model(&self, model: &str) -> bool {
        self.models.iter().any(|m| m.matches(model))
    }

    /// Model this node would synthesize with when acting as arbiter
    pub fn arbiter_route_model(&self) -> Option<&ModelId> {
        self.arbiter_model.as_ref().or(self.models.first())
    }
}

/// Observed health of one node, replaced on every probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeHealth {
    pub node: String,
    pub healthy: bool,
    pub last_check: DateTime<Utc>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    /// Models advertised by the node at the last successful probe (tag-stripped)
    pub available_models: Vec<String>,
}

impl NodeHealth {
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            healthy: true,
            last_check: Utc::now(),
            last_error: None,
            consecutive_failures: 0,
            available_models: Vec::new(),
        }
    }

    pub fn record_success(&mut self, advertised: &[String]) {
        self.healthy = true;
        self.last_check = Utc::now();
        self.last_error = None;
        self.consecutive_failures = 0;
        self.available_models = advertised.iter().map(|m| base_name(m).to_string()).collect();
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.healthy = false;
        self.last_check = Utc::now();
        self.last_error = Some(error.into());
        self.consecutive_failures += 1;
    }

    /// Whether the last probe saw `model` advertised (tag-stripped comparison)
    pub fn advertises(&self, model: &str) -> bool {
        let wanted = base_name(model);
        self.available_models.iter().any(|m| base_name(m) == wanted)
    }
}

/// Resolved arbiter: the node and model that perform final synthesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbiterRoute {
    pub node: String,
    pub model: ModelId,
}

/// One seat on the council: a model and the node configured to host it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncilMember {
    pub model: ModelId,
    pub node: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_adds_scheme_and_port() {
        let node = Node::new("gpu-1", "10.0.0.5", 8080);
        assert_eq!(node.base_url(), "http://10.0.0.5:8080");

        let node = Node::new("gpu-2", "https://gpu2.lan/", 443);
        assert_eq!(node.base_url(), "https://gpu2.lan:443");
    }

    #[test]
    fn test_base_url_keeps_embedded_port() {
        let node = Node::new("gpu-1", "http://10.0.0.1:8080", 8080);
        assert_eq!(node.base_url(), "http://10.0.0.1:8080");

        let node = Node::new("gpu-2", "gpu2.lan:9000/", 8080);
        assert_eq!(node.base_url(), "http://gpu2.lan:9000");
    }

    #[test]
    fn test_parse_address() {
        let address = NodeAddress::parse("https://gpu.lan:8443/api");
        assert_eq!(address.scheme, "https");
        assert_eq!(address.host, "gpu.lan");
        assert_eq!(address.port, Some(8443));

        let address = NodeAddress::parse("[::1]:11434");
        assert_eq!(address.host, "[::1]");
        assert_eq!(address.port, Some(11434));

        let address = NodeAddress::parse("::1");
        assert_eq!(address.host, "::1");
        assert_eq!(address.port, None);

        assert_eq!(
            NodeAddress::parse("localhost").url(DEFAULT_OLLAMA_PORT),
            "http://localhost:11434"
        );
    }

    #[test]
    fn test_serves_model_ignores_tags() {
        let node = Node::new("a", "localhost", 8080).with_models(["llama3.2:latest", "mistral"]);
        assert!(node.serves_model("llama3.2"));
        assert!(node.serves_model("mistral:7b"));
        assert!(!node.serves_model("gemma3"));
    }

    #[test]
    fn test_arbiter_model_defaults_to_first_model() {
        let node = Node::new("a", "localhost", 8080).with_models(["qwen3:4b"]);
        assert_eq!(node.arbiter_route_model(), Some(&ModelId::from("qwen3:4b")));

        let node = node.as_arbiter("mistral");
        assert_eq!(node.arbiter_route_model(), Some(&ModelId::from("mistral")));
    }

    #[test]
    fn test_health_failure_then_success_resets_counter() {
        let mut health = NodeHealth::new("a");
        health.record_failure("connection refused");
        health.record_failure("timeout");
        assert!(!health.healthy);
        assert_eq!(health.consecutive_failures, 2);
        assert_eq!(health.last_error.as_deref(), Some("timeout"));

        health.record_success(&["llama3.2:latest".to_string()]);
        assert!(health.healthy);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.last_error.is_none());
        assert_eq!(health.available_models, vec!["llama3.2".to_string()]);
        assert!(health.advertises("llama3.2:3b"));
    }
}
