//! Node declarations from TOML (`[[nodes]]` array)
//!
//! Example configuration:
//!
//! ```toml
//! [[nodes]]
//! name = "gpu-box"
//! address = "192.168.1.20"
//! port = 8080
//! models = ["qwen3:4b", "gemma3:4b"]
//! arbiter = true
//! arbiter_model = "mistral"
//! api_key = "secret"
//!
//! [[nodes]]
//! name = "laptop"
//! address = "localhost"
//! port = 11434
//! api = "ollama"
//! models = ["llama3.2"]
//! timeout_seconds = 60
//! ```

use council_domain::{DEFAULT_NODE_PORT, Node, NodeApi};
use serde::{Deserialize, Serialize};

/// One `[[nodes]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileNodeConfig {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub models: Vec<String>,
    pub enabled: bool,
    /// Marks this node as the arbiter host
    pub arbiter: bool,
    /// Model used for synthesis; defaults to the node's first model
    pub arbiter_model: Option<String>,
    /// Per-request timeout; defaults to `[dispatch].default_timeout_seconds`
    pub timeout_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api: NodeApi,
}

impl Default for FileNodeConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: "localhost".to_string(),
            port: DEFAULT_NODE_PORT,
            models: Vec::new(),
            enabled: true,
            arbiter: false,
            arbiter_model: None,
            timeout_seconds: None,
            api_key: None,
            api: NodeApi::default(),
        }
    }
}

impl FileNodeConfig {
    /// Build the domain node, falling back to `default_timeout` seconds
    pub fn to_node(&self, default_timeout: u64) -> Node {
        let mut node = Node::new(self.name.trim(), self.address.trim(), self.port)
            .with_models(self.models.iter().map(|m| m.trim()))
            .with_timeout_secs(self.timeout_seconds.unwrap_or(default_timeout))
            .with_api(self.api);

        node.arbiter = self.arbiter;
        node.arbiter_model = self
            .arbiter_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(Into::into);
        if !self.enabled {
            node = node.disabled();
        }
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            node = node.with_api_key(key);
        }
        node
    }
}
