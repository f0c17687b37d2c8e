//! Model identifier value object

use serde::{Deserialize, Serialize};

/// Name of a model as hosted by an inference node (Value Object)
///
/// Model names may carry a `:tag` suffix (`llama3.2:latest`, `qwen3:4b`).
/// Routing compares names both exactly and with the tag stripped, so
/// `llama3.2` matches a node that serves `llama3.2:latest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name without its `:tag` suffix
    pub fn base(&self) -> &str {
        base_name(&self.0)
    }

    /// Exact or tag-stripped match against another model name
    pub fn matches(&self, other: &str) -> bool {
        self.0 == other || self.base() == base_name(other)
    }
}

/// Strip a `:tag` suffix from a model name (`llama3.2:latest` -> `llama3.2`)
pub fn base_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(base, _)| base)
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
