//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and
//! application types after validation.

mod council;
mod dispatch;
mod nodes;
mod output;

pub use council::FileCouncilConfig;
pub use dispatch::FileDispatchConfig;
pub use nodes::FileNodeConfig;
pub use output::{FileOutputConfig, FileOutputFormat};

use council_application::{DispatchConfig, PipelineConfig};
use council_domain::{MAX_ITERATIONS, NodeRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("node #{0}: name cannot be empty")]
    EmptyNodeName(usize),

    #[error("node '{0}' is declared more than once")]
    DuplicateNodeName(String),

    #[error("node '{0}': address cannot be empty")]
    EmptyAddress(String),

    #[error("node '{0}': port cannot be 0")]
    InvalidPort(String),

    #[error("node '{0}': model name cannot be empty")]
    EmptyModelName(String),

    #[error("node '{0}': timeout_seconds cannot be 0")]
    InvalidNodeTimeout(String),

    #[error("dispatch.{0} cannot be 0")]
    InvalidDispatchTimeout(&'static str),

    #[error("council.{field} must be at most {max}, got {value}")]
    IterationsOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("council.max_critiques must be at least 1")]
    InvalidMaxCritiques,

    #[error("node '{0}' is not declared")]
    UnknownNode(String),
}

impl From<RegistryError> for ConfigValidationError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::DuplicateName(name) => ConfigValidationError::DuplicateNodeName(name),
            RegistryError::NotFound(name) => ConfigValidationError::UnknownNode(name),
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Inference nodes, in declaration order
    pub nodes: Vec<FileNodeConfig>,
    /// Retry and timeout policy
    pub dispatch: FileDispatchConfig,
    /// Deliberation bounds
    pub council: FileCouncilConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, node) in self.nodes.iter().enumerate() {
            let name = node.name.trim();
            if name.is_empty() {
                issues.push(ConfigValidationError::EmptyNodeName(index + 1));
                continue;
            }
            if !seen.insert(name) {
                issues.push(ConfigValidationError::DuplicateNodeName(name.to_string()));
            }
            if node.address.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyAddress(name.to_string()));
            }
            if node.port == 0 {
                issues.push(ConfigValidationError::InvalidPort(name.to_string()));
            }
            if node.models.iter().any(|m| m.trim().is_empty()) {
                issues.push(ConfigValidationError::EmptyModelName(name.to_string()));
            }
            if node.timeout_seconds == Some(0) {
                issues.push(ConfigValidationError::InvalidNodeTimeout(name.to_string()));
            }
        }

        if self.dispatch.default_timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidDispatchTimeout(
                "default_timeout_seconds",
            ));
        }
        if self.dispatch.probe_timeout_seconds == 0 {
            issues.push(ConfigValidationError::InvalidDispatchTimeout(
                "probe_timeout_seconds",
            ));
        }

        for (field, value) in [
            ("max_iterations", self.council.max_iterations),
            ("council_iterations", self.council.council_iterations),
        ] {
            if value > MAX_ITERATIONS {
                issues.push(ConfigValidationError::IterationsOutOfRange {
                    field,
                    value,
                    max: MAX_ITERATIONS,
                });
            }
        }
        if self.council.max_critiques == 0 {
            issues.push(ConfigValidationError::InvalidMaxCritiques);
        }

        issues
    }

    /// Build the node registry from `[[nodes]]`.
    ///
    /// Call [`validate`](Self::validate) first; duplicate names are the only
    /// problem reported here.
    pub fn to_registry(&self) -> Result<NodeRegistry, ConfigValidationError> {
        let default_timeout = self.dispatch.default_timeout_seconds;
        NodeRegistry::from_nodes(self.nodes.iter().map(|n| n.to_node(default_timeout)))
            .map_err(ConfigValidationError::from)
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        self.dispatch.to_dispatch_config()
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        self.council.to_pipeline_config()
    }
}
