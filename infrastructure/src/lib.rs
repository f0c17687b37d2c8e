//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the HTTP node transport, the health-aware
//! router and query dispatcher, configuration file loading and the JSONL
//! run transcript.

pub mod cluster;
pub mod config;
pub mod logging;
pub mod transport;

// Re-export commonly used types
pub use cluster::{
    ClusterContext, DEFAULT_TEST_PROMPT, HealthRouter, NodeTestReport, QueryDispatcher,
};
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCouncilConfig, FileDispatchConfig,
    FileNodeConfig, FileOutputConfig, FileOutputFormat,
};
pub use logging::JsonlRunLogger;
pub use transport::{
    ChatReply, ChatRequest, Endpoint, HttpNodeTransport, NodeTransport, ProbeReport,
    TransportError,
};
