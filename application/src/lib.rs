//! Application layer for llm-council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{DispatchConfig, PipelineConfig};
pub use ports::{
    council_gateway::{CouncilGateway, FanOutResults, QueryRequest, QueryResult, Target},
    progress::{NoProgress, ProgressNotifier},
    run_logger::{NoRunLogger, RunEvent, RunLogger},
};
pub use use_cases::run_deliberation::{DeliberationInput, RunDeliberationUseCase, RunError};
