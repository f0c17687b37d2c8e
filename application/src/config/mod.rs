//! Application-level configuration.
//!
//! - [`DispatchConfig`]: retry policy and timeouts for node requests
//! - [`PipelineConfig`]: deliberation defaults (iteration bounds, critique limit)

pub mod dispatch;
pub mod pipeline;

pub use dispatch::DispatchConfig;
pub use pipeline::PipelineConfig;
