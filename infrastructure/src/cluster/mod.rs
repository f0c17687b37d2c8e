//! Distributed cluster: shared node state, health-aware routing and query dispatch

mod context;
mod dispatcher;
#[cfg(test)]
mod mock;
mod router;

pub use context::ClusterContext;
pub use dispatcher::{DEFAULT_TEST_PROMPT, NodeTestReport, QueryDispatcher};
pub use router::HealthRouter;
