//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Cluster
//!
//! - **Node**: an inference endpoint serving a set of models
//! - **NodeRegistry**: the configured nodes, their arbiter designation and
//!   the council roster derived from them
//!
//! ## Deliberation
//!
//! Council members answer in parallel, review each other anonymously,
//! refine against the critiques addressed to them and an arbiter
//! synthesizes the final artifact. Two variants exist:
//!
//! - **Council**: open-ended questions
//! - **Code**: code generation with unit tests

pub mod core;
pub mod deliberation;
pub mod node;
pub mod parsing;
pub mod prompt;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    message::{ChatMessage, ChatRole},
    model::{ModelId, base_name},
    prompt::Prompt,
};
pub use deliberation::{
    entities::{
        CritiqueCategory, DeliberationResult, FinalArtifact, IterationSnapshot, RankingList,
        ReviewerReport, RunMetadata, RunStatus, StructuredCritique, Submission, TestSubmission,
    },
    feedback::{DEFAULT_MAX_CRITIQUES, RefinementFeedback, collect_feedback},
    label::{Label, LabelEntry, LabelMap},
    ranking::{AggregateRanking, aggregate_rankings},
    state::{PipelineState, Stage, StateTracker},
    variant::{MAX_ITERATIONS, Variant},
};
pub use node::{
    entities::{
        ArbiterRoute, CouncilMember, DEFAULT_NODE_PORT, DEFAULT_NODE_TIMEOUT_SECS,
        DEFAULT_OLLAMA_PORT, Node, NodeAddress, NodeApi, NodeHealth,
    },
    registry::{NodeRegistry, RegistryError},
    status::{ClusterStatus, HealthState, NodeStatus},
};
pub use parsing::{
    ParsedReview, SynthesisSections, parse_review, parse_synthesis, strip_fenced_block,
};
pub use prompt::{PromptTemplate, TargetStack};
