//! Deliberation subdomain
//!
//! Entities and pure logic of the council protocol:
//!
//! - [`variant::Variant`]: open-ended council or code council
//! - [`label::LabelMap`]: anonymized labels for one review round
//! - [`entities`]: submissions, critiques, per-iteration snapshots, results
//! - [`state::PipelineState`]: the deliberation state machine
//! - [`ranking`]: aggregate ranking across reviewers
//! - [`feedback`]: critique selection for refinement prompts

pub mod entities;
pub mod feedback;
pub mod label;
pub mod ranking;
pub mod state;
pub mod variant;
