//! Prompt domain
//!
//! Templates for every stage of the deliberation, per variant.

mod template;

pub use template::{PromptTemplate, TargetStack};
