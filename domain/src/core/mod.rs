//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelId`]: a model name as served by an inference node
//! - [`prompt::Prompt`]: a validated question or specification for the council
//! - [`message::ChatMessage`]: one role-tagged message sent to a node
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod message;
pub mod model;
pub mod prompt;
pub mod string;
