//! Type definitions for the RunDeliberation use case.

use council_domain::{DomainError, Prompt, TargetStack, Variant};
use thiserror::Error;

/// Errors that abort a deliberation.
///
/// Model failures are not errors: they are absorbed into the result
/// (`RunStatus::AllFailed`, carried-forward submissions, fallback artifact).
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RunError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunError::Cancelled)
    }
}

/// Input for the RunDeliberation use case
#[derive(Debug, Clone)]
pub struct DeliberationInput {
    pub prompt: Prompt,
    pub variant: Variant,
    pub language: Option<String>,
    pub framework: Option<String>,
    /// Requested refinement bound; clamped per variant
    pub max_iterations: Option<u32>,
}

impl DeliberationInput {
    /// Open-ended question for the council
    pub fn council(prompt: Prompt) -> Self {
        Self::new(prompt, Variant::Council)
    }

    /// Code specification for the code council
    pub fn code(prompt: Prompt) -> Self {
        Self::new(prompt, Variant::Code)
    }

    fn new(prompt: Prompt, variant: Variant) -> Self {
        Self {
            prompt,
            variant,
            language: None,
            framework: None,
            max_iterations: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub(super) fn stack(&self) -> TargetStack<'_> {
        TargetStack {
            language: self.language.as_deref(),
            framework: self.framework.as_deref(),
        }
    }

    pub(super) fn text(&self) -> &str {
        self.prompt.content()
    }
}
