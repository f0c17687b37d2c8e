//! Deliberation state machine
//!
//! ```text
//! Init -> Generated -> (Reviewed -> Refined)* -> FinalReviewed -> Synthesized -> Done
//!   \
//!    -> AllFailed   (generation produced no usable submission)
//! ```

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// State of a deliberation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Generated,
    Reviewed,
    Refined,
    FinalReviewed,
    Synthesized,
    Done,
    AllFailed,
}

impl PipelineState {
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Init, Generated)
                | (Init, AllFailed)
                | (Generated, Reviewed)
                | (Generated, FinalReviewed)
                | (Reviewed, Refined)
                | (Refined, Reviewed)
                | (Refined, FinalReviewed)
                | (FinalReviewed, Synthesized)
                | (Synthesized, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::AllFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Init => "init",
            PipelineState::Generated => "generated",
            PipelineState::Reviewed => "reviewed",
            PipelineState::Refined => "refined",
            PipelineState::FinalReviewed => "final_reviewed",
            PipelineState::Synthesized => "synthesized",
            PipelineState::Done => "done",
            PipelineState::AllFailed => "all_failed",
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state plus the path taken to reach it
#[derive(Debug, Clone)]
pub struct StateTracker {
    history: Vec<PipelineState>,
}

impl Default for StateTracker {
    fn default() -> Self {
        Self {
            history: vec![PipelineState::Init],
        }
    }
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Init)
    }

    pub fn advance(&mut self, next: PipelineState) -> Result<(), DomainError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(next);
        Ok(())
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }
}

/// Unit of work reported to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage", content = "iteration")]
pub enum Stage {
    Generation,
    Review(u32),
    Refinement(u32),
    FinalReview,
    TestGeneration,
    Synthesis,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Generation => "generation",
            Stage::Review(_) => "review",
            Stage::Refinement(_) => "refinement",
            Stage::FinalReview => "final_review",
            Stage::TestGeneration => "test_generation",
            Stage::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Stage::Generation => "Generation".to_string(),
            Stage::Review(i) => format!("Review (iteration {})", i),
            Stage::Refinement(i) => format!("Refinement (iteration {})", i),
            Stage::FinalReview => "Final Review".to_string(),
            Stage::TestGeneration => "Test Generation".to_string(),
            Stage::Synthesis => "Synthesis".to_string(),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_name())
    }
}
