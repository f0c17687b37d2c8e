//! Deliberation entities and result types
//!
//! - [`Submission`] - one model-authored artifact at one iteration
//! - [`StructuredCritique`] / [`ReviewerReport`] - parsed peer review
//! - [`IterationSnapshot`] - everything recorded for one iteration
//! - [`DeliberationResult`] - the complete output of a run

use super::label::{Label, LabelMap};
use super::ranking::AggregateRanking;
use super::state::PipelineState;
use super::variant::Variant;
use crate::core::model::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One model-authored artifact at a given refinement iteration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub model: ModelId,
    /// Node that produced the content
    pub node: String,
    pub content: String,
    pub iteration: u32,
    /// Refinement failed and the previous content was kept
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub carried_forward: bool,
}

impl Submission {
    /// Iteration-0 submission from initial generation
    pub fn initial(model: ModelId, node: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model,
            node: node.into(),
            content: content.into(),
            iteration: 0,
            carried_forward: false,
        }
    }

    /// Next iteration with refined content, same author
    pub fn refined(&self, node: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            model: self.model.clone(),
            node: node.into(),
            content: content.into(),
            iteration: self.iteration + 1,
            carried_forward: false,
        }
    }

    /// Next iteration with the content unchanged
    pub fn carried_forward(&self) -> Self {
        Self {
            iteration: self.iteration + 1,
            carried_forward: true,
            ..self.clone()
        }
    }
}

/// Critique taxonomy shared by every review round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueCategory {
    Bugs,
    Style,
    Performance,
    Security,
    BestPractices,
}

impl CritiqueCategory {
    /// Order in which reviewers are asked to write categories
    pub const ALL: [CritiqueCategory; 5] = [
        CritiqueCategory::Bugs,
        CritiqueCategory::Style,
        CritiqueCategory::Performance,
        CritiqueCategory::Security,
        CritiqueCategory::BestPractices,
    ];

    /// Order in which refinement addresses feedback
    pub const REFINEMENT_PRIORITY: [CritiqueCategory; 5] = [
        CritiqueCategory::Bugs,
        CritiqueCategory::Style,
        CritiqueCategory::Security,
        CritiqueCategory::Performance,
        CritiqueCategory::BestPractices,
    ];

    /// Header text a reviewer writes before the category (`Bugs:`)
    pub fn header(&self) -> &'static str {
        match self {
            CritiqueCategory::Bugs => "Bugs",
            CritiqueCategory::Style => "Style",
            CritiqueCategory::Performance => "Performance",
            CritiqueCategory::Security => "Security",
            CritiqueCategory::BestPractices => "Best Practices",
        }
    }
}

impl std::fmt::Display for CritiqueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

/// Feedback on one labeled submission, extracted from a review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCritique {
    pub label: Label,
    pub categories: BTreeMap<CritiqueCategory, String>,
    /// `Overall Score` in 1..=10, absent when the reviewer gave none
    pub score: Option<u8>,
    /// Section text the critique was extracted from
    pub raw: String,
}

/// Ordered labels, best first, as ranked by one reviewer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankingList(pub Vec<Label>);

impl RankingList {
    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    /// 1-based position of `label`, if ranked
    pub fn position_of(&self, label: &Label) -> Option<usize> {
        self.0.iter().position(|l| l == label).map(|p| p + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One reviewer's parsed response for a review round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerReport {
    pub reviewer: ModelId,
    pub node: String,
    pub raw_text: String,
    pub critiques: Vec<StructuredCritique>,
    pub ranking: RankingList,
}

impl ReviewerReport {
    pub fn critique_for(&self, label: &Label) -> Option<&StructuredCritique> {
        self.critiques.iter().find(|c| &c.label == label)
    }
}

/// Everything recorded for one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationSnapshot {
    pub iteration: u32,
    pub submissions: Vec<Submission>,
    pub reviews: Vec<ReviewerReport>,
    pub labels: LabelMap,
    pub aggregate_ranking: Vec<AggregateRanking>,
}

impl IterationSnapshot {
    pub fn new(iteration: u32, submissions: Vec<Submission>) -> Self {
        Self {
            iteration,
            submissions,
            reviews: Vec::new(),
            labels: LabelMap::default(),
            aggregate_ranking: Vec::new(),
        }
    }
}

/// Test suite generated by one model for the leading submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSubmission {
    pub model: ModelId,
    pub node: String,
    pub content: String,
}

/// Final synthesized artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalArtifact {
    /// Synthesized answer (council) or code (code council)
    pub content: String,
    /// Synthesized test suite; empty for the open-ended council
    pub tests: String,
    pub arbiter: Option<ModelId>,
    pub node: Option<String>,
    /// Arbiter was unavailable and the first submission / first test set was used
    pub fallback: bool,
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Done,
    AllFailed,
}

/// Run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub variant: Variant,
    pub language: Option<String>,
    pub framework: Option<String>,
    pub max_iterations: u32,
    pub total_iterations: usize,
    pub council: Vec<ModelId>,
    pub states: Vec<PipelineState>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Complete output of a deliberation run
///
/// Always carries whatever progress succeeded; `AllFailed` runs have an
/// error payload, no iterations and no artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationResult {
    pub prompt: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub iterations: Vec<IterationSnapshot>,
    pub tests: Vec<TestSubmission>,
    pub artifact: Option<FinalArtifact>,
    pub metadata: RunMetadata,
}

impl DeliberationResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Done
    }

    /// Submissions of the last recorded iteration
    pub fn final_submissions(&self) -> &[Submission] {
        self.iterations
            .last()
            .map(|i| i.submissions.as_slice())
            .unwrap_or(&[])
    }
}
