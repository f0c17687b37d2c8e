//! Deliberation variants

use serde::{Deserialize, Serialize};

/// Which flavour of deliberation a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Free-text question answered by the council, synthesized by the arbiter
    Council,
    /// Code generated from a specification, refined, tested and synthesized
    Code,
}

impl Variant {
    /// Noun used in front of labels in prompts and in review text
    /// (`Response A`, `Code Submission A`)
    pub fn submission_noun(&self) -> &'static str {
        match self {
            Variant::Council => "Response",
            Variant::Code => "Code Submission",
        }
    }

    /// Default refinement bound when the caller gives none
    pub fn default_iterations(&self) -> u32 {
        match self {
            Variant::Council => 0,
            Variant::Code => 2,
        }
    }

    /// Smallest accepted refinement bound
    pub fn min_iterations(&self) -> u32 {
        match self {
            Variant::Council => 0,
            Variant::Code => 1,
        }
    }

    /// Whether tests are generated before synthesis
    pub fn generates_tests(&self) -> bool {
        matches!(self, Variant::Code)
    }

    /// Effective refinement bound: the requested value, else `default`,
    /// clamped to `min_iterations()..=MAX_ITERATIONS`
    pub fn iteration_bound(&self, requested: Option<u32>, default: u32) -> u32 {
        requested
            .unwrap_or(default)
            .clamp(self.min_iterations(), MAX_ITERATIONS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Council => "council",
            Variant::Code => "code",
        }
    }
}

/// Largest accepted refinement bound
pub const MAX_ITERATIONS: u32 = 5;

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_bound_defaults_and_clamps() {
        assert_eq!(Variant::Code.iteration_bound(None, 2), 2);
        assert_eq!(Variant::Code.iteration_bound(Some(0), 2), 1);
        assert_eq!(Variant::Code.iteration_bound(Some(9), 2), MAX_ITERATIONS);
        assert_eq!(Variant::Council.iteration_bound(None, 0), 0);
        assert_eq!(Variant::Council.iteration_bound(Some(3), 0), 3);
    }

    #[test]
    fn test_nouns() {
        assert_eq!(Variant::Council.submission_noun(), "Response");
        assert_eq!(Variant::Code.submission_noun(), "Code Submission");
        assert!(Variant::Code.generates_tests());
        assert!(!Variant::Council.generates_tests());
    }
}
