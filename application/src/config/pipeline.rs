//! Deliberation defaults.

use council_domain::{DEFAULT_MAX_CRITIQUES, Variant};
use serde::{Deserialize, Serialize};

/// Defaults applied when a run does not specify its own bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Refinement bound for code runs
    pub max_iterations: u32,
    /// Refinement bound for open-ended council runs
    pub council_iterations: u32,
    /// Critiques passed into one refinement prompt
    pub max_critiques: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_iterations: Variant::Code.default_iterations(),
            council_iterations: Variant::Council.default_iterations(),
            max_critiques: DEFAULT_MAX_CRITIQUES,
        }
    }
}

impl PipelineConfig {
    pub fn default_iterations(&self, variant: Variant) -> u32 {
        match variant {
            Variant::Code => self.max_iterations,
            Variant::Council => self.council_iterations,
        }
    }
}
