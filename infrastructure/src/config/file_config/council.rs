//! Deliberation configuration from TOML (`[council]` section)
//!
//! ```toml
//! [council]
//! max_iterations = 2       # refinement rounds for `code`
//! council_iterations = 0   # refinement rounds for `ask`
//! max_critiques = 3        # critiques fed into one refinement prompt
//! ```

use council_application::PipelineConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub max_iterations: u32,
    pub council_iterations: u32,
    pub max_critiques: usize,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            max_iterations: defaults.max_iterations,
            council_iterations: defaults.council_iterations,
            max_critiques: defaults.max_critiques,
        }
    }
}

impl FileCouncilConfig {
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            max_iterations: self.max_iterations,
            council_iterations: self.council_iterations,
            max_critiques: self.max_critiques,
        }
    }
}
