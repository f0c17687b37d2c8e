//! Output configuration from TOML (`[output]` section)

use serde::{Deserialize, Serialize};

/// How a finished run is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOutputFormat {
    /// Every iteration, critique and ranking
    #[default]
    Full,
    /// Only the final artifact
    Final,
    Json,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: Option<FileOutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Show progress bars while a run is in flight
    pub show_progress: bool,
    /// Append every run to this JSONL file
    pub transcript: Option<String>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            show_progress: true,
            transcript: None,
        }
    }
}
