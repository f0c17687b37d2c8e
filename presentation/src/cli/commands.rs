//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every iteration with critiques and rankings
    #[default]
    Full,
    /// Only the final artifact
    Final,
    /// JSON output
    Json,
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(
    author,
    version,
    about = "LLM Council - A distributed council of local models deliberates, critiques and refines"
)]
#[command(long_about = r#"
LLM Council sends your prompt to every model hosted on your inference nodes,
has the models anonymously review each other, lets each author refine its
submission from the critiques, and asks an arbiter model for the final result.

The `code` pipeline:
1. Generation: every council member writes a solution
2. Review: each member critiques the labeled submissions and ranks them
3. Refinement: each author revises its own submission (repeated per iteration)
4. Tests: a test suite is written for the refined code
5. Synthesis: the arbiter produces the final code and tests

Configuration files are loaded from (in priority order):
1. --config <path>       Explicit config file
2. ./council.toml        Project-level config
3. ~/.config/llm-council/config.toml   Global config

Example:
  llm-council ask "What are the trade-offs of optimistic locking?"
  llm-council code "Parse RFC 3339 timestamps" --language Rust --max-iterations 3
  llm-council cluster status
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output format (defaults to the [output] config, then "full")
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Append every run event to this JSONL file
    #[arg(long, value_name = "PATH", global = true)]
    pub transcript: Option<PathBuf>,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the council an open question
    Ask(AskArgs),

    /// Have the council write, critique and refine code
    Code(CodeArgs),

    /// Inspect the inference cluster
    #[command(subcommand)]
    Cluster(ClusterCommand),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to ask the council
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Refinement rounds before synthesis (0-5)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u32>,
}

impl AskArgs {
    pub fn text(&self) -> String {
        self.question.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct CodeArgs {
    /// What the code should do
    #[arg(required_unless_present = "file", num_args = 1..)]
    pub spec: Vec<String>,

    /// Read the specification from a file instead
    #[arg(short, long, value_name = "PATH", conflicts_with = "spec")]
    pub file: Option<PathBuf>,

    /// Target language
    #[arg(short, long)]
    pub language: Option<String>,

    /// Target framework
    #[arg(long)]
    pub framework: Option<String>,

    /// Refinement rounds before synthesis (1-5)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u32>,
}

impl CodeArgs {
    pub fn text(&self) -> String {
        self.spec.join(" ")
    }
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommand {
    /// Probe every node and show the cluster status
    Status,

    /// Probe every node and report each result
    Probe,

    /// List configured nodes
    Nodes,

    /// Show the council roster and the arbiter
    Models,

    /// Send a short prompt to one node
    TestNode {
        /// Node name as configured
        name: String,

        /// Model to use (defaults to the node's first model)
        #[arg(short, long)]
        model: Option<String>,

        /// Prompt to send
        #[arg(short, long)]
        prompt: Option<String>,
    },
}
