//! Console output formatter for deliberation results and cluster diagnostics

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_domain::{
    ArbiterRoute, ClusterStatus, CouncilMember, DeliberationResult, HealthState, IterationSnapshot,
    Node, NodeHealth, ReviewerReport, RunStatus, Variant,
};

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result
    pub fn format(result: &DeliberationResult) -> String {
        let meta = &result.metadata;
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Prompt:".cyan().bold(), result.prompt));
        if let Some(language) = &meta.language {
            output.push_str(&format!("{} {}\n", "Language:".cyan().bold(), language));
        }
        if let Some(framework) = &meta.framework {
            output.push_str(&format!("{} {}\n", "Framework:".cyan().bold(), framework));
        }
        output.push_str(&format!(
            "{} {}\n",
            "Council:".cyan().bold(),
            meta.council
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        if result.status == RunStatus::AllFailed {
            output.push_str(&format!(
                "\n{} {}\n",
                "Run failed:".red().bold(),
                result.error.as_deref().unwrap_or("unknown error")
            ));
            output.push_str(&Self::footer());
            return output;
        }

        let noun = meta.variant.submission_noun();
        for snapshot in &result.iterations {
            output.push_str(&Self::format_iteration(snapshot, noun));
        }

        if !result.tests.is_empty() {
            output.push_str(&Self::section_header("Generated Tests"));
            for tests in &result.tests {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── {} @ {} ──", tests.model, tests.node).yellow().bold(),
                    tests.content
                ));
            }
        }

        output.push_str(&Self::section_header("Final Synthesis"));
        output.push_str(&Self::format_artifact(result));
        output.push_str(&format!(
            "\n{}\n",
            format!(
                "{} refinement iteration(s), {} stage(s), {:.1}s",
                meta.total_iterations.saturating_sub(1),
                meta.states.len(),
                (meta.finished_at - meta.started_at).num_milliseconds() as f64 / 1000.0
            )
            .dimmed()
        ));

        output.push_str(&Self::footer());
        output
    }

    fn format_iteration(snapshot: &IterationSnapshot, noun: &str) -> String {
        let mut output = String::new();
        let title = if snapshot.iteration == 0 {
            "Initial Submissions".to_string()
        } else {
            format!("Iteration {}", snapshot.iteration)
        };
        output.push_str(&Self::section_header(&title));

        for (index, submission) in snapshot.submissions.iter().enumerate() {
            let label = snapshot
                .labels
                .label_at(index)
                .map(|l| format!("{} {} · ", noun, l))
                .unwrap_or_default();
            let mut heading =
                format!("── {}{} @ {} ──", label, submission.model, submission.node);
            if submission.carried_forward {
                heading.push_str(" (carried forward)");
            }
            output.push_str(&format!(
                "\n{}\n{}\n",
                heading.yellow().bold(),
                submission.content
            ));
        }

        if !snapshot.reviews.is_empty() {
            output.push_str(&format!("\n{}\n", "Reviews".cyan().bold()));
            for report in &snapshot.reviews {
                output.push_str(&Self::format_review(report, noun));
            }
        }

        if !snapshot.aggregate_ranking.is_empty() {
            output.push_str(&format!("\n{}\n", "Aggregate Ranking".cyan().bold()));
            for (position, entry) in snapshot.aggregate_ranking.iter().enumerate() {
                let average = entry
                    .average_position
                    .map(|p| format!("avg position {:.2}", p))
                    .unwrap_or_else(|| "unranked".to_string());
                output.push_str(&format!(
                    "  {}. {} (score {:.2}, {}, {} mention(s))\n",
                    position + 1,
                    entry.model.as_str().bold(),
                    entry.score,
                    average,
                    entry.mentions
                ));
            }
        }

        output
    }

    fn format_review(report: &ReviewerReport, noun: &str) -> String {
        let mut output = format!(
            "\n{}\n",
            format!("── Review by {} @ {} ──", report.reviewer, report.node).yellow()
        );

        if report.critiques.is_empty() {
            output.push_str(&Self::indent(report.raw_text.trim(), "  "));
            output.push('\n');
        }

        for critique in &report.critiques {
            let score = critique
                .score
                .map(|s| format!(" [{}/10]", s))
                .unwrap_or_default();
            output.push_str(&format!(
                "  {}{}\n",
                format!("{} {}", noun, critique.label).bold(),
                score
            ));
            for (category, text) in &critique.categories {
                output.push_str(&format!("    {} {}\n", format!("{}:", category).dimmed(), text));
            }
        }

        if !report.ranking.is_empty() {
            output.push_str(&format!(
                "  {} {}\n",
                "Ranking:".green(),
                report
                    .ranking
                    .labels()
                    .iter()
                    .map(|l| l.as_str())
                    .collect::<Vec<_>>()
                    .join(" > ")
            ));
        }

        output
    }

    fn format_artifact(result: &DeliberationResult) -> String {
        let Some(artifact) = &result.artifact else {
            return format!("\n{}\n", "No final artifact".red());
        };

        let mut output = String::new();
        let arbiter = match (&artifact.arbiter, &artifact.node) {
            (Some(model), Some(node)) => format!("Arbiter: {} @ {}", model, node),
            (Some(model), None) => format!("Arbiter: {}", model),
            _ => "Arbiter: none".to_string(),
        };
        output.push_str(&format!("\n{}\n", arbiter.yellow().bold()));
        if artifact.fallback {
            output.push_str(&format!(
                "{}\n",
                "Arbiter unavailable: showing the first refined submission".red()
            ));
        }
        output.push_str(&format!("\n{}\n", artifact.content));

        if result.metadata.variant == Variant::Code && !artifact.tests.is_empty() {
            output.push_str(&format!("\n{}\n\n{}\n", "Tests:".cyan().bold(), artifact.tests));
        }
        output
    }

    /// Format as JSON
    pub fn format_json(result: &DeliberationResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Final artifact only (concise output)
    pub fn format_final(result: &DeliberationResult) -> String {
        let Some(artifact) = &result.artifact else {
            return format!(
                "{} {}\n",
                "Run failed:".red().bold(),
                result.error.as_deref().unwrap_or("no final artifact")
            );
        };

        let mut output = artifact.content.clone();
        if result.metadata.variant == Variant::Code && !artifact.tests.is_empty() {
            output.push_str("\n\n");
            output.push_str(&artifact.tests);
        }
        output.push('\n');
        output
    }

    /// Health table of every enabled node
    pub fn format_cluster_status(status: &ClusterStatus) -> String {
        let mut output = Self::header("Cluster Status");
        output.push_str(&format!(
            "\n{} {}/{} healthy\n",
            "Nodes:".cyan().bold(),
            status.healthy_nodes,
            status.total_nodes
        ));

        for node in &status.nodes {
            let state = match node.state {
                HealthState::Healthy => node.state.as_str().green(),
                HealthState::Unchecked => node.state.as_str().yellow(),
                HealthState::Unhealthy => node.state.as_str().red(),
            };
            output.push_str(&format!(
                "\n  {} {} [{}]{}\n",
                node.name.bold(),
                node.url.dimmed(),
                state,
                if node.arbiter { " (arbiter)" } else { "" }
            ));
            output.push_str(&format!(
                "    configured: {}\n",
                Self::join(node.configured_models.iter().map(|m| m.as_str()))
            ));
            if !node.available_models.is_empty() {
                output.push_str(&format!(
                    "    advertised: {}\n",
                    Self::join(node.available_models.iter().map(String::as_str))
                ));
            }
            if let Some(error) = &node.last_error {
                output.push_str(&format!(
                    "    {} {} ({} consecutive failure(s))\n",
                    "last error:".red(),
                    error,
                    node.consecutive_failures
                ));
            }
        }

        output.push('\n');
        output.push_str(&Self::format_models(&status.council, status.arbiter.as_ref()));
        output
    }

    /// One line per probed node
    pub fn format_probe(results: &[NodeHealth]) -> String {
        let mut output = String::new();
        for health in results {
            if health.healthy {
                output.push_str(&format!(
                    "{} {} ({} model(s) advertised)\n",
                    "v".green(),
                    health.node.bold(),
                    health.available_models.len()
                ));
            } else {
                output.push_str(&format!(
                    "{} {}: {}\n",
                    "x".red(),
                    health.node.bold(),
                    health.last_error.as_deref().unwrap_or("unhealthy")
                ));
            }
        }
        if results.is_empty() {
            output.push_str("No enabled nodes configured\n");
        }
        output
    }

    /// Configured nodes, including disabled ones
    pub fn format_nodes(nodes: &[Node]) -> String {
        if nodes.is_empty() {
            return "No nodes configured\n".to_string();
        }

        let mut output = String::new();
        for node in nodes {
            let mut flags = vec![format!("{:?}", node.api).to_lowercase()];
            if !node.enabled {
                flags.push("disabled".to_string());
            }
            if node.arbiter {
                flags.push("arbiter".to_string());
            }
            if node.api_key.is_some() {
                flags.push("auth".to_string());
            }
            output.push_str(&format!(
                "{} {} [{}] timeout {}s\n    {}\n",
                node.name.bold(),
                node.base_url().dimmed(),
                flags.join(", "),
                node.timeout_secs,
                Self::join(node.models.iter().map(|m| m.as_str()))
            ));
        }
        output
    }

    /// Council roster and arbiter
    pub fn format_models(council: &[CouncilMember], arbiter: Option<&ArbiterRoute>) -> String {
        let mut output = format!("{}\n", "Council:".cyan().bold());
        if council.is_empty() {
            output.push_str("  (no models configured)\n");
        }
        for member in council {
            output.push_str(&format!("  {} @ {}\n", member.model.as_str().bold(), member.node));
        }
        match arbiter {
            Some(route) => output.push_str(&format!(
                "{} {} @ {}\n",
                "Arbiter:".cyan().bold(),
                route.model,
                route.node
            )),
            None => output.push_str(&format!("{} {}\n", "Arbiter:".cyan().bold(), "none".red())),
        }
        output
    }

    /// Result of a single-node connectivity check
    pub fn format_node_test(node: &str, model: &str, response: &str, elapsed_ms: u64) -> String {
        format!(
            "{} {} answered with {} in {} ms\n\n{}\n",
            "v".green(),
            node.bold(),
            model,
            elapsed_ms,
            response.trim()
        )
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
        let joined = items.collect::<Vec<_>>().join(", ");
        if joined.is_empty() {
            "-".to_string()
        } else {
            joined
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &DeliberationResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &DeliberationResult) -> String {
        Self::format_json(result)
    }

    fn format_final(&self, result: &DeliberationResult) -> String {
        Self::format_final(result)
    }
}
