//! CLI entrypoint for LLM Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use council_application::{
    CouncilGateway, DeliberationInput, PipelineConfig, RunDeliberationUseCase,
};
use council_domain::Prompt;
use council_infrastructure::{
    ClusterContext, ConfigLoader, FileConfig, FileOutputFormat, HttpNodeTransport,
    JsonlRunLogger, NodeTransport, QueryDispatcher,
};
use council_presentation::{
    Cli, ClusterCommand, Command, ConsoleFormatter, OutputConfig, OutputFormat, OutputFormatter,
    ProgressReporter, SimpleProgress,
};
use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting LLM Council");

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("{} {}", "config:".red().bold(), issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    let output_config = output_config(&config);
    if !output_config.color {
        colored::control::set_override(false);
    }
    let format = output_config.resolve_format(cli.output);
    let show_progress = output_config.progress_enabled(cli.quiet, format);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // === Dependency Injection ===
    let context = Arc::new(ClusterContext::new(config.to_registry()?));
    let transport: Arc<dyn NodeTransport> = Arc::new(HttpNodeTransport::new()?);
    let dispatcher = Arc::new(QueryDispatcher::new(
        context,
        transport,
        config.dispatch_config(),
    ));

    let transcript = cli
        .transcript
        .clone()
        .or_else(|| config.output.transcript.as_ref().map(PathBuf::from));
    let run = RunSettings {
        pipeline: config.pipeline_config(),
        transcript,
        format,
        show_progress,
    };

    match command {
        Command::Ask(args) => {
            let mut input = DeliberationInput::council(Prompt::new(args.text())?);
            if let Some(max) = args.max_iterations {
                input = input.with_max_iterations(max);
            }
            deliberate(dispatcher, input, &run).await
        }
        Command::Code(args) => {
            let text = match &args.file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => args.text(),
            };
            let mut input = DeliberationInput::code(Prompt::new(text)?);
            if let Some(language) = &args.language {
                input = input.with_language(language);
            }
            if let Some(framework) = &args.framework {
                input = input.with_framework(framework);
            }
            if let Some(max) = args.max_iterations {
                input = input.with_max_iterations(max);
            }
            deliberate(dispatcher, input, &run).await
        }
        Command::Cluster(command) => cluster(&dispatcher, command, format).await,
    }
}

/// Settings shared by `ask` and `code`
struct RunSettings {
    pipeline: PipelineConfig,
    transcript: Option<PathBuf>,
    format: OutputFormat,
    show_progress: bool,
}

async fn deliberate(
    dispatcher: Arc<QueryDispatcher>,
    input: DeliberationInput,
    run: &RunSettings,
) -> Result<()> {
    if dispatcher.council().is_empty() {
        bail!("No models configured. Add [[nodes]] with models to council.toml");
    }

    // Probe first so routing skips nodes that are already down
    dispatcher.router().probe_all().await;

    let cancellation = CancellationToken::new();
    let token = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            token.cancel();
        }
    });

    let mut use_case = RunDeliberationUseCase::new(Arc::clone(&dispatcher))
        .with_config(run.pipeline.clone())
        .with_cancellation(cancellation);

    if let Some(path) = &run.transcript {
        match JsonlRunLogger::new(path) {
            Some(logger) => {
                info!("Writing transcript to {}", logger.path().display());
                use_case = use_case.with_logger(Arc::new(logger));
            }
            None => warn!("Continuing without transcript"),
        }
    }

    // Bars on a terminal, one line per event otherwise
    let outcome = if !run.show_progress {
        use_case.execute(input).await
    } else if std::io::stderr().is_terminal() {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await
    } else {
        use_case.execute_with_progress(input, &SimpleProgress).await
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => bail!("Run cancelled"),
        Err(e) => return Err(e.into()),
    };

    println!("{}", ConsoleFormatter.render(&result, run.format));

    if !result.is_success() {
        bail!(
            "{}",
            result.error.as_deref().unwrap_or("All models failed")
        );
    }
    Ok(())
}

async fn cluster(
    dispatcher: &QueryDispatcher,
    command: ClusterCommand,
    format: OutputFormat,
) -> Result<()> {
    let json = format == OutputFormat::Json;

    match command {
        ClusterCommand::Status => {
            dispatcher.router().probe_all().await;
            let status = dispatcher.router().cluster_status();
            if json {
                println!("{}", serde_json_pretty(&status)?);
            } else {
                print!("{}", ConsoleFormatter::format_cluster_status(&status));
            }
        }
        ClusterCommand::Probe => {
            let results = dispatcher.router().probe_all().await;
            if json {
                println!("{}", serde_json_pretty(&results)?);
            } else {
                print!("{}", ConsoleFormatter::format_probe(&results));
            }
        }
        ClusterCommand::Nodes => {
            let registry = dispatcher.context().registry();
            if json {
                let nodes: Vec<_> = registry
                    .list()
                    .iter()
                    .cloned()
                    .map(|mut node| {
                        node.api_key = node.api_key.map(|_| "***".to_string());
                        node
                    })
                    .collect();
                println!("{}", serde_json_pretty(&nodes)?);
            } else {
                print!("{}", ConsoleFormatter::format_nodes(registry.list()));
            }
        }
        ClusterCommand::Models => {
            let council = dispatcher.council();
            let arbiter = dispatcher.arbiter();
            if json {
                let value = serde_json::json!({ "council": council, "arbiter": arbiter });
                println!("{}", serde_json_pretty(&value)?);
            } else {
                print!("{}", ConsoleFormatter::format_models(&council, arbiter.as_ref()));
            }
        }
        ClusterCommand::TestNode {
            name,
            model,
            prompt,
        } => {
            let report = dispatcher
                .test_node(&name, model.as_deref(), prompt.as_deref())
                .await
                .with_context(|| format!("Node test failed for '{}'", name))?;
            if json {
                println!("{}", serde_json_pretty(&report)?);
            } else {
                print!(
                    "{}",
                    ConsoleFormatter::format_node_test(
                        &report.node,
                        report.model.as_str(),
                        &report.response,
                        report.elapsed_ms,
                    )
                );
            }
        }
    }

    Ok(())
}

fn serde_json_pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn output_config(config: &FileConfig) -> OutputConfig {
    OutputConfig {
        format: config.output.format.map(|format| match format {
            FileOutputFormat::Full => OutputFormat::Full,
            FileOutputFormat::Final => OutputFormat::Final,
            FileOutputFormat::Json => OutputFormat::Json,
        }),
        color: config.output.color,
        show_progress: config.output.show_progress,
    }
}

/// Initialize logging based on verbosity; diagnostics go to stderr and,
/// with `--log-file`, to that file as well
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_file {
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(stderr)
                .init();
            Ok(None)
        }
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(stderr)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
    }
}
