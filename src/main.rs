//! toolflow - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;
use toolflow::{
    catalog::{ToolCatalog, ToolRegistry},
    cli::{Args, Commands, Config, Verbosity},
    service::{build_reasoner, build_service},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    OrchestrationResponse, StepResult,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(message) = args.validate() {
        eprintln!("{}", message);
        std::process::exit(2);
    }

    let config = load_config(&args)?;
    let verbosity = effective_verbosity(&args, &config);
    init_logging(verbosity);

    match &args.command {
        Some(Commands::Tools) => list_tools(&config)?,
        Some(Commands::Config) => show_config(&config)?,
        None => {
            if let Some(request) = &args.request {
                run_request(&args, &config, verbosity, request).await?;
            }
        }
    }

    Ok(())
}

/// Load config and apply command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(model) = &args.model {
        config.reasoning.model = model.clone();
    }
    if let Some(host) = &args.host {
        config.reasoning.host = host.clone();
    }
    if let Some(port) = args.port {
        config.reasoning.port = port;
    }
    if let Some(catalog) = &args.catalog {
        config.catalog.path = catalog.to_string_lossy().into_owned();
    }

    config.validate()?;
    Ok(config)
}

/// Flags win over the configured default verbosity
fn effective_verbosity(args: &Args, config: &Config) -> Verbosity {
    if args.quiet || args.verbose > 0 {
        args.verbosity()
    } else {
        Verbosity::from_name(&config.telemetry.default_verbosity).unwrap_or(Verbosity::Normal)
    }
}

/// Install the tracing subscriber; RUST_LOG overrides the verbosity flags
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_catalog(config: &Config) -> Result<ToolRegistry> {
    let path = config.catalog_path();
    ToolRegistry::load_from_file(&path)
        .with_context(|| format!("Failed to load tool catalog from {}", path.display()))
}

fn list_tools(config: &Config) -> Result<()> {
    let registry = load_catalog(config)?;

    if registry.is_empty() {
        println!("No tools registered in {}", config.catalog_path().display());
        return Ok(());
    }

    for tool in registry.list_all() {
        let target = tool.endpoint().or(tool.container_image()).unwrap_or("-");
        println!(
            "{:<24} {:<15} {}",
            tool.name().bold(),
            tool.execution_kind().as_str(),
            target
        );
        if !tool.description().is_empty() {
            println!("    {}", tool.description().dimmed());
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

async fn run_request(args: &Args, config: &Config, verbosity: Verbosity, request: &str) -> Result<()> {
    let catalog: Arc<dyn ToolCatalog> = Arc::new(load_catalog(config)?);
    let reasoner = build_reasoner(config)?;

    if !reasoner.health_check().await {
        eprintln!(
            "Reasoning service is not reachable at {}",
            reasoner.base_url()
        );
        std::process::exit(2);
    }

    let telemetry = TelemetryCollector::new();
    let service = build_service(config, catalog, Arc::new(reasoner), telemetry.clone())?;

    let response = match service.handle(request).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    };

    if args.human {
        print_human(&response, config.telemetry.color_output);
    } else {
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    let display = TelemetryDisplay::new(telemetry, verbosity);
    if display.should_show_details() {
        display.display_summary();
    }

    Ok(())
}

fn print_human(response: &OrchestrationResponse, color: bool) {
    colored::control::set_override(color);

    println!("{}", "Plan".bold());
    for (i, result) in response.trace.iter().enumerate() {
        match result {
            StepResult::Ok {
                tool_name,
                duration_ms,
                ..
            } => println!("  {} {}. {} ({}ms)", "✓".green(), i + 1, tool_name, duration_ms),
            StepResult::Failed {
                tool_name,
                error,
                duration_ms,
                ..
            } => println!(
                "  {} {}. {} ({}ms): {}",
                "✗".red(),
                i + 1,
                tool_name,
                duration_ms,
                error
            ),
        }
    }

    let verdict = &response.verdict;
    println!();
    if verdict.success() {
        println!("{}", "Request fulfilled".green().bold());
    } else {
        println!("{}", "Request not fully fulfilled".yellow().bold());
    }
    for issue in verdict.issues() {
        println!("  issue: {}", issue);
    }
    for improvement in verdict.improvements() {
        println!("  improve: {}", improvement);
    }
    println!();
    println!("{}", response.user_message());
}
