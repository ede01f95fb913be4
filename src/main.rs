use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use console::Style;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use buildfleet::cli::{Cli, Command};
use buildfleet::config::FleetConfig;
use buildfleet::orchestrator::Orchestrator;
use buildfleet::progress::{PlainSink, ProgressSink, TerminalSink};
use buildfleet::repo::SdkRepo;
use buildfleet::report;
use buildfleet::summary::RunSummary;
use buildfleet::targets;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", Style::new().red().bold().apply_to("Error:"));
            ExitCode::from(report::EXIT_ENVIRONMENT)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "buildfleet=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = FleetConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Build {
            jobs,
            plain,
            skip_repo_check,
            summary,
        } => {
            let concurrency = jobs.map(usize::from).unwrap_or(config.concurrency);
            build(&config, concurrency, plain, skip_repo_check, summary).await
        }
    }
}

async fn build(
    config: &FleetConfig,
    concurrency: usize,
    plain: bool,
    skip_repo_check: bool,
    summary_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to get working directory")?;
    let sdk_root = if skip_repo_check {
        cwd
    } else {
        let repo = SdkRepo::open_root(&cwd)?;
        if let Some(expected) = config.expected_origin() {
            repo.ensure_origin(expected)?;
        }
        repo.root().to_path_buf()
    };

    let orchestrator = Orchestrator::new(concurrency)?;
    let catalog = targets::catalog_for(config, &sdk_root)?;

    println!(
        "{}",
        Style::new()
            .cyan()
            .bold()
            .apply_to("===== Building SDK libraries from source...")
    );

    let terminal = TerminalSink::stdout();
    let sink: Box<dyn ProgressSink + Send> = if plain || !terminal.is_attended() {
        Box::new(PlainSink::new(std::io::stdout()))
    } else {
        Box::new(terminal)
    };

    let started_at = Utc::now();
    let run_report = orchestrator.run_all(catalog, sink).await?;

    if let Some(path) = summary_path {
        RunSummary::from_report(&run_report, orchestrator.budget(), started_at).write(&path)?;
    }

    report::report_failure(&mut std::io::stderr().lock(), &run_report)
        .context("failed to print build error")?;
    Ok(ExitCode::from(report::exit_status(&run_report)))
}
