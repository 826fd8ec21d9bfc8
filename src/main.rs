//! RepoPulse - repository activity analytics
//!
//! A CLI tool that turns exported pull requests, issues, commits and
//! releases into a report of metrics, trends, projections, benchmarks and
//! an executive narrative.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, unreadable export, git failure, etc.)
//!   2 - Report failed validation and --fail-on-invalid was set

mod analysis;
mod benchmark;
mod cli;
mod collector;
mod config;
mod engine;
mod error;
mod models;
mod narrative;
mod report;

use analysis::AnalysisContext;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use collector::LocalSource;
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("RepoPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .repopulse.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize windows, thresholds and narrative rules.");
    Ok(())
}

/// RUST_LOG takes precedence over --verbose/--quiet when set.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run collection, the pipeline and rendering. Returns the exit code.
async fn run_analysis(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let repository = args
        .repository()
        .context("Repository must be given as owner/name")?;
    let now = args.now.unwrap_or_else(Utc::now);
    let mode = config.collector.mode;

    if !args.quiet {
        println!("📥 Collecting records for {} ({} mode)", repository, mode);
    }

    let source = LocalSource::new(
        config.collector.export_dir.clone(),
        config.collector.git_dir.clone(),
    )
    .context("Failed to open record sources")?;

    let ctx = AnalysisContext::new(now, config.thresholds.clone());

    let spinner = create_spinner(args.quiet);
    spinner.set_message("Running analyzers...");
    let result = engine::analyze_repository(&source, &repository, mode, ctx).await;
    spinner.finish_and_clear();

    let output = result.with_context(|| format!("Failed to collect records for {}", repository))?;
    let report = &output.report;
    let validation = &output.validation;

    let content = match config.general.format {
        OutputFormat::Json => report::generate_json_report(report, validation)?,
        OutputFormat::Markdown => report::generate_markdown_report(report, validation),
    };

    let output_path = Path::new(&config.general.output);
    report::write_report(&content, output_path)?;

    if !args.quiet {
        print_summary(&output, start_time.elapsed().as_secs_f64());
        println!(
            "\n✅ Analysis complete! Report saved to: {}",
            output_path.display()
        );
    }

    if args.fail_on_invalid && !validation.valid {
        eprintln!(
            "\n⛔ Report failed validation with {} error(s). Failing (exit code 2).",
            validation.errors.len()
        );
        return Ok(2);
    }

    Ok(0)
}

fn print_summary(output: &engine::PipelineOutput, duration: f64) {
    let report = &output.report;

    println!("\n📊 Analysis Summary:");
    println!(
        "   PRs: {} | Issues: {} | Commits: {} | Releases: {}",
        report.activity.total_prs,
        report.activity.total_issues,
        report.activity.total_commits,
        report.activity.total_releases
    );
    println!(
        "   Merge rate: {:.1}% | Health: {} | Bus factor: {}",
        report.health.merge_rate, report.health.health_status, report.contributors.bus_factor
    );
    if let Some(ref benchmark) = report.benchmark {
        if benchmark.has_any_data() {
            println!("   Benchmark score: {:.0}/100", benchmark.overall_score);
        }
    }
    if let Some(ref narrative) = report.narrative {
        println!("   Risk: {}", narrative.risk_assessment.level);
        println!("   {}", narrative.summary);
    }

    let failed = report.failed_blocks();
    if !failed.is_empty() {
        println!("   ⚠️  Failed sections: {}", failed.join(", "));
    }
    if !output.validation.valid {
        println!(
            "   ⚠️  Validation: {} error(s), {} warning(s)",
            output.validation.errors.len(),
            output.validation.warnings.len()
        );
    }
    println!("   Duration: {:.1}s", duration);
}

fn create_spinner(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
