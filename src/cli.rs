//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::{CollectionMode, Repository};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// RepoPulse - repository activity analytics
///
/// Turns exported pull requests, issues, commits and releases into a report
/// of metrics, trends, projections, benchmarks and an executive narrative.
///
/// Examples:
///   repopulse --repo owner/repo --export ./exports/owner-repo
///   repopulse --repo owner/repo --export ./exports --git ./checkout --mode live
///   repopulse --repo owner/repo --export ./exports --format json --now 2024-06-01T00:00:00Z
///   repopulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Repository identifier (owner/name)
    #[arg(short, long, value_name = "OWNER/NAME", required_unless_present = "init_config")]
    pub repo: Option<String>,

    /// Directory containing a prior export of repository records
    #[arg(short, long, value_name = "DIR", env = "REPOPULSE_EXPORT")]
    pub export: Option<PathBuf>,

    /// Local git checkout to read commits and release tags from (live mode)
    #[arg(long, value_name = "DIR")]
    pub git: Option<PathBuf>,

    /// Record collection mode
    #[arg(long, value_name = "MODE")]
    pub mode: Option<CollectionMode>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .repopulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reference time for the analysis windows (RFC 3339)
    ///
    /// Defaults to the current time. Fixing it makes runs reproducible.
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<DateTime<Utc>>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with code 2 when the report fails validation
    #[arg(long)]
    pub fail_on_invalid: bool,

    /// Generate a default .repopulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parsed repository identity. Only meaningful after [`Args::validate`].
    pub fn repository(&self) -> Option<Repository> {
        self.repo.as_deref().and_then(Repository::parse)
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.repository().is_none() {
            return Err(format!(
                "Repository must be given as owner/name, got '{}'",
                self.repo.as_deref().unwrap_or("")
            ));
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for (flag, dir) in [("--export", &self.export), ("--git", &self.git)] {
            if let Some(path) = dir {
                if !path.exists() {
                    return Err(format!("{} directory does not exist: {}", flag, path.display()));
                }
                if !path.is_dir() {
                    return Err(format!("{} path is not a directory: {}", flag, path.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
