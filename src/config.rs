//! Configuration file handling.
//!
//! This module handles loading `.repopulse.toml` files and merging them with
//! CLI arguments. The heuristic threshold tables used by the analyzers, the
//! validator and the narrative live here so they can be audited in one place.

use crate::cli::{Args, OutputFormat};
use crate::models::CollectionMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".repopulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Record source settings.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Analyzer, validator and narrative thresholds.
    #[serde(flatten)]
    pub thresholds: Thresholds,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "repopulse_report.md".to_string()
}

/// Where records come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Directory holding a prior export.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Local git checkout used for live commit and release data.
    #[serde(default)]
    pub git_dir: Option<PathBuf>,

    #[serde(default)]
    pub mode: CollectionMode,
}

/// All tunable heuristic constants, grouped by consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub bus_factor: BusFactorConfig,

    #[serde(default)]
    pub trends: TrendConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub narrative: NarrativeConfig,
}

/// Windows, ceilings and caps used by the analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of the "current" window in days.
    pub window_days: i64,
    /// Open PRs older than this are review bottlenecks.
    pub bottleneck_days: i64,
    pub max_bottlenecks: usize,
    pub top_contributors: usize,
    /// First reviews slower than this are discarded as outliers.
    pub first_review_ceiling_hours: f64,
    /// Approvals slower than this are discarded as outliers.
    pub approval_ceiling_days: f64,
    pub min_correlation_sample: usize,
    pub small_pr_lines: u64,
    pub large_pr_lines: u64,
    pub burndown_weeks: u32,
    /// Open items untouched for this long are stale.
    pub stale_days: i64,
    /// Trailing window used to derive deployments per month.
    pub deployment_window_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            bottleneck_days: 3,
            max_bottlenecks: 10,
            top_contributors: 10,
            first_review_ceiling_hours: 30.0 * 24.0,
            approval_ceiling_days: 90.0,
            min_correlation_sample: 10,
            small_pr_lines: 100,
            large_pr_lines: 500,
            burndown_weeks: 6,
            stale_days: 30,
            deployment_window_days: 90,
        }
    }
}

/// Contribution-concentration heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusFactorConfig {
    /// Top-two share (percent) above which the project is concentrated.
    pub concentration_pct: f64,
    /// Bus factor reported for a concentrated project.
    pub critical_value: u32,
    pub cap: u32,
}

impl Default for BusFactorConfig {
    fn default() -> Self {
        Self {
            concentration_pct: 50.0,
            critical_value: 2,
            cap: 5,
        }
    }
}

/// Deadbands inside which a delta is "stable".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub merge_rate_deadband: f64,
    pub review_time_deadband_hours: f64,
    pub contributors_deadband: f64,
    pub resolution_deadband_hours: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            merge_rate_deadband: 5.0,
            review_time_deadband_hours: 2.0,
            contributors_deadband: 2.0,
            resolution_deadband_hours: 12.0,
        }
    }
}

/// Merge-rate cutoffs for the health status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            excellent: 80.0,
            good: 60.0,
            fair: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Relative variance above which a cross-check is an error.
    pub variance_threshold: f64,
    pub epsilon: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            variance_threshold: 0.10,
            epsilon: 1e-6,
        }
    }
}

/// Predicate thresholds for paradoxes, root causes and actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub high_coverage_pct: f64,
    pub fast_review_hours: f64,
    pub low_merge_rate: f64,
    pub concentration_min_contributors: u64,
    pub low_bus_factor: u32,
    pub reviewer_imbalance_pct: f64,
    pub min_first_reviews: u64,
    pub stalled_pr_limit: u64,
    pub materiality_pts: f64,
    pub merge_rate_drop_pts: f64,
    pub slow_triage_days: f64,
    pub low_deployments_per_month: f64,
    pub strong_correlation: f64,
    pub unreviewed_merge_rate: f64,
    pub unreviewed_coverage_pct: f64,
    pub unreviewed_min_prs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            high_coverage_pct: 70.0,
            fast_review_hours: 24.0,
            low_merge_rate: 50.0,
            concentration_min_contributors: 20,
            low_bus_factor: 2,
            reviewer_imbalance_pct: 40.0,
            min_first_reviews: 5,
            stalled_pr_limit: 5,
            materiality_pts: 5.0,
            merge_rate_drop_pts: 20.0,
            slow_triage_days: 14.0,
            low_deployments_per_month: 1.0,
            strong_correlation: 0.5,
            unreviewed_merge_rate: 80.0,
            unreviewed_coverage_pct: 30.0,
            unreviewed_min_prs: 10,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref export) = args.export {
            self.collector.export_dir = Some(export.clone());
        }
        if let Some(ref git) = args.git {
            self.collector.git_dir = Some(git.clone());
        }
        if let Some(mode) = args.mode {
            self.collector.mode = mode;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "repopulse_report.md");
        assert_eq!(config.collector.mode, CollectionMode::Replay);
        assert_eq!(config.thresholds.bus_factor.cap, 5);
        assert_eq!(config.thresholds.analysis.window_days, 30);
        assert_eq!(config.thresholds.validation.variance_threshold, 0.10);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
format = "json"
verbose = true

[collector]
export_dir = "exports/acme"
mode = "live"

[trends]
merge_rate_deadband = 7.5

[validation]
variance_threshold = 0.25
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert!(config.general.verbose);
        assert_eq!(
            config.collector.export_dir,
            Some(PathBuf::from("exports/acme"))
        );
        assert_eq!(config.collector.mode, CollectionMode::Live);
        assert_eq!(config.thresholds.trends.merge_rate_deadband, 7.5);
        // Unset keys in a present table keep their defaults
        assert_eq!(config.thresholds.trends.resolution_deadband_hours, 12.0);
        assert_eq!(config.thresholds.validation.variance_threshold, 0.25);
        assert_eq!(config.thresholds.narrative.stalled_pr_limit, 5);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[bus_factor]"));
        assert!(toml_str.contains("[narrative]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.thresholds.analysis.max_bottlenecks, 10);
    }
}
