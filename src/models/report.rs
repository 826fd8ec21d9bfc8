//! The report aggregate and the stage outputs attached to it.

use super::metrics::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate root for one pipeline run.
///
/// Built once by the assembler. Only [`AnalyticsReport::attach_benchmark`]
/// and [`AnalyticsReport::attach_narrative`] change it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub repository: String,
    pub generated_at: DateTime<Utc>,
    pub activity: ActivityMetrics,
    pub contributors: ContributorMetrics,
    pub labels: LabelMetrics,
    pub health: HealthMetrics,
    pub review_velocity: ReviewVelocityMetrics,
    pub trends: TemporalTrends,
    pub correlations: MetricCorrelations,
    pub projections: Projections,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<ExecutiveNarrative>,
}

impl AnalyticsReport {
    pub fn attach_benchmark(&mut self, benchmark: BenchmarkComparison) {
        self.benchmark = Some(benchmark);
    }

    pub fn attach_narrative(&mut self, narrative: ExecutiveNarrative) {
        self.narrative = Some(narrative);
    }

    /// Names of blocks whose analyzer failed.
    pub fn failed_blocks(&self) -> Vec<&'static str> {
        let statuses: [(&'static str, bool); 8] = [
            (ActivityMetrics::NAME, self.activity.is_success()),
            (ContributorMetrics::NAME, self.contributors.is_success()),
            (LabelMetrics::NAME, self.labels.is_success()),
            (HealthMetrics::NAME, self.health.is_success()),
            (ReviewVelocityMetrics::NAME, self.review_velocity.is_success()),
            (TemporalTrends::NAME, self.trends.is_success()),
            (MetricCorrelations::NAME, self.correlations.is_success()),
            (Projections::NAME, self.projections.is_success()),
        ];
        statuses
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect()
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationCounters {
    pub cross_checks: u64,
    pub percentage_checks: u64,
    pub correlation_checks: u64,
    pub trend_checks: u64,
    pub skipped_checks: u64,
}

impl ValidationCounters {
    pub fn total(&self) -> u64 {
        self.cross_checks + self.percentage_checks + self.correlation_checks + self.trend_checks
    }
}

/// Findings from cross-checking a report. Never stored in the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub counters: ValidationCounters,
}

// ── Benchmark ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkMetric {
    MergeRate,
    TimeToFirstReview,
    ReviewCoverage,
    BusFactor,
    IssueResolutionDays,
    DeploymentsPerMonth,
}

impl fmt::Display for BenchmarkMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchmarkMetric::MergeRate => write!(f, "Merge rate"),
            BenchmarkMetric::TimeToFirstReview => write!(f, "Time to first review"),
            BenchmarkMetric::ReviewCoverage => write!(f, "Review coverage"),
            BenchmarkMetric::BusFactor => write!(f, "Bus factor"),
            BenchmarkMetric::IssueResolutionDays => write!(f, "Issue resolution time"),
            BenchmarkMetric::DeploymentsPerMonth => write!(f, "Deployments per month"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Poor,
    BelowAverage,
    Average,
    Good,
    Excellent,
    InsufficientData,
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Excellent => write!(f, "excellent"),
            Rating::Good => write!(f, "good"),
            Rating::Average => write!(f, "average"),
            Rating::BelowAverage => write!(f, "below average"),
            Rating::Poor => write!(f, "poor"),
            Rating::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricBenchmark {
    pub metric: BenchmarkMetric,
    pub value: f64,
    pub median: f64,
    pub percentile: u32,
    pub rating: Rating,
    pub has_data: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub metrics: Vec<MetricBenchmark>,
    /// Weighted percentile average, rounded, in [0, 100].
    pub overall_score: f64,
    pub overall_rating: Option<Rating>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

impl BenchmarkComparison {
    pub fn get(&self, metric: BenchmarkMetric) -> Option<&MetricBenchmark> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    pub fn has_any_data(&self) -> bool {
        self.metrics.iter().any(|m| m.has_data)
    }
}

// ── Narrative ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParadoxKind {
    ReviewCulture,
    ContributionConcentration,
    DecliningVelocity,
    UnreviewedThroughput,
}

impl fmt::Display for ParadoxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParadoxKind::ReviewCulture => write!(f, "Review Culture Paradox"),
            ParadoxKind::ContributionConcentration => {
                write!(f, "Contribution Concentration Paradox")
            }
            ParadoxKind::DecliningVelocity => write!(f, "Declining Velocity Paradox"),
            ParadoxKind::UnreviewedThroughput => write!(f, "Unreviewed Throughput Paradox"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paradox {
    pub kind: ParadoxKind,
    pub title: String,
    pub description: String,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub title: String,
    pub explanation: String,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_paradox: Option<ParadoxKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    /// 1 = urgent, 2 = important, 3 = optional.
    pub priority: u8,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
            RiskLevel::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedOutcome {
    pub description: String,
    /// Merge rate two periods out, when an extrapolation was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_merge_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveNarrative {
    pub summary: String,
    pub key_findings: Vec<String>,
    pub paradoxes: Vec<Paradox>,
    pub root_causes: Vec<RootCause>,
    pub action_plan: Vec<ActionItem>,
    pub risk_assessment: RiskAssessment,
    pub projected_outcome: ProjectedOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(RiskLevel::Low.max(RiskLevel::High), RiskLevel::High);
    }

    #[test]
    fn test_paradox_display() {
        assert_eq!(
            ParadoxKind::ReviewCulture.to_string(),
            "Review Culture Paradox"
        );
        assert_eq!(
            ParadoxKind::ContributionConcentration.to_string(),
            "Contribution Concentration Paradox"
        );
    }

    #[test]
    fn test_benchmark_lookup() {
        let comparison = BenchmarkComparison {
            metrics: vec![MetricBenchmark {
                metric: BenchmarkMetric::BusFactor,
                value: 3.0,
                median: 2.0,
                percentile: 80,
                rating: Rating::Good,
                has_data: true,
                description: String::new(),
            }],
            ..Default::default()
        };
        assert!(comparison.get(BenchmarkMetric::BusFactor).is_some());
        assert!(comparison.get(BenchmarkMetric::MergeRate).is_none());
        assert!(comparison.has_any_data());
    }
}
