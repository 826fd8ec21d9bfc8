//! Metric blocks produced by the analyzers.
//!
//! Every block carries a [`BlockStatus`]. A failed block keeps its default
//! (zeroed) fields and records why in `errors`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome shared by all metric blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatus {
    pub success: bool,
    pub duration_ms: u64,
    pub errors: Vec<String>,
}

impl Default for BlockStatus {
    fn default() -> Self {
        Self {
            success: true,
            duration_ms: 0,
            errors: Vec::new(),
        }
    }
}

/// Common behaviour of analyzer outputs.
pub trait MetricBlock: Default + Send + 'static {
    /// Block name used in logs and validation messages.
    const NAME: &'static str;

    fn status(&self) -> &BlockStatus;

    fn status_mut(&mut self) -> &mut BlockStatus;

    /// A zeroed block marked as failed.
    fn failed(error: impl Into<String>) -> Self {
        let mut block = Self::default();
        let status = block.status_mut();
        status.success = false;
        status.errors.push(error.into());
        block
    }

    fn is_success(&self) -> bool {
        self.status().success
    }
}

macro_rules! metric_block {
    ($ty:ty, $name:literal) => {
        impl MetricBlock for $ty {
            const NAME: &'static str = $name;

            fn status(&self) -> &BlockStatus {
                &self.status
            }

            fn status_mut(&mut self) -> &mut BlockStatus {
                &mut self.status
            }
        }
    };
}

// ── Activity ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub total_prs: u64,
    pub open_prs: u64,
    pub merged_prs: u64,
    /// Closed without merge.
    pub closed_prs: u64,
    /// `merged / (merged + closed) * 100`, 0 when nothing was resolved.
    pub merge_rate: f64,
    pub avg_time_to_merge_hours: f64,
    pub total_issues: u64,
    pub open_issues: u64,
    pub closed_issues: u64,
    pub total_commits: u64,
    pub total_releases: u64,
    pub prs_in_window: u64,
    pub issues_in_window: u64,
    pub commits_in_window: u64,
    pub deployments_per_month: f64,
    /// Commits per weekday, Monday first.
    pub commits_by_weekday: [u64; 7],
}

metric_block!(ActivityMetrics, "activity");

impl ActivityMetrics {
    /// Whether any pull request was resolved (merged or closed).
    pub fn has_resolved_prs(&self) -> bool {
        self.merged_prs + self.closed_prs > 0
    }
}

// ── Contributors ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributorStats {
    pub login: String,
    pub commits: u64,
    pub pull_requests: u64,
    pub reviews: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributorMetrics {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub total_contributors: u64,
    pub active_contributors: u64,
    pub first_time_contributors: u64,
    pub top_contributors: Vec<ContributorStats>,
    pub total_contributions: u64,
    /// Share of all contributions held by the top two contributors, in percent.
    pub top_two_share: f64,
    pub bus_factor: u32,
}

metric_block!(ContributorMetrics, "contributors");

// ── Labels ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCategory {
    Bug,
    Feature,
    Documentation,
    Other,
}

impl LabelCategory {
    /// Keyword classification of a label name.
    pub fn classify(label: &str) -> Self {
        let label = label.to_lowercase();
        if ["bug", "fix", "defect", "regression", "crash"]
            .iter()
            .any(|k| label.contains(k))
        {
            LabelCategory::Bug
        } else if ["feature", "enhancement", "improvement", "request"]
            .iter()
            .any(|k| label.contains(k))
        {
            LabelCategory::Feature
        } else if ["doc", "readme", "guide"].iter().any(|k| label.contains(k)) {
            LabelCategory::Documentation
        } else {
            LabelCategory::Other
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
    /// Percentage of all label applications.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub bug: u64,
    pub feature: u64,
    pub documentation: u64,
    pub other: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelMetrics {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub total_prs: u64,
    pub total_issues: u64,
    pub labeled_items: u64,
    pub unlabeled_prs: u64,
    pub unlabeled_issues: u64,
    /// Percentage of PRs and issues carrying at least one label.
    pub label_coverage: f64,
    pub distribution: Vec<LabelCount>,
    pub categories: CategoryCounts,
}

metric_block!(LabelMetrics, "labels");

// ── Health ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    #[default]
    InsufficientData,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Excellent => write!(f, "Excellent"),
            HealthStatus::Good => write!(f, "Good"),
            HealthStatus::Fair => write!(f, "Fair"),
            HealthStatus::Poor => write!(f, "Poor"),
            HealthStatus::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewCoverage {
    pub reviewed_prs: u64,
    pub total_prs: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub review_coverage: ReviewCoverage,
    pub merge_rate: f64,
    pub health_status: HealthStatus,
    pub stale_prs: u64,
    pub stale_issues: u64,
    pub closed_issues: u64,
    pub avg_issue_resolution_days: f64,
}

metric_block!(HealthMetrics, "health");

// ── Review velocity ────────────────────────────────────────────

/// Mean/median/p90 over a sample. All zero when the sample is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub sample_size: u64,
    pub average: f64,
    pub median: f64,
    pub p90: f64,
}

impl DistributionStats {
    pub fn has_data(&self) -> bool {
        self.sample_size > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckReason {
    NoReviewers,
    ChangesRequested,
    ApprovedPendingMerge,
    Unknown,
}

impl fmt::Display for BottleneckReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BottleneckReason::NoReviewers => write!(f, "No reviewers"),
            BottleneckReason::ChangesRequested => write!(f, "Changes requested"),
            BottleneckReason::ApprovedPendingMerge => write!(f, "Approved, pending merge"),
            BottleneckReason::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckPr {
    pub number: u64,
    pub author: Option<String>,
    pub waiting_days: f64,
    pub reason: BottleneckReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerLoad {
    pub reviewer: String,
    pub first_reviews: u64,
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewVelocityMetrics {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub reviewed_prs: u64,
    pub time_to_first_review_hours: DistributionStats,
    pub time_to_approval_days: DistributionStats,
    /// Open PRs over the wait threshold, before capping.
    pub total_bottlenecks: u64,
    pub bottlenecks: Vec<BottleneckPr>,
    pub reviewer_load: Vec<ReviewerLoad>,
    pub top_reviewer_share: f64,
}

metric_block!(ReviewVelocityMetrics, "review_velocity");

// ── Temporal trends ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    #[default]
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Declining => write!(f, "declining"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

/// One metric compared across two windows.
///
/// `insufficient_data` is set when either window had nothing to measure; the
/// zero stored for that window is a placeholder and the direction is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendMetric {
    pub current: f64,
    pub previous: f64,
    pub delta: f64,
    pub direction: TrendDirection,
    pub current_samples: u64,
    pub previous_samples: u64,
    pub insufficient_data: bool,
}

impl TrendMetric {
    pub fn has_data(&self) -> bool {
        !self.insufficient_data
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalTrends {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub current_window: TrendWindow,
    pub previous_window: TrendWindow,
    pub pr_merge_rate: TrendMetric,
    pub time_to_review: TrendMetric,
    pub active_contributors: TrendMetric,
    pub issue_resolution: TrendMetric,
}

metric_block!(TemporalTrends, "trends");

impl TemporalTrends {
    /// The four trend metrics with display names, in a fixed order.
    pub fn metrics(&self) -> [(&'static str, &TrendMetric); 4] {
        [
            ("PR merge rate", &self.pr_merge_rate),
            ("Time to review", &self.time_to_review),
            ("Active contributors", &self.active_contributors),
            ("Issue resolution time", &self.issue_resolution),
        ]
    }

    pub fn declining_count(&self) -> usize {
        self.metrics()
            .iter()
            .filter(|(_, m)| m.has_data() && m.direction == TrendDirection::Declining)
            .count()
    }
}

// ── Correlations ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    #[default]
    None,
    Weak,
    Moderate,
    Strong,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        match r.abs() {
            a if a >= 0.7 => CorrelationStrength::Strong,
            a if a >= 0.4 => CorrelationStrength::Moderate,
            a if a >= 0.2 => CorrelationStrength::Weak,
            _ => CorrelationStrength::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Pearson coefficient in [-1, 1]; 0 when the sample is too small.
    pub correlation: f64,
    pub sample_size: u64,
    pub strength: CorrelationStrength,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeBucket::Small => write!(f, "Small"),
            SizeBucket::Medium => write!(f, "Medium"),
            SizeBucket::Large => write!(f, "Large"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeBucketStats {
    pub bucket: SizeBucket,
    pub count: u64,
    pub avg_size: f64,
    pub avg_merge_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricCorrelations {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub pr_size_vs_time_to_merge: CorrelationResult,
    pub review_count_vs_time_to_merge: CorrelationResult,
    pub size_buckets: Vec<SizeBucketStats>,
}

metric_block!(MetricCorrelations, "correlations");

// ── Projections ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    #[default]
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputProjection {
    pub last_window: u64,
    pub projected: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
    pub week: u32,
    pub remaining: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklogProjection {
    pub open_backlog: u64,
    pub weekly_close_rate: f64,
    /// `None` when nothing is being closed.
    pub weeks_to_clear: Option<f64>,
    pub projected: Vec<BurndownPoint>,
    pub ideal: Vec<BurndownPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projections {
    #[serde(flatten)]
    pub status: BlockStatus,
    pub pr_throughput: ThroughputProjection,
    pub issue_throughput: ThroughputProjection,
    pub backlog_burndown: BacklogProjection,
}

metric_block!(Projections, "projections");
