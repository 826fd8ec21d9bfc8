//! Repository analyzers.
//!
//! Eight independent analyzers turn the immutable [`RecordSet`] into metric
//! blocks. They never see each other's output and never fail outward: an
//! internal error, or a panic in the analyzer task, becomes a failed block.

pub mod activity;
pub mod aggregator;
pub mod contributors;
pub mod correlation;
pub mod health;
pub mod labels;
pub mod projection;
pub mod review_velocity;
pub mod stats;
pub mod trends;

pub use activity::ActivityAnalyzer;
pub use contributors::ContributorAnalyzer;
pub use correlation::CorrelationAnalyzer;
pub use health::HealthAnalyzer;
pub use labels::LabelAnalyzer;
pub use projection::ProjectionAnalyzer;
pub use review_velocity::ReviewVelocityAnalyzer;
pub use trends::TemporalTrendAnalyzer;

use crate::config::Thresholds;
use crate::error::{AnalysisError, AnalysisResult};
use crate::models::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Shared, read-only inputs besides the records themselves.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Reference time all windows are measured back from.
    pub now: DateTime<Utc>,
    pub thresholds: Thresholds,
}

/// Half-open time range `(start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t > self.start && t <= self.end
    }

    pub fn contains_opt(&self, t: Option<DateTime<Utc>>) -> bool {
        t.is_some_and(|t| self.contains(t))
    }
}

impl AnalysisContext {
    pub fn new(now: DateTime<Utc>, thresholds: Thresholds) -> Self {
        Self { now, thresholds }
    }

    /// The most recent `window_days`.
    pub fn current_window(&self) -> Window {
        self.window_ending(self.now)
    }

    /// The `window_days` before the current window.
    pub fn previous_window(&self) -> Window {
        self.window_ending(self.current_window().start)
    }

    fn window_ending(&self, end: DateTime<Utc>) -> Window {
        let days = self.thresholds.analysis.window_days.max(1);
        Window {
            start: end - Duration::days(days),
            end,
        }
    }

    /// Age of `t` in fractional days, relative to `now`.
    pub fn age_days(&self, t: DateTime<Utc>) -> f64 {
        hours_between(t, self.now) / 24.0
    }
}

/// One metric computation over the record set.
pub trait Analyzer: Send + Sync + 'static {
    type Output: MetricBlock;

    fn compute(&self, records: &RecordSet, ctx: &AnalysisContext) -> AnalysisResult<Self::Output>;

    /// Run [`Analyzer::compute`], timing it and folding any error into a
    /// failed block.
    fn analyze(&self, records: &RecordSet, ctx: &AnalysisContext) -> Self::Output {
        let started = Instant::now();

        let mut block = match self.compute(records, ctx) {
            Ok(block) => block,
            Err(e) => {
                warn!("{} analyzer failed: {}", Self::Output::NAME, e);
                Self::Output::failed(e.to_string())
            }
        };

        block.status_mut().duration_ms = started.elapsed().as_millis() as u64;
        debug!(
            "{} analyzer finished in {}ms",
            Self::Output::NAME,
            block.status().duration_ms
        );
        block
    }
}

/// Outputs of one fan-out wave.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutputs {
    pub activity: ActivityMetrics,
    pub contributors: ContributorMetrics,
    pub labels: LabelMetrics,
    pub health: HealthMetrics,
    pub review_velocity: ReviewVelocityMetrics,
    pub trends: TemporalTrends,
    pub correlations: MetricCorrelations,
    pub projections: Projections,
}

/// Launch all eight analyzers together and wait for every one to settle.
pub async fn run_all(records: Arc<RecordSet>, ctx: Arc<AnalysisContext>) -> AnalyzerOutputs {
    let (activity, contributors, labels, health, review_velocity, trends, correlations, projections) = tokio::join!(
        spawn_analyzer(ActivityAnalyzer, &records, &ctx),
        spawn_analyzer(ContributorAnalyzer, &records, &ctx),
        spawn_analyzer(LabelAnalyzer, &records, &ctx),
        spawn_analyzer(HealthAnalyzer, &records, &ctx),
        spawn_analyzer(ReviewVelocityAnalyzer, &records, &ctx),
        spawn_analyzer(TemporalTrendAnalyzer, &records, &ctx),
        spawn_analyzer(CorrelationAnalyzer, &records, &ctx),
        spawn_analyzer(ProjectionAnalyzer, &records, &ctx),
    );

    AnalyzerOutputs {
        activity,
        contributors,
        labels,
        health,
        review_velocity,
        trends,
        correlations,
        projections,
    }
}

/// Run one analyzer on its own task. A panic becomes a failed block.
pub async fn spawn_analyzer<A: Analyzer>(
    analyzer: A,
    records: &Arc<RecordSet>,
    ctx: &Arc<AnalysisContext>,
) -> A::Output {
    let records = Arc::clone(records);
    let ctx = Arc::clone(ctx);

    match tokio::spawn(async move { analyzer.analyze(&records, &ctx) }).await {
        Ok(block) => block,
        Err(e) => {
            warn!("{} analyzer task aborted: {}", A::Output::NAME, e);
            A::Output::failed(AnalysisError::Task(e.to_string()).to_string())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    /// Analyzer that always panics, to exercise task isolation.
    struct PanickingAnalyzer;

    impl Analyzer for PanickingAnalyzer {
        type Output = LabelMetrics;

        fn compute(&self, _: &RecordSet, _: &AnalysisContext) -> AnalysisResult<LabelMetrics> {
            panic!("analyzer blew up");
        }
    }

    struct ErroringAnalyzer;

    impl Analyzer for ErroringAnalyzer {
        type Output = HealthMetrics;

        fn compute(&self, _: &RecordSet, _: &AnalysisContext) -> AnalysisResult<HealthMetrics> {
            Err(AnalysisError::InvalidRecord("PR #1 has no timestamps".to_string()))
        }
    }

    #[test]
    fn test_windows_are_adjacent() {
        let ctx = ctx();
        let current = ctx.current_window();
        let previous = ctx.previous_window();
        assert_eq!(current.end, now());
        assert_eq!(previous.end, current.start);
        assert!(current.contains(days_ago(1.0)));
        assert!(!current.contains(days_ago(31.0)));
        assert!(previous.contains(days_ago(31.0)));
        assert!(!current.contains_opt(None));
    }

    #[test]
    fn test_error_becomes_failed_block() {
        let block = ErroringAnalyzer.analyze(&RecordSet::default(), &ctx());
        assert!(!block.status.success);
        assert_eq!(block.status.errors.len(), 1);
        assert!(block.status.errors[0].contains("PR #1"));
        assert_eq!(block.review_coverage.percentage, 0.0);
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_block() {
        let records = Arc::new(RecordSet::default());
        let ctx = Arc::new(ctx());
        let block = spawn_analyzer(PanickingAnalyzer, &records, &ctx).await;
        assert!(!block.status.success);
        assert!(block.status.errors[0].starts_with("Analyzer task failed"));
    }

    #[tokio::test]
    async fn test_run_all_on_empty_records_succeeds() {
        let outputs = run_all(Arc::new(RecordSet::default()), Arc::new(ctx())).await;
        assert!(outputs.activity.status.success);
        assert!(outputs.contributors.status.success);
        assert!(outputs.labels.status.success);
        assert!(outputs.health.status.success);
        assert!(outputs.review_velocity.status.success);
        assert!(outputs.trends.status.success);
        assert!(outputs.correlations.status.success);
        assert!(outputs.projections.status.success);
        assert_eq!(outputs.activity.merge_rate, 0.0);
        assert_eq!(outputs.health.review_coverage.percentage, 0.0);
        assert_eq!(outputs.labels.label_coverage, 0.0);
    }
}
