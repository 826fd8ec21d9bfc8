//! The analysis pipeline.
//!
//! records → eight analyzers (one fan-out wave) → assemble → validate →
//! benchmark → narrative. Validation findings are returned alongside the
//! report and never stop the pipeline.

use crate::analysis::{self, AnalysisContext};
use crate::benchmark;
use crate::collector::{self, RecordSource};
use crate::error::CollectorResult;
use crate::models::{AnalyticsReport, CollectionMode, RecordSet, Repository, ValidationResult};
use crate::narrative;
use crate::report::{assemble, validate};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: AnalyticsReport,
    pub validation: ValidationResult,
}

/// Run every stage over an already collected record set.
pub async fn run(
    repository: &Repository,
    records: RecordSet,
    ctx: AnalysisContext,
) -> PipelineOutput {
    let started = Instant::now();
    let ctx = Arc::new(ctx);

    let outputs = analysis::run_all(Arc::new(records), Arc::clone(&ctx)).await;
    let mut report = assemble(repository, ctx.now, outputs);

    let failed = report.failed_blocks();
    if !failed.is_empty() {
        warn!("{} analyzer(s) failed: {}", failed.len(), failed.join(", "));
    }

    let validation = validate(&report, &ctx.thresholds.validation);
    if !validation.valid {
        warn!(
            "Report for {} has {} validation error(s)",
            repository,
            validation.errors.len()
        );
    }

    let comparison = benchmark::compare(&report);
    report.attach_benchmark(comparison);

    if let Some(ref comparison) = report.benchmark {
        let story = narrative::generate(&report, comparison, &ctx.thresholds.narrative);
        report.attach_narrative(story);
    }

    info!(
        "Analysis of {} finished in {:.2}s",
        repository,
        started.elapsed().as_secs_f64()
    );

    PipelineOutput { report, validation }
}

/// Collect records from `source`, then run the pipeline.
///
/// A collector failure is the only error this returns.
pub async fn analyze_repository(
    source: &dyn RecordSource,
    repository: &Repository,
    mode: CollectionMode,
    ctx: AnalysisContext,
) -> CollectorResult<PipelineOutput> {
    let records = collector::collect_all(source, repository, mode).await?;
    Ok(run(repository, records, ctx).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::*;
    use crate::error::CollectorError;
    use crate::models::*;
    use async_trait::async_trait;

    fn repo() -> Repository {
        Repository::new("acme", "widgets")
    }

    fn busy_records() -> RecordSet {
        let mut records = RecordSet::default();
        for n in 0..18 {
            let author = ["alice", "bob", "carol"][n as usize % 3];
            let mut pr = merged_pr(n, author, 5.0 + n as f64, 12.0);
            pr.labels = vec![if n % 2 == 0 { "bug" } else { "docs" }.to_string()];
            pr.reviews.push(review_after(&pr, "dave", ReviewState::Approved, 2.0));
            records.pull_requests.push(pr);
        }
        records.pull_requests.push(closed_pr(18, "erin", 8.0));
        records.pull_requests.push(closed_pr(19, "erin", 9.0));
        for n in 0..5 {
            records.pull_requests.push(open_pr(100 + n, "frank", 10.0));
        }
        for n in 0..6 {
            records.issues.push(issue(n, 20.0, Some(30.0)));
            records.commits.push(commit("alice", n as f64 + 1.0));
        }
        records.releases.push(release("v1.0.0", 10.0));
        records
    }

    #[tokio::test]
    async fn test_empty_repository_is_healthy() {
        let output = run(&repo(), RecordSet::default(), ctx()).await;
        let report = &output.report;

        assert!(report.failed_blocks().is_empty());
        assert_eq!(report.activity.merge_rate, 0.0);
        assert_eq!(report.health.review_coverage.percentage, 0.0);
        assert!(output.validation.valid);

        let narrative = report.narrative.as_ref().unwrap();
        assert!(narrative.summary.contains("healthy"));
        assert!(narrative.key_findings.is_empty());
        assert!(report.benchmark.is_some());
    }

    #[tokio::test]
    async fn test_ninety_percent_merge_rate() {
        let mut records = RecordSet::default();
        for n in 0..18 {
            records.pull_requests.push(merged_pr(n, "alice", 10.0, 5.0));
        }
        records.pull_requests.push(closed_pr(18, "bob", 10.0));
        records.pull_requests.push(closed_pr(19, "bob", 10.0));

        let output = run(&repo(), records, ctx()).await;
        assert_eq!(output.report.activity.merge_rate, 90.0);
        assert_eq!(output.report.health.merge_rate, 90.0);
        assert_eq!(output.report.health.health_status, HealthStatus::Excellent);
        assert!(output.validation.valid);
    }

    #[tokio::test]
    async fn test_identical_input_gives_identical_rankings() {
        let first = run(&repo(), busy_records(), ctx()).await.report;
        let second = run(&repo(), busy_records(), ctx()).await.report;

        assert_eq!(
            first.contributors.top_contributors,
            second.contributors.top_contributors
        );
        assert_eq!(first.labels.distribution, second.labels.distribution);
        assert_eq!(
            first.review_velocity.bottlenecks,
            second.review_velocity.bottlenecks
        );
        assert_eq!(first.narrative, second.narrative);
    }

    #[tokio::test]
    async fn test_busy_repository_is_consistent() {
        let output = run(&repo(), busy_records(), ctx()).await;
        let report = &output.report;

        assert!(output.validation.valid, "{:?}", output.validation.errors);
        assert_eq!(report.activity.total_prs, 25);
        assert_eq!(report.review_velocity.reviewed_prs, 18);
        assert_eq!(report.review_velocity.total_bottlenecks, 5);
        assert!(report.benchmark.as_ref().unwrap().has_any_data());
        assert!(!report.narrative.as_ref().unwrap().key_findings.is_empty());
    }

    struct BrokenSource;

    #[async_trait]
    impl RecordSource for BrokenSource {
        async fn fetch(
            &self,
            _repository: &Repository,
            kind: RecordKind,
            mode: CollectionMode,
        ) -> CollectorResult<Vec<Record>> {
            Err(CollectorError::Unsupported {
                kind: kind.to_string(),
                mode: mode.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_collector_failure_aborts() {
        let result =
            analyze_repository(&BrokenSource, &repo(), CollectionMode::Replay, ctx()).await;
        assert!(result.is_err());
    }
}
