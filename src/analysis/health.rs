//! Review coverage, staleness and overall health status.

use super::stats::{mean, percentage};
use super::{AnalysisContext, Analyzer};
use crate::config::HealthConfig;
use crate::error::AnalysisResult;
use crate::models::{HealthMetrics, HealthStatus, RecordSet, ReviewCoverage};

pub struct HealthAnalyzer;

impl Analyzer for HealthAnalyzer {
    type Output = HealthMetrics;

    fn compute(&self, records: &RecordSet, ctx: &AnalysisContext) -> AnalysisResult<HealthMetrics> {
        let prs = &records.pull_requests;
        let stale_days = ctx.thresholds.analysis.stale_days as f64;

        let reviewed_prs = prs.iter().filter(|pr| !pr.reviews.is_empty()).count() as u64;
        let merged = prs.iter().filter(|pr| pr.is_merged()).count() as u64;
        let resolved = merged + prs.iter().filter(|pr| pr.is_closed_unmerged()).count() as u64;
        let merge_rate = percentage(merged, resolved);

        let resolution_days: Vec<f64> = records
            .issues
            .iter()
            .filter_map(|i| i.hours_to_close())
            .filter(|h| *h >= 0.0)
            .map(|h| h / 24.0)
            .collect();

        Ok(HealthMetrics {
            review_coverage: ReviewCoverage {
                reviewed_prs,
                total_prs: prs.len() as u64,
                percentage: percentage(reviewed_prs, prs.len() as u64),
            },
            merge_rate,
            health_status: health_status(merge_rate, resolved > 0, &ctx.thresholds.health),
            stale_prs: prs
                .iter()
                .filter(|pr| pr.is_open() && ctx.age_days(pr.created_at) > stale_days)
                .count() as u64,
            stale_issues: records
                .issues
                .iter()
                .filter(|i| i.is_open() && ctx.age_days(i.created_at) > stale_days)
                .count() as u64,
            closed_issues: resolution_days.len() as u64,
            avg_issue_resolution_days: mean(&resolution_days),
            ..Default::default()
        })
    }
}

/// Status from the merge rate; no resolved PRs means no verdict.
pub fn health_status(merge_rate: f64, has_data: bool, config: &HealthConfig) -> HealthStatus {
    if !has_data {
        HealthStatus::InsufficientData
    } else if merge_rate >= config.excellent {
        HealthStatus::Excellent
    } else if merge_rate >= config.good {
        HealthStatus::Good
    } else if merge_rate >= config.fair {
        HealthStatus::Fair
    } else {
        HealthStatus::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::models::ReviewState;

    #[test]
    fn test_ninety_percent_merge_rate_is_excellent() {
        let mut records = RecordSet::default();
        for n in 0..18 {
            records.pull_requests.push(merged_pr(n, "alice", 10.0, 5.0));
        }
        for n in 18..20 {
            records.pull_requests.push(closed_pr(n, "bob", 10.0));
        }

        let metrics = HealthAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.merge_rate, 90.0);
        assert_eq!(metrics.health_status, HealthStatus::Excellent);
        assert_eq!(metrics.review_coverage.total_prs, 20);
        assert_eq!(metrics.review_coverage.percentage, 0.0);
    }

    #[test]
    fn test_status_thresholds() {
        let config = HealthConfig::default();
        assert_eq!(health_status(80.0, true, &config), HealthStatus::Excellent);
        assert_eq!(health_status(79.9, true, &config), HealthStatus::Good);
        assert_eq!(health_status(40.0, true, &config), HealthStatus::Fair);
        assert_eq!(health_status(10.0, true, &config), HealthStatus::Poor);
        assert_eq!(health_status(0.0, false, &config), HealthStatus::InsufficientData);
    }

    #[test]
    fn test_coverage_stale_and_resolution() {
        let mut records = RecordSet::default();
        let mut reviewed = merged_pr(1, "alice", 5.0, 10.0);
        reviewed.reviews.push(review_after(&reviewed, "bob", ReviewState::Approved, 2.0));
        records.pull_requests.push(reviewed);
        records.pull_requests.push(open_pr(2, "alice", 45.0));
        records.pull_requests.push(open_pr(3, "alice", 2.0));
        records.pull_requests.push(open_pr(4, "alice", 1.0));

        records.issues.push(issue(1, 60.0, None));
        records.issues.push(issue(2, 10.0, Some(48.0)));
        records.issues.push(issue(3, 10.0, Some(96.0)));

        let metrics = HealthAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.review_coverage.reviewed_prs, 1);
        assert_eq!(metrics.review_coverage.percentage, 25.0);
        assert_eq!(metrics.stale_prs, 1);
        assert_eq!(metrics.stale_issues, 1);
        assert_eq!(metrics.closed_issues, 2);
        assert_eq!(metrics.avg_issue_resolution_days, 3.0);
    }

    #[test]
    fn test_empty_records() {
        let metrics = HealthAnalyzer.analyze(&RecordSet::default(), &ctx());
        assert!(metrics.status.success);
        assert_eq!(metrics.health_status, HealthStatus::InsufficientData);
        assert_eq!(metrics.avg_issue_resolution_days, 0.0);
    }
}
