//! Volume and throughput of pull requests, issues, commits and releases.

use super::stats::{ensure_finite, mean, percentage, safe_div};
use super::{AnalysisContext, Analyzer, Window};
use crate::error::AnalysisResult;
use crate::models::{ActivityMetrics, RecordSet};
use chrono::{Datelike, Duration};

pub struct ActivityAnalyzer;

impl Analyzer for ActivityAnalyzer {
    type Output = ActivityMetrics;

    fn compute(&self, records: &RecordSet, ctx: &AnalysisContext) -> AnalysisResult<ActivityMetrics> {
        let window = ctx.current_window();
        let prs = &records.pull_requests;

        let merged_prs = prs.iter().filter(|pr| pr.is_merged()).count() as u64;
        let closed_prs = prs.iter().filter(|pr| pr.is_closed_unmerged()).count() as u64;
        let merge_hours: Vec<f64> = prs
            .iter()
            .filter_map(|pr| pr.hours_to_merge())
            .filter(|h| *h >= 0.0)
            .collect();

        let mut commits_by_weekday = [0u64; 7];
        for commit in &records.commits {
            commits_by_weekday[commit.date.weekday().num_days_from_monday() as usize] += 1;
        }

        let metrics = ActivityMetrics {
            total_prs: prs.len() as u64,
            open_prs: prs.iter().filter(|pr| pr.is_open()).count() as u64,
            merged_prs,
            closed_prs,
            merge_rate: ensure_finite("merge_rate", percentage(merged_prs, merged_prs + closed_prs))?,
            avg_time_to_merge_hours: mean(&merge_hours),
            total_issues: records.issues.len() as u64,
            open_issues: records.issues.iter().filter(|i| i.is_open()).count() as u64,
            closed_issues: records.issues.iter().filter(|i| !i.is_open()).count() as u64,
            total_commits: records.commits.len() as u64,
            total_releases: records.releases.len() as u64,
            prs_in_window: prs.iter().filter(|pr| window.contains(pr.created_at)).count() as u64,
            issues_in_window: records
                .issues
                .iter()
                .filter(|i| window.contains(i.created_at))
                .count() as u64,
            commits_in_window: records
                .commits
                .iter()
                .filter(|c| window.contains(c.date))
                .count() as u64,
            deployments_per_month: deployments_per_month(records, ctx),
            commits_by_weekday,
            ..Default::default()
        };

        Ok(metrics)
    }
}

/// Releases in the trailing deployment window, scaled to 30 days.
fn deployments_per_month(records: &RecordSet, ctx: &AnalysisContext) -> f64 {
    let days = ctx.thresholds.analysis.deployment_window_days.max(1);
    let window = Window {
        start: ctx.now - Duration::days(days),
        end: ctx.now,
    };
    let count = records
        .releases
        .iter()
        .filter(|r| window.contains(r.released_at()))
        .count();
    safe_div(count as f64 * 30.0, days as f64)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_merge_rate_ninety_percent() {
        let mut records = RecordSet::default();
        for n in 0..18 {
            records.pull_requests.push(merged_pr(n, "alice", 10.0, 5.0));
        }
        for n in 18..20 {
            records.pull_requests.push(closed_pr(n, "bob", 10.0));
        }

        let metrics = ActivityAnalyzer.analyze(&records, &ctx());
        assert!(metrics.status.success);
        assert_eq!(metrics.total_prs, 20);
        assert_eq!(metrics.merged_prs, 18);
        assert_eq!(metrics.closed_prs, 2);
        assert_eq!(metrics.merge_rate, 90.0);
        assert_eq!(metrics.avg_time_to_merge_hours, 5.0);
    }

    #[test]
    fn test_empty_records() {
        let metrics = ActivityAnalyzer.analyze(&RecordSet::default(), &ctx());
        assert!(metrics.status.success);
        assert_eq!(metrics.merge_rate, 0.0);
        assert_eq!(metrics.avg_time_to_merge_hours, 0.0);
        assert_eq!(metrics.deployments_per_month, 0.0);
        assert!(!metrics.has_resolved_prs());
    }

    #[test]
    fn test_only_open_prs_has_zero_merge_rate() {
        let mut records = RecordSet::default();
        records.pull_requests.push(open_pr(1, "alice", 2.0));
        let metrics = ActivityAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.open_prs, 1);
        assert_eq!(metrics.merge_rate, 0.0);
    }

    #[test]
    fn test_window_counts_and_deployments() {
        let mut records = RecordSet::default();
        records.pull_requests.push(open_pr(1, "alice", 5.0));
        records.pull_requests.push(open_pr(2, "alice", 45.0));
        records.issues.push(issue(1, 3.0, None));
        records.issues.push(issue(2, 50.0, Some(2.0)));
        records.commits.push(commit("alice", 1.0));
        records.commits.push(commit("alice", 40.0));
        for (i, days) in [10.0, 40.0, 70.0, 120.0].iter().enumerate() {
            records.releases.push(release(&format!("v{}", i), *days));
        }

        let metrics = ActivityAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.prs_in_window, 1);
        assert_eq!(metrics.issues_in_window, 1);
        assert_eq!(metrics.commits_in_window, 1);
        assert_eq!(metrics.open_issues, 1);
        assert_eq!(metrics.closed_issues, 1);
        // Three releases in the last 90 days
        assert_eq!(metrics.deployments_per_month, 1.0);
        assert_eq!(metrics.commits_by_weekday.iter().sum::<u64>(), 2);
    }
}
