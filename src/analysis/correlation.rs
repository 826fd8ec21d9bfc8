//! How PR size and review count relate to time to merge.

use super::stats::{mean, pearson};
use super::{AnalysisContext, Analyzer};
use crate::config::AnalysisConfig;
use crate::error::AnalysisResult;
use crate::models::{
    CorrelationResult, CorrelationStrength, MetricCorrelations, PullRequest, RecordSet,
    SizeBucket, SizeBucketStats,
};

pub struct CorrelationAnalyzer;

impl Analyzer for CorrelationAnalyzer {
    type Output = MetricCorrelations;

    fn compute(
        &self,
        records: &RecordSet,
        ctx: &AnalysisContext,
    ) -> AnalysisResult<MetricCorrelations> {
        let config = &ctx.thresholds.analysis;

        // (size, hours) for merged PRs that report a size
        let sized: Vec<(f64, f64)> = records
            .pull_requests
            .iter()
            .filter_map(|pr| Some((pr.size()? as f64, merge_hours(pr)?)))
            .collect();

        let reviewed: Vec<(f64, f64)> = records
            .pull_requests
            .iter()
            .filter_map(|pr| Some((pr.reviews.len() as f64, merge_hours(pr)?)))
            .collect();

        Ok(MetricCorrelations {
            pr_size_vs_time_to_merge: correlate(&sized, config.min_correlation_sample),
            review_count_vs_time_to_merge: correlate(&reviewed, config.min_correlation_sample),
            size_buckets: size_buckets(&sized, config),
            ..Default::default()
        })
    }
}

fn merge_hours(pr: &PullRequest) -> Option<f64> {
    pr.hours_to_merge().filter(|h| h.is_finite() && *h >= 0.0)
}

/// Pearson over `pairs`, or an insufficient-data result with a coefficient
/// of exactly 0 below `min_sample`.
pub fn correlate(pairs: &[(f64, f64)], min_sample: usize) -> CorrelationResult {
    let sample_size = pairs.len() as u64;
    if pairs.len() < min_sample.max(2) {
        return CorrelationResult {
            sample_size,
            insufficient_data: true,
            ..Default::default()
        };
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let correlation = pearson(&xs, &ys);
    CorrelationResult {
        correlation,
        sample_size,
        strength: CorrelationStrength::from_coefficient(correlation),
        insufficient_data: false,
    }
}

pub fn bucket_for(size: f64, config: &AnalysisConfig) -> SizeBucket {
    if size < config.small_pr_lines as f64 {
        SizeBucket::Small
    } else if size < config.large_pr_lines as f64 {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    }
}

/// Per-bucket averages. All three buckets are always present.
fn size_buckets(sized: &[(f64, f64)], config: &AnalysisConfig) -> Vec<SizeBucketStats> {
    [SizeBucket::Small, SizeBucket::Medium, SizeBucket::Large]
        .into_iter()
        .map(|bucket| {
            let (sizes, hours): (Vec<f64>, Vec<f64>) = sized
                .iter()
                .filter(|(size, _)| bucket_for(*size, config) == bucket)
                .copied()
                .unzip();
            SizeBucketStats {
                bucket,
                count: sizes.len() as u64,
                avg_size: mean(&sizes),
                avg_merge_hours: mean(&hours),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::models::ReviewState;

    fn sized_pr(number: u64, lines: u64, merge_hours: f64) -> PullRequest {
        let mut pr = merged_pr(number, "alice", 20.0, merge_hours);
        pr.additions = Some(lines);
        pr.deletions = Some(0);
        pr
    }

    #[test]
    fn test_below_minimum_sample_is_zero() {
        let mut records = RecordSet::default();
        for n in 0..9 {
            records.pull_requests.push(sized_pr(n, 10 * (n + 1), n as f64 + 1.0));
        }

        let correlations = CorrelationAnalyzer.analyze(&records, &ctx());
        let result = &correlations.pr_size_vs_time_to_merge;
        assert!(correlations.status.success);
        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.sample_size, 9);
        assert!(result.insufficient_data);
        assert_eq!(result.strength, CorrelationStrength::None);
    }

    #[test]
    fn test_strong_positive_correlation() {
        let mut records = RecordSet::default();
        for n in 1..=12 {
            records.pull_requests.push(sized_pr(n, n * 50, n as f64 * 4.0));
        }
        // Unsized and unmerged PRs do not qualify
        records.pull_requests.push(merged_pr(100, "bob", 5.0, 500.0));
        records.pull_requests.push(open_pr(101, "bob", 5.0));

        let correlations = CorrelationAnalyzer.analyze(&records, &ctx());
        let result = &correlations.pr_size_vs_time_to_merge;
        assert_eq!(result.sample_size, 12);
        assert!(!result.insufficient_data);
        assert!(result.correlation > 0.99 && result.correlation <= 1.0);
        assert_eq!(result.strength, CorrelationStrength::Strong);
        assert_eq!(correlations.review_count_vs_time_to_merge.sample_size, 13);
    }

    #[test]
    fn test_review_count_correlation() {
        let mut records = RecordSet::default();
        for n in 0..10u64 {
            let mut pr = merged_pr(n, "alice", 20.0, 10.0 * (n + 1) as f64);
            for r in 0..n {
                pr.reviews
                    .push(review_after(&pr, "bob", ReviewState::Commented, r as f64));
            }
            records.pull_requests.push(pr);
        }

        let correlations = CorrelationAnalyzer.analyze(&records, &ctx());
        let result = &correlations.review_count_vs_time_to_merge;
        assert!(!result.insufficient_data);
        assert!((result.correlation - 1.0).abs() < 1e-9);
        assert!(correlations.pr_size_vs_time_to_merge.insufficient_data);
    }

    #[test]
    fn test_size_buckets() {
        let mut records = RecordSet::default();
        records.pull_requests.push(sized_pr(1, 20, 2.0));
        records.pull_requests.push(sized_pr(2, 60, 4.0));
        records.pull_requests.push(sized_pr(3, 100, 10.0));
        records.pull_requests.push(sized_pr(4, 499, 20.0));
        records.pull_requests.push(sized_pr(5, 500, 48.0));

        let correlations = CorrelationAnalyzer.analyze(&records, &ctx());
        let buckets = &correlations.size_buckets;
        assert_eq!(buckets.len(), 3);

        assert_eq!(buckets[0].bucket, SizeBucket::Small);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].avg_size, 40.0);
        assert_eq!(buckets[0].avg_merge_hours, 3.0);

        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].avg_size, 299.5);
        assert_eq!(buckets[2].count, 1);
        assert_eq!(buckets[2].avg_merge_hours, 48.0);
    }

    #[test]
    fn test_empty_records() {
        let correlations = CorrelationAnalyzer.analyze(&RecordSet::default(), &ctx());
        assert!(correlations.status.success);
        assert_eq!(correlations.pr_size_vs_time_to_merge.correlation, 0.0);
        assert!(correlations.size_buckets.iter().all(|b| b.count == 0));
    }
}
