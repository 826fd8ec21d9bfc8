//! Time to first review, time to approval, reviewer load and stalled PRs.

use super::aggregator::{sort_desc_by, Tally};
use super::stats::{distribution, percentage};
use super::{AnalysisContext, Analyzer};
use crate::error::AnalysisResult;
use crate::models::{
    hours_between, BottleneckPr, BottleneckReason, PullRequest, RecordSet, ReviewState,
    ReviewVelocityMetrics, ReviewerLoad,
};

pub struct ReviewVelocityAnalyzer;

impl Analyzer for ReviewVelocityAnalyzer {
    type Output = ReviewVelocityMetrics;

    fn compute(
        &self,
        records: &RecordSet,
        ctx: &AnalysisContext,
    ) -> AnalysisResult<ReviewVelocityMetrics> {
        let config = &ctx.thresholds.analysis;

        let mut first_review_hours = Vec::new();
        let mut approval_days = Vec::new();
        let mut first_reviewers = Tally::new();
        let mut reviewed_prs = 0u64;

        for pr in records.pull_requests.iter().filter(|pr| !pr.reviews.is_empty()) {
            reviewed_prs += 1;

            if let Some(first) = pr.first_review() {
                if let Some(at) = first.submitted_at {
                    let hours = hours_between(pr.created_at, at);
                    if (0.0..=config.first_review_ceiling_hours).contains(&hours) {
                        first_review_hours.push(hours);
                    }
                }
                if let Some(ref reviewer) = first.reviewer {
                    first_reviewers.increment(reviewer);
                }
            }

            if let Some(at) = pr.first_approval().and_then(|r| r.submitted_at) {
                let days = hours_between(pr.created_at, at) / 24.0;
                if (0.0..=config.approval_ceiling_days).contains(&days) {
                    approval_days.push(days);
                }
            }
        }

        let total_first_reviews = first_reviewers.total();
        let reviewer_load: Vec<ReviewerLoad> = first_reviewers
            .ranked()
            .into_iter()
            .map(|(reviewer, first_reviews)| ReviewerLoad {
                reviewer,
                first_reviews,
                share: percentage(first_reviews, total_first_reviews),
            })
            .collect();

        let mut bottlenecks: Vec<BottleneckPr> = records
            .pull_requests
            .iter()
            .filter(|pr| pr.is_open())
            .map(|pr| BottleneckPr {
                number: pr.number,
                author: pr.author.clone(),
                waiting_days: ctx.age_days(pr.created_at),
                reason: classify_bottleneck(pr),
            })
            .filter(|b| b.waiting_days > config.bottleneck_days as f64)
            .collect();
        sort_desc_by(&mut bottlenecks, |b| b.waiting_days);
        let total_bottlenecks = bottlenecks.len() as u64;
        bottlenecks.truncate(config.max_bottlenecks);

        Ok(ReviewVelocityMetrics {
            reviewed_prs,
            time_to_first_review_hours: distribution(&first_review_hours),
            time_to_approval_days: distribution(&approval_days),
            total_bottlenecks,
            bottlenecks,
            top_reviewer_share: reviewer_load.first().map(|r| r.share).unwrap_or(0.0),
            reviewer_load,
            ..Default::default()
        })
    }
}

/// Why an open pull request is still waiting.
pub fn classify_bottleneck(pr: &PullRequest) -> BottleneckReason {
    if pr.reviews.is_empty() {
        return BottleneckReason::NoReviewers;
    }
    match pr.latest_verdict() {
        Some(ReviewState::ChangesRequested) => BottleneckReason::ChangesRequested,
        Some(ReviewState::Approved) => BottleneckReason::ApprovedPendingMerge,
        _ => BottleneckReason::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_first_review_distribution() {
        let mut records = RecordSet::default();
        for h in 1..=10 {
            let mut pr = merged_pr(h, "alice", 20.0, 48.0);
            pr.reviews
                .push(review_after(&pr, "bob", ReviewState::Commented, h as f64));
            records.pull_requests.push(pr);
        }

        let metrics = ReviewVelocityAnalyzer.analyze(&records, &ctx());
        let stats = &metrics.time_to_first_review_hours;
        assert_eq!(metrics.reviewed_prs, 10);
        assert_eq!(stats.sample_size, 10);
        assert_eq!(stats.average, 5.5);
        assert_eq!(stats.median, 6.0);
        assert_eq!(stats.p90, 10.0);
        assert!(!metrics.time_to_approval_days.has_data());
    }

    #[test]
    fn test_outliers_discarded() {
        let mut records = RecordSet::default();
        let mut slow = merged_pr(1, "alice", 200.0, 1.0);
        slow.reviews
            .push(review_after(&slow, "bob", ReviewState::Approved, 31.0 * 24.0));
        let mut slower = merged_pr(2, "alice", 200.0, 1.0);
        slower
            .reviews
            .push(review_after(&slower, "bob", ReviewState::Approved, 91.0 * 24.0));
        let mut quick = merged_pr(3, "alice", 20.0, 1.0);
        quick.reviews.push(review_after(&quick, "carol", ReviewState::Approved, 24.0));
        records.pull_requests.extend([slow, slower, quick]);

        let metrics = ReviewVelocityAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.reviewed_prs, 3);
        assert_eq!(metrics.time_to_first_review_hours.sample_size, 1);
        assert_eq!(metrics.time_to_first_review_hours.average, 24.0);
        // 31 days is inside the 90 day approval ceiling, 91 is not
        assert_eq!(metrics.time_to_approval_days.sample_size, 2);
    }

    #[test]
    fn test_reviewer_load() {
        let mut records = RecordSet::default();
        for (n, reviewer) in ["bob", "carol", "bob", "bob", "dave"].iter().enumerate() {
            let mut pr = merged_pr(n as u64, "alice", 5.0, 10.0);
            pr.reviews
                .push(review_after(&pr, reviewer, ReviewState::Approved, 1.0));
            pr.reviews
                .push(review_after(&pr, "erin", ReviewState::Commented, 2.0));
            records.pull_requests.push(pr);
        }

        let metrics = ReviewVelocityAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.reviewer_load[0].reviewer, "bob");
        assert_eq!(metrics.reviewer_load[0].first_reviews, 3);
        assert_eq!(metrics.top_reviewer_share, 60.0);
        assert_eq!(metrics.reviewer_load[1].reviewer, "carol");
        assert!(metrics.reviewer_load.iter().all(|r| r.reviewer != "erin"));
    }

    #[test]
    fn test_bottlenecks_classified_sorted_and_capped() {
        let mut records = RecordSet::default();
        for n in 0..12 {
            records.pull_requests.push(open_pr(n, "alice", 4.0 + n as f64));
        }
        let mut changes = open_pr(100, "bob", 30.0);
        changes
            .reviews
            .push(review_after(&changes, "carol", ReviewState::ChangesRequested, 2.0));
        let mut approved = open_pr(101, "bob", 40.0);
        approved
            .reviews
            .push(review_after(&approved, "carol", ReviewState::ChangesRequested, 2.0));
        approved
            .reviews
            .push(review_after(&approved, "carol", ReviewState::Approved, 20.0));
        let mut commented = open_pr(102, "bob", 40.0);
        commented
            .reviews
            .push(review_after(&commented, "carol", ReviewState::Commented, 2.0));
        // Young PR is not a bottleneck
        records.pull_requests.push(open_pr(103, "bob", 1.0));
        records.pull_requests.extend([changes, approved, commented]);

        let metrics = ReviewVelocityAnalyzer.analyze(&records, &ctx());
        assert_eq!(metrics.total_bottlenecks, 15);
        assert_eq!(metrics.bottlenecks.len(), 10);

        let head: Vec<(u64, BottleneckReason)> = metrics
            .bottlenecks
            .iter()
            .take(3)
            .map(|b| (b.number, b.reason))
            .collect();
        assert_eq!(
            head,
            vec![
                (101, BottleneckReason::ApprovedPendingMerge),
                (102, BottleneckReason::Unknown),
                (100, BottleneckReason::ChangesRequested),
            ]
        );
        assert_eq!(metrics.bottlenecks[3].reason, BottleneckReason::NoReviewers);
        assert!(metrics
            .bottlenecks
            .windows(2)
            .all(|w| w[0].waiting_days >= w[1].waiting_days));
    }
}
