//! Likely explanations behind detected conditions.
//!
//! Confidence is fixed per rule.

use super::Rule;
use crate::models::{Confidence, ParadoxKind, RootCause};

pub fn rules() -> Vec<Rule<RootCause>> {
    vec![
        Rule {
            name: "stalling after review",
            when: |f| f.has_paradox(ParadoxKind::ReviewCulture),
            then: |_| RootCause {
                title: "PRs stalling after review".to_string(),
                explanation: "Reviews happen, but pull requests are abandoned or closed \
                              afterwards instead of being revised and merged."
                    .to_string(),
                confidence: Confidence::High,
                related_paradox: Some(ParadoxKind::ReviewCulture),
            },
        },
        Rule {
            name: "concentrated ownership",
            when: |f| f.has_paradox(ParadoxKind::ContributionConcentration),
            then: |_| RootCause {
                title: "Ownership concentrated in a few maintainers".to_string(),
                explanation: "Most changes are written or approved by the same two people, so \
                              the wider contributor base depends on them."
                    .to_string(),
                confidence: Confidence::Medium,
                related_paradox: Some(ParadoxKind::ContributionConcentration),
            },
        },
        Rule {
            name: "reviewer imbalance",
            when: |f| f.reviewer_imbalance().is_some(),
            then: |f| {
                let (reviewer, share) = f
                    .reviewer_imbalance()
                    .map(|r| (r.reviewer.clone(), r.share))
                    .unwrap_or_default();
                RootCause {
                    title: "Review load imbalance".to_string(),
                    explanation: format!(
                        "{} performs {:.1}% of first reviews, so review latency tracks one \
                         person's availability.",
                        reviewer, share
                    ),
                    confidence: Confidence::Medium,
                    related_paradox: None,
                }
            },
        },
        Rule {
            name: "shrinking capacity",
            when: |f| f.has_paradox(ParadoxKind::DecliningVelocity),
            then: |_| RootCause {
                title: "Team capacity shrinking".to_string(),
                explanation: "Several delivery metrics worsened together, which usually points \
                              to fewer people available rather than a single process problem."
                    .to_string(),
                confidence: Confidence::Low,
                related_paradox: Some(ParadoxKind::DecliningVelocity),
            },
        },
        Rule {
            name: "skipped reviews",
            when: |f| f.has_paradox(ParadoxKind::UnreviewedThroughput),
            then: |_| RootCause {
                title: "Reviews skipped to keep throughput".to_string(),
                explanation: "Changes merge without review, trading defect risk for speed."
                    .to_string(),
                confidence: Confidence::Medium,
                related_paradox: Some(ParadoxKind::UnreviewedThroughput),
            },
        },
        Rule {
            name: "oversized pull requests",
            when: |f| f.strong_size_correlation().is_some(),
            then: |f| RootCause {
                title: "Oversized pull requests".to_string(),
                explanation: format!(
                    "Larger pull requests take longer to merge (r = {:.2}).",
                    f.strong_size_correlation().unwrap_or_default()
                ),
                confidence: Confidence::High,
                related_paradox: None,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{evaluate, Facts};
    use super::*;
    use crate::models::*;

    fn causes(report: &AnalyticsReport, paradoxes: Vec<ParadoxKind>) -> Vec<RootCause> {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let mut facts = Facts::new(report, &benchmark, &config);
        facts.paradoxes = paradoxes;
        evaluate(&rules(), &facts)
    }

    fn load(reviewer: &str, first_reviews: u64, share: f64) -> ReviewerLoad {
        ReviewerLoad {
            reviewer: reviewer.to_string(),
            first_reviews,
            share,
        }
    }

    #[test]
    fn test_stalling_requires_paradox() {
        let report = review_culture_report();
        assert!(causes(&report, vec![]).is_empty());

        let found = causes(&report, vec![ParadoxKind::ReviewCulture]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "PRs stalling after review");
        assert_eq!(found[0].confidence, Confidence::High);
    }

    #[test]
    fn test_reviewer_imbalance_is_independent() {
        let mut report = empty_report();
        report.review_velocity.reviewer_load = vec![load("bob", 6, 60.0), load("carol", 4, 40.0)];

        let found = causes(&report, vec![]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Review load imbalance");
        assert!(found[0].explanation.starts_with("bob performs 60.0%"));
        assert!(found[0].related_paradox.is_none());
    }

    #[test]
    fn test_reviewer_imbalance_needs_enough_reviews() {
        let mut report = empty_report();
        report.review_velocity.reviewer_load = vec![load("bob", 3, 75.0), load("carol", 1, 25.0)];
        assert!(causes(&report, vec![]).is_empty());
    }

    #[test]
    fn test_oversized_prs() {
        let mut report = empty_report();
        report.correlations.pr_size_vs_time_to_merge = CorrelationResult {
            correlation: 0.72,
            sample_size: 30,
            strength: CorrelationStrength::Strong,
            insufficient_data: false,
        };
        let found = causes(&report, vec![]);
        assert_eq!(found.len(), 1);
        assert!(found[0].explanation.contains("r = 0.72"));

        report.correlations.pr_size_vs_time_to_merge.insufficient_data = true;
        assert!(causes(&report, vec![]).is_empty());
    }

    #[test]
    fn test_order_follows_table() {
        let report = review_culture_report();
        let found = causes(
            &report,
            vec![ParadoxKind::DecliningVelocity, ParadoxKind::ReviewCulture],
        );
        let titles: Vec<&str> = found.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["PRs stalling after review", "Team capacity shrinking"]
        );
    }
}
