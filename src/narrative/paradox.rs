//! Metric combinations that move against each other.

use super::{Facts, Rule};
use crate::models::{Paradox, ParadoxKind, TrendDirection};

pub fn rules() -> Vec<Rule<Paradox>> {
    vec![
        Rule {
            name: "review culture",
            when: review_culture,
            then: |f| {
                let coverage = f.review_coverage().unwrap_or_default();
                let hours = f.first_review_hours().map(|s| s.average).unwrap_or_default();
                let merge_rate = f.merge_rate().unwrap_or_default();
                paradox(
                    ParadoxKind::ReviewCulture,
                    "Pull requests are reviewed thoroughly and quickly, yet most of them are \
                     never merged.",
                    vec![
                        format!("{:.1}% of pull requests are reviewed", coverage),
                        format!("First review arrives after {:.1} hours on average", hours),
                        format!("Only {:.1}% of resolved pull requests are merged", merge_rate),
                    ],
                )
            },
        },
        Rule {
            name: "contribution concentration",
            when: contribution_concentration,
            then: |f| {
                let (total, bus) = f
                    .contributors()
                    .map(|c| (c.total_contributors, c.bus_factor))
                    .unwrap_or_default();
                paradox(
                    ParadoxKind::ContributionConcentration,
                    "Many people contribute, but the work still depends on very few of them.",
                    vec![
                        format!("{} contributors", total),
                        format!("Bus factor of {}", bus),
                    ],
                )
            },
        },
        Rule {
            name: "declining velocity",
            when: declining_velocity,
            then: |f| {
                let evidence = f
                    .trends()
                    .map(|t| {
                        t.metrics()
                            .iter()
                            .filter(|(_, m)| m.has_data() && m.direction == TrendDirection::Declining)
                            .map(|(name, m)| {
                                format!("{} moved from {:.1} to {:.1}", name, m.previous, m.current)
                            })
                            .collect::<Vec<String>>()
                    })
                    .unwrap_or_default();
                paradox(
                    ParadoxKind::DecliningVelocity,
                    "Most delivery metrics got worse at the same time.",
                    evidence,
                )
            },
        },
        Rule {
            name: "unreviewed throughput",
            when: unreviewed_throughput,
            then: |f| {
                paradox(
                    ParadoxKind::UnreviewedThroughput,
                    "Pull requests merge at a high rate even though few of them are reviewed.",
                    vec![
                        format!("{:.1}% merge rate", f.merge_rate().unwrap_or_default()),
                        format!(
                            "{:.1}% review coverage",
                            f.review_coverage().unwrap_or_default()
                        ),
                    ],
                )
            },
        },
    ]
}

fn paradox(kind: ParadoxKind, description: &str, evidence: Vec<String>) -> Paradox {
    Paradox {
        kind,
        title: kind.to_string(),
        description: description.to_string(),
        evidence,
    }
}

/// High coverage and fast first reviews, but a low merge rate.
pub fn review_culture(f: &Facts) -> bool {
    let config = f.config;
    match (f.review_coverage(), f.first_review_hours(), f.merge_rate()) {
        (Some(coverage), Some(review), Some(merge_rate)) => {
            coverage >= config.high_coverage_pct
                && review.average <= config.fast_review_hours
                && merge_rate < config.low_merge_rate
        }
        _ => false,
    }
}

/// Many contributors, low bus factor.
pub fn contribution_concentration(f: &Facts) -> bool {
    f.contributors().is_some_and(|c| {
        c.total_contributors > f.config.concentration_min_contributors
            && c.bus_factor <= f.config.low_bus_factor
    })
}

/// At least three of the four trend metrics declining.
pub fn declining_velocity(f: &Facts) -> bool {
    f.trends().is_some_and(|t| t.declining_count() >= 3)
}

/// High merge rate with little review.
pub fn unreviewed_throughput(f: &Facts) -> bool {
    let config = f.config;
    match (f.merge_rate(), f.review_coverage()) {
        (Some(merge_rate), Some(coverage)) => {
            f.total_prs() >= config.unreviewed_min_prs
                && merge_rate >= config.unreviewed_merge_rate
                && coverage < config.unreviewed_coverage_pct
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{evaluate, Facts};
    use super::*;
    use crate::models::*;

    fn kinds(report: &AnalyticsReport) -> Vec<ParadoxKind> {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let facts = Facts::new(report, &benchmark, &config);
        evaluate(&rules(), &facts).into_iter().map(|p| p.kind).collect()
    }

    #[test]
    fn test_review_culture() {
        let report = review_culture_report();
        assert_eq!(kinds(&report), vec![ParadoxKind::ReviewCulture]);

        let mut slow = review_culture_report();
        slow.review_velocity.time_to_first_review_hours.average = 48.0;
        assert!(kinds(&slow).is_empty());
    }

    #[test]
    fn test_concentration_needs_many_contributors() {
        let mut report = empty_report();
        // A:60, B:5, C:5 gives bus factor 2 with only 3 contributors
        report.contributors = contributors(3, 2);
        assert!(kinds(&report).is_empty());

        report.contributors = contributors(25, 2);
        assert_eq!(kinds(&report), vec![ParadoxKind::ContributionConcentration]);

        report.contributors = contributors(25, 5);
        assert!(kinds(&report).is_empty());
    }

    #[test]
    fn test_declining_velocity() {
        let mut report = empty_report();
        report.trends.pr_merge_rate.direction = TrendDirection::Declining;
        report.trends.time_to_review.direction = TrendDirection::Declining;
        assert!(kinds(&report).is_empty());

        report.trends.issue_resolution.direction = TrendDirection::Declining;
        assert_eq!(kinds(&report), vec![ParadoxKind::DecliningVelocity]);

        report.trends.time_to_review.insufficient_data = true;
        assert!(kinds(&report).is_empty());
    }

    #[test]
    fn test_unreviewed_throughput() {
        let mut report = empty_report();
        report.activity.total_prs = 20;
        report.health.merge_rate = 90.0;
        report.health.health_status = HealthStatus::Excellent;
        report.health.review_coverage = ReviewCoverage {
            reviewed_prs: 2,
            total_prs: 20,
            percentage: 10.0,
        };
        assert_eq!(kinds(&report), vec![ParadoxKind::UnreviewedThroughput]);
    }

    #[test]
    fn test_paradoxes_keep_evaluation_order() {
        let mut report = review_culture_report();
        report.contributors = contributors(30, 2);
        report.trends.pr_merge_rate.direction = TrendDirection::Declining;
        report.trends.time_to_review.direction = TrendDirection::Declining;
        report.trends.active_contributors.direction = TrendDirection::Declining;
        assert_eq!(
            kinds(&report),
            vec![
                ParadoxKind::ReviewCulture,
                ParadoxKind::ContributionConcentration,
                ParadoxKind::DecliningVelocity,
            ]
        );
    }
}
