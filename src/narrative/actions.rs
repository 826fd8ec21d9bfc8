//! Prioritized remediation actions.

use super::{Facts, Rule};
use crate::models::{ActionItem, MetricBlock, ParadoxKind, TrendDirection};

pub const URGENT: u8 = 1;
pub const IMPORTANT: u8 = 2;
pub const OPTIONAL: u8 = 3;

pub fn rules() -> Vec<Rule<ActionItem>> {
    vec![
        Rule {
            name: "bus factor",
            when: |f| f.bus_factor().is_some_and(|b| b < f.config.low_bus_factor),
            then: |f| {
                action(
                    URGENT,
                    "Reduce single-maintainer risk",
                    format!(
                        "Bus factor is {}. Pair a second maintainer on every core area and \
                         document release and triage duties.",
                        f.bus_factor().unwrap_or_default()
                    ),
                )
            },
        },
        Rule {
            name: "stalled prs",
            when: |f| stalled_prs(f) > f.config.stalled_pr_limit,
            then: |f| {
                action(
                    URGENT,
                    "Unblock stalled pull requests",
                    format!(
                        "{} open pull requests are waiting on review or merge. Triage them \
                         this week and close what will not land.",
                        stalled_prs(f)
                    ),
                )
            },
        },
        Rule {
            name: "reviewer imbalance",
            when: |f| f.reviewer_imbalance().is_some(),
            then: |f| {
                let share = f.reviewer_imbalance().map(|r| r.share).unwrap_or_default();
                action(
                    IMPORTANT,
                    "Rebalance review load",
                    format!(
                        "The busiest reviewer handles {:.1}% of first reviews. Add CODEOWNERS \
                         entries or a review rotation.",
                        share
                    ),
                )
            },
        },
        Rule {
            name: "declining merge rate",
            when: |f| {
                f.merge_rate_trend()
                    .is_some_and(|m| m.direction == TrendDirection::Declining)
            },
            then: |f| {
                let delta = f.merge_rate_trend().map(|m| m.delta).unwrap_or_default();
                action(
                    IMPORTANT,
                    "Recover the merge rate",
                    format!(
                        "Merge rate moved {:+.1} points since the previous window. Review why \
                         recent pull requests were closed without merging.",
                        delta
                    ),
                )
            },
        },
        Rule {
            name: "unreviewed merges",
            when: |f| f.has_paradox(ParadoxKind::UnreviewedThroughput),
            then: |_| {
                action(
                    IMPORTANT,
                    "Require review before merge",
                    "Enable branch protection so every pull request gets at least one approval."
                        .to_string(),
                )
            },
        },
        Rule {
            name: "oversized prs",
            when: |f| f.strong_size_correlation().is_some(),
            then: |_| {
                action(
                    IMPORTANT,
                    "Encourage smaller pull requests",
                    "Split large changes into reviewable steps; size strongly predicts merge time."
                        .to_string(),
                )
            },
        },
        Rule {
            name: "deployment cadence",
            when: |f| {
                let activity = &f.report.activity;
                activity.is_success()
                    && activity.total_prs > 0
                    && activity.deployments_per_month < f.config.low_deployments_per_month
            },
            then: |f| {
                action(
                    OPTIONAL,
                    "Release more often",
                    format!(
                        "{:.2} releases per month. Smaller, regular releases shorten feedback \
                         loops.",
                        f.report.activity.deployments_per_month
                    ),
                )
            },
        },
        Rule {
            name: "issue triage",
            when: |f| slow_triage_days(f).is_some(),
            then: |f| {
                action(
                    OPTIONAL,
                    "Speed up issue triage",
                    format!(
                        "Issues take {:.1} days to resolve on average. Hold a weekly triage \
                         and label new issues on arrival.",
                        slow_triage_days(f).unwrap_or_default()
                    ),
                )
            },
        },
    ]
}

/// Sort by priority only; ties keep rule order.
pub fn prioritize(mut actions: Vec<ActionItem>) -> Vec<ActionItem> {
    actions.sort_by_key(|a| a.priority);
    actions
}

fn action(priority: u8, title: &str, description: String) -> ActionItem {
    ActionItem {
        priority,
        title: title.to_string(),
        description,
    }
}

fn stalled_prs(f: &Facts) -> u64 {
    let velocity = &f.report.review_velocity;
    if velocity.is_success() {
        velocity.total_bottlenecks
    } else {
        0
    }
}

fn slow_triage_days(f: &Facts) -> Option<f64> {
    let health = &f.report.health;
    (health.is_success()
        && health.closed_issues > 0
        && health.avg_issue_resolution_days > f.config.slow_triage_days)
        .then_some(health.avg_issue_resolution_days)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{evaluate, Facts};
    use super::*;
    use crate::models::*;

    fn plan(report: &AnalyticsReport) -> Vec<ActionItem> {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let facts = Facts::new(report, &benchmark, &config);
        prioritize(evaluate(&rules(), &facts))
    }

    fn titles(actions: &[ActionItem]) -> Vec<(u8, &str)> {
        actions
            .iter()
            .map(|a| (a.priority, a.title.as_str()))
            .collect()
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let actions = vec![
            action(3, "c", String::new()),
            action(1, "a", String::new()),
            action(2, "b1", String::new()),
            action(1, "a2", String::new()),
            action(2, "b2", String::new()),
        ];
        let sorted = prioritize(actions);
        assert_eq!(
            titles(&sorted),
            vec![(1, "a"), (1, "a2"), (2, "b1"), (2, "b2"), (3, "c")]
        );
    }

    #[test]
    fn test_full_plan() {
        let mut report = empty_report();
        report.activity.total_prs = 30;
        report.activity.deployments_per_month = 0.5;
        report.health.closed_issues = 8;
        report.health.avg_issue_resolution_days = 20.0;
        report.trends.pr_merge_rate.delta = -12.0;
        report.trends.pr_merge_rate.direction = TrendDirection::Declining;
        report.review_velocity.total_bottlenecks = 7;
        report.contributors.total_contributors = 4;
        report.contributors.bus_factor = 1;

        let actions = plan(&report);
        assert_eq!(
            titles(&actions),
            vec![
                (1, "Reduce single-maintainer risk"),
                (1, "Unblock stalled pull requests"),
                (2, "Recover the merge rate"),
                (3, "Release more often"),
                (3, "Speed up issue triage"),
            ]
        );
        assert!(actions[2].description.contains("-12.0"));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut report = empty_report();
        report.review_velocity.total_bottlenecks = 5;
        report.contributors.total_contributors = 3;
        report.contributors.bus_factor = 2;
        report.health.closed_issues = 3;
        report.health.avg_issue_resolution_days = 14.0;
        assert!(plan(&report).is_empty());
    }

    #[test]
    fn test_empty_report_has_no_actions() {
        assert!(plan(&empty_report()).is_empty());
    }
}
