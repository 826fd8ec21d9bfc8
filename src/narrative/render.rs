//! Prose for the summary, key findings, risk and projected outcome.

use super::actions::URGENT;
use super::Facts;
use crate::models::*;

/// Risk level from a fixed decision table. The highest matching row wins.
///
/// | Condition | Level |
/// |---|---|
/// | bus factor below `low_bus_factor` | critical |
/// | bus factor below `low_bus_factor + 1` | at least high |
/// | merge rate dropped more than `merge_rate_drop_pts` | at least high |
/// | active contributors declining | at least medium |
pub fn assess_risk(f: &Facts) -> RiskAssessment {
    let config = f.config;
    let mut level = RiskLevel::Low;
    let mut factors = Vec::new();

    if let Some(bus) = f.bus_factor() {
        if bus < config.low_bus_factor {
            level = level.max(RiskLevel::Critical);
            factors.push(format!("Bus factor of {} leaves no backup maintainer", bus));
        } else if bus < config.low_bus_factor + 1 {
            level = level.max(RiskLevel::High);
            factors.push(format!("Bus factor of {} concentrates knowledge", bus));
        }
    }

    if let Some(merge_rate) = f.merge_rate_trend() {
        if merge_rate.delta < -config.merge_rate_drop_pts {
            level = level.max(RiskLevel::High);
            factors.push(format!(
                "Merge rate fell {:.1} points since the previous window",
                -merge_rate.delta
            ));
        }
    }

    if let Some(trends) = f.trends() {
        if trends.active_contributors.has_data()
            && trends.active_contributors.direction == TrendDirection::Declining
        {
            level = level.max(RiskLevel::Medium);
            factors.push(format!(
                "Active contributors dropped from {:.0} to {:.0}",
                trends.active_contributors.previous, trends.active_contributors.current
            ));
        }
    }

    RiskAssessment { level, factors }
}

/// Extrapolate the merge-rate delta two periods forward, but only when
/// urgent actions exist and the delta is material.
pub fn project_outcome(f: &Facts, actions: &[ActionItem]) -> ProjectedOutcome {
    let urgent = actions.iter().any(|a| a.priority == URGENT);
    match f.merge_rate_trend() {
        Some(merge_rate) if urgent && merge_rate.delta.abs() > f.config.materiality_pts => {
            let projected = (merge_rate.current + 2.0 * merge_rate.delta).clamp(0.0, 100.0);
            ProjectedOutcome {
                description: format!(
                    "If the urgent actions are not addressed, the merge rate is projected to \
                     move from {:.1}% to {:.1}% within two periods.",
                    merge_rate.current, projected
                ),
                projected_merge_rate: Some(projected),
            }
        }
        _ => ProjectedOutcome {
            description: "No material shift is expected; current metrics should hold at \
                          their present levels."
                .to_string(),
            projected_merge_rate: None,
        },
    }
}

pub fn summary(
    f: &Facts,
    paradoxes: &[Paradox],
    risk: &RiskAssessment,
    actions: &[ActionItem],
) -> String {
    let repository = &f.report.repository;

    let mut summary = if let Some(first) = paradoxes.first() {
        format!(
            "{} shows a {}: {}",
            repository,
            first.title,
            first.description.to_lowercase()
        )
    } else if risk.level <= RiskLevel::Medium {
        format!(
            "{} is healthy with {} risk and no conflicting signals.",
            repository,
            risk.level.to_string().to_lowercase()
        )
    } else {
        format!(
            "{} needs attention: {} risk.",
            repository,
            risk.level.to_string().to_lowercase()
        )
    };

    if let Some(top) = actions.first() {
        summary.push_str(&format!(" Top priority: {}.", top.title.to_lowercase()));
    }
    if f.benchmark.has_any_data() {
        summary.push_str(&format!(
            " Benchmark score {:.0}/100.",
            f.benchmark.overall_score
        ));
    }

    summary
}

/// Headline facts. Each line is only produced when its data exists.
pub fn key_findings(f: &Facts) -> Vec<String> {
    let mut findings = Vec::new();
    let report = f.report;

    if let Some(merge_rate) = f.merge_rate() {
        findings.push(format!(
            "{:.1}% of resolved pull requests were merged ({}).",
            merge_rate,
            report.health.health_status.to_string().to_lowercase()
        ));
    }

    if let Some(coverage) = f.review_coverage() {
        findings.push(format!(
            "{:.1}% of {} pull requests received a review.",
            coverage, report.health.review_coverage.total_prs
        ));
    }

    if let Some(review) = f.first_review_hours() {
        findings.push(format!(
            "First reviews arrive after {:.1} hours at the median, {:.1} hours at p90.",
            review.median, review.p90
        ));
    }

    if let Some(contributors) = f.contributors() {
        findings.push(format!(
            "{} contributors, {} active in the last window, bus factor {}.",
            contributors.total_contributors,
            contributors.active_contributors,
            contributors.bus_factor
        ));
    }

    let velocity = &report.review_velocity;
    if velocity.is_success() && velocity.total_bottlenecks > 0 {
        findings.push(format!(
            "{} open pull requests are waiting on review or merge.",
            velocity.total_bottlenecks
        ));
    }

    if let Some(trends) = f.trends() {
        for (name, metric) in trends.metrics() {
            if metric.has_data() && metric.direction != TrendDirection::Stable {
                findings.push(format!(
                    "{} is {} ({:+.1}).",
                    name, metric.direction, metric.delta
                ));
            }
        }
    }

    if let Some(rating) = f.benchmark.overall_rating {
        findings.push(format!(
            "Benchmark score {:.0}/100 ({}).",
            f.benchmark.overall_score, rating
        ));
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn facts<'a>(
        report: &'a AnalyticsReport,
        benchmark: &'a BenchmarkComparison,
        config: &'a crate::config::NarrativeConfig,
    ) -> Facts<'a> {
        Facts::new(report, benchmark, config)
    }

    fn urgent() -> ActionItem {
        ActionItem {
            priority: 1,
            title: "Reduce single-maintainer risk".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_risk_decision_table() {
        let benchmark = BenchmarkComparison::default();
        let config = config();

        let mut report = empty_report();
        assert_eq!(assess_risk(&facts(&report, &benchmark, &config)).level, RiskLevel::Low);

        report.trends.active_contributors.direction = TrendDirection::Declining;
        assert_eq!(assess_risk(&facts(&report, &benchmark, &config)).level, RiskLevel::Medium);

        report.contributors = contributors(3, 2);
        assert_eq!(assess_risk(&facts(&report, &benchmark, &config)).level, RiskLevel::High);

        report.contributors = contributors(1, 1);
        let risk = assess_risk(&facts(&report, &benchmark, &config));
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.factors.len(), 2);
    }

    #[test]
    fn test_merge_rate_drop_is_high_risk() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let mut report = empty_report();
        report.trends.pr_merge_rate.delta = -25.0;
        assert_eq!(assess_risk(&facts(&report, &benchmark, &config)).level, RiskLevel::High);

        report.trends.pr_merge_rate.delta = -20.0;
        assert_eq!(assess_risk(&facts(&report, &benchmark, &config)).level, RiskLevel::Low);
    }

    #[test]
    fn test_projection_requires_urgent_and_material_delta() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let mut report = empty_report();
        report.trends.pr_merge_rate.current = 50.0;
        report.trends.pr_merge_rate.previous = 60.0;
        report.trends.pr_merge_rate.delta = -10.0;

        let facts = facts(&report, &benchmark, &config);
        let outcome = project_outcome(&facts, &[urgent()]);
        assert_eq!(outcome.projected_merge_rate, Some(30.0));

        assert!(project_outcome(&facts, &[]).projected_merge_rate.is_none());
    }

    #[test]
    fn test_merge_rate_without_data_is_ignored() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let mut report = empty_report();
        report.trends.pr_merge_rate.previous = 40.0;
        report.trends.pr_merge_rate.delta = -40.0;
        report.trends.pr_merge_rate.insufficient_data = true;

        let facts = facts(&report, &benchmark, &config);
        assert_eq!(assess_risk(&facts).level, RiskLevel::Low);
        assert!(project_outcome(&facts, &[urgent()]).projected_merge_rate.is_none());
    }

    #[test]
    fn test_projection_ignores_immaterial_delta_and_clamps() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let mut report = empty_report();
        report.trends.pr_merge_rate.current = 50.0;
        report.trends.pr_merge_rate.delta = 5.0;
        let outcome = project_outcome(&facts(&report, &benchmark, &config), &[urgent()]);
        assert!(outcome.projected_merge_rate.is_none());

        report.trends.pr_merge_rate.current = 90.0;
        report.trends.pr_merge_rate.delta = 30.0;
        let outcome = project_outcome(&facts(&report, &benchmark, &config), &[urgent()]);
        assert_eq!(outcome.projected_merge_rate, Some(100.0));
    }

    #[test]
    fn test_summary_variants() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let report = empty_report();
        let facts = facts(&report, &benchmark, &config);

        let healthy = summary(&facts, &[], &RiskAssessment::default(), &[]);
        assert!(healthy.starts_with("acme/widgets is healthy"));

        let critical = RiskAssessment {
            level: RiskLevel::Critical,
            factors: vec![],
        };
        let attention = summary(&facts, &[], &critical, &[urgent()]);
        assert!(attention.contains("needs attention"));
        assert!(attention.contains("Top priority: reduce single-maintainer risk."));
    }

    #[test]
    fn test_key_findings_guarded() {
        let benchmark = BenchmarkComparison::default();
        let config = config();
        assert!(key_findings(&facts(&empty_report(), &benchmark, &config)).is_empty());

        let report = review_culture_report();
        let findings = key_findings(&facts(&report, &benchmark, &config));
        assert_eq!(findings.len(), 3);
        assert!(findings[0].starts_with("30.0% of resolved pull requests"));
    }
}
