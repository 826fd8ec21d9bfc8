//! Executive narrative synthesis.
//!
//! Paradoxes, root causes and actions are ordered tables of
//! [`Rule`]s evaluated against [`Facts`]. Root-cause rules may look at which
//! paradoxes fired; nothing else depends on evaluation order.

pub mod actions;
pub mod paradox;
pub mod render;
pub mod root_cause;

use crate::config::NarrativeConfig;
use crate::models::*;
use tracing::debug;

/// A pure predicate/builder pair.
pub struct Rule<T> {
    pub name: &'static str,
    pub when: fn(&Facts) -> bool,
    pub then: fn(&Facts) -> T,
}

/// Build every item whose predicate holds, in table order.
pub fn evaluate<T>(rules: &[Rule<T>], facts: &Facts) -> Vec<T> {
    rules
        .iter()
        .filter(|rule| (rule.when)(facts))
        .map(|rule| {
            debug!("Narrative rule fired: {}", rule.name);
            (rule.then)(facts)
        })
        .collect()
}

/// Read-only view of the report for rule evaluation.
///
/// Accessors return `None` when the source block failed or holds no data,
/// so rules never draw conclusions from zeroed fields.
pub struct Facts<'a> {
    pub report: &'a AnalyticsReport,
    pub benchmark: &'a BenchmarkComparison,
    pub config: &'a NarrativeConfig,
    pub paradoxes: Vec<ParadoxKind>,
}

impl<'a> Facts<'a> {
    pub fn new(
        report: &'a AnalyticsReport,
        benchmark: &'a BenchmarkComparison,
        config: &'a NarrativeConfig,
    ) -> Self {
        Self {
            report,
            benchmark,
            config,
            paradoxes: Vec::new(),
        }
    }

    pub fn has_paradox(&self, kind: ParadoxKind) -> bool {
        self.paradoxes.contains(&kind)
    }

    pub fn merge_rate(&self) -> Option<f64> {
        let health = &self.report.health;
        (health.is_success() && health.health_status != HealthStatus::InsufficientData)
            .then_some(health.merge_rate)
    }

    pub fn review_coverage(&self) -> Option<f64> {
        let health = &self.report.health;
        (health.is_success() && health.review_coverage.total_prs > 0)
            .then_some(health.review_coverage.percentage)
    }

    pub fn first_review_hours(&self) -> Option<&DistributionStats> {
        let velocity = &self.report.review_velocity;
        let stats = &velocity.time_to_first_review_hours;
        (velocity.is_success() && stats.has_data()).then_some(stats)
    }

    pub fn total_prs(&self) -> u64 {
        if self.report.activity.is_success() {
            self.report.activity.total_prs
        } else {
            0
        }
    }

    pub fn contributors(&self) -> Option<&ContributorMetrics> {
        let contributors = &self.report.contributors;
        (contributors.is_success() && contributors.total_contributors > 0).then_some(contributors)
    }

    pub fn bus_factor(&self) -> Option<u32> {
        self.contributors().map(|c| c.bus_factor)
    }

    pub fn trends(&self) -> Option<&TemporalTrends> {
        let trends = &self.report.trends;
        trends.is_success().then_some(trends)
    }

    /// Merge-rate trend, only when both windows resolved pull requests.
    pub fn merge_rate_trend(&self) -> Option<&TrendMetric> {
        self.trends()
            .map(|t| &t.pr_merge_rate)
            .filter(|m| m.has_data())
    }

    /// Top reviewer share, once enough first reviews exist to judge balance.
    pub fn reviewer_imbalance(&self) -> Option<&ReviewerLoad> {
        let velocity = &self.report.review_velocity;
        if !velocity.is_success() {
            return None;
        }
        let first_reviews: u64 = velocity.reviewer_load.iter().map(|r| r.first_reviews).sum();
        velocity
            .reviewer_load
            .first()
            .filter(|top| {
                first_reviews >= self.config.min_first_reviews
                    && top.share > self.config.reviewer_imbalance_pct
            })
    }

    /// Size vs merge time coefficient, when strong enough to act on.
    pub fn strong_size_correlation(&self) -> Option<f64> {
        let correlations = &self.report.correlations;
        let result = &correlations.pr_size_vs_time_to_merge;
        (correlations.is_success()
            && !result.insufficient_data
            && result.correlation >= self.config.strong_correlation)
            .then_some(result.correlation)
    }
}

/// Produce the executive narrative for an assembled and benchmarked report.
pub fn generate(
    report: &AnalyticsReport,
    benchmark: &BenchmarkComparison,
    config: &NarrativeConfig,
) -> ExecutiveNarrative {
    let mut facts = Facts::new(report, benchmark, config);

    let paradoxes = evaluate(&paradox::rules(), &facts);
    facts.paradoxes = paradoxes.iter().map(|p| p.kind).collect();

    let root_causes = evaluate(&root_cause::rules(), &facts);
    let action_plan = actions::prioritize(evaluate(&actions::rules(), &facts));

    let risk_assessment = render::assess_risk(&facts);
    let projected_outcome = render::project_outcome(&facts, &action_plan);
    let summary = render::summary(&facts, &paradoxes, &risk_assessment, &action_plan);
    let key_findings = render::key_findings(&facts);

    debug!(
        "Narrative: {} paradoxes, {} root causes, {} actions, risk {}",
        paradoxes.len(),
        root_causes.len(),
        action_plan.len(),
        risk_assessment.level
    );

    ExecutiveNarrative {
        summary,
        key_findings,
        paradoxes,
        root_causes,
        action_plan,
        risk_assessment,
        projected_outcome,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_empty_report_is_healthy() {
        let report = empty_report();
        let benchmark = crate::benchmark::compare(&report);
        let narrative = generate(&report, &benchmark, &config());

        assert!(narrative.summary.contains("healthy"));
        assert!(narrative.key_findings.is_empty());
        assert!(narrative.paradoxes.is_empty());
        assert!(narrative.root_causes.is_empty());
        assert!(narrative.action_plan.is_empty());
        assert_eq!(narrative.risk_assessment.level, RiskLevel::Low);
        assert!(narrative.projected_outcome.projected_merge_rate.is_none());
    }

    #[test]
    fn test_review_culture_chain() {
        let report = review_culture_report();
        let narrative = generate(&report, &BenchmarkComparison::default(), &config());

        assert_eq!(narrative.paradoxes.len(), 1);
        assert_eq!(narrative.paradoxes[0].kind, ParadoxKind::ReviewCulture);
        assert!(narrative.summary.contains("Review Culture Paradox"));
        assert_eq!(narrative.root_causes.len(), 1);
        assert_eq!(
            narrative.root_causes[0].related_paradox,
            Some(ParadoxKind::ReviewCulture)
        );
        assert_eq!(narrative.root_causes[0].confidence, Confidence::High);
    }

    #[test]
    fn test_failed_blocks_yield_no_conclusions() {
        let mut report = review_culture_report();
        report.health = HealthMetrics::failed("boom");
        let narrative = generate(&report, &BenchmarkComparison::default(), &config());
        assert!(narrative.paradoxes.is_empty());
    }

    #[test]
    fn test_evaluate_keeps_table_order() {
        let rules: [Rule<u8>; 3] = [
            Rule { name: "a", when: |_| true, then: |_| 1 },
            Rule { name: "b", when: |_| false, then: |_| 2 },
            Rule { name: "c", when: |_| true, then: |_| 3 },
        ];
        let report = empty_report();
        let benchmark = BenchmarkComparison::default();
        let config = config();
        let facts = Facts::new(&report, &benchmark, &config);
        assert_eq!(evaluate(&rules, &facts), vec![1, 3]);
    }
}
