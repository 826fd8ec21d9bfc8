//! Consistency checks over an assembled report.
//!
//! The validator only reads the report. Findings are returned separately
//! and never stop the pipeline.

use crate::config::ValidationConfig;
use crate::models::{AnalyticsReport, CorrelationResult, MetricBlock, ValidationResult};
use tracing::{debug, info, warn};

/// Cross-check, range-check and trend-check a report.
pub fn validate(report: &AnalyticsReport, config: &ValidationConfig) -> ValidationResult {
    let mut checker = Checker::new(config);

    cross_checks(report, &mut checker);
    percentage_checks(report, &mut checker);
    correlation_checks(report, &mut checker);
    trend_checks(report, &mut checker);

    let result = checker.finish();
    info!(
        "Validation: {} checks, {} errors, {} warnings, {} skipped",
        result.counters.total(),
        result.errors.len(),
        result.warnings.len(),
        result.counters.skipped_checks
    );
    for error in &result.errors {
        warn!("Validation error: {}", error);
    }
    for warning in &result.warnings {
        debug!("Validation warning: {}", warning);
    }
    result
}

struct Checker<'a> {
    config: &'a ValidationConfig,
    result: ValidationResult,
}

impl<'a> Checker<'a> {
    fn new(config: &'a ValidationConfig) -> Self {
        Self {
            config,
            result: ValidationResult::default(),
        }
    }

    fn error(&mut self, message: String) {
        self.result.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        self.result.warnings.push(message);
    }

    fn skip(&mut self) {
        self.result.counters.skipped_checks += 1;
    }

    /// Two independently computed values that should agree.
    fn agree(&mut self, what: &str, (left, a): (&str, f64), (right, b): (&str, f64)) {
        self.result.counters.cross_checks += 1;

        if !a.is_finite() || !b.is_finite() {
            self.error(format!("{}: non-finite value ({} = {}, {} = {})", what, left, a, right, b));
            return;
        }

        let largest = a.abs().max(b.abs());
        if largest == 0.0 || a == b {
            return;
        }

        let variance = (a - b).abs() / largest;
        let message = format!(
            "{}: {} reports {} but {} reports {} ({:.1}% variance)",
            what,
            left,
            a,
            right,
            b,
            variance * 100.0
        );
        if variance > self.config.variance_threshold {
            self.error(message);
        } else {
            self.warning(message);
        }
    }

    fn percentage(&mut self, what: &str, value: f64) {
        self.result.counters.percentage_checks += 1;
        if !value.is_finite() {
            self.error(format!("{} is not a number ({})", what, value));
        } else if !(0.0..=100.0).contains(&value) {
            self.error(format!("{} is outside [0, 100]: {}", what, value));
        }
    }

    fn correlation(&mut self, what: &str, result: &CorrelationResult) {
        self.result.counters.correlation_checks += 1;
        let r = result.correlation;
        if !r.is_finite() {
            self.error(format!("{} coefficient is not a number ({})", what, r));
        } else if !(-1.0..=1.0).contains(&r) {
            self.error(format!("{} coefficient is outside [-1, 1]: {}", what, r));
        } else if result.insufficient_data && r != 0.0 {
            self.error(format!(
                "{} coefficient is {} despite insufficient data",
                what, r
            ));
        }
    }

    fn delta(&mut self, what: &str, current: f64, previous: f64, delta: f64) {
        self.result.counters.trend_checks += 1;
        let expected = current - previous;
        if !delta.is_finite() || (delta - expected).abs() > self.config.epsilon {
            self.error(format!(
                "{} trend delta {} does not equal {} - {}",
                what, delta, current, previous
            ));
        }
    }

    fn finish(mut self) -> ValidationResult {
        self.result.valid = self.result.errors.is_empty();
        self.result
    }
}

fn cross_checks(report: &AnalyticsReport, checker: &mut Checker) {
    let activity = &report.activity;
    let health = &report.health;
    let labels = &report.labels;
    let velocity = &report.review_velocity;

    if activity.is_success() && health.is_success() {
        checker.agree(
            "Total PRs",
            ("activity", activity.total_prs as f64),
            ("health review coverage", health.review_coverage.total_prs as f64),
        );
        checker.agree(
            "Merge rate",
            ("activity", activity.merge_rate),
            ("health", health.merge_rate),
        );
    } else {
        checker.skip();
        checker.skip();
    }

    if activity.is_success() && labels.is_success() {
        checker.agree(
            "Total issues",
            ("activity", activity.total_issues as f64),
            ("labels", labels.total_issues as f64),
        );
        checker.agree(
            "Total PRs",
            ("activity", activity.total_prs as f64),
            ("labels", labels.total_prs as f64),
        );
    } else {
        checker.skip();
        checker.skip();
    }

    if velocity.is_success() && health.is_success() {
        checker.agree(
            "Reviewed PRs",
            ("review velocity", velocity.reviewed_prs as f64),
            ("health review coverage", health.review_coverage.reviewed_prs as f64),
        );
    } else {
        checker.skip();
    }
}

fn percentage_checks(report: &AnalyticsReport, checker: &mut Checker) {
    if report.activity.is_success() {
        checker.percentage("Activity merge rate", report.activity.merge_rate);
    }

    if report.health.is_success() {
        checker.percentage("Health merge rate", report.health.merge_rate);
        checker.percentage("Review coverage", report.health.review_coverage.percentage);
    }

    if report.contributors.is_success() {
        checker.percentage("Top-two contributor share", report.contributors.top_two_share);
    }

    if report.labels.is_success() {
        checker.percentage("Label coverage", report.labels.label_coverage);
        for label in &report.labels.distribution {
            checker.percentage(&format!("Label '{}' share", label.label), label.percentage);
        }
    }

    if report.review_velocity.is_success() {
        checker.percentage("Top reviewer share", report.review_velocity.top_reviewer_share);
        for load in &report.review_velocity.reviewer_load {
            checker.percentage(&format!("Reviewer '{}' share", load.reviewer), load.share);
        }
    }

    if report.trends.is_success() {
        let merge_rate = &report.trends.pr_merge_rate;
        checker.percentage("Current window merge rate", merge_rate.current);
        checker.percentage("Previous window merge rate", merge_rate.previous);
    }
}

fn correlation_checks(report: &AnalyticsReport, checker: &mut Checker) {
    let correlations = &report.correlations;
    if !correlations.is_success() {
        checker.skip();
        checker.skip();
        return;
    }
    checker.correlation("PR size vs time to merge", &correlations.pr_size_vs_time_to_merge);
    checker.correlation(
        "Review count vs time to merge",
        &correlations.review_count_vs_time_to_merge,
    );
}

fn trend_checks(report: &AnalyticsReport, checker: &mut Checker) {
    if !report.trends.is_success() {
        checker.skip();
        return;
    }
    for (name, metric) in report.trends.metrics() {
        checker.delta(name, metric.current, metric.previous, metric.delta);
    }
}
