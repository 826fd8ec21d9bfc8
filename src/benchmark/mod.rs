//! Scores a report against the reference table.
//!
//! Metrics whose source block failed or has no data are reported with the
//! lowest bucket and an `InsufficientData` rating. They still count in the
//! weighted score but never become strengths or weaknesses.

pub mod tables;

use crate::analysis::stats::finite_or_zero;
use crate::models::*;
use tables::{rating_for, Reference, NO_DATA_PERCENTILE, REFERENCE_TABLE};
use tracing::debug;

/// Benchmark the six scored metrics of a report.
pub fn compare(report: &AnalyticsReport) -> BenchmarkComparison {
    let metrics: Vec<MetricBenchmark> = REFERENCE_TABLE
        .iter()
        .map(|reference| {
            let (value, has_data) = observe(report, reference.metric);
            score(reference, value, has_data)
        })
        .collect();

    let weighted: f64 = REFERENCE_TABLE
        .iter()
        .zip(&metrics)
        .map(|(reference, m)| reference.weight * m.percentile as f64)
        .sum();
    let overall_score = finite_or_zero(weighted.round()).clamp(0.0, 100.0);

    let has_any_data = metrics.iter().any(|m| m.has_data);
    let strengths = metrics
        .iter()
        .filter(|m| m.has_data && m.percentile >= 75 && m.value != 0.0)
        .map(|m| format!("{} ({}, p{})", m.metric, m.rating, m.percentile))
        .collect();
    let weak: Vec<&MetricBenchmark> = metrics
        .iter()
        .filter(|m| m.has_data && m.percentile < 50)
        .collect();
    let weaknesses = weak
        .iter()
        .map(|m| format!("{} ({}, p{})", m.metric, m.rating, m.percentile))
        .collect();
    let recommendations = weak.iter().map(|m| recommendation(m.metric).to_string()).collect();

    debug!(
        "Benchmark score {} across {} metrics with data",
        overall_score,
        metrics.iter().filter(|m| m.has_data).count()
    );

    BenchmarkComparison {
        metrics,
        overall_score,
        overall_rating: has_any_data.then(|| rating_for(overall_score)),
        strengths,
        weaknesses,
        recommendations,
    }
}

/// The raw value behind a benchmark metric and whether it can be trusted.
fn observe(report: &AnalyticsReport, metric: BenchmarkMetric) -> (f64, bool) {
    let activity = &report.activity;
    let health = &report.health;

    let (value, has_data) = match metric {
        BenchmarkMetric::MergeRate => (
            health.merge_rate,
            health.is_success() && health.health_status != HealthStatus::InsufficientData,
        ),
        BenchmarkMetric::TimeToFirstReview => {
            let stats = &report.review_velocity.time_to_first_review_hours;
            (
                stats.average,
                report.review_velocity.is_success() && stats.has_data() && stats.average > 0.0,
            )
        }
        BenchmarkMetric::ReviewCoverage => (
            health.review_coverage.percentage,
            health.is_success() && health.review_coverage.total_prs > 0,
        ),
        BenchmarkMetric::BusFactor => (
            report.contributors.bus_factor as f64,
            report.contributors.is_success() && report.contributors.total_contributors > 0,
        ),
        BenchmarkMetric::IssueResolutionDays => (
            health.avg_issue_resolution_days,
            health.is_success() && health.closed_issues > 0 && health.avg_issue_resolution_days > 0.0,
        ),
        BenchmarkMetric::DeploymentsPerMonth => (
            activity.deployments_per_month,
            activity.is_success() && activity.total_releases > 0,
        ),
    };

    let value = finite_or_zero(value);
    (value, has_data)
}

fn score(reference: &Reference, value: f64, has_data: bool) -> MetricBenchmark {
    if !has_data {
        return MetricBenchmark {
            metric: reference.metric,
            value,
            median: reference.p50,
            percentile: NO_DATA_PERCENTILE,
            rating: Rating::InsufficientData,
            has_data: false,
            description: format!("{}: insufficient data", reference.metric),
        };
    }

    let percentile = reference.percentile(value);
    let relation = if value == reference.p50 {
        "at"
    } else if (value > reference.p50) == (reference.direction == tables::Direction::HigherIsBetter) {
        "better than"
    } else {
        "worse than"
    };

    MetricBenchmark {
        metric: reference.metric,
        value,
        median: reference.p50,
        percentile,
        rating: rating_for(percentile as f64),
        has_data: true,
        description: format!(
            "{} of {:.1}{} is {} the median of {}{}",
            reference.metric, value, reference.unit, relation, reference.p50, reference.unit
        ),
    }
}

fn recommendation(metric: BenchmarkMetric) -> &'static str {
    match metric {
        BenchmarkMetric::MergeRate => {
            "Close or land stale pull requests and agree on what is ready to merge."
        }
        BenchmarkMetric::TimeToFirstReview => {
            "Set a first-response target for reviews and rotate a reviewer on duty."
        }
        BenchmarkMetric::ReviewCoverage => {
            "Require at least one review before merging to the default branch."
        }
        BenchmarkMetric::BusFactor => {
            "Spread knowledge of core areas through pairing and shared ownership."
        }
        BenchmarkMetric::IssueResolutionDays => {
            "Triage new issues weekly and close those that will not be addressed."
        }
        BenchmarkMetric::DeploymentsPerMonth => {
            "Cut smaller, more frequent releases from the default branch."
        }
    }
}
