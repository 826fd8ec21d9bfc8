//! Markdown and JSON report generation.
//!
//! Each section is a pure function of the report. Failed metric blocks
//! render their recorded errors instead of zeroed numbers.

use crate::models::*;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalyticsReport, validation: &ValidationResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Repository Analytics: {}\n\n", report.repository));

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(report));

    if let Some(ref narrative) = report.narrative {
        output.push_str(&generate_narrative_section(narrative));
    }

    output.push_str(&generate_activity_section(&report.activity));
    output.push_str(&generate_contributors_section(&report.contributors));
    output.push_str(&generate_labels_section(&report.labels));
    output.push_str(&generate_health_section(&report.health));
    output.push_str(&generate_review_velocity_section(&report.review_velocity));
    output.push_str(&generate_trends_section(&report.trends));
    output.push_str(&generate_correlations_section(&report.correlations));
    output.push_str(&generate_projections_section(&report.projections));

    if let Some(ref benchmark) = report.benchmark {
        output.push_str(&generate_benchmark_section(benchmark));
    }

    output.push_str(&generate_validation_section(validation));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(report: &AnalyticsReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Repository:** {}\n", report.repository));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records:** {} PRs, {} issues, {} commits, {} releases\n",
        report.activity.total_prs,
        report.activity.total_issues,
        report.activity.total_commits,
        report.activity.total_releases
    ));

    let failed = report.failed_blocks();
    if !failed.is_empty() {
        section.push_str(&format!("- **Failed Sections:** {}\n", failed.join(", ")));
    }
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &AnalyticsReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    if report.narrative.is_some() {
        toc.push_str("- [Executive Summary](#executive-summary)\n");
    }
    for (title, anchor) in [
        ("Activity", "activity"),
        ("Contributors", "contributors"),
        ("Labels", "labels"),
        ("Health", "health"),
        ("Review Velocity", "review-velocity"),
        ("Trends", "trends"),
        ("Correlations", "correlations"),
        ("Projections", "projections"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    if report.benchmark.is_some() {
        toc.push_str("- [Benchmark](#benchmark)\n");
    }
    toc.push_str("- [Validation](#validation)\n\n");

    toc
}

/// Heading plus, for a failed block, its recorded errors.
fn block_header<B: MetricBlock>(title: &str, block: &B) -> (String, bool) {
    let mut section = format!("## {}\n\n", title);
    let status = block.status();

    if status.success {
        return (section, true);
    }

    section.push_str("> **This section could not be computed.**\n");
    for error in &status.errors {
        section.push_str(&format!("> - {}\n", error));
    }
    section.push('\n');
    (section, false)
}

fn generate_narrative_section(narrative: &ExecutiveNarrative) -> String {
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str(&narrative.summary);
    section.push_str("\n\n");

    section.push_str(&format!(
        "**Risk:** {}\n\n",
        narrative.risk_assessment.level
    ));
    for factor in &narrative.risk_assessment.factors {
        section.push_str(&format!("- {}\n", factor));
    }
    if !narrative.risk_assessment.factors.is_empty() {
        section.push('\n');
    }

    if !narrative.key_findings.is_empty() {
        section.push_str("### Key Findings\n\n");
        for finding in &narrative.key_findings {
            section.push_str(&format!("- {}\n", finding));
        }
        section.push('\n');
    }

    if !narrative.paradoxes.is_empty() {
        section.push_str("### Paradoxes\n\n");
        for paradox in &narrative.paradoxes {
            section.push_str(&format!("#### {}\n\n{}\n\n", paradox.title, paradox.description));
            for evidence in &paradox.evidence {
                section.push_str(&format!("- {}\n", evidence));
            }
            section.push('\n');
        }
    }

    if !narrative.root_causes.is_empty() {
        section.push_str("### Likely Root Causes\n\n");
        for cause in &narrative.root_causes {
            section.push_str(&format!(
                "- **{}** ({} confidence): {}\n",
                cause.title, cause.confidence, cause.explanation
            ));
        }
        section.push('\n');
    }

    if !narrative.action_plan.is_empty() {
        section.push_str("### Action Plan\n\n");
        section.push_str("| Priority | Action | Details |\n");
        section.push_str("|:---:|:---|:---|\n");
        for action in &narrative.action_plan {
            section.push_str(&format!(
                "| P{} | {} | {} |\n",
                action.priority, action.title, action.description
            ));
        }
        section.push('\n');
    }

    section.push_str(&format!(
        "**Projected outcome:** {}\n\n",
        narrative.projected_outcome.description
    ));

    section
}

fn generate_activity_section(activity: &ActivityMetrics) -> String {
    let (mut section, ok) = block_header("Activity", activity);
    if !ok {
        return section;
    }

    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!(
        "| Pull requests | {} ({} open, {} merged, {} closed) |\n",
        activity.total_prs, activity.open_prs, activity.merged_prs, activity.closed_prs
    ));
    section.push_str(&format!("| Merge rate | {:.1}% |\n", activity.merge_rate));
    section.push_str(&format!(
        "| Average time to merge | {:.1}h |\n",
        activity.avg_time_to_merge_hours
    ));
    section.push_str(&format!(
        "| Issues | {} ({} open, {} closed) |\n",
        activity.total_issues, activity.open_issues, activity.closed_issues
    ));
    section.push_str(&format!("| Commits | {} |\n", activity.total_commits));
    section.push_str(&format!("| Releases | {} |\n", activity.total_releases));
    section.push_str(&format!(
        "| Last window | {} PRs, {} issues, {} commits |\n",
        activity.prs_in_window, activity.issues_in_window, activity.commits_in_window
    ));
    section.push_str(&format!(
        "| Deployments per month | {:.2} |\n\n",
        activity.deployments_per_month
    ));

    if activity.total_commits > 0 {
        section.push_str("### Commits by Weekday\n\n");
        section.push_str("| Mon | Tue | Wed | Thu | Fri | Sat | Sun |\n");
        section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
        let counts: Vec<String> = activity
            .commits_by_weekday
            .iter()
            .map(|c| c.to_string())
            .collect();
        section.push_str(&format!("| {} |\n\n", counts.join(" | ")));
    }

    section
}

fn generate_contributors_section(contributors: &ContributorMetrics) -> String {
    let (mut section, ok) = block_header("Contributors", contributors);
    if !ok {
        return section;
    }

    section.push_str(&format!(
        "- **Contributors:** {} ({} active, {} new this window)\n",
        contributors.total_contributors,
        contributors.active_contributors,
        contributors.first_time_contributors
    ));
    section.push_str(&format!("- **Bus factor:** {}\n", contributors.bus_factor));
    section.push_str(&format!(
        "- **Top-two share:** {:.1}%\n\n",
        contributors.top_two_share
    ));

    if !contributors.top_contributors.is_empty() {
        section.push_str("| Contributor | Commits | PRs | Reviews | Total |\n");
        section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
        for c in &contributors.top_contributors {
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                c.login, c.commits, c.pull_requests, c.reviews, c.total
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_labels_section(labels: &LabelMetrics) -> String {
    let (mut section, ok) = block_header("Labels", labels);
    if !ok {
        return section;
    }

    section.push_str(&format!(
        "- **Label coverage:** {:.1}% ({} unlabeled PRs, {} unlabeled issues)\n",
        labels.label_coverage, labels.unlabeled_prs, labels.unlabeled_issues
    ));
    let c = &labels.categories;
    section.push_str(&format!(
        "- **Categories:** {} bug, {} feature, {} documentation, {} other\n\n",
        c.bug, c.feature, c.documentation, c.other
    ));

    if !labels.distribution.is_empty() {
        section.push_str("| Label | Count | Share |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for label in &labels.distribution {
            section.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                label.label, label.count, label.percentage
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_health_section(health: &HealthMetrics) -> String {
    let (mut section, ok) = block_header("Health", health);
    if !ok {
        return section;
    }

    section.push_str(&format!("- **Status:** {}\n", health.health_status));
    section.push_str(&format!("- **Merge rate:** {:.1}%\n", health.merge_rate));
    section.push_str(&format!(
        "- **Review coverage:** {:.1}% ({} of {} PRs)\n",
        health.review_coverage.percentage,
        health.review_coverage.reviewed_prs,
        health.review_coverage.total_prs
    ));
    section.push_str(&format!(
        "- **Stale:** {} PRs, {} issues\n",
        health.stale_prs, health.stale_issues
    ));
    if health.closed_issues > 0 {
        section.push_str(&format!(
            "- **Average issue resolution:** {:.1} days over {} issues\n",
            health.avg_issue_resolution_days, health.closed_issues
        ));
    }
    section.push('\n');

    section
}

fn distribution_row(name: &str, unit: &str, stats: &DistributionStats) -> String {
    if !stats.has_data() {
        return format!("| {} | - | - | - | 0 |\n", name);
    }
    format!(
        "| {} | {:.1}{unit} | {:.1}{unit} | {:.1}{unit} | {} |\n",
        name,
        stats.average,
        stats.median,
        stats.p90,
        stats.sample_size,
        unit = unit
    )
}

fn generate_review_velocity_section(velocity: &ReviewVelocityMetrics) -> String {
    let (mut section, ok) = block_header("Review Velocity", velocity);
    if !ok {
        return section;
    }

    section.push_str(&format!("{} PRs received at least one review.\n\n", velocity.reviewed_prs));
    section.push_str("| Measure | Average | Median | P90 | Sample |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");
    section.push_str(&distribution_row(
        "Time to first review",
        "h",
        &velocity.time_to_first_review_hours,
    ));
    section.push_str(&distribution_row(
        "Time to approval",
        "d",
        &velocity.time_to_approval_days,
    ));
    section.push('\n');

    if !velocity.reviewer_load.is_empty() {
        section.push_str("### Reviewer Load\n\n");
        section.push_str("| Reviewer | First Reviews | Share |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for load in &velocity.reviewer_load {
            section.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                load.reviewer, load.first_reviews, load.share
            ));
        }
        section.push('\n');
    }

    if velocity.bottlenecks.is_empty() {
        section.push_str("No open PRs are waiting past the bottleneck threshold.\n\n");
        return section;
    }

    section.push_str(&format!(
        "### Bottlenecks ({} total)\n\n",
        velocity.total_bottlenecks
    ));
    section.push_str("| PR | Author | Waiting | Reason |\n");
    section.push_str("|:---|:---|:---:|:---|\n");
    for b in &velocity.bottlenecks {
        section.push_str(&format!(
            "| #{} | {} | {:.1}d | {} |\n",
            b.number,
            b.author.as_deref().unwrap_or("unknown"),
            b.waiting_days,
            b.reason
        ));
    }
    section.push('\n');

    section
}

fn generate_trends_section(trends: &TemporalTrends) -> String {
    let (mut section, ok) = block_header("Trends", trends);
    if !ok {
        return section;
    }

    if let (Some(start), Some(end)) = (trends.current_window.start, trends.current_window.end) {
        section.push_str(&format!(
            "Current window: {} to {}\n\n",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ));
    }

    section.push_str("| Metric | Previous | Current | Delta | Direction |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---|\n");
    for (name, metric) in trends.metrics() {
        if metric.has_data() {
            section.push_str(&format!(
                "| {} | {:.1} | {:.1} | {:+.1} | {} |\n",
                name, metric.previous, metric.current, metric.delta, metric.direction
            ));
        } else {
            section.push_str(&format!(
                "| {} | {} | {} | - | insufficient data |\n",
                name,
                sample_cell(metric.previous, metric.previous_samples),
                sample_cell(metric.current, metric.current_samples)
            ));
        }
    }
    section.push('\n');

    section
}

fn sample_cell(value: f64, samples: u64) -> String {
    if samples == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}", value)
    }
}

fn correlation_line(name: &str, result: &CorrelationResult) -> String {
    if result.insufficient_data {
        format!(
            "- **{}:** insufficient data ({} qualifying PRs)\n",
            name, result.sample_size
        )
    } else {
        format!(
            "- **{}:** r = {:.2} ({:?}, {} PRs)\n",
            name, result.correlation, result.strength, result.sample_size
        )
    }
}

fn generate_correlations_section(correlations: &MetricCorrelations) -> String {
    let (mut section, ok) = block_header("Correlations", correlations);
    if !ok {
        return section;
    }

    section.push_str(&correlation_line(
        "PR size vs time to merge",
        &correlations.pr_size_vs_time_to_merge,
    ));
    section.push_str(&correlation_line(
        "Review count vs time to merge",
        &correlations.review_count_vs_time_to_merge,
    ));
    section.push('\n');

    if correlations.size_buckets.iter().any(|b| b.count > 0) {
        section.push_str("| Size | PRs | Avg Lines | Avg Merge Time |\n");
        section.push_str("|:---|:---:|:---:|:---:|\n");
        for b in &correlations.size_buckets {
            section.push_str(&format!(
                "| {} | {} | {:.0} | {:.1}h |\n",
                b.bucket, b.count, b.avg_size, b.avg_merge_hours
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_projections_section(projections: &Projections) -> String {
    let (mut section, ok) = block_header("Projections", projections);
    if !ok {
        return section;
    }

    for (name, p) in [
        ("Merged PRs", &projections.pr_throughput),
        ("New issues", &projections.issue_throughput),
    ] {
        section.push_str(&format!(
            "- **{} next window:** {:.0} (range {:.1} to {:.1}, {} confidence)\n",
            name, p.projected, p.lower_bound, p.upper_bound, p.confidence
        ));
    }

    let backlog = &projections.backlog_burndown;
    section.push_str(&format!(
        "- **Open backlog:** {} issues, closing {:.1} per week",
        backlog.open_backlog, backlog.weekly_close_rate
    ));
    match backlog.weeks_to_clear {
        Some(weeks) => section.push_str(&format!(", clear in {:.1} weeks\n\n", weeks)),
        None => section.push_str(", not on track to clear\n\n"),
    }

    if !backlog.projected.is_empty() {
        section.push_str("| Week | Projected | Ideal |\n");
        section.push_str("|:---:|:---:|:---:|\n");
        for (projected, ideal) in backlog.projected.iter().zip(&backlog.ideal) {
            section.push_str(&format!(
                "| {} | {:.1} | {:.1} |\n",
                projected.week, projected.remaining, ideal.remaining
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_benchmark_section(benchmark: &BenchmarkComparison) -> String {
    let mut section = String::new();

    section.push_str("## Benchmark\n\n");
    match benchmark.overall_rating {
        Some(rating) => section.push_str(&format!(
            "**Overall score:** {:.0}/100 ({})\n\n",
            benchmark.overall_score, rating
        )),
        None => section.push_str("**Overall score:** insufficient data\n\n"),
    }

    section.push_str("| Metric | Value | Median | Percentile | Rating |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---|\n");
    for m in &benchmark.metrics {
        if m.has_data {
            section.push_str(&format!(
                "| {} | {:.1} | {:.1} | p{} | {} |\n",
                m.metric, m.value, m.median, m.percentile, m.rating
            ));
        } else {
            section.push_str(&format!(
                "| {} | - | {:.1} | - | {} |\n",
                m.metric, m.median, m.rating
            ));
        }
    }
    section.push('\n');

    for (title, items) in [
        ("Strengths", &benchmark.strengths),
        ("Weaknesses", &benchmark.weaknesses),
        ("Recommendations", &benchmark.recommendations),
    ] {
        if items.is_empty() {
            continue;
        }
        section.push_str(&format!("### {}\n\n", title));
        for item in items {
            section.push_str(&format!("- {}\n", item));
        }
        section.push('\n');
    }

    section
}

fn generate_validation_section(validation: &ValidationResult) -> String {
    let mut section = String::new();

    section.push_str("## Validation\n\n");
    section.push_str(&format!(
        "{} checks run, {} skipped. Report is **{}**.\n\n",
        validation.counters.total(),
        validation.counters.skipped_checks,
        if validation.valid { "consistent" } else { "inconsistent" }
    ));

    for error in &validation.errors {
        section.push_str(&format!("- Error: {}\n", error));
    }
    for warning in &validation.warnings {
        section.push_str(&format!("- Warning: {}\n", warning));
    }
    if !validation.errors.is_empty() || !validation.warnings.is_empty() {
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by repopulse {}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    report: &'a AnalyticsReport,
    validation: &'a ValidationResult,
}

/// Generate a JSON document holding the report and its validation result.
pub fn generate_json_report(
    report: &AnalyticsReport,
    validation: &ValidationResult,
) -> Result<String> {
    serde_json::to_string_pretty(&JsonDocument { report, validation }).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
