//! Forward projections from the most recent window.
//!
//! Throughput uses a Poisson-style band of `count ± sqrt(count)`. The
//! backlog burndown decays linearly at the recent closing rate and is paired
//! with an ideal straight line to zero.

use super::stats::{finite_or_zero, safe_div};
use super::{AnalysisContext, Analyzer};
use crate::error::AnalysisResult;
use crate::models::{
    BacklogProjection, BurndownPoint, Confidence, Projections, RecordSet, ThroughputProjection,
};

pub struct ProjectionAnalyzer;

impl Analyzer for ProjectionAnalyzer {
    type Output = Projections;

    fn compute(&self, records: &RecordSet, ctx: &AnalysisContext) -> AnalysisResult<Projections> {
        let window = ctx.current_window();
        let config = &ctx.thresholds.analysis;

        let merged = records
            .pull_requests
            .iter()
            .filter(|pr| window.contains_opt(pr.merged_at))
            .count() as u64;
        let opened_issues = records
            .issues
            .iter()
            .filter(|i| window.contains(i.created_at))
            .count() as u64;
        let closed_issues = records
            .issues
            .iter()
            .filter(|i| window.contains_opt(i.closed_at))
            .count() as u64;
        let open_backlog = records.issues.iter().filter(|i| i.is_open()).count() as u64;

        let weekly_close_rate = safe_div(closed_issues as f64 * 7.0, config.window_days as f64);

        Ok(Projections {
            pr_throughput: throughput(merged),
            issue_throughput: throughput(opened_issues),
            backlog_burndown: burndown(open_backlog, weekly_close_rate, config.burndown_weeks),
            ..Default::default()
        })
    }
}

/// Next-window estimate from the last window's event count.
pub fn throughput(count: u64) -> ThroughputProjection {
    let projected = count as f64;
    let spread = projected.sqrt();
    ThroughputProjection {
        last_window: count,
        projected,
        lower_bound: (projected - spread).max(0.0),
        upper_bound: projected + spread,
        confidence: confidence(count),
    }
}

pub fn confidence(events: u64) -> Confidence {
    if events > 10 {
        Confidence::High
    } else if events > 5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Weekly projected and ideal remaining backlog for weeks `0..=weeks`.
pub fn burndown(open_backlog: u64, weekly_close_rate: f64, weeks: u32) -> BacklogProjection {
    let backlog = open_backlog as f64;
    let weeks = weeks.max(1);

    let projected = (0..=weeks)
        .map(|week| BurndownPoint {
            week,
            remaining: (backlog - weekly_close_rate * week as f64).max(0.0),
        })
        .collect();
    let ideal = (0..=weeks)
        .map(|week| BurndownPoint {
            week,
            remaining: finite_or_zero(backlog * (1.0 - week as f64 / weeks as f64)),
        })
        .collect();

    let weeks_to_clear = if open_backlog == 0 {
        Some(0.0)
    } else if weekly_close_rate > 0.0 {
        Some(backlog / weekly_close_rate)
    } else {
        None
    };

    BacklogProjection {
        open_backlog,
        weekly_close_rate,
        weeks_to_clear,
        projected,
        ideal,
    }
}
