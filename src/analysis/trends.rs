//! Current vs. previous window comparison of four delivery metrics.
//!
//! Merge rate and active contributors improve upward; time to review and
//! issue resolution time improve downward.

use super::stats::{mean, percentage};
use super::{AnalysisContext, Analyzer, Window};
use crate::error::AnalysisResult;
use crate::models::{
    hours_between, RecordSet, TemporalTrends, TrendDirection, TrendMetric, TrendWindow,
};
use std::collections::HashSet;

pub struct TemporalTrendAnalyzer;

/// Which way a metric has to move to count as an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Analyzer for TemporalTrendAnalyzer {
    type Output = TemporalTrends;

    fn compute(&self, records: &RecordSet, ctx: &AnalysisContext) -> AnalysisResult<TemporalTrends> {
        let current = ctx.current_window();
        let previous = ctx.previous_window();
        let deadbands = &ctx.thresholds.trends;

        Ok(TemporalTrends {
            current_window: to_trend_window(current),
            previous_window: to_trend_window(previous),
            pr_merge_rate: trend(
                merge_rate(records, current),
                merge_rate(records, previous),
                deadbands.merge_rate_deadband,
                Polarity::HigherIsBetter,
            ),
            time_to_review: trend(
                time_to_review(records, current),
                time_to_review(records, previous),
                deadbands.review_time_deadband_hours,
                Polarity::LowerIsBetter,
            ),
            active_contributors: trend(
                active_contributors(records, current),
                active_contributors(records, previous),
                deadbands.contributors_deadband,
                Polarity::HigherIsBetter,
            ),
            issue_resolution: trend(
                issue_resolution(records, current),
                issue_resolution(records, previous),
                deadbands.resolution_deadband_hours,
                Polarity::LowerIsBetter,
            ),
            ..Default::default()
        })
    }
}

/// A per-window measurement and how many observations produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub count: u64,
}

impl Sample {
    pub fn new(value: f64, count: u64) -> Self {
        Self { value, count }
    }
}

/// Build a trend metric with `delta = current - previous`.
///
/// A window without observations makes the comparison meaningless, so the
/// metric is flagged and classified stable.
pub fn trend(current: Sample, previous: Sample, deadband: f64, polarity: Polarity) -> TrendMetric {
    let delta = current.value - previous.value;
    let insufficient_data = current.count == 0 || previous.count == 0;
    let direction = if insufficient_data {
        TrendDirection::Stable
    } else {
        classify(delta, deadband, polarity)
    };

    TrendMetric {
        current: current.value,
        previous: previous.value,
        delta,
        direction,
        current_samples: current.count,
        previous_samples: previous.count,
        insufficient_data,
    }
}

/// Direction of a delta; anything within the deadband is stable.
pub fn classify(delta: f64, deadband: f64, polarity: Polarity) -> TrendDirection {
    if !delta.is_finite() || delta.abs() <= deadband {
        return TrendDirection::Stable;
    }
    let rising = delta > 0.0;
    match (polarity, rising) {
        (Polarity::HigherIsBetter, true) | (Polarity::LowerIsBetter, false) => {
            TrendDirection::Improving
        }
        _ => TrendDirection::Declining,
    }
}

fn to_trend_window(window: Window) -> TrendWindow {
    TrendWindow {
        start: Some(window.start),
        end: Some(window.end),
    }
}

/// Merge rate over PRs resolved inside the window.
fn merge_rate(records: &RecordSet, window: Window) -> Sample {
    let merged = records
        .pull_requests
        .iter()
        .filter(|pr| window.contains_opt(pr.merged_at))
        .count() as u64;
    let closed = records
        .pull_requests
        .iter()
        .filter(|pr| pr.is_closed_unmerged() && window.contains_opt(pr.closed_at))
        .count() as u64;
    Sample::new(percentage(merged, merged + closed), merged + closed)
}

/// Mean hours to first review over first reviews submitted in the window.
fn time_to_review(records: &RecordSet, window: Window) -> Sample {
    let hours: Vec<f64> = records
        .pull_requests
        .iter()
        .filter_map(|pr| {
            let at = pr.first_review()?.submitted_at?;
            window
                .contains(at)
                .then(|| hours_between(pr.created_at, at))
        })
        .filter(|h| *h >= 0.0)
        .collect();
    Sample::new(mean(&hours), hours.len() as u64)
}

/// Distinct people who committed, opened a PR or reviewed in the window.
///
/// The sample count is the number of contributions seen, so a window with
/// no activity at all has no data rather than zero contributors.
fn active_contributors(records: &RecordSet, window: Window) -> Sample {
    let mut people: HashSet<&str> = HashSet::new();
    let mut events = 0u64;

    for commit in &records.commits {
        if let Some(ref author) = commit.author {
            if window.contains(commit.date) {
                people.insert(author);
                events += 1;
            }
        }
    }
    for pr in &records.pull_requests {
        if let Some(ref author) = pr.author {
            if window.contains(pr.created_at) {
                people.insert(author);
                events += 1;
            }
        }
        for review in &pr.reviews {
            if let Some(ref reviewer) = review.reviewer {
                if window.contains_opt(review.submitted_at) {
                    people.insert(reviewer);
                    events += 1;
                }
            }
        }
    }

    Sample::new(people.len() as f64, events)
}

/// Mean hours to close over issues closed in the window.
fn issue_resolution(records: &RecordSet, window: Window) -> Sample {
    let hours: Vec<f64> = records
        .issues
        .iter()
        .filter(|i| window.contains_opt(i.closed_at))
        .filter_map(|i| i.hours_to_close())
        .filter(|h| *h >= 0.0)
        .collect();
    Sample::new(mean(&hours), hours.len() as u64)
}
