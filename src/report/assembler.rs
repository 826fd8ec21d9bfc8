//! Merges the eight analyzer outputs into one report.

use crate::analysis::AnalyzerOutputs;
use crate::models::{AnalyticsReport, Repository};
use chrono::{DateTime, Utc};

/// Build the report aggregate. Blocks are moved in as-is, including their
/// status and errors.
pub fn assemble(
    repository: &Repository,
    generated_at: DateTime<Utc>,
    outputs: AnalyzerOutputs,
) -> AnalyticsReport {
    let AnalyzerOutputs {
        activity,
        contributors,
        labels,
        health,
        review_velocity,
        trends,
        correlations,
        projections,
    } = outputs;

    AnalyticsReport {
        repository: repository.to_string(),
        generated_at,
        activity,
        contributors,
        labels,
        health,
        review_velocity,
        trends,
        correlations,
        projections,
        benchmark: None,
        narrative: None,
    }
}
