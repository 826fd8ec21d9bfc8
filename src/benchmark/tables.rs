//! Frozen reference percentiles for open-source repositories.

use crate::models::{BenchmarkMetric, Rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Five-point reference distribution for one metric.
///
/// `p10` is the value at the 10th percentile of repositories ranked from
/// worst to best, so for lower-is-better metrics the numbers decrease.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub metric: BenchmarkMetric,
    pub direction: Direction,
    pub weight: f64,
    pub unit: &'static str,
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

pub const REFERENCE_TABLE: [Reference; 6] = [
    Reference {
        metric: BenchmarkMetric::MergeRate,
        direction: Direction::HigherIsBetter,
        weight: 0.20,
        unit: "%",
        p10: 40.0,
        p25: 55.0,
        p50: 70.0,
        p75: 82.0,
        p90: 92.0,
    },
    Reference {
        metric: BenchmarkMetric::TimeToFirstReview,
        direction: Direction::LowerIsBetter,
        weight: 0.20,
        unit: "h",
        p10: 96.0,
        p25: 48.0,
        p50: 24.0,
        p75: 6.0,
        p90: 2.0,
    },
    Reference {
        metric: BenchmarkMetric::ReviewCoverage,
        direction: Direction::HigherIsBetter,
        weight: 0.15,
        unit: "%",
        p10: 30.0,
        p25: 50.0,
        p50: 70.0,
        p75: 85.0,
        p90: 95.0,
    },
    Reference {
        metric: BenchmarkMetric::BusFactor,
        direction: Direction::HigherIsBetter,
        weight: 0.15,
        unit: "",
        p10: 1.0,
        p25: 1.0,
        p50: 2.0,
        p75: 3.0,
        p90: 5.0,
    },
    Reference {
        metric: BenchmarkMetric::IssueResolutionDays,
        direction: Direction::LowerIsBetter,
        weight: 0.15,
        unit: " days",
        p10: 45.0,
        p25: 21.0,
        p50: 7.0,
        p75: 3.0,
        p90: 1.0,
    },
    Reference {
        metric: BenchmarkMetric::DeploymentsPerMonth,
        direction: Direction::HigherIsBetter,
        weight: 0.15,
        unit: "/month",
        p10: 0.25,
        p25: 0.5,
        p50: 1.0,
        p75: 2.0,
        p90: 4.0,
    },
];

/// Percentile bucket assigned to values with no usable data.
pub const NO_DATA_PERCENTILE: u32 = 5;

impl Reference {
    /// Map a value to one of the buckets {95, 80, 60, 35, 15, 5}.
    pub fn percentile(&self, value: f64) -> u32 {
        let cutoffs = [
            (self.p90, 95),
            (self.p75, 80),
            (self.p50, 60),
            (self.p25, 35),
            (self.p10, 15),
        ];
        let beats = |threshold: f64| match self.direction {
            Direction::HigherIsBetter => value >= threshold,
            Direction::LowerIsBetter => value <= threshold,
        };

        cutoffs
            .iter()
            .find(|(threshold, _)| beats(*threshold))
            .map(|(_, bucket)| *bucket)
            .unwrap_or(NO_DATA_PERCENTILE)
    }
}

pub fn rating_for(percentile: f64) -> Rating {
    if percentile >= 90.0 {
        Rating::Excellent
    } else if percentile >= 75.0 {
        Rating::Good
    } else if percentile >= 50.0 {
        Rating::Average
    } else if percentile >= 25.0 {
        Rating::BelowAverage
    } else {
        Rating::Poor
    }
}

pub fn reference(metric: BenchmarkMetric) -> &'static Reference {
    REFERENCE_TABLE
        .iter()
        .find(|r| r.metric == metric)
        .unwrap_or(&REFERENCE_TABLE[0])
}
