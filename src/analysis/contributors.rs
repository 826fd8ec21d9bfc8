//! Contributor ranking and the bus factor heuristic.

use super::stats::percentage;
use super::{AnalysisContext, Analyzer};
use crate::config::BusFactorConfig;
use crate::error::AnalysisResult;
use crate::models::{ContributorMetrics, ContributorStats, RecordSet};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

pub struct ContributorAnalyzer;

/// Per-login contribution counts in first-seen order.
#[derive(Default)]
struct Ledger {
    index: HashMap<String, usize>,
    stats: Vec<ContributorStats>,
    first_seen: Vec<DateTime<Utc>>,
}

impl Ledger {
    fn entry(&mut self, login: &str, at: DateTime<Utc>) -> &mut ContributorStats {
        let i = match self.index.get(login) {
            Some(&i) => {
                if at < self.first_seen[i] {
                    self.first_seen[i] = at;
                }
                i
            }
            None => {
                self.index.insert(login.to_string(), self.stats.len());
                self.stats.push(ContributorStats {
                    login: login.to_string(),
                    ..Default::default()
                });
                self.first_seen.push(at);
                self.stats.len() - 1
            }
        };
        &mut self.stats[i]
    }
}

impl Analyzer for ContributorAnalyzer {
    type Output = ContributorMetrics;

    fn compute(
        &self,
        records: &RecordSet,
        ctx: &AnalysisContext,
    ) -> AnalysisResult<ContributorMetrics> {
        let window = ctx.current_window();
        let mut ledger = Ledger::default();
        let mut active: HashSet<String> = HashSet::new();

        for commit in &records.commits {
            if let Some(ref login) = commit.author {
                ledger.entry(login, commit.date).commits += 1;
                if window.contains(commit.date) {
                    active.insert(login.clone());
                }
            }
        }

        for pr in &records.pull_requests {
            if let Some(ref login) = pr.author {
                ledger.entry(login, pr.created_at).pull_requests += 1;
                if window.contains(pr.created_at) {
                    active.insert(login.clone());
                }
            }
        }

        for pr in &records.pull_requests {
            for review in &pr.reviews {
                if let Some(ref login) = review.reviewer {
                    let at = review.submitted_at.unwrap_or(pr.created_at);
                    ledger.entry(login, at).reviews += 1;
                    if window.contains_opt(review.submitted_at) {
                        active.insert(login.clone());
                    }
                }
            }
        }

        let first_time_contributors =
            ledger.first_seen.iter().filter(|t| window.contains(**t)).count() as u64;

        let mut ranked = ledger.stats;
        for stats in &mut ranked {
            stats.total = stats.commits + stats.pull_requests + stats.reviews;
        }
        ranked.sort_by_key(|s| std::cmp::Reverse(s.total));

        let totals: Vec<u64> = ranked.iter().map(|s| s.total).collect();
        let total_contributions: u64 = totals.iter().sum();
        let top_two: u64 = totals.iter().take(2).sum();

        let mut top_contributors = ranked;
        let total_contributors = top_contributors.len() as u64;
        top_contributors.truncate(ctx.thresholds.analysis.top_contributors);

        Ok(ContributorMetrics {
            total_contributors,
            active_contributors: active.len() as u64,
            first_time_contributors,
            top_contributors,
            total_contributions,
            top_two_share: percentage(top_two, total_contributions),
            bus_factor: bus_factor(&totals, &ctx.thresholds.bus_factor),
            ..Default::default()
        })
    }
}

/// Bus factor from contribution totals sorted descending.
///
/// If the top two hold more than `concentration_pct` of everything, the
/// project is concentrated and gets `critical_value`. Otherwise the factor is
/// the contributor count, capped.
pub fn bus_factor(sorted_totals: &[u64], config: &BusFactorConfig) -> u32 {
    let total: u64 = sorted_totals.iter().sum();
    if total == 0 {
        return 0;
    }

    let top_two: u64 = sorted_totals.iter().take(2).sum();
    if percentage(top_two, total) > config.concentration_pct {
        config.critical_value
    } else {
        (sorted_totals.len() as u32).min(config.cap)
    }
}
