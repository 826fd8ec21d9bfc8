//! Label usage across pull requests and issues.

use super::aggregator::Tally;
use super::stats::percentage;
use super::{AnalysisContext, Analyzer};
use crate::error::AnalysisResult;
use crate::models::{CategoryCounts, LabelCategory, LabelCount, LabelMetrics, RecordSet};

pub struct LabelAnalyzer;

impl Analyzer for LabelAnalyzer {
    type Output = LabelMetrics;

    fn compute(&self, records: &RecordSet, _ctx: &AnalysisContext) -> AnalysisResult<LabelMetrics> {
        let mut tally = Tally::new();
        let mut categories = CategoryCounts::default();

        let label_sets = records
            .pull_requests
            .iter()
            .map(|pr| &pr.labels)
            .chain(records.issues.iter().map(|i| &i.labels));

        for labels in label_sets {
            for label in labels {
                tally.increment(label);
                match LabelCategory::classify(label) {
                    LabelCategory::Bug => categories.bug += 1,
                    LabelCategory::Feature => categories.feature += 1,
                    LabelCategory::Documentation => categories.documentation += 1,
                    LabelCategory::Other => categories.other += 1,
                }
            }
        }

        let applications = tally.total();
        let distribution = tally
            .ranked()
            .into_iter()
            .map(|(label, count)| LabelCount {
                label,
                count,
                percentage: percentage(count, applications),
            })
            .collect();

        let unlabeled_prs = records
            .pull_requests
            .iter()
            .filter(|pr| pr.labels.is_empty())
            .count() as u64;
        let unlabeled_issues = records.issues.iter().filter(|i| i.labels.is_empty()).count() as u64;
        let total_items = (records.pull_requests.len() + records.issues.len()) as u64;
        let labeled_items = total_items - unlabeled_prs - unlabeled_issues;

        Ok(LabelMetrics {
            total_prs: records.pull_requests.len() as u64,
            total_issues: records.issues.len() as u64,
            labeled_items,
            unlabeled_prs,
            unlabeled_issues,
            label_coverage: percentage(labeled_items, total_items),
            distribution,
            categories,
            ..Default::default()
        })
    }
}
