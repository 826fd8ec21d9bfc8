//! Error types for record collection and analysis.
//!
//! Collector errors are the only failures allowed to abort a run. Analysis
//! errors never escape an analyzer: they are folded into the metric block's
//! `errors` list by [`crate::analysis::Analyzer::analyze`].

use std::path::PathBuf;
use thiserror::Error;

/// Failure while fetching records from a source.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Export directory does not exist: {}", .0.display())]
    MissingExport(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("No source configured for {kind} in {mode} mode")]
    Unsupported { kind: String, mode: String },
}

/// Why one exported entry could not become a record. Entries that fail
/// are skipped; this never aborts collection.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("missing or unparseable {0}")]
    Missing(&'static str),

    #[error("entry is a pull request listed as an issue")]
    PullRequestAsIssue,
}

/// Failure inside a single analyzer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Non-finite value for {0}")]
    NonFinite(&'static str),

    #[error("Analyzer task failed: {0}")]
    Task(String),
}

pub type CollectorResult<T> = std::result::Result<T, CollectorError>;

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
