//! Normalized repository activity records.
//!
//! These are the explicit, typed shapes every analyzer works against. Raw
//! export data is converted into them once, at the collector boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `{owner, name}` repository identity, used only as a label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` identifier.
    pub fn parse(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim().trim_end_matches(".git");
        let identifier = identifier
            .strip_prefix("https://github.com/")
            .or_else(|| identifier.strip_prefix("git@github.com:"))
            .unwrap_or(identifier);

        let mut parts = identifier.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Some(Self::new(owner, name)),
            _ => None,
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The kind of record requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    PullRequests,
    Issues,
    Commits,
    Releases,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::PullRequests,
        RecordKind::Issues,
        RecordKind::Commits,
        RecordKind::Releases,
    ];

    /// File and directory stem used in export directories.
    pub fn export_stem(&self) -> &'static str {
        match self {
            RecordKind::PullRequests => "pull_requests",
            RecordKind::Issues => "issues",
            RecordKind::Commits => "commits",
            RecordKind::Releases => "releases",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.export_stem().replace('_', " "))
    }
}

/// Whether records are sourced live or replayed from a prior export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    Live,
    #[default]
    Replay,
}

impl fmt::Display for CollectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionMode::Live => write!(f, "live"),
            CollectionMode::Replay => write!(f, "replay"),
        }
    }
}

/// Open/closed state shared by pull requests and issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

/// Review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl From<&str> for ReviewState {
    fn from(s: &str) -> Self {
        match s.to_lowercase().replace(' ', "_").as_str() {
            "approved" => ReviewState::Approved,
            "changes_requested" => ReviewState::ChangesRequested,
            "dismissed" => ReviewState::Dismissed,
            "pending" => ReviewState::Pending,
            _ => ReviewState::Commented,
        }
    }
}

/// A single review event on a pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub reviewer: Option<String>,
    pub state: ReviewState,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub author: Option<String>,
    pub state: ItemState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub reviews: Vec<Review>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.state == ItemState::Open && !self.is_merged()
    }

    /// Closed without being merged.
    pub fn is_closed_unmerged(&self) -> bool {
        !self.is_merged() && (self.state == ItemState::Closed || self.closed_at.is_some())
    }

    /// Lines changed, when both counts are known.
    pub fn size(&self) -> Option<u64> {
        Some(self.additions? + self.deletions?)
    }

    pub fn hours_to_merge(&self) -> Option<f64> {
        self.merged_at.map(|m| hours_between(self.created_at, m))
    }

    /// Earliest submitted review, ignoring pending drafts.
    pub fn first_review(&self) -> Option<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.state != ReviewState::Pending && r.submitted_at.is_some())
            .min_by_key(|r| r.submitted_at)
    }

    pub fn first_approval(&self) -> Option<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.state == ReviewState::Approved && r.submitted_at.is_some())
            .min_by_key(|r| r.submitted_at)
    }

    /// Most recent approving or change-requesting review.
    pub fn latest_verdict(&self) -> Option<ReviewState> {
        self.reviews
            .iter()
            .filter(|r| {
                matches!(
                    r.state,
                    ReviewState::Approved | ReviewState::ChangesRequested
                )
            })
            .max_by_key(|r| r.submitted_at)
            .map(|r| r.state)
    }

    /// Timestamp at which the pull request stopped being open, if it did.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at.or(self.closed_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub author: Option<String>,
    pub state: ItemState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub labels: Vec<String>,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.state == ItemState::Open && self.closed_at.is_none()
    }

    pub fn hours_to_close(&self) -> Option<f64> {
        self.closed_at.map(|c| hours_between(self.created_at, c))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: Option<String>,
    pub author: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Publication time, falling back to creation.
    pub fn released_at(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// A tagged record as returned by a source.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    PullRequest(PullRequest),
    Issue(Issue),
    Commit(Commit),
    Release(Release),
}

/// Immutable input set for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub pull_requests: Vec<PullRequest>,
    pub issues: Vec<Issue>,
    pub commits: Vec<Commit>,
    pub releases: Vec<Release>,
}

impl RecordSet {
    /// Build a set from tagged records, preserving their order.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut set = Self::default();
        for record in records {
            match record {
                Record::PullRequest(pr) => set.pull_requests.push(pr),
                Record::Issue(issue) => set.issues.push(issue),
                Record::Commit(commit) => set.commits.push(commit),
                Record::Release(release) => set.releases.push(release),
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.pull_requests.is_empty()
            && self.issues.is_empty()
            && self.commits.is_empty()
            && self.releases.is_empty()
    }

    pub fn total(&self) -> usize {
        self.pull_requests.len() + self.issues.len() + self.commits.len() + self.releases.len()
    }
}

/// Fractional hours from `start` to `end`.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}
