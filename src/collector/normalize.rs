//! Record normalization.
//!
//! Exports come in loosely-shaped JSON: snake_case or camelCase keys, authors
//! as plain strings or `{login}` objects, labels as strings or `{name}`
//! objects, lists as arrays or `{nodes: [...]}` connections. Each kind is
//! read into a raw shape first and then converted into the typed record, so
//! no analyzer ever inspects raw JSON.

use crate::error::NormalizeError;
use crate::models::{
    Commit, Issue, ItemState, PullRequest, Record, RecordKind, Release, Review, ReviewState,
};
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

/// Normalize one exported entry into a record of `kind`.
pub fn normalize(kind: RecordKind, raw: &Value) -> Result<Record, NormalizeError> {
    let record = match kind {
        RecordKind::PullRequests => {
            Record::PullRequest(RawPullRequest::deserialize(raw)?.try_into()?)
        }
        RecordKind::Issues => Record::Issue(RawIssue::deserialize(raw)?.try_into()?),
        RecordKind::Commits => Record::Commit(RawCommit::deserialize(raw)?.try_into()?),
        RecordKind::Releases => Record::Release(RawRelease::deserialize(raw)?.try_into()?),
    };
    Ok(record)
}

// ── Raw shapes ─────────────────────────────────────────────────

/// A person as a bare login or an account object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawActor {
    Login(String),
    Account {
        login: Option<String>,
        name: Option<String>,
        email: Option<String>,
    },
    Other(IgnoredAny),
}

impl RawActor {
    fn into_name(self) -> Option<String> {
        match self {
            RawActor::Login(login) => clean(Some(login)),
            RawActor::Account { login, name, email } => {
                clean(login).or_else(|| clean(name)).or_else(|| clean(email))
            }
            RawActor::Other(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLabel {
    Name(String),
    Object { name: Option<String> },
    Other(IgnoredAny),
}

impl RawLabel {
    fn into_name(self) -> Option<String> {
        match self {
            RawLabel::Name(name) => clean(Some(name)),
            RawLabel::Object { name } => clean(name),
            RawLabel::Other(_) => None,
        }
    }
}

/// A list as a plain array or a GraphQL-style `{nodes: [...]}` connection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    Items(Vec<T>),
    Nodes { nodes: Vec<T> },
    Other(IgnoredAny),
}

impl<T> RawList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            RawList::Items(items) | RawList::Nodes { nodes: items } => items,
            RawList::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    state: Option<String>,
    merged: Option<bool>,
    author: Option<RawActor>,
    user: Option<RawActor>,
    #[serde(alias = "createdAt")]
    created_at: Option<String>,
    #[serde(alias = "closedAt")]
    closed_at: Option<String>,
    #[serde(alias = "mergedAt")]
    merged_at: Option<String>,
    labels: Option<RawList<RawLabel>>,
    additions: Option<u64>,
    deletions: Option<u64>,
    reviews: Option<RawList<RawReview>>,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    state: Option<String>,
    reviewer: Option<RawActor>,
    user: Option<RawActor>,
    author: Option<RawActor>,
    #[serde(alias = "submittedAt")]
    submitted_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: Option<u64>,
    state: Option<String>,
    author: Option<RawActor>,
    user: Option<RawActor>,
    #[serde(alias = "createdAt")]
    created_at: Option<String>,
    #[serde(alias = "closedAt")]
    closed_at: Option<String>,
    labels: Option<RawList<RawLabel>>,
    #[serde(alias = "pullRequest")]
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    #[serde(alias = "oid", alias = "id")]
    sha: Option<String>,
    author: Option<RawActor>,
    login: Option<String>,
    author_name: Option<String>,
    #[serde(alias = "authored_date", alias = "authoredDate")]
    date: Option<String>,
    #[serde(alias = "committedDate")]
    committed_date: Option<String>,
    commit: Option<RawCommitDetail>,
}

/// The nested git data in REST commit listings.
#[derive(Debug, Deserialize)]
struct RawCommitDetail {
    author: Option<RawSignature>,
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    name: Option<String>,
    email: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    #[serde(alias = "tagName", alias = "tag")]
    tag_name: Option<String>,
    name: Option<String>,
    #[serde(alias = "createdAt")]
    created_at: Option<String>,
    #[serde(alias = "publishedAt")]
    published_at: Option<String>,
}

// ── Conversions ────────────────────────────────────────────────

impl TryFrom<RawPullRequest> for PullRequest {
    type Error = NormalizeError;

    fn try_from(raw: RawPullRequest) -> Result<Self, Self::Error> {
        let number = raw.number.ok_or(NormalizeError::Missing("number"))?;
        let created_at = parse_time(raw.created_at).ok_or(NormalizeError::Missing("created_at"))?;
        let closed_at = parse_time(raw.closed_at);

        let state_str = raw.state.unwrap_or_default().to_lowercase();
        let merged_flag = raw.merged.unwrap_or(false) || state_str == "merged";
        let merged_at = parse_time(raw.merged_at).or(if merged_flag { closed_at } else { None });

        let resolved = merged_at.is_some() || closed_at.is_some();
        let state = if resolved || state_str == "closed" || state_str == "merged" {
            ItemState::Closed
        } else {
            ItemState::Open
        };

        let reviews = raw
            .reviews
            .map(RawList::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(review)
            .collect();

        Ok(PullRequest {
            number,
            author: first_actor([raw.author, raw.user]),
            state,
            created_at,
            closed_at,
            merged_at,
            labels: labels(raw.labels),
            additions: raw.additions,
            deletions: raw.deletions,
            reviews,
        })
    }
}

/// Reviews without a state carry no signal and are dropped.
fn review(raw: RawReview) -> Option<Review> {
    let state = clean(raw.state)?;
    Some(Review {
        reviewer: first_actor([raw.reviewer, raw.user, raw.author]),
        state: ReviewState::from(state.as_str()),
        submitted_at: parse_time(raw.submitted_at),
    })
}

impl TryFrom<RawIssue> for Issue {
    type Error = NormalizeError;

    fn try_from(raw: RawIssue) -> Result<Self, Self::Error> {
        // The issues API also lists pull requests
        if raw.pull_request.is_some() {
            return Err(NormalizeError::PullRequestAsIssue);
        }

        let number = raw.number.ok_or(NormalizeError::Missing("number"))?;
        let created_at = parse_time(raw.created_at).ok_or(NormalizeError::Missing("created_at"))?;
        let closed_at = parse_time(raw.closed_at);
        let closed_state = raw.state.is_some_and(|s| s.eq_ignore_ascii_case("closed"));
        let state = if closed_state || closed_at.is_some() {
            ItemState::Closed
        } else {
            ItemState::Open
        };

        Ok(Issue {
            number,
            author: first_actor([raw.author, raw.user]),
            state,
            created_at,
            closed_at,
            labels: labels(raw.labels),
        })
    }
}

impl TryFrom<RawCommit> for Commit {
    type Error = NormalizeError;

    fn try_from(raw: RawCommit) -> Result<Self, Self::Error> {
        let (nested_author, nested_date) = match raw.commit.and_then(|c| c.author) {
            Some(sig) => (clean(sig.name).or_else(|| clean(sig.email)), sig.date),
            None => (None, None),
        };

        let date = parse_time(raw.date)
            .or_else(|| parse_time(raw.committed_date))
            .or_else(|| parse_time(nested_date))
            .ok_or(NormalizeError::Missing("date"))?;

        let author = first_actor([raw.author])
            .or_else(|| clean(raw.login))
            .or_else(|| clean(raw.author_name))
            .or(nested_author);

        Ok(Commit {
            sha: clean(raw.sha),
            author,
            date,
        })
    }
}

impl TryFrom<RawRelease> for Release {
    type Error = NormalizeError;

    fn try_from(raw: RawRelease) -> Result<Self, Self::Error> {
        let tag_name = clean(raw.tag_name)
            .or_else(|| clean(raw.name))
            .ok_or(NormalizeError::Missing("tag_name"))?;
        let published_at = parse_time(raw.published_at);
        let created_at = parse_time(raw.created_at)
            .or(published_at)
            .ok_or(NormalizeError::Missing("created_at"))?;

        Ok(Release {
            tag_name,
            created_at,
            published_at,
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn first_actor<const N: usize>(candidates: [Option<RawActor>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find_map(RawActor::into_name)
}

/// Label names, de-duplicated in first-seen order.
fn labels(raw: Option<RawList<RawLabel>>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw
        .map(RawList::into_vec)
        .unwrap_or_default()
        .into_iter()
        .filter_map(RawLabel::into_name)
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
