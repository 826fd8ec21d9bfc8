//! Record collection.
//!
//! The engine only sees the [`RecordSource`] trait: `fetch(repository, kind,
//! mode)`. [`LocalSource`] is the concrete implementation: replay mode reads
//! an export directory, live mode reads commits and tags from a local git
//! checkout and everything else from the export.

pub mod export;
pub mod git;
pub mod normalize;

pub use export::ExportReader;
pub use git::GitHistory;

use crate::error::{CollectorError, CollectorResult};
use crate::models::{CollectionMode, Record, RecordKind, RecordSet, Repository};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// Anything that can hand over typed records for a repository.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(
        &self,
        repository: &Repository,
        kind: RecordKind,
        mode: CollectionMode,
    ) -> CollectorResult<Vec<Record>>;
}

/// Export directory and/or local git checkout.
#[derive(Debug, Clone, Default)]
pub struct LocalSource {
    export: Option<ExportReader>,
    git: Option<GitHistory>,
}

impl LocalSource {
    pub fn new(export_dir: Option<PathBuf>, git_dir: Option<PathBuf>) -> CollectorResult<Self> {
        let git = git_dir.map(|dir| GitHistory::open(&dir)).transpose()?;
        Ok(Self {
            export: export_dir.map(ExportReader::new),
            git,
        })
    }

    async fn from_export(&self, kind: RecordKind) -> CollectorResult<Vec<Record>> {
        let Some(reader) = self.export.clone() else {
            return Err(CollectorError::Unsupported {
                kind: kind.to_string(),
                mode: CollectionMode::Replay.to_string(),
            });
        };
        run_blocking(move || reader.read(kind)).await
    }

    async fn from_git(&self, git: GitHistory, kind: RecordKind) -> CollectorResult<Vec<Record>> {
        run_blocking(move || match kind {
            RecordKind::Commits => git.commits(),
            RecordKind::Releases => git.releases(),
            _ => Ok(Vec::new()),
        })
        .await
    }
}

#[async_trait]
impl RecordSource for LocalSource {
    async fn fetch(
        &self,
        repository: &Repository,
        kind: RecordKind,
        mode: CollectionMode,
    ) -> CollectorResult<Vec<Record>> {
        match (mode, kind, &self.git) {
            (CollectionMode::Live, RecordKind::Commits | RecordKind::Releases, Some(git)) => {
                self.from_git(git.clone(), kind).await
            }
            (CollectionMode::Live, _, _) if self.export.is_none() => {
                // Hosted PR/issue data is never polled; without an export there is none
                warn!("No export configured for {} {}; using none", repository, kind);
                Ok(Vec::new())
            }
            _ => self.from_export(kind).await,
        }
    }
}

async fn run_blocking<F>(f: F) -> CollectorResult<Vec<Record>>
where
    F: FnOnce() -> CollectorResult<Vec<Record>> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .unwrap_or_else(|e| {
            Err(CollectorError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(e.to_string()),
            })
        })
}

/// Fetch all four record kinds concurrently into one record set.
pub async fn collect_all(
    source: &dyn RecordSource,
    repository: &Repository,
    mode: CollectionMode,
) -> CollectorResult<RecordSet> {
    let (prs, issues, commits, releases) = futures::try_join!(
        source.fetch(repository, RecordKind::PullRequests, mode),
        source.fetch(repository, RecordKind::Issues, mode),
        source.fetch(repository, RecordKind::Commits, mode),
        source.fetch(repository, RecordKind::Releases, mode),
    )?;

    let set = RecordSet::from_records(
        prs.into_iter()
            .chain(issues)
            .chain(commits)
            .chain(releases),
    );

    info!(
        "Collected {} PRs, {} issues, {} commits, {} releases for {} ({} mode)",
        set.pull_requests.len(),
        set.issues.len(),
        set.commits.len(),
        set.releases.len(),
        repository,
        mode
    );

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Commit;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    /// Source that returns one commit per request and records nothing else.
    struct OneCommitSource;

    #[async_trait]
    impl RecordSource for OneCommitSource {
        async fn fetch(
            &self,
            _repository: &Repository,
            kind: RecordKind,
            _mode: CollectionMode,
        ) -> CollectorResult<Vec<Record>> {
            Ok(match kind {
                RecordKind::Commits => vec![Record::Commit(Commit {
                    sha: None,
                    author: Some("alice".to_string()),
                    date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                })],
                _ => Vec::new(),
            })
        }
    }

    #[test]
    fn test_collect_all_sorts_records_by_kind() {
        let repo = Repository::new("acme", "widgets");
        let set = tokio_test::block_on(collect_all(
            &OneCommitSource,
            &repo,
            CollectionMode::Replay,
        ))
        .unwrap();
        assert_eq!(set.commits.len(), 1);
        assert!(set.pull_requests.is_empty());
    }

    #[tokio::test]
    async fn test_replay_reads_export() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("pull_requests.json"),
            r#"[{"number": 1, "state": "open", "created_at": "2024-03-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let source = LocalSource::new(Some(temp.path().to_path_buf()), None).unwrap();
        let repo = Repository::new("acme", "widgets");
        let set = collect_all(&source, &repo, CollectionMode::Replay)
            .await
            .unwrap();
        assert_eq!(set.pull_requests.len(), 1);
        assert!(set.issues.is_empty());
    }

    #[tokio::test]
    async fn test_replay_without_export_fails() {
        let source = LocalSource::default();
        let repo = Repository::new("acme", "widgets");
        let result = collect_all(&source, &repo, CollectionMode::Replay).await;
        assert!(matches!(result, Err(CollectorError::Unsupported { .. })));
    }

    #[tokio::test]
    async fn test_live_without_sources_is_empty() {
        let source = LocalSource::default();
        let repo = Repository::new("acme", "widgets");
        let set = collect_all(&source, &repo, CollectionMode::Live)
            .await
            .unwrap();
        assert!(set.is_empty());
    }
}
