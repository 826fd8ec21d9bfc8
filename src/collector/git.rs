//! Commit and release history from a local git checkout.
//!
//! Used in live mode: commits come from a revwalk over `HEAD`, releases from
//! the repository's tags. Annotated tags use the tagger time, lightweight
//! tags the time of the tagged commit.

use crate::error::CollectorResult;
use crate::models::{Commit, Record, Release};
use chrono::{DateTime, Utc};
use git2::{Repository, Sort, Time};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Handle on a local repository. The repository is reopened per read so the
/// handle itself can be shared across tasks.
#[derive(Debug, Clone)]
pub struct GitHistory {
    path: PathBuf,
}

impl GitHistory {
    /// Open an existing local repository.
    pub fn open(path: &Path) -> CollectorResult<Self> {
        info!("Opening local repository: {}", path.display());
        Repository::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// All commits reachable from `HEAD`, oldest first.
    pub fn commits(&self) -> CollectorResult<Vec<Record>> {
        let repo = Repository::open(&self.path)?;
        if repo.head().is_err() {
            warn!("Repository {} has no HEAD; no commits", self.path.display());
            return Ok(Vec::new());
        }

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(Sort::TIME | Sort::REVERSE)?;

        let mut records = Vec::new();
        for oid in walk {
            let commit = repo.find_commit(oid?)?;
            let author = commit.author();
            let Some(date) = to_utc(author.when()) else {
                continue;
            };
            records.push(Record::Commit(Commit {
                sha: Some(commit.id().to_string()),
                author: author.name().map(String::from),
                date,
            }));
        }

        debug!("Read {} commits from {}", records.len(), self.path.display());
        Ok(records)
    }

    /// One release per tag, in tag-name order.
    pub fn releases(&self) -> CollectorResult<Vec<Record>> {
        let repo = Repository::open(&self.path)?;
        let names = repo.tag_names(None)?;

        let mut records = Vec::new();
        for name in names.iter().flatten() {
            let object = repo.revparse_single(&format!("refs/tags/{}", name))?;
            let tagger_time = object
                .as_tag()
                .and_then(|tag| tag.tagger())
                .map(|sig| sig.when());
            let time = match tagger_time {
                Some(time) => Some(time),
                None => object.peel_to_commit().ok().map(|c| c.time()),
            };

            let Some(created_at) = time.and_then(to_utc) else {
                warn!("Skipping tag {} with no resolvable time", name);
                continue;
            };
            records.push(Record::Release(Release {
                tag_name: name.to_string(),
                created_at,
                published_at: None,
            }));
        }

        debug!("Read {} tags from {}", records.len(), self.path.display());
        Ok(records)
    }
}

fn to_utc(time: Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.seconds(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn commit(repo: &Repository, name: &str, seconds: i64) -> git2::Oid {
        let sig = Signature::new(name, "dev@example.com", &Time::new(seconds, 0)).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parents: Vec<git2::Commit> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "change", &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_reads_commits_and_tags() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        commit(&repo, "Alice", 1_709_251_200);
        let second = commit(&repo, "Bob", 1_709_337_600);

        let target = repo.find_object(second, None).unwrap();
        repo.tag_lightweight("v0.1.0", &target, false).unwrap();

        let history = GitHistory::open(temp.path()).unwrap();

        let commits = history.commits().unwrap();
        assert_eq!(commits.len(), 2);
        match &commits[0] {
            Record::Commit(c) => assert_eq!(c.author.as_deref(), Some("Alice")),
            other => panic!("unexpected record {:?}", other),
        }

        let releases = history.releases().unwrap();
        assert_eq!(releases.len(), 1);
        match &releases[0] {
            Record::Release(r) => {
                assert_eq!(r.tag_name, "v0.1.0");
                assert_eq!(r.created_at.timestamp(), 1_709_337_600);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_empty_repository_has_no_commits() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let history = GitHistory::open(temp.path()).unwrap();
        assert!(history.commits().unwrap().is_empty());
        assert!(history.releases().unwrap().is_empty());
    }

    #[test]
    fn test_open_non_repository_fails() {
        let temp = TempDir::new().unwrap();
        assert!(GitHistory::open(temp.path()).is_err());
    }
}
