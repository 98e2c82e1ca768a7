use anyhow::Result;
use tracing::info;

use crate::git::GitOps;
use crate::hosting::HostingProvider;
use crate::params::{MAIN_BRANCH, RepositoryTarget};

pub const REMOTE_NAME: &str = "origin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginStatus {
    Existing(String),
    Added(String),
}

impl OriginStatus {
    pub fn url(&self) -> &str {
        match self {
            Self::Existing(url) | Self::Added(url) => url,
        }
    }
}

pub fn resolve_remote_url(
    target: &RepositoryTarget,
    hosting: &dyn HostingProvider,
) -> Result<String> {
    match target {
        RepositoryTarget::Url(url) => Ok(url.clone()),
        RepositoryTarget::Name(name) => hosting.repository_url(name),
    }
}

/// Makes sure `origin` is configured, resolving and adding it when absent.
pub fn ensure_origin(
    git: &GitOps,
    target: &RepositoryTarget,
    hosting: &dyn HostingProvider,
) -> Result<OriginStatus> {
    if let Some(url) = git.remote_url(REMOTE_NAME)? {
        return Ok(OriginStatus::Existing(url));
    }

    let url = resolve_remote_url(target, hosting)?;
    git.add_remote(REMOTE_NAME, &url)?;
    info!(remote = REMOTE_NAME, url = %url, "added remote");
    Ok(OriginStatus::Added(url))
}

/// Links `origin`, moves history onto [`MAIN_BRANCH`] and pushes it upstream.
pub fn publish(
    git: &GitOps,
    target: &RepositoryTarget,
    hosting: &dyn HostingProvider,
) -> Result<OriginStatus> {
    let origin = ensure_origin(git, target, hosting)?;
    git.rename_current_branch(MAIN_BRANCH)?;
    git.push_upstream(REMOTE_NAME, MAIN_BRANCH)?;
    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::IdentityOverride;
    use crate::writer::CommitWriter;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct FakeHosting {
        url: &'static str,
        lookups: Cell<usize>,
    }

    impl FakeHosting {
        fn new(url: &'static str) -> Self {
            Self {
                url,
                lookups: Cell::new(0),
            }
        }
    }

    impl HostingProvider for FakeHosting {
        fn repository_exists(&self, _name: &str) -> Result<bool> {
            Ok(true)
        }

        fn repository_url(&self, _name: &str) -> Result<String> {
            self.lookups.set(self.lookups.get() + 1);
            Ok(self.url.to_string())
        }
    }

    fn repo() -> (TempDir, GitOps) {
        let dir = TempDir::new().unwrap();
        let git = GitOps::init(dir.path(), MAIN_BRANCH).unwrap();
        (dir, git)
    }

    #[test]
    fn name_target_is_resolved_through_hosting() {
        let (_dir, git) = repo();
        let hosting = FakeHosting::new("https://github.com/octo/demo");
        let target = RepositoryTarget::Name("octo/demo".to_string());

        let status = ensure_origin(&git, &target, &hosting).unwrap();
        assert_eq!(
            status,
            OriginStatus::Added("https://github.com/octo/demo".to_string())
        );
        assert_eq!(hosting.lookups.get(), 1);
        assert_eq!(
            git.remote_url(REMOTE_NAME).unwrap().as_deref(),
            Some("https://github.com/octo/demo")
        );
    }

    #[test]
    fn url_target_skips_lookup() {
        let (_dir, git) = repo();
        let hosting = FakeHosting::new("unused");
        let target = RepositoryTarget::Url("git@github.com:octo/demo.git".to_string());

        let status = ensure_origin(&git, &target, &hosting).unwrap();
        assert_eq!(status.url(), "git@github.com:octo/demo.git");
        assert_eq!(hosting.lookups.get(), 0);
    }

    #[test]
    fn existing_origin_is_left_alone() {
        let (_dir, git) = repo();
        git.add_remote(REMOTE_NAME, "https://example.com/keep.git")
            .unwrap();
        let hosting = FakeHosting::new("https://github.com/octo/other");
        let target = RepositoryTarget::Name("octo/other".to_string());

        let status = ensure_origin(&git, &target, &hosting).unwrap();
        assert_eq!(
            status,
            OriginStatus::Existing("https://example.com/keep.git".to_string())
        );
        assert_eq!(hosting.lookups.get(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn history_is_pushed_to_main_with_upstream() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("local");
        let bare = dir.path().join("remote.git");
        git2::Repository::init_bare(&bare).unwrap();

        let git = GitOps::init(&local, "master").unwrap();
        git.set_identity(&IdentityOverride {
            name: Some("Push User".to_string()),
            email: Some("push@example.com".to_string()),
        })
        .unwrap();
        let at = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let head = CommitWriter::new(&git).write(at).unwrap();

        let hosting = FakeHosting::new("unused");
        let target = RepositoryTarget::Url(format!("file://{}", bare.display()));
        let status = publish(&git, &target, &hosting).unwrap();

        assert!(matches!(status, OriginStatus::Added(_)));
        assert_eq!(hosting.lookups.get(), 0);
        assert_eq!(git.current_branch().unwrap().as_deref(), Some(MAIN_BRANCH));

        let remote = git2::Repository::open_bare(&bare).unwrap();
        let pushed = remote.find_reference("refs/heads/main").unwrap();
        assert_eq!(pushed.target(), Some(head));

        let mut config = git2::Repository::open(&local).unwrap().config().unwrap();
        let config = config.snapshot().unwrap();
        assert_eq!(config.get_str("branch.main.remote").unwrap(), REMOTE_NAME);
        assert_eq!(
            config.get_str("branch.main.merge").unwrap(),
            "refs/heads/main"
        );
    }
}
