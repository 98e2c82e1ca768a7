use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{
    Branch, Commit, ErrorCode, IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature,
    Time,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command;
use crate::params::IdentityOverride;

pub struct GitOps {
    repo: Repository,
    workdir: PathBuf,
}

impl GitOps {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Not a git repository: {}", path.display()))?;
        Ok(Self {
            repo,
            workdir: path.to_path_buf(),
        })
    }

    /// Creates a fresh repository whose unborn HEAD points at `branch`.
    pub fn init<P: AsRef<Path>>(path: P, branch: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head(branch);
        let repo = Repository::init_opts(path, &opts)
            .with_context(|| format!("Failed to initialize repository in {}", path.display()))?;
        debug!(path = %path.display(), branch, "initialized repository");
        Ok(Self {
            repo,
            workdir: path.to_path_buf(),
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn set_identity(&self, identity: &IdentityOverride) -> Result<()> {
        let mut config = self.repo.config()?;
        if let Some(name) = &identity.name {
            config.set_str("user.name", name)?;
        }
        if let Some(email) = &identity.email {
            config.set_str("user.email", email)?;
        }
        Ok(())
    }

    /// Configured identity, stamped with `when` instead of the current time.
    pub fn signature_at(&self, when: DateTime<FixedOffset>) -> Result<Signature<'static>> {
        let current = self
            .repo
            .signature()
            .context("No git identity configured; set user.name and user.email")?;
        let name = current.name().context("user.name is not valid UTF-8")?;
        let email = current.email().context("user.email is not valid UTF-8")?;
        let offset_minutes = when.offset().local_minus_utc() / 60;
        let time = Time::new(when.timestamp(), offset_minutes);
        Ok(Signature::new(name, email, &time)?)
    }

    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.write()?;
        Ok(())
    }

    pub fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Commits the staged index on top of HEAD with author and committer
    /// dates set to `when`.
    pub fn commit_at(&self, message: &str, when: DateTime<FixedOffset>) -> Result<Oid> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature_at(when)?;

        let parent = self.head_commit()?;
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!(%oid, message, "created commit");
        Ok(oid)
    }

    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.repo
            .remote(name, url)
            .with_context(|| format!("Failed to add remote {} -> {}", name, url))?;
        Ok(())
    }

    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.repo.head() {
            Ok(head) => Ok(head.shorthand().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Force-renames the checked out branch to `name`. An unborn HEAD is
    /// simply re-pointed.
    pub fn rename_current_branch(&self, name: &str) -> Result<()> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                self.repo.set_head(&format!("refs/heads/{}", name))?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            anyhow::bail!("HEAD is detached; cannot rename it to {}", name);
        }
        if head.shorthand() == Some(name) {
            return Ok(());
        }

        let mut branch = Branch::wrap(head);
        branch.rename(name, true)?;
        debug!(branch = name, "renamed current branch");
        Ok(())
    }

    pub fn commit_count(&self) -> Result<usize> {
        if self.head_commit()?.is_none() {
            return Ok(0);
        }
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        Ok(revwalk.count())
    }

    /// Pushes `branch` to `remote` and sets it as upstream. Runs the git
    /// binary so credential helpers and SSH agents apply.
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        command::run_inherited("git", ["push", "-u", remote, branch], Some(&self.workdir))
            .with_context(|| format!("Failed to push {} to {}", branch, remote))
    }
}
