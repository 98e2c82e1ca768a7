use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::git::GitOps;
use crate::params::{IdentityOverride, MAIN_BRANCH};

pub const REPOSITORY_PREFIX: &str = "repository-";

pub struct PreparedRepository {
    pub git: GitOps,
    /// The directory was already there and was opened as-is.
    pub existed: bool,
}

/// Opens `path` if it exists, otherwise creates it, initializes a repository
/// on [`MAIN_BRANCH`] and applies the identity overrides.
pub fn prepare(path: &Path, identity: &IdentityOverride) -> Result<PreparedRepository> {
    if path.exists() {
        info!(path = %path.display(), "using existing repository");
        let git = GitOps::open(path)?;
        return Ok(PreparedRepository { git, existed: true });
    }

    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))?;
    let git = GitOps::init(path, MAIN_BRANCH)?;
    if !identity.is_empty() {
        git.set_identity(identity)
            .context("Failed to configure git identity")?;
    }
    info!(path = %path.display(), "created repository");

    Ok(PreparedRepository { git, existed: false })
}
