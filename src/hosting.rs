//! Hosting-provider lookups, backed by the GitHub CLI.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::command;

pub trait HostingProvider {
    fn repository_exists(&self, name: &str) -> Result<bool>;

    /// Canonical clone URL for `name`.
    fn repository_url(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct RepoView {
    url: String,
}

pub fn parse_repo_view(json: &str) -> Result<String> {
    let view: RepoView =
        serde_json::from_str(json).context("Unexpected output from `gh repo view --json url`")?;
    Ok(view.url)
}

#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }
}

impl GhCli {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl HostingProvider for GhCli {
    fn repository_exists(&self, name: &str) -> Result<bool> {
        match command::run(&self.program, ["repo", "view", name], None) {
            Ok(_) => Ok(true),
            Err(e) if e.is_failure() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn repository_url(&self, name: &str) -> Result<String> {
        let output = command::run(&self.program, ["repo", "view", "--json", "url", name], None)
            .with_context(|| format!("Failed to look up repository {}", name))?;
        parse_repo_view(&output)
    }
}
