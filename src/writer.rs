use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use git2::Oid;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::git::GitOps;

pub const README_FILENAME: &str = "README.md";

pub fn commit_message(timestamp: NaiveDateTime) -> String {
    timestamp.format("Contribution: %Y-%m-%d %H:%M").to_string()
}

/// Pins a wall-clock timestamp to the local zone. Ambiguous times take the
/// earlier offset; times inside a DST gap are shifted forward by an hour.
pub fn localize(timestamp: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
    Local
        .from_local_datetime(&timestamp)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(timestamp + chrono::Duration::hours(1)))
                .earliest()
        })
        .map(|dt| dt.fixed_offset())
        .with_context(|| format!("{} does not exist in the local time zone", timestamp))
}

/// Turns one scheduled timestamp into one commit: append a line to the
/// tracked file, stage everything, commit with the timestamp as date.
pub struct CommitWriter<'a> {
    git: &'a GitOps,
    file: PathBuf,
}

impl<'a> CommitWriter<'a> {
    pub fn new(git: &'a GitOps) -> Self {
        let file = git.workdir().join(README_FILENAME);
        Self { git, file }
    }

    pub fn write(&self, timestamp: NaiveDateTime) -> Result<Oid> {
        let message = commit_message(timestamp);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)
            .with_context(|| format!("Failed to open {}", self.file.display()))?;
        write!(file, "{}\n\n", message)
            .with_context(|| format!("Failed to write {}", self.file.display()))?;

        self.git.stage_all().context("Failed to stage changes")?;
        self.git
            .commit_at(&message, localize(timestamp)?)
            .with_context(|| format!("Failed to commit {}", message))
    }
}
