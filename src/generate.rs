use anyhow::Result;
use chrono::NaiveDateTime;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::info;

use crate::ContribGen;
use crate::hosting::HostingProvider;
use crate::params::{MAIN_BRANCH, RepositoryTarget};
use crate::publish::{self, OriginStatus, REMOTE_NAME};
use crate::repository;
use crate::schedule::{self, ScheduleConfig};
use crate::writer::CommitWriter;

#[derive(Debug)]
pub struct RunReport {
    pub directory: PathBuf,
    pub existed: bool,
    pub commits: usize,
    pub active_days: usize,
    pub origin: Option<OriginStatus>,
}

impl ContribGen {
    fn rng(&self) -> StdRng {
        match self.params.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Commit timestamps for this run, in order.
    pub fn plan(&self) -> Vec<NaiveDateTime> {
        let config = ScheduleConfig::from(&self.params);
        schedule::schedule(&config, &mut self.rng())
    }

    /// Fails when a named remote repository is not known to the hosting
    /// provider. URL targets and local-only runs are not checked.
    pub fn verify_remote(&self, hosting: &dyn HostingProvider) -> Result<()> {
        if !self.params.push() {
            return Ok(());
        }
        if let Some(RepositoryTarget::Name(name)) = self.params.repository() {
            if !hosting.repository_exists(name)? {
                anyhow::bail!("Repository {} does not exist", name);
            }
        }
        Ok(())
    }

    pub fn generate(&self, hosting: &dyn HostingProvider, dry_run: bool) -> Result<()> {
        self.verify_remote(hosting)?;
        let timestamps = self.plan();

        if dry_run {
            self.print_preview(&timestamps);
            return Ok(());
        }

        let report = self.execute(&timestamps, hosting)?;

        println!();
        println!(
            "{} Wrote {} commits over {} days in {}",
            "✓".green(),
            report.commits.to_string().cyan(),
            report.active_days.to_string().cyan(),
            report.directory.display().to_string().yellow()
        );
        match &report.origin {
            Some(origin) => println!(
                "Pushed {} to {}",
                MAIN_BRANCH.yellow(),
                origin.url().blue()
            ),
            None if self.params.push() => println!("Nothing pushed"),
            None => println!("Local only, nothing pushed"),
        }
        println!(
            "\nRepository generation {}!",
            "completed successfully".green().bold()
        );

        Ok(())
    }

    /// Writes one commit per timestamp, then publishes when pushing is on.
    pub fn execute(
        &self,
        timestamps: &[NaiveDateTime],
        hosting: &dyn HostingProvider,
    ) -> Result<RunReport> {
        let directory = self.target_dir();
        let prepared = repository::prepare(&directory, self.params.identity())?;
        if prepared.existed && !self.params.identity().is_empty() {
            println!(
                "{} {} already exists, identity overrides not applied",
                "!".yellow(),
                directory.display()
            );
        }

        let pb = ProgressBar::new(timestamps.len() as u64);
        pb.set_style(ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos}/{len} {msg}")?);

        let writer = CommitWriter::new(&prepared.git);
        for (i, &timestamp) in timestamps.iter().enumerate() {
            pb.set_position(i as u64);
            pb.set_message(timestamp.format("%Y-%m-%d %H:%M").to_string());
            writer.write(timestamp)?;
        }
        pb.finish_with_message(format!("Wrote {} commits", timestamps.len()));
        info!(commits = timestamps.len(), "history written");

        let origin = match self.params.repository() {
            Some(target) if self.params.push() => {
                if prepared.git.head_commit()?.is_none() {
                    println!(
                        "{} No commits in {}, nothing to push",
                        "!".yellow(),
                        directory.display()
                    );
                    None
                } else {
                    println!("Pushing to {}...", REMOTE_NAME);
                    Some(publish::publish(&prepared.git, target, hosting)?)
                }
            }
            _ => None,
        };

        Ok(RunReport {
            directory,
            existed: prepared.existed,
            commits: timestamps.len(),
            active_days: schedule::active_days(timestamps),
            origin,
        })
    }

    fn print_preview(&self, timestamps: &[NaiveDateTime]) {
        let params = &self.params;

        println!("{}", "[DRY RUN] Generation preview:".blue().bold());
        println!(
            "  Directory: {}",
            self.target_dir().display().to_string().yellow()
        );
        println!(
            "  Date range: {} .. {}",
            params.day_start().to_string().cyan(),
            params.day_end().to_string().cyan()
        );
        println!(
            "  Weekends: {}",
            if params.no_weekends() {
                "skipped".red()
            } else {
                "included".green()
            }
        );
        println!(
            "  Commits per day: {}-{}, frequency {}%",
            params.min_commits(),
            params.max_commits(),
            params.frequency()
        );
        println!(
            "  {} {} commits over {} days would be written",
            "→".blue(),
            timestamps.len(),
            schedule::active_days(timestamps)
        );
        match params.repository() {
            Some(target) if params.push() => println!(
                "  {} {} would be pushed to {}",
                "→".blue(),
                MAIN_BRANCH,
                target.to_string().blue()
            ),
            _ => println!("  {} Nothing would be pushed", "→".blue()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{IdentityOverride, ParameterInput};
    use chrono::NaiveDate;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Hosting {
        exists: bool,
        calls: Cell<usize>,
    }

    impl Hosting {
        fn new(exists: bool) -> Self {
            Self {
                exists,
                calls: Cell::new(0),
            }
        }
    }

    impl HostingProvider for Hosting {
        fn repository_exists(&self, _name: &str) -> Result<bool> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.exists)
        }

        fn repository_url(&self, _name: &str) -> Result<String> {
            anyhow::bail!("no lookups expected")
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input() -> ParameterInput {
        ParameterInput {
            repository: Some("octo/demo".to_string()),
            identity: IdentityOverride {
                name: Some("Gen".to_string()),
                email: Some("gen@example.com".to_string()),
            },
            day_start: Some(date(2024, 1, 1)),
            day_end: Some(date(2024, 1, 1)),
            frequency: 100,
            max_commits: 1,
            push: false,
            seed: Some(7),
            ..ParameterInput::default()
        }
    }

    #[test]
    fn single_day_run_writes_one_commit() {
        let dir = TempDir::new().unwrap();
        let params = input().validate(date(2024, 6, 1)).unwrap();
        let contrib = ContribGen::new(dir.path(), params);
        let hosting = Hosting::new(true);

        let timestamps = contrib.plan();
        let report = contrib.execute(&timestamps, &hosting).unwrap();

        assert_eq!(report.commits, 1);
        assert_eq!(report.active_days, 1);
        assert!(!report.existed);
        assert!(report.origin.is_none());
        assert_eq!(report.directory, dir.path().join("demo"));

        let repo = git2::Repository::open(dir.path().join("demo")).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Contribution: 2024-01-01 12:00"));
        assert_eq!(repo.head().unwrap().shorthand(), Some("main"));
    }

    #[test]
    fn seeded_plans_are_reproducible() {
        let mut raw = input();
        raw.day_start = Some(date(2024, 1, 1));
        raw.day_end = Some(date(2024, 3, 31));
        raw.frequency = 50;
        raw.max_commits = 5;
        let params = raw.validate(date(2024, 6, 1)).unwrap();

        let a = ContribGen::new("unused", params.clone()).plan();
        let b = ContribGen::new("unused", params).plan();
        assert_eq!(a, b);
    }

    #[test]
    fn missing_remote_repository_is_fatal() {
        let mut raw = input();
        raw.push = true;
        let params = raw.validate(date(2024, 6, 1)).unwrap();
        let contrib = ContribGen::new("unused", params);
        let hosting = Hosting::new(false);

        let err = contrib.verify_remote(&hosting).unwrap_err();
        assert_eq!(err.to_string(), "Repository octo/demo does not exist");
    }

    #[test]
    fn url_targets_and_local_runs_skip_remote_check() {
        let hosting = Hosting::new(false);

        let local = ContribGen::new("unused", input().validate(date(2024, 6, 1)).unwrap());
        local.verify_remote(&hosting).unwrap();

        let mut raw = input();
        raw.push = true;
        raw.repository = Some("git@github.com:octo/demo.git".to_string());
        let url = ContribGen::new("unused", raw.validate(date(2024, 6, 1)).unwrap());
        url.verify_remote(&hosting).unwrap();

        assert_eq!(hosting.calls.get(), 0);
    }

    #[test]
    fn second_run_appends_to_existing_repository() {
        let dir = TempDir::new().unwrap();
        let hosting = Hosting::new(true);

        let first = ContribGen::new(dir.path(), input().validate(date(2024, 6, 1)).unwrap());
        first.execute(&first.plan(), &hosting).unwrap();

        let mut raw = input();
        raw.day_start = Some(date(2024, 1, 2));
        raw.day_end = Some(date(2024, 1, 2));
        let second = ContribGen::new(dir.path(), raw.validate(date(2024, 6, 1)).unwrap());
        let report = second.execute(&second.plan(), &hosting).unwrap();

        assert!(report.existed);
        let repo = git2::Repository::open(dir.path().join("demo")).unwrap();
        let mut walk = repo.revwalk().unwrap();
        walk.push_head().unwrap();
        assert_eq!(walk.count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn push_run_without_commits_skips_publishing() {
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("remote.git");
        git2::Repository::init_bare(&bare).unwrap();

        let mut raw = input();
        raw.push = true;
        raw.frequency = 0;
        raw.repository = Some(format!("file://{}", bare.display()));
        let params = raw.validate(date(2024, 6, 1)).unwrap();
        let contrib = ContribGen::new(dir.path().join("work"), params);
        let hosting = Hosting::new(true);

        let report = contrib.execute(&contrib.plan(), &hosting).unwrap();

        assert_eq!(report.commits, 0);
        assert!(report.origin.is_none());
        let remote = git2::Repository::open_bare(&bare).unwrap();
        assert!(remote.find_reference("refs/heads/main").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn push_run_publishes_existing_history() {
        let dir = TempDir::new().unwrap();
        let bare = dir.path().join("remote.git");
        git2::Repository::init_bare(&bare).unwrap();
        let url = format!("file://{}", bare.display());
        let hosting = Hosting::new(true);

        let mut raw = input();
        raw.repository = Some(url.clone());
        let params = raw.validate(date(2024, 6, 1)).unwrap();
        let first = ContribGen::new(dir.path().join("work"), params);
        first.execute(&first.plan(), &hosting).unwrap();

        let mut raw = input();
        raw.push = true;
        raw.frequency = 0;
        raw.repository = Some(url.clone());
        let params = raw.validate(date(2024, 6, 1)).unwrap();
        let second = ContribGen::new(dir.path().join("work"), params);
        let report = second.execute(&second.plan(), &hosting).unwrap();

        assert!(report.existed);
        assert_eq!(report.commits, 0);
        assert_eq!(
            report.origin.as_ref().map(OriginStatus::url),
            Some(url.as_str())
        );

        let local = git2::Repository::open(dir.path().join("work").join("remote")).unwrap();
        let head = local.head().unwrap().target();
        let remote = git2::Repository::open_bare(&bare).unwrap();
        let pushed = remote.find_reference("refs/heads/main").unwrap();
        assert_eq!(pushed.target(), head);
    }
}
