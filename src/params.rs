use chrono::{Days, NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

pub const MIN_COMMITS_PER_DAY: u8 = 1;
pub const MAX_COMMITS_PER_DAY: u8 = 20;
pub const DEFAULT_MAX_COMMITS: u8 = 10;
pub const DEFAULT_FREQUENCY: u8 = 80;
pub const DEFAULT_DAYS_BEFORE: u32 = 365;
pub const DEFAULT_DAYS_AFTER: u32 = 0;
pub const MAIN_BRANCH: &str = "main";

pub fn default_commit_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Latest base time that still fits a full day of commits, one minute apart.
pub fn latest_commit_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 60 - u32::from(MAX_COMMITS_PER_DAY), 59).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Repository name is required")]
    MissingRepository,

    #[error("Invalid repository identifier: {0}")]
    InvalidRepository(String),

    #[error("Start date {start} cannot be after end date {end}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Start date {0} cannot be in the future")]
    StartInFuture(NaiveDate),

    #[error("Frequency must be between 0 and 100, got {0}")]
    FrequencyOutOfRange(u8),

    #[error("Max commits must be between 1 and 20, got {0}")]
    MaxCommitsOutOfRange(u8),

    #[error("Min commits must be between 1 and max commits ({max}), got {min}")]
    MinCommitsOutOfRange { min: u8, max: u8 },

    #[error("Commit time {0} leaves no room for 20 commits before midnight")]
    CommitTimeTooLate(NaiveTime),

    #[error("Date offset of {0} days is out of range")]
    OffsetOutOfRange(u32),
}

/// Where generated history gets published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryTarget {
    /// `name` or `owner/name`, resolved through the hosting provider.
    Name(String),
    /// SSH or HTTPS remote URL, used as-is for `origin`.
    Url(String),
}

impl RepositoryTarget {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::MissingRepository);
        }

        let target = if input.starts_with("git@") || input.contains("://") {
            Self::Url(input.to_string())
        } else {
            Self::Name(input.to_string())
        };

        if target.directory_name().is_empty() {
            return Err(ValidationError::InvalidRepository(input.to_string()));
        }

        Ok(target)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Url(url) => url,
        }
    }

    /// Last path segment of the identifier, without a trailing `.git`.
    pub fn directory_name(&self) -> String {
        let raw = self.as_str().trim_end_matches('/');
        let segment = raw.rsplit(['/', ':']).next().unwrap_or(raw);
        let segment = segment.strip_suffix(".git").unwrap_or(segment);

        if segment == "." || segment == ".." {
            String::new()
        } else {
            segment.to_string()
        }
    }
}

impl fmt::Display for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOverride {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentityOverride {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Raw input as collected by the CLI or the interactive form, before
/// defaults and validation are applied.
#[derive(Debug, Clone)]
pub struct ParameterInput {
    pub no_weekends: bool,
    pub min_commits: u8,
    pub max_commits: u8,
    pub frequency: u8,
    pub repository: Option<String>,
    pub identity: IdentityOverride,
    pub day_start: Option<NaiveDate>,
    pub day_end: Option<NaiveDate>,
    pub days_before: u32,
    pub days_after: u32,
    pub commit_time: NaiveTime,
    pub push: bool,
    pub seed: Option<u64>,
}

impl Default for ParameterInput {
    fn default() -> Self {
        Self {
            no_weekends: false,
            min_commits: MIN_COMMITS_PER_DAY,
            max_commits: DEFAULT_MAX_COMMITS,
            frequency: DEFAULT_FREQUENCY,
            repository: None,
            identity: IdentityOverride::default(),
            day_start: None,
            day_end: None,
            days_before: DEFAULT_DAYS_BEFORE,
            days_after: DEFAULT_DAYS_AFTER,
            commit_time: default_commit_time(),
            push: true,
            seed: None,
        }
    }
}

/// Validated inputs for one generation run. Only obtainable through
/// [`ParameterInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParameters {
    no_weekends: bool,
    min_commits: u8,
    max_commits: u8,
    frequency: u8,
    repository: Option<RepositoryTarget>,
    identity: IdentityOverride,
    day_start: NaiveDate,
    day_end: NaiveDate,
    commit_time: NaiveTime,
    push: bool,
    seed: Option<u64>,
}

impl ParameterInput {
    pub fn validate(self, today: NaiveDate) -> Result<RunParameters, ValidationError> {
        let repository = match self.repository.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(RepositoryTarget::parse(raw)?),
            _ if self.push => return Err(ValidationError::MissingRepository),
            _ => None,
        };

        if self.frequency > 100 {
            return Err(ValidationError::FrequencyOutOfRange(self.frequency));
        }
        if !(MIN_COMMITS_PER_DAY..=MAX_COMMITS_PER_DAY).contains(&self.max_commits) {
            return Err(ValidationError::MaxCommitsOutOfRange(self.max_commits));
        }
        if self.min_commits < MIN_COMMITS_PER_DAY || self.min_commits > self.max_commits {
            return Err(ValidationError::MinCommitsOutOfRange {
                min: self.min_commits,
                max: self.max_commits,
            });
        }

        if self.commit_time > latest_commit_time() {
            return Err(ValidationError::CommitTimeTooLate(self.commit_time));
        }

        let day_start = match self.day_start {
            Some(date) => date,
            None => today
                .checked_sub_days(Days::new(self.days_before.into()))
                .ok_or(ValidationError::OffsetOutOfRange(self.days_before))?,
        };
        let day_end = match self.day_end {
            Some(date) => date,
            None => today
                .checked_add_days(Days::new(self.days_after.into()))
                .ok_or(ValidationError::OffsetOutOfRange(self.days_after))?,
        };

        if day_end < day_start {
            return Err(ValidationError::EndBeforeStart {
                start: day_start,
                end: day_end,
            });
        }
        if day_start > today {
            return Err(ValidationError::StartInFuture(day_start));
        }

        let identity = IdentityOverride {
            name: self.identity.name.filter(|s| !s.trim().is_empty()),
            email: self.identity.email.filter(|s| !s.trim().is_empty()),
        };

        Ok(RunParameters {
            no_weekends: self.no_weekends,
            min_commits: self.min_commits,
            max_commits: self.max_commits,
            frequency: self.frequency,
            repository,
            identity,
            day_start,
            day_end,
            commit_time: self.commit_time,
            push: self.push,
            seed: self.seed,
        })
    }
}

impl RunParameters {
    pub fn no_weekends(&self) -> bool {
        self.no_weekends
    }

    pub fn min_commits(&self) -> u8 {
        self.min_commits
    }

    pub fn max_commits(&self) -> u8 {
        self.max_commits
    }

    pub fn frequency(&self) -> u8 {
        self.frequency
    }

    pub fn repository(&self) -> Option<&RepositoryTarget> {
        self.repository.as_ref()
    }

    pub fn identity(&self) -> &IdentityOverride {
        &self.identity
    }

    pub fn day_start(&self) -> NaiveDate {
        self.day_start
    }

    pub fn day_end(&self) -> NaiveDate {
        self.day_end
    }

    pub fn commit_time(&self) -> NaiveTime {
        self.commit_time
    }

    pub fn push(&self) -> bool {
        self.push
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}
