use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rand::Rng;

use crate::params::{MAX_COMMITS_PER_DAY, MIN_COMMITS_PER_DAY, RunParameters};

/// Inputs of the day-by-day commit decision. Built from [`RunParameters`],
/// or by hand in tests.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub day_start: NaiveDate,
    pub day_end: NaiveDate,
    pub no_weekends: bool,
    pub frequency: u8,
    pub min_commits: u8,
    pub max_commits: u8,
    pub commit_time: NaiveTime,
}

impl From<&RunParameters> for ScheduleConfig {
    fn from(params: &RunParameters) -> Self {
        Self {
            day_start: params.day_start(),
            day_end: params.day_end(),
            no_weekends: params.no_weekends(),
            frequency: params.frequency(),
            min_commits: params.min_commits(),
            max_commits: params.max_commits(),
            commit_time: params.commit_time(),
        }
    }
}

pub fn clamp_commits(requested: u8) -> u8 {
    requested.clamp(MIN_COMMITS_PER_DAY, MAX_COMMITS_PER_DAY)
}

pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every calendar day in `[start, end]`. Empty when `end < start`.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Whether `day` gets any commits at all.
pub fn should_commit<R: Rng>(
    day: NaiveDate,
    no_weekends: bool,
    frequency: u8,
    rng: &mut R,
) -> bool {
    if no_weekends && is_weekend(day) {
        return false;
    }
    rng.random_range(0..100u8) < frequency
}

pub fn commits_for_day<R: Rng>(min_commits: u8, max_commits: u8, rng: &mut R) -> u8 {
    let max = clamp_commits(max_commits);
    let min = min_commits.clamp(MIN_COMMITS_PER_DAY, max);
    rng.random_range(min..=max)
}

pub fn commit_times_for_day(day: NaiveDate, base: NaiveTime, count: u8) -> Vec<NaiveDateTime> {
    let start = day.and_time(base);
    (0..i64::from(count))
        .map(|minute| start + Duration::minutes(minute))
        .collect()
}

/// Produces the ordered list of commit timestamps for the whole range.
pub fn schedule<R: Rng>(config: &ScheduleConfig, rng: &mut R) -> Vec<NaiveDateTime> {
    let mut timestamps = Vec::new();

    for day in days(config.day_start, config.day_end) {
        if !should_commit(day, config.no_weekends, config.frequency, rng) {
            continue;
        }
        let count = commits_for_day(config.min_commits, config.max_commits, rng);
        timestamps.extend(commit_times_for_day(day, config.commit_time, count));
    }

    timestamps
}

/// Number of distinct days present in a schedule.
pub fn active_days(timestamps: &[NaiveDateTime]) -> usize {
    let mut count = 0;
    let mut last = None;
    for ts in timestamps {
        let day = ts.date();
        if last != Some(day) {
            count += 1;
            last = Some(day);
        }
    }
    count
}
