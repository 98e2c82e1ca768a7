//! Interactive terminal form collecting the same fields as the CLI flags.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use dialoguer::{Confirm, Input};

use crate::config::Config;
use crate::params::{MAX_COMMITS_PER_DAY, MIN_COMMITS_PER_DAY, ParameterInput};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| format!("expected a date like 2024-01-31, got '{}'", value.trim()))
}

/// Start date offered by the form: `days_before` days back from `today`.
pub fn default_start(today: NaiveDate, days_before: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days_before.into()))
        .unwrap_or(today)
}

fn optional(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Prompts for every field, prefilled from `config`. Returns `None` when
/// the user declines the final confirmation.
pub fn prompt(config: &Config, today: NaiveDate) -> Result<Option<ParameterInput>> {
    let mut input = config.parameter_input();

    let repository: String = Input::new()
        .with_prompt("Repository")
        .validate_with(|value: &String| -> Result<(), &str> {
            if value.trim().is_empty() {
                Err("a repository name or URL is required")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    input.repository = Some(repository.trim().to_string());

    input.no_weekends = Confirm::new()
        .with_prompt("No weekends?")
        .default(input.no_weekends)
        .interact()?;

    input.max_commits = Input::new()
        .with_prompt("Max commits per day")
        .default(input.max_commits)
        .validate_with(|value: &u8| -> Result<(), String> {
            if (MIN_COMMITS_PER_DAY..=MAX_COMMITS_PER_DAY).contains(value) {
                Ok(())
            } else {
                Err(format!(
                    "must be between {} and {}",
                    MIN_COMMITS_PER_DAY, MAX_COMMITS_PER_DAY
                ))
            }
        })
        .interact_text()?;
    input.min_commits = input.min_commits.min(input.max_commits);

    input.frequency = Input::new()
        .with_prompt("Frequency (% of days)")
        .default(input.frequency)
        .validate_with(|value: &u8| -> Result<(), &str> {
            if *value <= 100 {
                Ok(())
            } else {
                Err("must be between 0 and 100")
            }
        })
        .interact_text()?;

    let user_name: String = Input::new()
        .with_prompt("User name")
        .default(input.identity.name.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    input.identity.name = optional(user_name);

    let user_email: String = Input::new()
        .with_prompt("User email")
        .default(input.identity.email.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;
    input.identity.email = optional(user_email);

    let start: String = Input::new()
        .with_prompt("Start date")
        .default(
            default_start(today, input.days_before)
                .format(DATE_FORMAT)
                .to_string(),
        )
        .validate_with(|value: &String| parse_date(value).map(|_| ()))
        .interact_text()?;
    input.day_start = parse_date(&start).ok();

    let end: String = Input::new()
        .with_prompt("End date")
        .default(today.format(DATE_FORMAT).to_string())
        .validate_with(|value: &String| parse_date(value).map(|_| ()))
        .interact_text()?;
    input.day_end = parse_date(&end).ok();

    let confirmed = Confirm::new()
        .with_prompt("Generate contributions?")
        .default(true)
        .interact()?;

    Ok(confirmed.then_some(input))
}
