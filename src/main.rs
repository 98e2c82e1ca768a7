use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use git_contrib::ContribGen;
use git_contrib::config::Config;
use git_contrib::form;
use git_contrib::hosting::GhCli;
use git_contrib::params::{MAX_COMMITS_PER_DAY, MIN_COMMITS_PER_DAY, ParameterInput};

#[derive(Parser)]
#[command(
    name = "git-contrib",
    version,
    author = "Ludwig",
    about = "Generate contribution history in a git repository",
    long_about = "A tool for filling a git repository with backdated commits over a date range and pushing it to a remote"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Path to the configuration file")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Verbose output")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate commits from command-line flags")]
    Generate(GenerateArgs),

    #[command(about = "Fill in the parameters interactively")]
    Form {
        #[arg(long, help = "Parent directory for the working repository")]
        dir: Option<PathBuf>,

        #[arg(long = "no_push", alias = "no-push", help = "Only write local history")]
        no_push: bool,
    },

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(long = "no_weekends", alias = "no-weekends", help = "Do not commit on weekends")]
    no_weekends: bool,

    #[arg(
        long = "min_commits",
        alias = "min-commits",
        value_parser = clap::value_parser!(u8).range(MIN_COMMITS_PER_DAY as i64..=MAX_COMMITS_PER_DAY as i64),
        help = "Minimum number of commits per active day (1-20)"
    )]
    min_commits: Option<u8>,

    #[arg(
        long = "max_commits",
        alias = "max-commits",
        value_parser = clap::value_parser!(u8).range(MIN_COMMITS_PER_DAY as i64..=MAX_COMMITS_PER_DAY as i64),
        help = "Maximum number of commits per active day (1-20)"
    )]
    max_commits: Option<u8>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u8).range(0..=100),
        help = "Percentage of days to commit on (0-100)"
    )]
    frequency: Option<u8>,

    #[arg(short, long, help = "Remote repository name (owner/name) or URL (SSH or HTTPS)")]
    repository: Option<String>,

    #[arg(long = "user_name", alias = "user-name", help = "Git user.name for a new repository")]
    user_name: Option<String>,

    #[arg(long = "user_email", alias = "user-email", help = "Git user.email for a new repository")]
    user_email: Option<String>,

    #[arg(
        long = "day_start",
        alias = "day-start",
        value_parser = form::parse_date,
        conflicts_with = "days_before",
        help = "First day to commit on (YYYY-MM-DD)"
    )]
    day_start: Option<NaiveDate>,

    #[arg(
        long = "day_end",
        alias = "day-end",
        value_parser = parse_day_end,
        conflicts_with = "days_after",
        help = "Last day to commit on (YYYY-MM-DD or 'now')"
    )]
    day_end: Option<EndDay>,

    #[arg(long = "days_before", alias = "days-before", help = "Start this many days before today")]
    days_before: Option<u32>,

    #[arg(long = "days_after", alias = "days-after", help = "End this many days after today")]
    days_after: Option<u32>,

    #[arg(long = "commit_time", alias = "commit-time", value_parser = parse_time, help = "Time of day of the first commit (HH:MM)")]
    commit_time: Option<NaiveTime>,

    #[arg(long, help = "Parent directory for the working repository")]
    dir: Option<PathBuf>,

    #[arg(long, help = "Seed for a reproducible schedule")]
    seed: Option<u64>,

    #[arg(long = "no_push", alias = "no-push", help = "Only write local history")]
    no_push: bool,

    #[arg(short, long = "dry_run", alias = "dry-run", help = "Show what would be done without making changes")]
    dry_run: bool,
}

#[derive(Clone, Copy)]
enum EndDay {
    Now,
    On(NaiveDate),
}

fn parse_day_end(value: &str) -> Result<EndDay, String> {
    if value.trim().eq_ignore_ascii_case("now") {
        Ok(EndDay::Now)
    } else {
        form::parse_date(value).map(EndDay::On)
    }
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("expected a time like 20:00, got '{}'", value.trim()))
}

#[derive(Subcommand)]
enum ConfigAction {
    #[command(about = "Show current configuration")]
    Show,

    #[command(about = "Set default identity for new repositories")]
    SetIdentity {
        #[arg(help = "Git user.name")]
        name: String,

        #[arg(help = "Git user.email")]
        email: String,
    },

    #[command(about = "Change generation defaults")]
    SetDefaults {
        #[arg(long = "no_weekends", alias = "no-weekends")]
        no_weekends: Option<bool>,

        #[arg(long = "min_commits", alias = "min-commits", value_parser = clap::value_parser!(u8).range(1..=20))]
        min_commits: Option<u8>,

        #[arg(long = "max_commits", alias = "max-commits", value_parser = clap::value_parser!(u8).range(1..=20))]
        max_commits: Option<u8>,

        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        frequency: Option<u8>,

        #[arg(long = "days_before", alias = "days-before")]
        days_before: Option<u32>,

        #[arg(long = "days_after", alias = "days-after")]
        days_after: Option<u32>,

        #[arg(long = "commit_time", alias = "commit-time", value_parser = parse_time)]
        commit_time: Option<NaiveTime>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "git_contrib=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path).context("Failed to load configuration")?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Generate(args) => {
            let base_dir = resolve_dir(args.dir.clone())?;
            let dry_run = args.dry_run;
            let input = generate_input(&config, args);
            run(input, base_dir, today, dry_run)
        }
        Commands::Form { dir, no_push } => {
            let base_dir = resolve_dir(dir)?;
            match form::prompt(&config, today)? {
                Some(mut input) => {
                    input.push = !no_push;
                    run(input, base_dir, today, false)?;
                    println!("{}", "Contributions generated successfully!".green());
                    Ok(())
                }
                None => {
                    println!("Aborted.");
                    Ok(())
                }
            }
        }
        Commands::Config { action } => handle_config(action, config, &config_path),
    }
}

fn resolve_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => env::current_dir().context("Failed to get current directory"),
    }
}

fn generate_input(config: &Config, args: GenerateArgs) -> ParameterInput {
    let mut input = config.parameter_input();

    input.no_weekends |= args.no_weekends;
    if let Some(n) = args.max_commits {
        input.max_commits = n;
    }
    // A configured floor follows an explicit ceiling down; explicit flags are
    // left for validation to reject.
    match args.min_commits {
        Some(n) => input.min_commits = n,
        None => input.min_commits = input.min_commits.min(input.max_commits),
    }
    if let Some(n) = args.frequency {
        input.frequency = n;
    }
    input.repository = args.repository;
    if args.user_name.is_some() {
        input.identity.name = args.user_name;
    }
    if args.user_email.is_some() {
        input.identity.email = args.user_email;
    }
    input.day_start = args.day_start;
    input.day_end = match args.day_end {
        Some(EndDay::On(date)) => Some(date),
        Some(EndDay::Now) | None => None,
    };
    if let Some(n) = args.days_before {
        input.days_before = n;
    }
    if let Some(n) = args.days_after {
        input.days_after = n;
    }
    // An explicit end of 'now' overrides a configured forward offset.
    if matches!(args.day_end, Some(EndDay::Now)) {
        input.days_after = 0;
    }
    if let Some(time) = args.commit_time {
        input.commit_time = time;
    }
    input.seed = args.seed;
    input.push = !args.no_push;

    input
}

fn run(input: ParameterInput, base_dir: PathBuf, today: NaiveDate, dry_run: bool) -> Result<()> {
    let params = input.validate(today)?;
    let contrib = ContribGen::new(base_dir, params);
    contrib.generate(&GhCli::default(), dry_run)
}

fn handle_config(action: ConfigAction, mut config: Config, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!(
                "Configuration file: {}",
                config_path.display().to_string().cyan()
            );
            println!();
            println!("Default identity:");
            println!(
                "  Name:  {}",
                config.identity.name.as_deref().unwrap_or("(git config)").green()
            );
            println!(
                "  Email: {}",
                config.identity.email.as_deref().unwrap_or("(git config)").green()
            );
            println!();

            let d = &config.defaults;
            println!("Defaults:");
            println!("  No weekends:  {}", d.no_weekends.to_string().yellow());
            println!(
                "  Commits/day:  {}-{}",
                d.min_commits.to_string().yellow(),
                d.max_commits.to_string().yellow()
            );
            println!("  Frequency:    {}%", d.frequency.to_string().yellow());
            println!(
                "  Range:        {} days before .. {} days after today",
                d.days_before.to_string().yellow(),
                d.days_after.to_string().yellow()
            );
            println!(
                "  Commit time:  {}",
                d.commit_time.format("%H:%M").to_string().yellow()
            );
        }

        ConfigAction::SetIdentity { name, email } => {
            config.identity.name = Some(name);
            config.identity.email = Some(email);
            config.save_to(config_path)?;

            println!("{} Updated default identity", "✓".green());
        }

        ConfigAction::SetDefaults {
            no_weekends,
            min_commits,
            max_commits,
            frequency,
            days_before,
            days_after,
            commit_time,
        } => {
            let d = &mut config.defaults;
            if let Some(v) = no_weekends {
                d.no_weekends = v;
            }
            if let Some(v) = min_commits {
                d.min_commits = v;
            }
            if let Some(v) = max_commits {
                d.max_commits = v;
            }
            if d.min_commits > d.max_commits {
                anyhow::bail!(
                    "Min commits ({}) cannot exceed max commits ({})",
                    d.min_commits,
                    d.max_commits
                );
            }
            if let Some(v) = frequency {
                d.frequency = v;
            }
            if let Some(v) = days_before {
                d.days_before = v;
            }
            if let Some(v) = days_after {
                d.days_after = v;
            }
            if let Some(v) = commit_time {
                d.commit_time = v;
            }
            config.save_to(config_path)?;

            println!("{} Updated defaults", "✓".green());
        }
    }

    Ok(())
}
