use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde_json::json;
use services::{AppServices, Clock};
use study_core::access::{Resource, is_allowed, landing_resource};
use study_core::calendar::YearMonth;
use study_core::model::{ChartPeriod, Role, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUserId { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDate { flag: &'static str, raw: String },
    InvalidPeriod { raw: String },
    InvalidRole { raw: String },
    MissingArg { flag: &'static str },
    SeedIntoDemo,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDate { flag, raw } => {
                write!(f, "invalid {flag} value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidPeriod { raw } => {
                write!(f, "invalid --period value (expected day|week|month|year): {raw}")
            }
            ArgsError::InvalidRole { raw } => {
                write!(f, "invalid --role value (expected admin|user): {raw}")
            }
            ArgsError::MissingArg { flag } => write!(f, "{flag} is required"),
            ArgsError::SeedIntoDemo => {
                write!(f, "seed-demo writes to --db and cannot be combined with --demo")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_date(flag: &'static str, raw: String) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidDate { flag, raw })
}

fn parse_number(flag: &'static str, raw: String) -> Result<i32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_user(raw: String) -> Result<UserId, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidUserId { raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Calendar,
    Progress,
    Chart,
    Results,
    Access,
    SeedDemo,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "calendar" => Some(Self::Calendar),
            "progress" => Some(Self::Progress),
            "chart" => Some(Self::Chart),
            "results" => Some(Self::Results),
            "access" => Some(Self::Access),
            "seed-demo" => Some(Self::SeedDemo),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    demo: bool,
    user: Option<UserId>,
    year: Option<i32>,
    /// One-based, as typed.
    month: Option<i32>,
    period: ChartPeriod,
    date: Option<NaiveDate>,
    today: Option<NaiveDate>,
    role: Option<Role>,
    path: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- calendar  [--year <y>] [--month <1-12>] [--user <id>]");
    eprintln!("  cargo run -p app -- progress  [--year <y>] [--month <1-12>] [--user <id>]");
    eprintln!("  cargo run -p app -- chart     [--period day|week|month|year] [--user <id>]");
    eprintln!("  cargo run -p app -- results   [--date <YYYY-MM-DD>] [--user <id>]");
    eprintln!("  cargo run -p app -- access    --role admin|user [--path <route>]");
    eprintln!("  cargo run -p app -- seed-demo");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>    SQLite URL (default: sqlite://study.sqlite3)");
    eprintln!("  --demo               Use in-memory demo data instead of the database");
    eprintln!("  --today <YYYY-MM-DD> Fix the clock to this date");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_USER_ID, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("STUDY_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url),
            demo: false,
            user: std::env::var("STUDY_USER_ID")
                .ok()
                .and_then(|value| value.parse::<UserId>().ok()),
            year: None,
            month: None,
            period: ChartPeriod::Week,
            date: None,
            today: None,
            role: None,
            path: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--demo" => parsed.demo = true,
                "--user" => parsed.user = Some(parse_user(require_value(args, "--user")?)?),
                "--year" => parsed.year = Some(parse_number("--year", require_value(args, "--year")?)?),
                "--month" => {
                    parsed.month = Some(parse_number("--month", require_value(args, "--month")?)?);
                }
                "--period" => {
                    let value = require_value(args, "--period")?;
                    parsed.period = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidPeriod { raw: value.clone() })?;
                }
                "--date" => parsed.date = Some(parse_date("--date", require_value(args, "--date")?)?),
                "--today" => {
                    parsed.today = Some(parse_date("--today", require_value(args, "--today")?)?);
                }
                "--role" => {
                    let value = require_value(args, "--role")?;
                    parsed.role = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidRole { raw: value.clone() })?,
                    );
                }
                "--path" => parsed.path = Some(require_value(args, "--path")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    /// Reject flag combinations that make no sense for `cmd`.
    fn check_command(&self, cmd: Command) -> Result<(), ArgsError> {
        if cmd == Command::SeedDemo && self.demo {
            // The demo store is already seeded and is dropped on exit.
            return Err(ArgsError::SeedIntoDemo);
        }
        Ok(())
    }

    fn clock(&self) -> Clock {
        self.today.map_or_else(Clock::default_clock, Clock::fixed_on)
    }

    /// Year and zero-based month, defaulting to the clock's current month.
    fn year_month(&self, today: NaiveDate) -> (i32, i32) {
        let current = YearMonth::of(today);
        let year = self.year.unwrap_or(current.year());
        let month = self.month.map_or_else(
            || i32::try_from(today.month0()).unwrap_or(0),
            |m| m - 1,
        );
        (year, month)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    // stdout carries the JSON report, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_services(args: &Args) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = args.clock();
    if args.demo {
        return Ok(AppServices::in_memory_demo(clock).await?);
    }
    prepare_sqlite_file(&args.db_url)?;
    Ok(AppServices::new_sqlite(&args.db_url, clock).await?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if cmd == Command::Access {
        let role = args.role.ok_or(ArgsError::MissingArg { flag: "--role" })?;
        let landing = landing_resource(role);
        let resources: Vec<_> = match args.path.as_deref() {
            Some(path) => vec![(path.to_string(), Resource::from_path(path))],
            None => Resource::ALL
                .iter()
                .map(|r| (r.path().to_string(), Some(*r)))
                .collect(),
        };
        let checks: Vec<_> = resources
            .into_iter()
            .map(|(path, resource)| {
                json!({
                    "path": path,
                    "allowed": resource.is_some_and(|r| is_allowed(role, r)),
                })
            })
            .collect();
        return print_json(&json!({
            "role": role,
            "landing": landing.path(),
            "checks": checks,
        }));
    }

    args.check_command(cmd).map_err(|e| {
        eprintln!("{e}");
        e
    })?;

    let app = open_services(&args).await?;
    let today = app.clock().today();

    match cmd {
        Command::Calendar => {
            let (year, month) = args.year_month(today);
            let grid = app.calendar().month_grid(year, month, args.user).await?;
            print_json(&grid)
        }
        Command::Progress => {
            let (year, month) = args.year_month(today);
            let progress = match args.user {
                Some(user) => {
                    app.progress()
                        .compute_user_month_progress(user, year, month)
                        .await?
                }
                None => app.progress().compute_month_progress(year, month).await?,
            };
            print_json(&progress)
        }
        Command::Chart => {
            let series = app
                .results()
                .compute_chart_series(args.period, args.user)
                .await?;
            print_json(&json!({ "period": args.period, "points": series }))
        }
        Command::Results => {
            let results = match (args.user, args.date) {
                (Some(user), None) => app.results().results_for_user(user).await?,
                (Some(user), Some(date)) => app
                    .results()
                    .results_for_user(user)
                    .await?
                    .into_iter()
                    .filter(|r| r.date() == date)
                    .collect(),
                (None, date) => app.results().results_on(date.unwrap_or(today)).await?,
            };
            print_json(&results)
        }
        Command::SeedDemo => {
            let summary = app.load_demo().await?;
            eprintln!(
                "Seeded {} users, {} topics, {} progress records and {} results",
                summary.users, summary.topics, summary.progress, summary.results
            );
            Ok(())
        }
        Command::Access => Ok(()),
    }
}


#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "command failed");
        eprintln!("{err}");
        std::process::exit(2);
    }
}
