mod clock;
mod schedule;
mod simulation;
mod store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use daystreak_core::{
    DEFAULT_SESSION_KEY, DayConfig, KeyValueSessionPersistence, SessionPersistence,
};
use std::path::{Path, PathBuf};

use simulation::PlayerModel;
use store::FileStore;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "daystreak-tester", version = "0.1.0")]
#[command(about = "QA driver for the Daystreak session core")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output report format
    #[arg(long, value_enum, global = true, default_value_t = ReportFormat::Console)]
    format: ReportFormat,

    /// JSON day configuration (defaults to the built-in configuration)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the challenge schedule for a base seed
    Schedule {
        /// Base seed of the session
        #[arg(long)]
        seed: i64,

        /// First epoch day (number or YYYY-MM-DD, defaults to today in UTC)
        #[arg(long)]
        from_day: Option<String>,

        /// Number of consecutive days
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// JSON object of per-difficulty tuning tables to resolve per challenge
        #[arg(long)]
        tuning: Option<PathBuf>,
    },
    /// Play a scripted player through consecutive days against a save file
    Simulate {
        /// Number of consecutive days
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// First epoch day (number or YYYY-MM-DD, defaults to today in UTC)
        #[arg(long)]
        start_day: Option<String>,

        /// Save file holding the session
        #[arg(long, default_value = "target/daystreak-save.json")]
        store: PathBuf,

        /// Seed for the player model
        #[arg(long, default_value_t = 1337)]
        play_seed: u64,

        /// Probability of skipping a whole day
        #[arg(long, default_value_t = 0.1)]
        skip_chance: f64,

        /// Probability of quitting after each challenge
        #[arg(long, default_value_t = 0.05)]
        abandon_chance: f64,

        /// Base seed for new sessions (OS entropy when omitted)
        #[arg(long)]
        base_seed: Option<i64>,
    },
    /// Print the session stored in a save file
    Inspect {
        /// Save file holding the session
        #[arg(long, default_value = "target/daystreak-save.json")]
        store: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    if matches!(args.format, ReportFormat::Console) {
        announce_banner();
    }

    match args.command {
        Command::Schedule {
            seed,
            from_day,
            days,
            tuning,
        } => {
            let from_day = clock::resolve_day(from_day.as_deref())?;
            let tuning = load_tuning(tuning.as_deref())?;
            let report = schedule::build_schedule(seed, from_day, days, &config, &tuning)?;
            match args.format {
                ReportFormat::Console => {
                    schedule::print_tuning(&tuning);
                    schedule::print_console(&report);
                }
                ReportFormat::Json => schedule::print_json(&report)?,
            }
        }
        Command::Simulate {
            days,
            start_day,
            store,
            play_seed,
            skip_chance,
            abandon_chance,
            base_seed,
        } => {
            let start_day = clock::resolve_day(start_day.as_deref())?;
            let model = PlayerModel {
                play_seed,
                skip_chance,
                abandon_chance,
            };
            let persistence = KeyValueSessionPersistence::new(FileStore::new(&store));
            let mut journey = simulation::build_journey(config, persistence, base_seed)?;
            let report = simulation::run_simulation(&mut journey, model, start_day, days)
                .await
                .with_context(|| format!("simulation against {} failed", store.display()))?;
            match args.format {
                ReportFormat::Console => simulation::print_console(&report),
                ReportFormat::Json => simulation::print_json(&report)?,
            }
        }
        Command::Inspect { store } => inspect(&store, args.format).await?,
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🔥 Daystreak Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn load_config(path: Option<&Path>) -> Result<DayConfig> {
    let Some(path) = path else {
        return Ok(DayConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = DayConfig::from_json(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn load_tuning(path: Option<&Path>) -> Result<schedule::TuningTables> {
    let Some(path) = path else {
        return Ok(schedule::TuningTables::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning {}", path.display()))?;
    schedule::parse_tuning(&raw)
        .with_context(|| format!("failed to parse tuning {}", path.display()))
}

async fn inspect(path: &Path, format: ReportFormat) -> Result<()> {
    let persistence = KeyValueSessionPersistence::new(FileStore::new(path));
    let record = persistence
        .load()
        .await
        .with_context(|| format!("failed to load session from {}", path.display()))?;

    match format {
        ReportFormat::Json => println!("{}", record.to_json()?),
        ReportFormat::Console if record.is_null() => {
            println!(
                "No session stored under {} in {}",
                DEFAULT_SESSION_KEY.bold(),
                path.display()
            );
        }
        ReportFormat::Console => {
            let flags: String = record
                .completion_flags()
                .iter()
                .map(|done| if *done { '■' } else { '□' })
                .collect();
            println!("Version:        {}", record.version());
            println!("Base seed:      {}", record.base_seed());
            println!("Started on day: {}", record.starting_day_epoch());
            println!(
                "Streak:         {}",
                record.game_streak().to_string().green().bold()
            );
            println!("Current day:    {}", record.last_saved_day());
            println!("Completion:     {flags}");
        }
    }
    Ok(())
}
