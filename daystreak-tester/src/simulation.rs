use anyhow::{Context, Result, ensure};
use colored::Colorize;
use daystreak_core::{
    DailyJourney, DayConfig, DayOutcome, FixedSeedSource, OsSeedSource, SeedError, SeedSource,
    SessionPersistence,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::Serialize;

/// Knobs for the scripted player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerModel {
    pub play_seed: u64,
    /// Probability that the player never opens the app on a given day.
    pub skip_chance: f64,
    /// Probability of walking away after each finished challenge.
    pub abandon_chance: f64,
}

impl PlayerModel {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.skip_chance),
            "skip chance {} must be within 0..=1",
            self.skip_chance
        );
        ensure!(
            (0.0..=1.0).contains(&self.abandon_chance),
            "abandon chance {} must be within 0..=1",
            self.abandon_chance
        );
        Ok(())
    }
}

/// Base seeds for sessions the simulation creates.
#[derive(Debug, Clone)]
pub enum SimulationSeeds {
    Os(OsSeedSource),
    Fixed(FixedSeedSource),
}

impl SimulationSeeds {
    #[must_use]
    pub fn from_arg(base_seed: Option<i64>) -> Self {
        match base_seed {
            Some(seed) => Self::Fixed(FixedSeedSource::new(vec![seed])),
            None => Self::Os(OsSeedSource),
        }
    }
}

impl SeedSource for SimulationSeeds {
    fn next_base_seed(&mut self) -> Result<i64, SeedError> {
        match self {
            Self::Os(source) => source.next_base_seed(),
            Self::Fixed(source) => source.next_base_seed(),
        }
    }
}

/// What happened on one simulated day.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedDay {
    pub epoch_day: i64,
    pub visited: bool,
    pub outcome: Option<DayOutcome>,
    pub game_streak: i32,
    pub completed: usize,
    pub challenges: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub days_simulated: usize,
    pub days_visited: usize,
    pub days_fully_completed: usize,
    pub streak_breaks: usize,
    pub longest_streak: i32,
    pub final_streak: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub days: Vec<SimulatedDay>,
    pub summary: SimulationSummary,
}

/// Drive a journey through `days` consecutive epoch days starting at
/// `start_day`, letting the player model decide what gets played.
pub async fn run_simulation<P, S>(
    journey: &mut DailyJourney<P, S>,
    model: PlayerModel,
    start_day: i64,
    days: u32,
) -> Result<SimulationReport>
where
    P: SessionPersistence,
    S: SeedSource,
{
    model.validate()?;
    let mut rng = ChaCha20Rng::seed_from_u64(model.play_seed);
    let mut report = Vec::with_capacity(days as usize);
    let mut initialized = false;

    for offset in 0..i64::from(days) {
        let today = start_day
            .checked_add(offset)
            .context("simulated day runs past the epoch day range")?;
        if rng.gen_bool(model.skip_chance) {
            log::debug!("player skipped day {today}");
            report.push(SimulatedDay {
                epoch_day: today,
                visited: false,
                outcome: None,
                game_streak: journey.state().map_or(0, |state| state.game_streak()),
                completed: 0,
                challenges: 0,
            });
            continue;
        }

        let entry = if initialized {
            journey.advance_day(today).await?
        } else {
            initialized = true;
            journey.initialize(today).await?
        };

        let mut view = entry.view;
        let pending: Vec<u32> = view
            .steps
            .iter()
            .filter(|step| !step.completed)
            .map(|step| step.assignment.index)
            .collect();
        for index in pending {
            view = journey.complete_challenge(index).await?;
            if rng.gen_bool(model.abandon_chance) {
                log::debug!("player walked away after challenge {index} on day {today}");
                break;
            }
        }

        report.push(SimulatedDay {
            epoch_day: today,
            visited: true,
            outcome: Some(entry.outcome),
            game_streak: view.game_streak,
            completed: view.completed_count(),
            challenges: view.steps.len(),
        });
    }

    let summary = summarize(&report);
    Ok(SimulationReport {
        days: report,
        summary,
    })
}

fn summarize(days: &[SimulatedDay]) -> SimulationSummary {
    let visited: Vec<&SimulatedDay> = days.iter().filter(|day| day.visited).collect();
    SimulationSummary {
        days_simulated: days.len(),
        days_visited: visited.len(),
        days_fully_completed: visited
            .iter()
            .filter(|day| day.challenges > 0 && day.completed == day.challenges)
            .count(),
        streak_breaks: visited
            .iter()
            .filter(|day| matches!(day.outcome, Some(DayOutcome::StreakBroken { .. })))
            .count(),
        longest_streak: visited.iter().map(|day| day.game_streak).max().unwrap_or(0),
        final_streak: days.last().map_or(0, |day| day.game_streak),
    }
}

/// Build a journey with the configuration the simulation runs under.
pub fn build_journey<P: SessionPersistence>(
    config: DayConfig,
    persistence: P,
    base_seed: Option<i64>,
) -> Result<DailyJourney<P, SimulationSeeds>> {
    Ok(DailyJourney::new(
        config,
        persistence,
        SimulationSeeds::from_arg(base_seed),
    )?)
}

pub fn print_console(report: &SimulationReport) {
    println!("{}", "📊 Simulation Results".bright_cyan().bold());
    println!("{}", "=".repeat(40).cyan());
    for day in &report.days {
        if !day.visited {
            println!(
                "Day {} {}",
                day.epoch_day.to_string().bold(),
                "skipped".dimmed()
            );
            continue;
        }
        let outcome = match day.outcome {
            Some(DayOutcome::Introduction) => "introduction".normal(),
            Some(DayOutcome::Resumed) => "resumed".normal(),
            Some(DayOutcome::Continued) => "continued".green(),
            Some(DayOutcome::StreakBroken { previous_streak }) => {
                format!("streak of {previous_streak} broken").red()
            }
            None => "-".normal(),
        };
        let progress = format!("{}/{}", day.completed, day.challenges);
        let progress = if day.completed == day.challenges {
            progress.green()
        } else {
            progress.yellow()
        };
        println!(
            "Day {} {:<24} streak {:>3}  {}",
            day.epoch_day.to_string().bold(),
            outcome,
            day.game_streak,
            progress
        );
    }

    let summary = &report.summary;
    println!();
    println!(
        "Visited {}/{} days, {} fully completed",
        summary.days_visited, summary.days_simulated, summary.days_fully_completed
    );
    println!(
        "Longest streak: {}  Final streak: {}  Breaks: {}",
        summary.longest_streak.to_string().green().bold(),
        summary.final_streak,
        if summary.streak_breaks == 0 {
            summary.streak_breaks.to_string().green()
        } else {
            summary.streak_breaks.to_string().red()
        }
    );
}

pub fn print_json(report: &SimulationReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daystreak_core::{KeyValueSessionPersistence, MemoryStore};

    fn model(skip_chance: f64, abandon_chance: f64) -> PlayerModel {
        PlayerModel {
            play_seed: 5,
            skip_chance,
            abandon_chance,
        }
    }

    fn journey() -> DailyJourney<KeyValueSessionPersistence<MemoryStore>, SimulationSeeds> {
        build_journey(
            DayConfig::default(),
            KeyValueSessionPersistence::new(MemoryStore::new()),
            Some(42),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn diligent_player_builds_an_unbroken_streak() {
        let mut journey = journey();
        let report = run_simulation(&mut journey, model(0.0, 0.0), 100, 10)
            .await
            .unwrap();
        assert_eq!(report.summary.days_visited, 10);
        assert_eq!(report.summary.days_fully_completed, 10);
        assert_eq!(report.summary.streak_breaks, 0);
        assert_eq!(report.summary.final_streak, 9);
        assert_eq!(report.days[0].outcome, Some(DayOutcome::Introduction));
        assert_eq!(report.days[1].outcome, Some(DayOutcome::Continued));
    }

    #[tokio::test]
    async fn absent_player_never_visits() {
        let mut journey = journey();
        let report = run_simulation(&mut journey, model(1.0, 0.0), 0, 5)
            .await
            .unwrap();
        assert_eq!(report.summary.days_visited, 0);
        assert_eq!(report.summary.longest_streak, 0);
    }

    #[tokio::test]
    async fn quitting_after_one_challenge_breaks_every_day() {
        let mut journey = journey();
        let report = run_simulation(&mut journey, model(0.0, 1.0), 0, 4)
            .await
            .unwrap();
        assert!(report.days.iter().all(|day| day.completed == 1));
        assert_eq!(report.summary.streak_breaks, 3);
        assert_eq!(report.summary.longest_streak, 0);
    }

    #[tokio::test]
    async fn same_play_seed_replays_the_same_run() {
        let mut first = journey();
        let mut second = journey();
        let a = run_simulation(&mut first, model(0.3, 0.2), 0, 30).await.unwrap();
        let b = run_simulation(&mut second, model(0.3, 0.2), 0, 30).await.unwrap();
        let shape = |r: &SimulationReport| {
            r.days
                .iter()
                .map(|d| (d.visited, d.completed, d.game_streak))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&a), shape(&b));
    }

    #[tokio::test]
    async fn run_past_the_last_epoch_day_is_an_error() {
        let mut journey = journey();
        let err = run_simulation(&mut journey, model(0.0, 0.0), i64::MAX, 2).await;
        assert!(err.is_err());
    }

    #[test]
    fn out_of_range_chances_are_rejected() {
        assert!(model(1.5, 0.0).validate().is_err());
        assert!(model(0.0, -0.1).validate().is_err());
    }
}
