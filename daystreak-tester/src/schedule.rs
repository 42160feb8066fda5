use anyhow::{Context, Result};
use colored::Colorize;
use daystreak_core::{
    ChallengeAssignment, DayConfig, DifficultyTable, derive_day_seed, generate_day,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Named per-difficulty minigame parameters, e.g. `{"fall_speed": [1.0, 0.8, 0.6]}`.
pub type TuningTables = BTreeMap<String, DifficultyTable<f64>>;

/// Parse tuning tables from JSON.
pub fn parse_tuning(json: &str) -> Result<TuningTables> {
    Ok(serde_json::from_str(json)?)
}

/// One challenge with the tuning values its engine would launch with.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledChallenge {
    #[serde(flatten)]
    pub assignment: ChallengeAssignment,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tuning: BTreeMap<String, f64>,
}

/// Generated schedule for one epoch day.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledDay {
    pub epoch_day: i64,
    pub day_seed: i32,
    pub challenges: Vec<ScheduledChallenge>,
}

/// Schedules for a run of consecutive days plus their fingerprint.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub base_seed: i64,
    pub days: Vec<ScheduledDay>,
    pub fingerprint: String,
}

pub fn build_schedule(
    base_seed: i64,
    from_day: i64,
    days: u32,
    config: &DayConfig,
    tuning: &TuningTables,
) -> Result<ScheduleReport> {
    let mut scheduled = Vec::with_capacity(days as usize);
    for offset in 0..i64::from(days) {
        let epoch_day = from_day
            .checked_add(offset)
            .context("schedule runs past the epoch day range")?;
        scheduled.push(ScheduledDay {
            epoch_day,
            day_seed: derive_day_seed(base_seed, epoch_day),
            challenges: generate_day(base_seed, epoch_day, config)?
                .into_iter()
                .map(|assignment| ScheduledChallenge {
                    tuning: tuned_values(&assignment, tuning),
                    assignment,
                })
                .collect(),
        });
    }
    let fingerprint = format!("{:016x}", schedule_fingerprint(&scheduled));
    Ok(ScheduleReport {
        base_seed,
        days: scheduled,
        fingerprint,
    })
}

fn tuned_values(
    assignment: &ChallengeAssignment,
    tuning: &TuningTables,
) -> BTreeMap<String, f64> {
    let launch = assignment.launch();
    tuning
        .iter()
        .filter_map(|(name, table)| launch.tuned(table).map(|value| (name.clone(), *value)))
        .collect()
}

/// Stable hash over days, difficulties and selectors.
///
/// Two builds producing different fingerprints for the same inputs have
/// diverged in seed mixing or PRNG behavior.
pub fn schedule_fingerprint(days: &[ScheduledDay]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for day in days {
        hasher.write(&day.epoch_day.to_le_bytes());
        hasher.write(&(day.challenges.len() as u64).to_le_bytes());
        for challenge in &day.challenges {
            hasher.write(challenge.assignment.difficulty.key().as_bytes());
            hasher.write(&challenge.assignment.game_selector.to_le_bytes());
        }
    }
    hasher.finish()
}

pub fn print_console(report: &ScheduleReport) {
    println!(
        "{} {}",
        "📅 Schedule for base seed".bright_cyan().bold(),
        report.base_seed.to_string().bold()
    );
    println!("{}", "=".repeat(40).cyan());
    for day in &report.days {
        println!(
            "Day {} {}",
            day.epoch_day.to_string().bold(),
            format!("(seed {})", day.day_seed).dimmed()
        );
        for challenge in &day.challenges {
            let tuning: Vec<String> = challenge
                .tuning
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!(
                "   #{} {:<10} game {} {}",
                challenge.assignment.index,
                challenge.assignment.difficulty.key(),
                challenge.assignment.game_selector.to_string().green(),
                tuning.join(" ").dimmed()
            );
        }
    }
    println!();
    println!("Fingerprint: {}", report.fingerprint.yellow());
}

pub fn print_tuning(tuning: &TuningTables) {
    if tuning.is_empty() {
        return;
    }
    println!("{}", "🎚  Tuning tables".bright_cyan().bold());
    for (name, table) in tuning {
        let entries: Vec<String> = table
            .iter()
            .map(|(level, value)| format!("{}={value}", level.key()))
            .collect();
        println!("   {name:<16} {}", entries.join(" "));
    }
    println!();
}

pub fn print_json(report: &ScheduleReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_reproducible() {
        let cfg = DayConfig::default();
        let first = build_schedule(42, 19_000, 14, &cfg, &TuningTables::new()).unwrap();
        let second = build_schedule(42, 19_000, 14, &cfg, &TuningTables::new()).unwrap();
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.days.len(), 14);
    }

    #[test]
    fn fingerprint_tracks_the_seed() {
        let cfg = DayConfig::default();
        let a = build_schedule(42, 0, 7, &cfg, &TuningTables::new()).unwrap();
        let b = build_schedule(43, 0, 7, &cfg, &TuningTables::new()).unwrap();
        assert_ne!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn first_day_matches_core_golden_values() {
        let cfg = DayConfig {
            count_range: (4, 4),
            game_pool_size: 3,
            ..DayConfig::default()
        };
        let report = build_schedule(42, 0, 1, &cfg, &TuningTables::new()).unwrap();
        let selectors: Vec<u32> = report.days[0]
            .challenges
            .iter()
            .map(|c| c.assignment.game_selector)
            .collect();
        assert_eq!(report.days[0].day_seed, 42);
        assert_eq!(selectors, vec![1, 0, 2, 2]);
    }

    #[test]
    fn tuning_follows_each_challenge_difficulty() {
        let cfg = DayConfig::default();
        let tuning =
            parse_tuning(r#"{"fall_speed": [1.0, 0.8, 0.6], "target_score": [500]}"#).unwrap();
        let plain = build_schedule(42, 0, 3, &cfg, &TuningTables::new()).unwrap();
        let tuned = build_schedule(42, 0, 3, &cfg, &tuning).unwrap();
        assert_eq!(plain.fingerprint, tuned.fingerprint);

        let first_day = &tuned.days[0].challenges;
        let speeds: Vec<f64> = first_day.iter().map(|c| c.tuning["fall_speed"]).collect();
        assert_eq!(speeds, vec![1.0, 0.8, 0.6, 0.6]);
        assert!(first_day.iter().all(|c| c.tuning["target_score"] == 500.0));
    }

    #[test]
    fn untuned_challenges_serialize_flat() {
        let cfg = DayConfig::default();
        let report = build_schedule(42, 0, 1, &cfg, &TuningTables::new()).unwrap();
        let json = serde_json::to_value(&report.days[0].challenges[0]).unwrap();
        assert_eq!(json["difficulty"], "easy");
        assert!(json.get("tuning").is_none());
    }
}
