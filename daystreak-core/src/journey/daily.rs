//! Deterministic per-day challenge schedules.
//!
//! A day's schedule is a pure function of `(base_seed, epoch_day, config)`:
//! the day seed from [`derive_day_seed`] seeds a [`Pcg32`], one draw picks the
//! challenge count and one draw per challenge picks its game selector.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, DayConfig};
use crate::difficulty::{DifficultyLevel, DifficultyTable};
use crate::rng::Pcg32;
use crate::seed::derive_day_seed;

/// One generated challenge for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeAssignment {
    /// Position within the day, also the completion flag index.
    pub index: u32,
    pub difficulty: DifficultyLevel,
    /// Index into the external game pool, in `[0, game_pool_size)`.
    pub game_selector: u32,
}

impl ChallengeAssignment {
    /// The part of the assignment a minigame engine receives when started.
    #[must_use]
    pub const fn launch(&self) -> ChallengeLaunch {
        ChallengeLaunch {
            difficulty: self.difficulty,
            game_selector: self.game_selector,
        }
    }
}

/// Parameters handed to a minigame engine for a started challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChallengeLaunch {
    pub difficulty: DifficultyLevel,
    pub game_selector: u32,
}

impl ChallengeLaunch {
    /// Look up this challenge's entry in a minigame tuning table.
    #[must_use]
    pub fn tuned<'t, T>(&self, table: &'t DifficultyTable<T>) -> Option<&'t T> {
        table.get(self.difficulty)
    }
}

/// Lazy iterator over one day's assignments.
///
/// Restart by constructing it again; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct DayChallenges<'a> {
    rng: Pcg32,
    config: &'a DayConfig,
    next_index: u32,
    count: u32,
}

impl<'a> DayChallenges<'a> {
    /// Start the schedule for `day_index`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the configuration is invalid.
    pub fn new(base_seed: i64, day_index: i64, config: &'a DayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = Pcg32::from_day_seed(derive_day_seed(base_seed, day_index));
        let (min, max) = config.count_range;
        let count = rng.uniform_int(min, max);
        Ok(Self {
            rng,
            config,
            next_index: 0,
            count,
        })
    }

    /// Total number of assignments this day produces.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.count
    }
}

impl Iterator for DayChallenges<'_> {
    type Item = ChallengeAssignment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.count {
            return None;
        }
        let index = self.next_index;
        let difficulty = self.config.difficulty_for(index as usize)?;
        let game_selector = self.rng.uniform_int(0, self.config.game_pool_size);
        self.next_index += 1;
        Some(ChallengeAssignment {
            index,
            difficulty,
            game_selector,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.count - self.next_index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DayChallenges<'_> {}

/// Generate the full ordered schedule for `day_index`.
///
/// # Errors
///
/// Returns `ConfigError` when the configuration is invalid; no partial
/// schedule is produced.
pub fn generate_day(
    base_seed: i64,
    day_index: i64,
    config: &DayConfig,
) -> Result<Vec<ChallengeAssignment>, ConfigError> {
    Ok(DayChallenges::new(base_seed, day_index, config)?.collect())
}

/// Number of challenges scheduled for `day_index`, without drawing selectors.
///
/// # Errors
///
/// Returns `ConfigError` when the configuration is invalid.
pub fn challenge_count(
    base_seed: i64,
    day_index: i64,
    config: &DayConfig,
) -> Result<usize, ConfigError> {
    Ok(DayChallenges::new(base_seed, day_index, config)?.total() as usize)
}
