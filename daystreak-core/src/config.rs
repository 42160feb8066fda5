use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::difficulty::DifficultyLevel;

/// Errors raised when a day configuration cannot produce a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("game pool is empty; no selector can be drawn")]
    EmptyGamePool,
    #[error("challenge count range invalid (min {min} > max {max})")]
    CountRangeInverted { min: u32, max: u32 },
    #[error("difficulty sequence is empty")]
    EmptyDifficultySequence,
}

/// Inputs for daily challenge generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConfig {
    /// Challenge count bounds, min inclusive and max exclusive. Equal bounds
    /// pin the count.
    #[serde(default = "DayConfig::default_count_range")]
    pub count_range: (u32, u32),
    /// Number of games a selector may point at.
    #[serde(default = "DayConfig::default_game_pool_size")]
    pub game_pool_size: u32,
    /// Difficulty per challenge position; positions past the end reuse the
    /// last entry.
    #[serde(default = "DayConfig::default_difficulty_sequence")]
    pub difficulty_sequence: Vec<DifficultyLevel>,
}

impl DayConfig {
    #[must_use]
    pub const fn default_count_range() -> (u32, u32) {
        (4, 4)
    }

    #[must_use]
    pub const fn default_game_pool_size() -> u32 {
        4
    }

    #[must_use]
    pub fn default_difficulty_sequence() -> Vec<DifficultyLevel> {
        DifficultyLevel::ALL.to_vec()
    }

    /// Parse a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a day configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the invariants generation relies on.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the pool is empty, the count range is
    /// inverted, or no difficulty is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = self.count_range;
        if min > max {
            return Err(ConfigError::CountRangeInverted { min, max });
        }
        if self.game_pool_size == 0 {
            return Err(ConfigError::EmptyGamePool);
        }
        if self.difficulty_sequence.is_empty() {
            return Err(ConfigError::EmptyDifficultySequence);
        }
        Ok(())
    }

    /// Difficulty assigned to challenge position `index`.
    #[must_use]
    pub fn difficulty_for(&self, index: usize) -> Option<DifficultyLevel> {
        self.difficulty_sequence
            .get(index)
            .or_else(|| self.difficulty_sequence.last())
            .copied()
    }
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            count_range: Self::default_count_range(),
            game_pool_size: Self::default_game_pool_size(),
            difficulty_sequence: Self::default_difficulty_sequence(),
        }
    }
}
