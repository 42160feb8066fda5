use serde::{Deserialize, Serialize};

/// Difficulty label attached to a generated challenge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Medium,
    Hard,
    Impossible,
}

impl DifficultyLevel {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Impossible];

    /// Zero-based position used to index per-difficulty tuning tables.
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
            Self::Impossible => 3,
        }
    }

    #[must_use]
    pub const fn from_ordinal(ordinal: usize) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Easy),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            3 => Some(Self::Impossible),
            _ => None,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Impossible => "impossible",
        }
    }
}

/// Per-difficulty tuning values, ordered Easy to Impossible.
///
/// Minigame configs carry these (fall speeds, target scores, move budgets).
/// Tables shorter than the difficulty ladder repeat their last entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyTable<T>(Vec<T>);

impl<T> DifficultyTable<T> {
    #[must_use]
    pub const fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    /// Value for `level`, clamped to the last entry. `None` for an empty table.
    #[must_use]
    pub fn get(&self, level: DifficultyLevel) -> Option<&T> {
        self.0.get(level.ordinal()).or_else(|| self.0.last())
    }

    /// Entries paired with the level they tune. Entries past the last
    /// level are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (DifficultyLevel, &T)> {
        self.0.iter().enumerate().filter_map(|(ordinal, value)| {
            DifficultyLevel::from_ordinal(ordinal).map(|level| (level, value))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for DifficultyTable<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> From<Vec<T>> for DifficultyTable<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_roundtrip() {
        for level in DifficultyLevel::ALL {
            assert_eq!(DifficultyLevel::from_ordinal(level.ordinal()), Some(level));
        }
        assert_eq!(DifficultyLevel::from_ordinal(4), None);
    }

    #[test]
    fn table_clamps_to_last_entry() {
        let fall_speeds = DifficultyTable::new(vec![1.0_f32, 0.7]);
        assert_eq!(fall_speeds.get(DifficultyLevel::Easy), Some(&1.0));
        assert_eq!(fall_speeds.get(DifficultyLevel::Impossible), Some(&0.7));
        assert_eq!(DifficultyTable::<u32>::default().get(DifficultyLevel::Hard), None);
    }

    #[test]
    fn table_parses_from_plain_array() {
        let table: DifficultyTable<u32> = serde_json::from_str("[500, 1000, 2000, 5000]").unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(DifficultyLevel::Hard), Some(&2000));
    }

    #[test]
    fn iter_pairs_entries_with_levels() {
        let scores = DifficultyTable::new(vec![10, 20, 30, 40, 50]);
        let pairs: Vec<(DifficultyLevel, u32)> = scores.iter().map(|(l, v)| (l, *v)).collect();
        assert_eq!(
            pairs,
            vec![
                (DifficultyLevel::Easy, 10),
                (DifficultyLevel::Medium, 20),
                (DifficultyLevel::Hard, 30),
                (DifficultyLevel::Impossible, 40),
            ]
        );
    }

    #[test]
    fn levels_serialize_snake_case() {
        let json = serde_json::to_string(&DifficultyLevel::Impossible).unwrap();
        assert_eq!(json, "\"impossible\"");
    }
}
