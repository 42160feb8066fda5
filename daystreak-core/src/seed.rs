//! Base seed generation and per-day seed mixing.
//!
//! A session draws one base seed when it is created; every day's schedule is
//! then derived from `(base_seed, epoch_day)` so it can be recomputed on demand
//! instead of being stored.

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

/// Golden-ratio multiplier used to spread consecutive day indices.
const DAY_MIX_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Errors raised while drawing a fresh base seed.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(#[from] rand::Error),
    #[error("fixed seed source has no seeds to hand out")]
    NoSeedsConfigured,
}

/// Draw a non-negative base seed from the operating system entropy source.
///
/// # Errors
///
/// Returns [`SeedError::EntropyUnavailable`] when the OS cannot provide random
/// bytes. There is no weaker fallback.
pub fn generate_base_seed() -> Result<i64, SeedError> {
    generate_base_seed_from(&mut OsRng)
}

/// Draw a non-negative base seed from the provided entropy source.
///
/// Eight bytes are read little-endian and the sign bit is cleared.
///
/// # Errors
///
/// Returns [`SeedError::EntropyUnavailable`] when the source fails to fill the buffer.
pub fn generate_base_seed_from<R: RngCore + ?Sized>(source: &mut R) -> Result<i64, SeedError> {
    let mut bytes = [0u8; 8];
    source.try_fill_bytes(&mut bytes)?;
    Ok(i64::from_le_bytes(bytes) & i64::MAX)
}

/// Mix a base seed with an epoch day into the 32-bit seed for that day.
///
/// Changing this formula changes every previously generated day.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub const fn derive_day_seed(base_seed: i64, day_index: i64) -> i32 {
    let mixed = (base_seed as u64) ^ (day_index as u64).wrapping_mul(DAY_MIX_MULTIPLIER);
    let folded = (mixed as i64) & i64::MAX;
    (folded ^ (folded >> 32)) as i32
}

/// Source of base seeds for newly created sessions.
pub trait SeedSource {
    /// Produce the base seed for a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if no seed can be produced.
    fn next_base_seed(&mut self) -> Result<i64, SeedError>;
}

/// Production seed source backed by [`generate_base_seed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn next_base_seed(&mut self) -> Result<i64, SeedError> {
        generate_base_seed()
    }
}

/// Seed source replaying a fixed list of seeds, cycling when exhausted.
///
/// Intended for tests and reproducible tooling runs.
#[derive(Debug, Clone)]
pub struct FixedSeedSource {
    seeds: Vec<i64>,
    cursor: usize,
}

impl FixedSeedSource {
    #[must_use]
    pub fn new(seeds: impl Into<Vec<i64>>) -> Self {
        Self {
            seeds: seeds.into(),
            cursor: 0,
        }
    }
}

impl SeedSource for FixedSeedSource {
    fn next_base_seed(&mut self) -> Result<i64, SeedError> {
        if self.seeds.is_empty() {
            return Err(SeedError::NoSeedsConfigured);
        }
        let seed = self.seeds[self.cursor % self.seeds.len()] & i64::MAX;
        self.cursor = self.cursor.wrapping_add(1);
        Ok(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct DeadSource;

    impl RngCore for DeadSource {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::other("no entropy")))
        }
    }

    struct AllOnes;

    impl RngCore for AllOnes {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xFF);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn day_seed_matches_pinned_values() {
        assert_eq!(derive_day_seed(42, 0), 42);
        assert_eq!(derive_day_seed(42, 1), 1_635_583_366);
        assert_eq!(derive_day_seed(i64::MAX, 20_000), 890_786_648);
        assert_eq!(derive_day_seed(123_456_789, 19_650), -901_849_437);
    }

    #[test]
    fn day_seed_is_stable_across_calls() {
        for day in [-5_i64, 0, 1, 19_000, i64::MAX] {
            assert_eq!(derive_day_seed(0x1234_5678, day), derive_day_seed(0x1234_5678, day));
        }
    }

    #[test]
    fn thousand_days_do_not_collide() {
        let seeds: HashSet<i32> = (0..1000).map(|day| derive_day_seed(42, day)).collect();
        assert_eq!(seeds.len(), 1000);
    }

    #[test]
    fn base_seed_clears_sign_bit() {
        let seed = generate_base_seed_from(&mut AllOnes).unwrap();
        assert_eq!(seed, i64::MAX);
    }

    #[test]
    fn base_seed_fails_without_entropy() {
        let err = generate_base_seed_from(&mut DeadSource).unwrap_err();
        assert!(matches!(err, SeedError::EntropyUnavailable(_)));
    }

    #[test]
    fn os_seed_is_non_negative() {
        let seed = generate_base_seed().unwrap();
        assert!(seed >= 0);
    }

    #[test]
    fn fixed_source_cycles() {
        let mut source = FixedSeedSource::new(vec![3, -1]);
        assert_eq!(source.next_base_seed().unwrap(), 3);
        assert_eq!(source.next_base_seed().unwrap(), i64::MAX);
        assert_eq!(source.next_base_seed().unwrap(), 3);
    }

    #[test]
    fn empty_fixed_source_fails_instead_of_seeding_zero() {
        let mut source = FixedSeedSource::new(Vec::new());
        let err = source.next_base_seed().unwrap_err();
        assert!(matches!(err, SeedError::NoSeedsConfigured));
    }
}
