//! Daystreak Session Core
//!
//! Deterministic daily challenge schedules, streak tracking and versioned
//! session persistence for the Daystreak minigame collection. Rendering,
//! minigame engines and the wall clock live outside this crate; callers
//! supply the current epoch day and consume abstract challenge assignments.

pub mod config;
pub mod difficulty;
pub mod journey;
pub mod persistence;
pub mod record;
pub mod rng;
pub mod seed;

// Re-export commonly used types
pub use config::{ConfigError, DayConfig};
pub use difficulty::{DifficultyLevel, DifficultyTable};
pub use journey::{
    ChallengeAssignment, ChallengeLaunch, DailyJourney, DayChallenges, DayEntry, DayOutcome,
    DayView, JourneyError, JourneyStep, SessionState, StreakTransition, challenge_count,
    generate_day,
};
pub use persistence::{
    DEFAULT_SESSION_KEY, KeyValueSessionPersistence, KeyValueStore, MemoryStore,
    PersistenceError, SessionPersistence,
};
pub use record::{CompletionFlags, LATEST_VERSION, MigrationError, SessionRecord};
pub use rng::Pcg32;
pub use seed::{
    FixedSeedSource, OsSeedSource, SeedError, SeedSource, derive_day_seed, generate_base_seed,
};
