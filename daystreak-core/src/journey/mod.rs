//! Daily journey orchestration.
//!
//! [`DailyJourney`] ties the pieces together: it loads the stored session,
//! moves it to the caller's epoch day, regenerates that day's schedule and
//! persists every meaningful change. Every mutation is staged on a copy of
//! the live [`SessionState`] and only committed once the store succeeded, so
//! a failed or dropped persistence future leaves the last good state in place.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, DayConfig};
use crate::persistence::{PersistenceError, SessionPersistence};
use crate::record::{MigrationError, SessionRecord};
use crate::seed::{OsSeedSource, SeedError, SeedSource};

pub mod daily;
pub mod session;
pub use daily::{
    ChallengeAssignment, ChallengeLaunch, DayChallenges, challenge_count, generate_day,
};
pub use session::{SessionState, StreakTransition};

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum JourneyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error("journey has no live session; call initialize first")]
    NotInitialized,
}

/// How the player arrived at the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayOutcome {
    /// First day of a session with nothing completed yet.
    Introduction,
    /// Same day as the last visit.
    Resumed,
    /// Streak advanced into a fresh day.
    Continued,
    /// The previous streak ended; a new session started today.
    StreakBroken { previous_streak: i32 },
}

/// One challenge of the day together with its completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyStep {
    pub assignment: ChallengeAssignment,
    pub completed: bool,
}

/// Snapshot of the current day for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayView {
    pub epoch_day: i64,
    pub game_streak: i32,
    pub steps: Vec<JourneyStep>,
}

impl DayView {
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.steps.iter().filter(|step| step.completed).count()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|step| step.completed)
    }
}

/// Result of entering the daily view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    pub outcome: DayOutcome,
    pub view: DayView,
}

/// Owner of the live session and its collaborators.
///
/// Mutating methods take `&mut self`; the borrow checker provides the
/// single-writer discipline the session requires. Until
/// [`DailyJourney::initialize`] succeeds there is no live session and every
/// other operation fails with [`JourneyError::NotInitialized`].
#[derive(Debug)]
pub struct DailyJourney<P, S = OsSeedSource> {
    config: DayConfig,
    persistence: P,
    seeds: S,
    state: Option<SessionState>,
}

impl<P: SessionPersistence> DailyJourney<P, OsSeedSource> {
    /// Construct with OS-entropy base seeds.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::Config` if the configuration is invalid.
    pub fn with_os_seeds(config: DayConfig, persistence: P) -> Result<Self, JourneyError> {
        Self::new(config, persistence, OsSeedSource)
    }
}

impl<P: SessionPersistence, S: SeedSource> DailyJourney<P, S> {
    /// Construct an orchestrator. There is no live session until
    /// [`DailyJourney::initialize`] runs.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::Config` if the configuration is invalid.
    pub fn new(config: DayConfig, persistence: P, seeds: S) -> Result<Self, JourneyError> {
        config.validate()?;
        Ok(Self {
            config,
            persistence,
            seeds,
            state: None,
        })
    }

    /// Load the stored session (creating one if none exists) and enter `today`.
    ///
    /// Calling it again reloads from persistence and replaces the live session.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, seeding or persisting fails.
    pub async fn initialize(&mut self, today: i64) -> Result<DayEntry, JourneyError> {
        let record = self.persistence.load().await?;
        if record.is_null() {
            log::info!("no stored session; starting a new one on day {today}");
            let fresh = self.fresh_state(today)?;
            self.commit(fresh).await?;
            return Ok(DayEntry {
                outcome: DayOutcome::Introduction,
                view: self.view()?,
            });
        }

        let mut loaded = SessionState::from_record(&record);
        let count = challenge_count(loaded.base_seed(), loaded.last_saved_day(), &self.config)?;
        if loaded.reconcile_completion(count) {
            log::warn!(
                "stored completion flags did not match {count} challenges for day {}; resized",
                loaded.last_saved_day()
            );
            self.commit(loaded).await?;
        } else {
            self.state = Some(loaded);
        }
        self.advance_day(today).await
    }

    /// Move the session to `today` and react to the streak transition.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::NotInitialized` before [`DailyJourney::initialize`],
    /// or an error if generation, seeding or persisting fails. The live state
    /// is unchanged on error.
    pub async fn advance_day(&mut self, today: i64) -> Result<DayEntry, JourneyError> {
        let mut staged = self.live()?.clone();
        let outcome = match staged.set_realtime_day(today) {
            StreakTransition::Remains => {
                if staged.game_streak() == 0 && staged.completed_game_count() == 0 {
                    DayOutcome::Introduction
                } else {
                    DayOutcome::Resumed
                }
            }
            StreakTransition::Continues => {
                let count =
                    challenge_count(staged.base_seed(), staged.last_saved_day(), &self.config)?;
                staged.reconcile_completion(count);
                self.commit(staged).await?;
                DayOutcome::Continued
            }
            StreakTransition::Broken => {
                let previous_streak = staged.game_streak();
                log::info!(
                    "streak of {previous_streak} broken on day {today} (last saved day {})",
                    staged.last_saved_day()
                );
                let fresh = self.fresh_state(today)?;
                self.commit(fresh).await?;
                DayOutcome::StreakBroken { previous_streak }
            }
        };
        Ok(DayEntry {
            outcome,
            view: self.view()?,
        })
    }

    /// Mark challenge `index` of the current day complete and persist it.
    ///
    /// Unknown indices and already completed challenges leave the session
    /// untouched and skip the store.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::NotInitialized` before [`DailyJourney::initialize`],
    /// or an error if persisting fails; the completion is then not applied to
    /// the live state.
    pub async fn complete_challenge(&mut self, index: u32) -> Result<DayView, JourneyError> {
        let live = self.live()?;
        let mut staged = live.clone();
        staged.set_game_index_completed(i64::from(index));
        if &staged != live {
            let (done, total) = (
                staged.completed_game_count(),
                staged.completion_flags().len(),
            );
            self.commit(staged).await?;
            log::debug!("challenge {index} completed ({done}/{total})");
        }
        self.view()
    }

    /// Engine parameters for challenge `index` of the current day.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::NotInitialized` without a live session.
    pub fn launch(&self, index: u32) -> Result<Option<ChallengeLaunch>, JourneyError> {
        let live = self.live()?;
        let mut challenges =
            DayChallenges::new(live.base_seed(), live.last_saved_day(), &self.config)?;
        Ok(challenges
            .nth(index as usize)
            .map(|assignment| assignment.launch()))
    }

    /// Regenerate the current day and merge the completion flags.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::NotInitialized` without a live session.
    pub fn view(&self) -> Result<DayView, JourneyError> {
        let live = self.live()?;
        let flags = live.completion_flags();
        let steps = DayChallenges::new(live.base_seed(), live.last_saved_day(), &self.config)?
        .map(|assignment| JourneyStep {
            assignment,
            completed: flags
                .get(assignment.index as usize)
                .copied()
                .unwrap_or(false),
        })
        .collect();
        Ok(DayView {
            epoch_day: live.last_saved_day(),
            game_streak: live.game_streak(),
            steps,
        })
    }

    /// The live session, `None` before [`DailyJourney::initialize`].
    #[must_use]
    pub const fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &DayConfig {
        &self.config
    }

    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Export the live session as a record.
    ///
    /// # Errors
    ///
    /// Returns `JourneyError::NotInitialized` without a live session, or
    /// `MigrationError` if the live state cannot be exported.
    pub fn export(&self) -> Result<SessionRecord, JourneyError> {
        Ok(self.live()?.export_session()?)
    }

    fn live(&self) -> Result<&SessionState, JourneyError> {
        self.state.as_ref().ok_or(JourneyError::NotInitialized)
    }

    fn fresh_state(&mut self, today: i64) -> Result<SessionState, JourneyError> {
        let base_seed = self.seeds.next_base_seed()?;
        let count = challenge_count(base_seed, today, &self.config)?;
        log::info!("new session on day {today} with {count} challenges");
        Ok(SessionState::from_record(&SessionRecord::create_empty(
            today, base_seed, count,
        )))
    }

    async fn commit(&mut self, staged: SessionState) -> Result<(), JourneyError> {
        let record = staged.export_session()?;
        self.persistence.store(&record).await?;
        self.state = Some(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::DifficultyLevel;
    use crate::persistence::{KeyValueSessionPersistence, MemoryStore};
    use crate::seed::FixedSeedSource;

    fn journey() -> DailyJourney<KeyValueSessionPersistence<MemoryStore>, FixedSeedSource> {
        let config = DayConfig {
            count_range: (4, 4),
            game_pool_size: 3,
            difficulty_sequence: DifficultyLevel::ALL.to_vec(),
        };
        DailyJourney::new(
            config,
            KeyValueSessionPersistence::new(MemoryStore::new()),
            FixedSeedSource::new(vec![42, 7]),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn first_visit_creates_and_persists_session() {
        let mut journey = journey();
        let entry = journey.initialize(0).await.unwrap();
        assert_eq!(entry.outcome, DayOutcome::Introduction);
        assert_eq!(entry.view.steps.len(), 4);
        let selectors: Vec<u32> = entry
            .view
            .steps
            .iter()
            .map(|step| step.assignment.game_selector)
            .collect();
        assert_eq!(selectors, vec![1, 0, 2, 2]);

        let stored = journey.persistence().load().await.unwrap();
        assert_eq!(stored.base_seed(), 42);
        assert_eq!(stored.completion_flags().len(), 4);
    }

    #[tokio::test]
    async fn launch_exposes_only_engine_parameters() {
        let mut journey = journey();
        journey.initialize(0).await.unwrap();
        let launch = journey.launch(2).unwrap().unwrap();
        assert_eq!(launch.difficulty, DifficultyLevel::Hard);
        assert_eq!(launch.game_selector, 2);
        assert_eq!(journey.launch(4).unwrap(), None);
    }

    #[tokio::test]
    async fn completing_twice_does_not_double_count() {
        let mut journey = journey();
        journey.initialize(0).await.unwrap();
        journey.complete_challenge(1).await.unwrap();
        let view = journey.complete_challenge(1).await.unwrap();
        assert_eq!(view.completed_count(), 1);
        let view = journey.complete_challenge(9).await.unwrap();
        assert_eq!(view.completed_count(), 1);
    }

    #[tokio::test]
    async fn operations_before_initialize_are_refused() {
        let persistence = KeyValueSessionPersistence::new(MemoryStore::new());
        let saved = SessionRecord::create_empty(30, 777, 4);
        persistence.store(&saved).await.unwrap();

        let mut journey = DailyJourney::new(
            DayConfig::default(),
            persistence,
            FixedSeedSource::new(vec![1]),
        )
        .unwrap();
        assert!(journey.state().is_none());
        assert!(matches!(
            journey.advance_day(31).await,
            Err(JourneyError::NotInitialized)
        ));
        assert!(matches!(
            journey.complete_challenge(0).await,
            Err(JourneyError::NotInitialized)
        ));
        assert!(matches!(journey.view(), Err(JourneyError::NotInitialized)));
        assert!(matches!(journey.launch(0), Err(JourneyError::NotInitialized)));
        assert!(matches!(journey.export(), Err(JourneyError::NotInitialized)));

        let stored = journey.persistence().load().await.unwrap();
        assert!(stored.deep_eq(&saved));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = DayConfig {
            game_pool_size: 0,
            ..DayConfig::default()
        };
        let err = DailyJourney::new(
            config,
            KeyValueSessionPersistence::new(MemoryStore::new()),
            FixedSeedSource::new(vec![1]),
        )
        .unwrap_err();
        assert!(matches!(err, JourneyError::Config(ConfigError::EmptyGamePool)));
    }
}
