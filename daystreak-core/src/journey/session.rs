use serde::{Deserialize, Serialize};

use crate::record::{CompletionFlags, MigrationError, SessionRecord};
use crate::seed::derive_day_seed;

/// Outcome of moving the session to a new realtime day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// Same day as the last save; nothing changed.
    Remains,
    /// Next day after a fully completed one; streak advanced and flags cleared.
    Continues,
    /// Gap, regression, or unfinished previous day. State is untouched and
    /// the caller decides whether to reset.
    Broken,
}

/// Mutable owner of the live session.
///
/// All streak bookkeeping happens here; persistence only ever sees the
/// snapshots produced by [`SessionState::export_session`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    version: u32,
    game_streak: i32,
    starting_day_epoch: i64,
    base_seed: i64,
    completion_flags: CompletionFlags,
}

impl SessionState {
    /// Build live state from a record.
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        let mut state = Self::default();
        state.load_session(record);
        state
    }

    /// Replace every field with the contents of `record`.
    pub fn load_session(&mut self, record: &SessionRecord) {
        *self = Self {
            version: record.version(),
            game_streak: record.game_streak(),
            starting_day_epoch: record.starting_day_epoch(),
            base_seed: record.base_seed(),
            completion_flags: CompletionFlags::from_slice(record.completion_flags()),
        };
    }

    /// Snapshot the live state at the latest schema version.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if the loaded version cannot be carried
    /// forward to the latest schema.
    pub fn export_session(&self) -> Result<SessionRecord, MigrationError> {
        SessionRecord::create(
            self.version,
            self.game_streak,
            self.starting_day_epoch,
            self.base_seed,
            self.completion_flags.clone(),
        )
    }

    /// Advance to `new_day` and report how the streak reacted.
    ///
    /// A day too far from the last saved day to measure, or a streak that
    /// can not grow any further, counts as a break.
    pub fn set_realtime_day(&mut self, new_day: i64) -> StreakTransition {
        let delta = new_day.checked_sub(self.last_saved_day());
        if delta == Some(0) {
            log::debug!("realtime day {new_day} unchanged; streak remains");
            return StreakTransition::Remains;
        }
        if delta == Some(1) && self.all_completed() {
            if let Some(next_streak) = self.game_streak.checked_add(1) {
                self.completion_flags.fill(false);
                self.game_streak = next_streak;
                log::debug!("realtime day {new_day} continues streak at {next_streak}");
                return StreakTransition::Continues;
            }
            log::warn!("streak counter exhausted at {}", self.game_streak);
        }
        log::debug!(
            "realtime day {new_day} breaks streak of {} (delta {delta:?})",
            self.game_streak
        );
        StreakTransition::Broken
    }

    /// Mark the challenge at `index` complete. Indices outside the flag
    /// array are ignored.
    pub fn set_game_index_completed(&mut self, index: i64) {
        let Ok(slot) = usize::try_from(index) else {
            return;
        };
        if let Some(flag) = self.completion_flags.get_mut(slot) {
            *flag = true;
        }
    }

    /// Resize the flag array to `count`, keeping existing entries.
    /// Returns whether the length changed.
    pub fn reconcile_completion(&mut self, count: usize) -> bool {
        if self.completion_flags.len() == count {
            return false;
        }
        self.completion_flags.resize(count, false);
        true
    }

    #[must_use]
    pub fn completed_game_count(&self) -> usize {
        self.completion_flags.iter().filter(|done| **done).count()
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.completion_flags.iter().all(|done| *done)
    }

    #[must_use]
    pub const fn game_streak(&self) -> i32 {
        self.game_streak
    }

    #[must_use]
    pub const fn starting_day_epoch(&self) -> i64 {
        self.starting_day_epoch
    }

    #[must_use]
    pub const fn base_seed(&self) -> i64 {
        self.base_seed
    }

    #[must_use]
    pub fn completion_flags(&self) -> &[bool] {
        &self.completion_flags
    }

    /// Epoch day the completion flags belong to.
    #[must_use]
    pub fn last_saved_day(&self) -> i64 {
        self.starting_day_epoch
            .saturating_add(i64::from(self.game_streak))
    }

    #[must_use]
    pub fn seed_for_last_saved_day(&self) -> i32 {
        derive_day_seed(self.base_seed, self.last_saved_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LATEST_VERSION;
    use smallvec::smallvec;

    fn two_day_streak() -> SessionState {
        let record =
            SessionRecord::create(LATEST_VERSION, 2, 100, 42, smallvec![true, true, true, true])
                .unwrap();
        SessionState::from_record(&record)
    }

    #[test]
    fn same_day_remains() {
        let mut state = two_day_streak();
        let before = state.clone();
        assert_eq!(state.set_realtime_day(102), StreakTransition::Remains);
        assert_eq!(state, before);
    }

    #[test]
    fn next_day_after_full_completion_continues() {
        let mut state = two_day_streak();
        assert_eq!(state.set_realtime_day(103), StreakTransition::Continues);
        assert_eq!(state.game_streak(), 3);
        assert_eq!(state.last_saved_day(), 103);
        assert_eq!(state.completion_flags(), &[false, false, false, false]);
    }

    #[test]
    fn gap_after_continue_breaks_without_mutation() {
        let mut state = two_day_streak();
        state.set_realtime_day(103);
        let before = state.clone();
        assert_eq!(state.set_realtime_day(105), StreakTransition::Broken);
        assert_eq!(state, before);
        assert_eq!(state.game_streak(), 3);
    }

    #[test]
    fn regression_breaks_without_mutation() {
        let mut state = two_day_streak();
        let before = state.clone();
        assert_eq!(state.set_realtime_day(101), StreakTransition::Broken);
        assert_eq!(state, before);
    }

    #[test]
    fn incomplete_previous_day_breaks() {
        let record =
            SessionRecord::create(LATEST_VERSION, 0, 10, 1, smallvec![true, false]).unwrap();
        let mut state = SessionState::from_record(&record);
        assert_eq!(state.set_realtime_day(11), StreakTransition::Broken);
        assert_eq!(state.completion_flags(), &[true, false]);
    }

    #[test]
    fn unmeasurable_day_gap_breaks() {
        let mut state = two_day_streak();
        let before = state.clone();
        assert_eq!(state.set_realtime_day(i64::MIN), StreakTransition::Broken);
        assert_eq!(state, before);

        let far_future =
            SessionRecord::create(LATEST_VERSION, 0, -10, 1, smallvec![true]).unwrap();
        let mut state = SessionState::from_record(&far_future);
        assert_eq!(state.set_realtime_day(i64::MAX), StreakTransition::Broken);
    }

    #[test]
    fn exhausted_streak_counter_breaks_instead_of_wrapping() {
        let record =
            SessionRecord::create(LATEST_VERSION, i32::MAX, 0, 1, smallvec![true]).unwrap();
        let mut state = SessionState::from_record(&record);
        let before = state.clone();
        let next_day = i64::from(i32::MAX) + 1;
        assert_eq!(state.set_realtime_day(next_day), StreakTransition::Broken);
        assert_eq!(state, before);
    }

    #[test]
    fn out_of_range_completion_is_ignored() {
        let record = SessionRecord::create_empty(5, 9, 3);
        let mut state = SessionState::from_record(&record);
        state.set_game_index_completed(-1);
        state.set_game_index_completed(3);
        assert_eq!(state.completion_flags(), &[false, false, false]);
        state.set_game_index_completed(1);
        assert_eq!(state.completion_flags(), &[false, true, false]);
        assert_eq!(state.completed_game_count(), 1);
    }

    #[test]
    fn export_then_load_preserves_data() {
        let mut state = two_day_streak();
        state.set_realtime_day(103);
        state.set_game_index_completed(2);
        let exported = state.export_session().unwrap();
        assert_eq!(exported.version(), LATEST_VERSION);

        let reloaded = SessionState::from_record(&exported);
        assert_eq!(reloaded, state);
        assert!(exported.deep_eq(&reloaded.export_session().unwrap()));
    }

    #[test]
    fn export_from_default_state_upgrades_version() {
        let state = SessionState::default();
        let exported = state.export_session().unwrap();
        assert_eq!(exported.version(), LATEST_VERSION);
    }

    #[test]
    fn reconcile_keeps_prefix() {
        let record =
            SessionRecord::create(LATEST_VERSION, 0, 0, 1, smallvec![true, false, true]).unwrap();
        let mut state = SessionState::from_record(&record);
        assert!(state.reconcile_completion(5));
        assert_eq!(state.completion_flags(), &[true, false, true, false, false]);
        assert!(!state.reconcile_completion(5));
        assert!(state.reconcile_completion(2));
        assert_eq!(state.completion_flags(), &[true, false]);
    }

    #[test]
    fn seed_for_day_follows_streak() {
        let state = two_day_streak();
        assert_eq!(state.seed_for_last_saved_day(), derive_day_seed(42, 102));
    }
}
