//! Versioned, persistable snapshot of a daily session.
//!
//! Records are only built through [`SessionRecord::create`] (or the empty /
//! null constructors), which walks the migration table up to
//! [`LATEST_VERSION`]. Decoded blobs go through the same path, so any record
//! in memory is already at the latest schema.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Schema version written by this build.
pub const LATEST_VERSION: u32 = 1;

/// Completion flags for the current day, one per generated challenge.
pub type CompletionFlags = SmallVec<[bool; 8]>;

/// Errors raised while bringing a record up to the latest schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MigrationError {
    #[error("no migration registered from version {version}")]
    MissingStep { version: u32 },
    #[error("record version {version} is newer than supported version {latest}")]
    UnsupportedVersion { version: u32, latest: u32 },
    #[error("migration from version {version} failed: {reason}")]
    StepFailed { version: u32, reason: String },
    #[error("record field {field} is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Field payload carried between migration steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub game_streak: i32,
    pub starting_day_epoch: i64,
    pub base_seed: i64,
    pub completion_flags: CompletionFlags,
}

/// One schema upgrade, from the version it is registered under to the next.
pub type MigrationStep = fn(RecordFields) -> Result<RecordFields, MigrationError>;

/// Registered upgrades keyed by the version they upgrade from.
const MIGRATIONS: &[(u32, MigrationStep)] = &[(0, migrate_unversioned as MigrationStep)];

/// Blobs written before versioning share the version 1 layout.
#[allow(clippy::unnecessary_wraps)]
fn migrate_unversioned(fields: RecordFields) -> Result<RecordFields, MigrationError> {
    Ok(fields)
}

/// Persistable session snapshot.
///
/// No `PartialEq`: use [`SessionRecord::same_session`]
/// to compare identity (flags excluded) and [`SessionRecord::deep_eq`] when
/// the flag contents matter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionRecord {
    version: u32,
    game_streak: i32,
    starting_day_epoch: i64,
    base_seed: i64,
    completion_flags: CompletionFlags,
}

/// Wire shape accepted when decoding; absent fields fall back to zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredRecord {
    version: u32,
    game_streak: i32,
    starting_day_epoch: i64,
    base_seed: i64,
    completion_flags: CompletionFlags,
}

impl StoredRecord {
    /// Unversioned blob with every identity field zeroed: the encoded null
    /// sentinel. It is never migrated into a real version 1 session.
    const fn is_null_shape(&self) -> bool {
        self.version == 0
            && self.game_streak == 0
            && self.starting_day_epoch == 0
            && self.base_seed == 0
    }
}

impl SessionRecord {
    /// The "no session yet" sentinel.
    #[must_use]
    pub fn null() -> Self {
        Self::default()
    }

    /// Fresh session starting on `starting_day_epoch` with no streak and
    /// `challenge_count` incomplete challenges.
    #[must_use]
    pub fn create_empty(starting_day_epoch: i64, base_seed: i64, challenge_count: usize) -> Self {
        Self {
            version: LATEST_VERSION,
            game_streak: 0,
            starting_day_epoch,
            base_seed,
            completion_flags: SmallVec::from_elem(false, challenge_count),
        }
    }

    /// Build a record written under `version`, migrating it to
    /// [`LATEST_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` when a step is missing or fails, when the
    /// version is newer than this build understands, or when a field can
    /// not be carried forward (negative streak or base seed, or a current day
    /// past the end of the epoch day range).
    pub fn create(
        version: u32,
        game_streak: i32,
        starting_day_epoch: i64,
        base_seed: i64,
        completion_flags: CompletionFlags,
    ) -> Result<Self, MigrationError> {
        let fields = RecordFields {
            game_streak,
            starting_day_epoch,
            base_seed,
            completion_flags,
        };
        let (version, fields) = migrate_with(MIGRATIONS, LATEST_VERSION, version, fields)?;
        if fields.game_streak < 0 {
            return Err(MigrationError::InvalidField {
                field: "game_streak",
                reason: "must not be negative",
            });
        }
        if fields.base_seed < 0 {
            return Err(MigrationError::InvalidField {
                field: "base_seed",
                reason: "must not be negative",
            });
        }
        if fields
            .starting_day_epoch
            .checked_add(i64::from(fields.game_streak))
            .is_none()
        {
            return Err(MigrationError::InvalidField {
                field: "starting_day_epoch",
                reason: "current day falls outside the epoch day range",
            });
        }
        Ok(Self {
            version,
            game_streak: fields.game_streak,
            starting_day_epoch: fields.starting_day_epoch,
            base_seed: fields.base_seed,
            completion_flags: fields.completion_flags,
        })
    }

    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
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

    /// Epoch day the current completion flags belong to.
    ///
    /// [`SessionRecord::create`] rejects records where this would overflow.
    #[must_use]
    pub fn last_saved_day(&self) -> i64 {
        self.starting_day_epoch
            .saturating_add(i64::from(self.game_streak))
    }

    /// Identity comparison: version, streak, starting day and seed.
    #[must_use]
    pub const fn same_session(&self, other: &Self) -> bool {
        self.version == other.version
            && self.game_streak == other.game_streak
            && self.starting_day_epoch == other.starting_day_epoch
            && self.base_seed == other.base_seed
    }

    /// Full comparison including completion flags.
    #[must_use]
    pub fn deep_eq(&self, other: &Self) -> bool {
        self.same_session(other) && self.completion_flags == other.completion_flags
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.version == 0
            && self.game_streak == 0
            && self.starting_day_epoch == 0
            && self.base_seed == 0
    }

    /// Encode the record as a compact JSON blob.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode and migrate a JSON blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the record cannot be
    /// migrated to the latest schema.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let stored: StoredRecord = serde_json::from_str(json)?;
        if stored.is_null_shape() {
            return Ok(Self::null());
        }
        Ok(Self::create(
            stored.version,
            stored.game_streak,
            stored.starting_day_epoch,
            stored.base_seed,
            stored.completion_flags,
        )?)
    }
}

/// Walk `table` from `version` up to `latest`.
///
/// Each iteration applies exactly one registered step and advances the
/// version by one, so the loop ends at `latest` or fails.
///
/// # Errors
///
/// See [`SessionRecord::create`].
pub fn migrate_with(
    table: &[(u32, MigrationStep)],
    latest: u32,
    mut version: u32,
    mut fields: RecordFields,
) -> Result<(u32, RecordFields), MigrationError> {
    if version > latest {
        return Err(MigrationError::UnsupportedVersion { version, latest });
    }
    while version < latest {
        let step = table
            .iter()
            .find(|(from, _)| *from == version)
            .map(|(_, step)| *step)
            .ok_or(MigrationError::MissingStep { version })?;
        fields = step(fields)?;
        version += 1;
    }
    Ok((version, fields))
}
