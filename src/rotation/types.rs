//! Records produced by the rotation controller.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final classification of one instance's rotation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// A snapshot was created.
    Success,
    /// The provider refused the snapshot.
    Failed,
    /// The sequence was cut short by an unexpected error.
    Error,
}

impl OutcomeStatus {
    /// Lowercase tag used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }
}

/// What happened when quota had to be freed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Eviction {
    /// No snapshot qualified for eviction.
    NoCandidate,
    /// The oldest snapshot was deleted.
    Deleted {
        /// Identifier of the deleted snapshot.
        snapshot_id: String,
    },
    /// The oldest snapshot could not be deleted.
    DeleteFailed {
        /// Identifier of the snapshot that survived.
        snapshot_id: String,
    },
}

/// Result of processing one instance in one run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RotationOutcome {
    /// Provider identifier of the instance.
    pub instance_id: String,
    /// Display name of the instance.
    pub display_name: String,
    /// Name given to the snapshot requested in this run.
    pub snapshot_name: String,
    /// Identifier of the created snapshot, when known.
    pub snapshot_id: Option<String>,
    /// Whether a snapshot was created.
    pub success: bool,
    /// Failure detail for unsuccessful outcomes.
    pub error: Option<String>,
    /// When processing of this instance finished.
    pub completed_at: DateTime<Utc>,
    /// Outcome classification.
    pub status: OutcomeStatus,
    /// Create requests issued for this instance (1 or 2).
    pub attempts: u8,
    /// Eviction performed after a quota hit, if any.
    pub eviction: Option<Eviction>,
}
