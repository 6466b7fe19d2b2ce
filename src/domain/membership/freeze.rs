//! Freeze episodes and the freeze-status projection.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::MembershipStatus;

/// One completed freeze episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeRecord {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_days: i64,
}

/// Result of ending a freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnfreezeOutcome {
    pub duration_days: i64,
    /// Days credited to the end date (capped).
    pub extension_days: i64,
    pub new_end_date: Timestamp,
}

/// Read-only view of a membership's freeze state.
///
/// The two optional figures are present only while Frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeStatus {
    pub status: MembershipStatus,
    pub freeze_start_date: Option<Timestamp>,
    pub freeze_history: Vec<FreezeRecord>,
    pub current_freeze_duration_days: Option<i64>,
    pub remaining_freeze_days: Option<i64>,
}
