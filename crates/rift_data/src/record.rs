//! Durable per-participant records.
//!
//! A [`PlayerRecord`] is the persisted game progress for one participant,
//! identified by a stable [`ParticipantId`]. `joined_at == 0` is the
//! never-stamped sentinel; the synchronizer stamps and persists the current
//! time on the first-ever load.

use serde::{Deserialize, Serialize};

/// Stable identity of a connected participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantId(pub u64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "participant({})", self.0)
    }
}

/// A participant's current and maximum vitality, carried on the join signal
/// and used to seed the spawned entity's health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitality {
    /// Current vitality.
    pub current: f32,
    /// Maximum vitality.
    pub max: f32,
}

/// Durable game-progress data for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Unix timestamp of the first-ever join; 0 means never stamped.
    pub joined_at: u64,
    /// Progression level, starts at 1.
    pub level: u32,
    /// Soft currency balance.
    pub coins: u64,
}

/// The seed record written when a participant has no stored data yet.
#[must_use]
pub fn default_record() -> PlayerRecord {
    PlayerRecord {
        joined_at: 0,
        level: 1,
        coins: 0,
    }
}

/// Schema predicate applied to loaded records before they are considered
/// valid. A record that fails is treated like a failed load.
#[must_use]
pub fn validate_record(record: &PlayerRecord) -> bool {
    record.level >= 1
}

/// Durable-store key for a participant's record, namespaced per id.
#[must_use]
pub fn record_key(participant: ParticipantId) -> String {
    format!("player_{}", participant.0)
}
