//! Observer mirror of participant records.
//!
//! A read-optimized copy of the authoritative records, keyed by participant
//! id and visible to remote observers. Pure key-value surface: last write
//! wins, no ordering guarantees beyond that.

use std::sync::Arc;

use dashmap::DashMap;

use crate::record::{ParticipantId, PlayerRecord};

/// Shared observer-visible record mirror. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MirrorStore {
    inner: Arc<DashMap<ParticipantId, PlayerRecord>>,
}

impl MirrorStore {
    /// Create an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a participant's mirrored record.
    pub fn set(&self, participant: ParticipantId, record: PlayerRecord) {
        self.inner.insert(participant, record);
    }

    /// Returns a copy of a participant's mirrored record.
    #[must_use]
    pub fn get(&self, participant: ParticipantId) -> Option<PlayerRecord> {
        self.inner.get(&participant).map(|entry| entry.clone())
    }

    /// Remove a participant's mirror entry. No-op when absent.
    pub fn remove(&self, participant: ParticipantId) {
        self.inner.remove(&participant);
    }

    /// Number of mirrored participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` when no records are mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
