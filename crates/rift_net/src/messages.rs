//! Wire message types.
//!
//! All message types derive `Serialize`/`Deserialize` for MessagePack
//! transport via [`codec`](crate::codec).

use serde::{Deserialize, Serialize};

use rift_data::{ParticipantId, PlayerRecord, Vitality};

use crate::session::{ResourceId, SessionEvent};

/// A full record snapshot pushed to its owning participant.
///
/// Sent on load completion and on every update; also re-sent in answer to a
/// [`RequestData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncData {
    /// The record owner.
    pub participant: ParticipantId,
    /// The snapshot.
    pub record: PlayerRecord,
}

/// A participant asks for a re-send of its current record snapshot.
/// Carries no payload beyond the sender's identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequestData {
    /// The requesting participant.
    pub participant: ParticipantId,
}

/// Kind discriminator of a [`SessionSignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionSignalKind {
    /// The participant connected.
    Join,
    /// The participant disconnected.
    Leave,
    /// The participant was defeated.
    Defeated,
}

/// Wire form of a participant lifecycle signal from the session
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSignal {
    /// The participant the signal concerns.
    pub participant: ParticipantId,
    /// What happened.
    pub kind: SessionSignalKind,
    /// Current vitality; only meaningful on [`SessionSignalKind::Join`].
    pub vitality: Option<Vitality>,
    /// Presentation resource id; only meaningful on join, may be absent when
    /// the resource could not be established before the signal.
    pub resource: Option<u64>,
}

impl SessionSignal {
    /// Default seed vitality when a join signal carries none.
    pub const DEFAULT_VITALITY: Vitality = Vitality {
        current: 100.0,
        max: 100.0,
    };

    /// Convert the wire signal into an in-process [`SessionEvent`].
    #[must_use]
    pub fn into_event(self) -> SessionEvent {
        match self.kind {
            SessionSignalKind::Join => SessionEvent::Joined {
                participant: self.participant,
                vitality: self.vitality.unwrap_or(Self::DEFAULT_VITALITY),
                resource: self.resource.map(ResourceId),
            },
            SessionSignalKind::Leave => SessionEvent::Left {
                participant: self.participant,
            },
            SessionSignalKind::Defeated => SessionEvent::Defeated {
                participant: self.participant,
            },
        }
    }
}

/// Core asks the presentation collaborator to release a visual resource
/// whose entity was despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResource {
    /// The externally owned resource to release.
    pub resource: u64,
}

/// One replicated entity inside an [`ObserveState`] snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// The entity id.
    pub entity: u64,
    /// The linked participant, when the entity represents one.
    pub participant: Option<ParticipantId>,
    /// World-space position.
    pub position: [f32; 3],
    /// Current vitality, when the entity carries one.
    pub vitality: Option<Vitality>,
}

/// Read-only world snapshot published to observers by the presentation
/// phase. Carries only entities marked for replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserveState {
    /// The presentation tick the snapshot was taken on.
    pub tick: u64,
    /// Replicated entities.
    pub entities: Vec<EntityState>,
}

/// Core asks the session collaborator to disconnect a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminate {
    /// The participant to disconnect.
    pub participant: ParticipantId,
    /// User-visible reason.
    pub reason: String,
}
