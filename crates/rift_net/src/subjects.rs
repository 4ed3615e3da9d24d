//! NATS subject hierarchy.
//!
//! All rift subjects are prefixed with `rift.` to namespace within a shared
//! NATS cluster.

use rift_data::ParticipantId;

/// Root prefix for all rift NATS subjects.
pub const PREFIX: &str = "rift";

// ── Session signals (session collaborator → core) ───────────────────────────

/// A participant joined.
pub const SESSION_JOIN: &str = "rift.session.join";

/// A participant left.
pub const SESSION_LEAVE: &str = "rift.session.leave";

/// A participant was defeated through a game-specific channel.
pub const SESSION_DEFEATED: &str = "rift.session.defeated";

/// Core requests termination of a participant's session. Core → session.
pub const SESSION_TERMINATE: &str = "rift.session.terminate";

// ── Record synchronization ──────────────────────────────────────────────────

/// A participant requests a re-send of its record snapshot. Participant → core.
pub const PLAYER_REQUEST: &str = "rift.player.request";

// ── Presentation ────────────────────────────────────────────────────────────

/// Core asks the presentation collaborator to release a visual resource.
pub const PRESENTATION_RELEASE: &str = "rift.presentation.release";

// ── Observation ─────────────────────────────────────────────────────────────

/// Read-only world snapshots for observers. Core → anyone listening.
pub const OBSERVE_STATE: &str = "rift.observe.state";

/// Build the subject carrying record snapshots to one participant.
///
/// `rift.player.sync.<participant id>`
#[must_use]
pub fn player_sync(participant: ParticipantId) -> String {
    format!("rift.player.sync.{}", participant.0)
}
