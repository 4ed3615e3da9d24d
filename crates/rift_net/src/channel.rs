//! NATS-backed collaborator implementations.
//!
//! [`NatsSyncChannel`] pushes record snapshots to their owning participant;
//! [`NatsSessionControl`] asks the session collaborator to disconnect a
//! participant. Both are thin adapters over [`NatsConnection`].

use tracing::warn;

use rift_data::{ParticipantId, PlayerRecord, SessionControl, SyncChannel};

use crate::connection::NatsConnection;
use crate::messages::{SyncData, Terminate};
use crate::subjects;

/// Outbound record-snapshot channel over NATS.
#[derive(Debug, Clone)]
pub struct NatsSyncChannel {
    conn: NatsConnection,
}

impl NatsSyncChannel {
    /// Wrap a connection.
    #[must_use]
    pub fn new(conn: NatsConnection) -> Self {
        Self { conn }
    }
}

impl SyncChannel for NatsSyncChannel {
    async fn push(&self, participant: ParticipantId, record: &PlayerRecord) {
        let message = SyncData {
            participant,
            record: record.clone(),
        };
        let subject = subjects::player_sync(participant);
        if let Err(e) = self.conn.publish(&subject, &message).await {
            // Push failures are not fatal: the participant can re-request.
            warn!(%participant, error = %e, "record push failed");
        }
    }
}

/// Session termination over NATS.
#[derive(Debug, Clone)]
pub struct NatsSessionControl {
    conn: NatsConnection,
}

impl NatsSessionControl {
    /// Wrap a connection.
    #[must_use]
    pub fn new(conn: NatsConnection) -> Self {
        Self { conn }
    }
}

impl SessionControl for NatsSessionControl {
    fn terminate(&self, participant: ParticipantId, reason: &str) {
        let conn = self.conn.clone();
        let message = Terminate {
            participant,
            reason: reason.to_string(),
        };
        tokio::spawn(async move {
            if let Err(e) = conn.publish(subjects::SESSION_TERMINATE, &message).await {
                warn!(participant = %message.participant, error = %e, "terminate publish failed");
            }
        });
    }
}
