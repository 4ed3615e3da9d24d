//! NATS inbound fan-in.
//!
//! Session signals and record re-send requests arrive on NATS; the gateway
//! decodes them and delivers session events through the [`SessionBus`] so
//! the binder and the synchronizer see them in a fixed order.

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use rift_data::SyncClient;
use rift_net::codec::decode_message;
use rift_net::messages::{RequestData, SessionSignal};
use rift_net::subjects;
use rift_net::{NatsConnection, NetError, SessionBus, SessionEvent};

/// Build the session bus wired to the simulation and the synchronizer.
///
/// The binder forwarder registers first, the synchronizer second, so an
/// entity spawn is queued before its record load begins.
pub fn build_session_bus(
    binder: mpsc::UnboundedSender<SessionEvent>,
    sync: SyncClient,
) -> SessionBus {
    let mut bus = SessionBus::new();
    bus.subscribe(move |event| {
        let _ = binder.send(event.clone());
    });
    bus.subscribe(move |event| match event {
        SessionEvent::Joined { participant, .. } => {
            sync.joined(*participant);
        }
        SessionEvent::Left { participant } => {
            sync.left(*participant);
        }
        // A defeated participant is still connected; its record stays open.
        SessionEvent::Defeated { .. } => {}
    });
    bus
}

/// Subscribe to the inbound subjects and pump messages until the
/// connection closes.
///
/// # Errors
///
/// Returns [`NetError::Subscribe`] if any subscription fails; decode
/// failures on individual messages are logged and skipped.
pub async fn run(
    conn: NatsConnection,
    mut bus: SessionBus,
    sync: SyncClient,
) -> Result<(), NetError> {
    let subs = conn
        .subscribe_many(&[
            subjects::SESSION_JOIN,
            subjects::SESSION_LEAVE,
            subjects::SESSION_DEFEATED,
            subjects::PLAYER_REQUEST,
        ])
        .await?;
    info!("gateway listening");

    let mut stream = futures::stream::select_all(subs);
    while let Some(msg) = stream.next().await {
        if msg.subject.as_str() == subjects::PLAYER_REQUEST {
            match decode_message::<RequestData>(&msg) {
                Ok(request) => {
                    sync.request(request.participant);
                }
                Err(e) => warn!(error = %e, "malformed request message"),
            }
        } else {
            match decode_message::<SessionSignal>(&msg) {
                Ok(signal) => bus.publish(&signal.into_event()),
                Err(e) => warn!(subject = %msg.subject, error = %e, "malformed session signal"),
            }
        }
    }
    info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use rift_data::{sync_channel, ParticipantId, SyncCommand, Vitality};

    use super::*;

    #[test]
    fn test_bus_feeds_binder_then_synchronizer() {
        let (binder_tx, mut binder_rx) = mpsc::unbounded_channel();
        let (sync, mut commands) = sync_channel();
        let mut bus = build_session_bus(binder_tx, sync);

        let event = SessionEvent::Joined {
            participant: ParticipantId(9),
            vitality: Vitality {
                current: 100.0,
                max: 100.0,
            },
            resource: None,
        };
        bus.publish(&event);
        assert_eq!(binder_rx.try_recv().unwrap(), event);
        assert!(matches!(
            commands.try_recv().unwrap(),
            SyncCommand::Joined(ParticipantId(9))
        ));
    }

    #[test]
    fn test_defeated_does_not_close_the_record() {
        let (binder_tx, mut binder_rx) = mpsc::unbounded_channel();
        let (sync, mut commands) = sync_channel();
        let mut bus = build_session_bus(binder_tx, sync);

        bus.publish(&SessionEvent::Defeated {
            participant: ParticipantId(2),
        });
        assert!(binder_rx.try_recv().is_ok());
        assert!(commands.try_recv().is_err());
    }
}
