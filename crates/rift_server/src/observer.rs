//! Observer snapshot publishing.
//!
//! A presentation-phase system collects the replicated entities into an
//! [`ObserveState`] and queues it; a spawned task publishes the queue over
//! NATS. The system itself never suspends, keeping world access inside the
//! scheduled execution window. The queue is bounded: while the publisher is
//! stalled, snapshots are shed rather than buffered.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use rift_data::Vitality;
use rift_ecs::World;
use rift_game::{Health, PlayerLink, Replicated, Transform};
use rift_loop::SystemContext;
use rift_net::messages::{EntityState, ObserveState};
use rift_net::{subjects, NatsConnection};

/// Queue depth between the snapshot system and the NATS publisher. Snapshots
/// supersede each other, so a stalled publisher sheds the newest instead of
/// buffering without bound.
pub const SNAPSHOT_BUFFER: usize = 8;

/// Build the presentation-phase snapshot system.
pub fn observe_system(
    snapshots: mpsc::Sender<ObserveState>,
) -> impl FnMut(&mut World, &mut SystemContext) + Send {
    move |world, ctx| {
        let entities = world
            .query()
            .with::<Replicated>()
            .ids()
            .into_iter()
            .map(|entity| EntityState {
                entity: entity.id(),
                participant: world.get::<PlayerLink>(entity).map(|l| l.participant),
                position: world
                    .get::<Transform>(entity)
                    .map_or([0.0; 3], |t| t.position.to_array()),
                vitality: world.get::<Health>(entity).map(|h| Vitality {
                    current: h.current,
                    max: h.max,
                }),
            })
            .collect();
        let state = ObserveState {
            tick: ctx.tick_id,
            entities,
        };
        if let Err(mpsc::error::TrySendError::Full(state)) = snapshots.try_send(state) {
            debug!(tick = state.tick, "snapshot queue full; dropping snapshot");
        }
    }
}

/// Publish queued snapshots until the simulation stops.
pub async fn publish_snapshots(conn: NatsConnection, mut snapshots: mpsc::Receiver<ObserveState>) {
    while let Some(state) = snapshots.recv().await {
        if let Err(e) = conn.publish(subjects::OBSERVE_STATE, &state).await {
            warn!(error = %e, "snapshot publish failed");
        }
    }
}
