//! Participant lifecycle binder.
//!
//! Translates session signals into entity lifecycle: a join spawns exactly
//! one participant-linked entity, a leave or defeat despawns it. Signals are
//! queued on an unbounded channel and drained inside the simulation phase,
//! so the world is only ever mutated from a scheduled system's execution
//! window.

use std::collections::HashMap;

use glam::Vec3;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use rift_data::{ParticipantId, Vitality};
use rift_ecs::{Entity, World};
use rift_loop::SystemContext;
use rift_net::{ResourceId, SessionEvent};

use crate::components::{Health, PlayerLink, Renderable, Replicated, Transform};

/// Spawns and despawns participant-linked entities from session signals.
///
/// Exactly one entity carries a given participant id at a time. The `bound`
/// map is the binder's index for duplicate-join checks and unbind lookups;
/// the world stays authoritative, so an entity despawned elsewhere (a reaped
/// death) does not block a later rejoin.
pub struct Binder {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    bound: HashMap<ParticipantId, Entity>,
    spawn_point: Vec3,
}

impl Binder {
    /// Build a binder draining `events`.
    #[must_use]
    pub fn new(events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            events,
            bound: HashMap::new(),
            spawn_point: Vec3::ZERO,
        }
    }

    /// The entity this binder has bound to `participant`, if any.
    #[must_use]
    pub fn bound_entity(&self, participant: ParticipantId) -> Option<Entity> {
        self.bound.get(&participant).copied()
    }

    /// Override the position newly bound entities spawn at.
    #[must_use]
    pub fn with_spawn_point(mut self, spawn_point: Vec3) -> Self {
        self.spawn_point = spawn_point;
        self
    }

    /// The entity currently linked to `participant`, if any.
    #[must_use]
    pub fn entity_of(world: &World, participant: ParticipantId) -> Option<Entity> {
        world
            .query()
            .with::<PlayerLink>()
            .ids()
            .into_iter()
            .find(|&e| {
                world
                    .get::<PlayerLink>(e)
                    .is_some_and(|link| link.participant == participant)
            })
    }

    /// Apply one session signal to the world.
    pub fn handle_event(&mut self, world: &mut World, event: SessionEvent) {
        match event {
            SessionEvent::Joined {
                participant,
                vitality,
                resource,
            } => self.handle_join(world, participant, vitality, resource),
            SessionEvent::Left { participant } => {
                self.handle_unbind(world, participant, "left");
            }
            SessionEvent::Defeated { participant } => {
                self.handle_unbind(world, participant, "defeated");
            }
        }
    }

    fn handle_join(
        &mut self,
        world: &mut World,
        participant: ParticipantId,
        vitality: Vitality,
        resource: Option<ResourceId>,
    ) {
        if self
            .bound
            .get(&participant)
            .is_some_and(|&e| world.contains(e))
        {
            warn!(%participant, "join for an already-bound participant ignored");
            return;
        }
        let entity = world.spawn();
        world.insert(entity, PlayerLink { participant });
        world.insert(entity, Transform::at(self.spawn_point));
        world.insert(entity, Health::new(vitality.current, vitality.max));
        world.insert(entity, Replicated);
        // The presentation link may be absent when the participant
        // disconnected before the resource was established; the spawn still
        // completes.
        if let Some(resource) = resource {
            world.insert(entity, Renderable { resource });
        }
        self.bound.insert(participant, entity);
        debug!(%participant, entity = entity.id(), "participant bound");
    }

    fn handle_unbind(&mut self, world: &mut World, participant: ParticipantId, cause: &str) {
        let Some(entity) = self.bound.remove(&participant) else {
            debug!(%participant, cause, "unbind with no linked entity");
            return;
        };
        // The entity may already be gone when a defeat was reaped before the
        // session signal arrived.
        world.despawn(entity);
        debug!(%participant, entity = entity.id(), cause, "participant unbound");
    }

    /// Drain every queued signal into the world.
    pub fn drain(&mut self, world: &mut World) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(world, event);
        }
    }

    /// Turn the binder into a schedulable system.
    #[must_use]
    pub fn into_system(mut self) -> impl FnMut(&mut World, &mut SystemContext) + Send {
        move |world, _ctx| self.drain(world)
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("bound", &self.bound)
            .field("spawn_point", &self.spawn_point)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rift_net::ResourceId;

    use super::*;

    fn binder() -> (mpsc::UnboundedSender<SessionEvent>, Binder) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Binder::new(rx))
    }

    fn joined(id: u64, current: f32, max: f32) -> SessionEvent {
        SessionEvent::Joined {
            participant: ParticipantId(id),
            vitality: Vitality { current, max },
            resource: Some(ResourceId(id)),
        }
    }

    #[test]
    fn test_join_spawns_linked_entity_with_seeded_health() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(1, 80.0, 120.0));

        let entity = Binder::entity_of(&world, ParticipantId(1)).unwrap();
        let health = world.get::<Health>(entity).unwrap();
        assert_eq!(health.current, 80.0);
        assert_eq!(health.max, 120.0);
        assert!(world.has::<Transform>(entity));
        assert!(world.has::<Replicated>(entity));
        assert_eq!(
            world.get::<Renderable>(entity).unwrap().resource,
            ResourceId(1)
        );
    }

    #[test]
    fn test_duplicate_join_spawns_nothing() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let links = world.query().with::<PlayerLink>().ids();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_join_without_resource_still_completes() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(
            &mut world,
            SessionEvent::Joined {
                participant: ParticipantId(2),
                vitality: Vitality {
                    current: 100.0,
                    max: 100.0,
                },
                resource: None,
            },
        );
        let entity = Binder::entity_of(&world, ParticipantId(2)).unwrap();
        assert!(!world.has::<Renderable>(entity));
    }

    #[test]
    fn test_leave_despawns_and_is_noop_when_absent() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let entity = Binder::entity_of(&world, ParticipantId(1)).unwrap();

        binder.handle_event(
            &mut world,
            SessionEvent::Left {
                participant: ParticipantId(1),
            },
        );
        assert!(!world.contains(entity));

        // A second leave finds nothing and completes quietly.
        binder.handle_event(
            &mut world,
            SessionEvent::Left {
                participant: ParticipantId(1),
            },
        );
    }

    #[test]
    fn test_defeated_despawns_linked_entity() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(3, 100.0, 100.0));
        binder.handle_event(
            &mut world,
            SessionEvent::Defeated {
                participant: ParticipantId(3),
            },
        );
        assert!(Binder::entity_of(&world, ParticipantId(3)).is_none());
    }

    #[test]
    fn test_bound_entity_tracks_the_lifecycle() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        assert!(binder.bound_entity(ParticipantId(1)).is_none());

        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let entity = binder.bound_entity(ParticipantId(1)).unwrap();
        assert_eq!(Binder::entity_of(&world, ParticipantId(1)), Some(entity));

        binder.handle_event(
            &mut world,
            SessionEvent::Left {
                participant: ParticipantId(1),
            },
        );
        assert!(binder.bound_entity(ParticipantId(1)).is_none());
    }

    #[test]
    fn test_rejoin_after_external_despawn_binds_again() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let first = binder.bound_entity(ParticipantId(1)).unwrap();

        // A reaped death despawns the entity without going through the
        // binder; the stale binding must not block the rejoin.
        world.despawn(first);
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let second = binder.bound_entity(ParticipantId(1)).unwrap();
        assert_ne!(first, second);
        assert!(world.contains(second));
    }

    #[test]
    fn test_rejoin_after_leave_binds_a_fresh_entity() {
        let (_tx, mut binder) = binder();
        let mut world = World::new();
        binder.handle_event(&mut world, joined(1, 100.0, 100.0));
        let first = Binder::entity_of(&world, ParticipantId(1)).unwrap();
        binder.handle_event(
            &mut world,
            SessionEvent::Left {
                participant: ParticipantId(1),
            },
        );
        binder.handle_event(&mut world, joined(1, 60.0, 100.0));
        let second = Binder::entity_of(&world, ParticipantId(1)).unwrap();
        assert_ne!(first, second);
        assert_eq!(world.get::<Health>(second).unwrap().current, 60.0);
    }
}
