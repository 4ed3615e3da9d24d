//! The simulation facade.
//!
//! Owns the scheduler and wires the core game systems into the primary
//! phase. Initialization is explicit and idempotent: the first call
//! schedules everything, a second call reports [`SimError::AlreadyInitialized`]
//! without scheduling anything twice.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use rift_ecs::World;
use rift_loop::{LoopHandle, Phase, SimLoop, SystemContext, TickSource, SIMULATION};
use rift_net::SessionEvent;

use crate::binder::Binder;
use crate::systems::{damage_system, movement_system, reaper_system, regen_system, PresentationSink};

/// Simulation facade errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    /// [`Simulation::initialize`] was called twice on the same instance.
    #[error("simulation is already initialized")]
    AlreadyInitialized,
}

/// Owns the world and the scheduler, and composes the core systems.
pub struct Simulation {
    sim: SimLoop,
    initialized: bool,
}

impl Simulation {
    /// An empty, uninitialized simulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sim: SimLoop::new(),
            initialized: false,
        }
    }

    /// Schedule the core systems onto the primary phase, in resolution
    /// order: binder, movement, damage, regen, reaper.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AlreadyInitialized`] on a second call; nothing is
    /// scheduled twice.
    pub fn initialize<S: PresentationSink>(
        &mut self,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        sink: S,
    ) -> Result<(), SimError> {
        if self.initialized {
            warn!("simulation initialize called twice");
            return Err(SimError::AlreadyInitialized);
        }
        self.initialized = true;

        let binder = Binder::new(events);
        self.sim.schedule(SIMULATION, "binder", binder.into_system());
        self.sim.schedule(SIMULATION, "movement", movement_system);
        self.sim.schedule(SIMULATION, "damage", damage_system);
        self.sim.schedule(SIMULATION, "regen", regen_system);
        self.sim.schedule(SIMULATION, "reaper", reaper_system(sink));
        info!("simulation initialized");
        Ok(())
    }

    /// Whether [`Simulation::initialize`] has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Append a system to a phase; late additions take effect from the next
    /// tick of that phase.
    pub fn add_system<F>(&mut self, phase: Phase, name: impl Into<String>, system: F)
    where
        F: FnMut(&mut World, &mut SystemContext) + Send + 'static,
    {
        self.sim.schedule(phase, name, system);
    }

    /// Read access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        self.sim.world()
    }

    /// Mutable access to the world.
    pub fn world_mut(&mut self) -> &mut World {
        self.sim.world_mut()
    }

    /// Run one synchronous tick of `phase`. Test and embedding harnesses
    /// drive the simulation with this; production uses [`Simulation::begin`].
    pub fn step(&mut self, phase: Phase, dt: f64) {
        self.sim.step(phase, dt);
    }

    /// Hand the simulation to the async tick loop.
    #[must_use]
    pub fn begin(self, sources: Vec<(Phase, TickSource)>) -> LoopHandle {
        self.sim.begin(sources)
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rift_data::{ParticipantId, Vitality};
    use rift_net::ResourceId;

    use crate::components::{Damage, Dead, Health};

    use super::*;

    const TICK: f64 = 1.0 / 60.0;

    struct Harness {
        sim: Simulation,
        events: mpsc::UnboundedSender<SessionEvent>,
        released: Arc<Mutex<Vec<ResourceId>>>,
    }

    fn harness() -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let released = Arc::clone(&released);
            move |resource| released.lock().unwrap().push(resource)
        };
        let mut sim = Simulation::new();
        sim.initialize(rx, sink).unwrap();
        Harness {
            sim,
            events: tx,
            released,
        }
    }

    fn join(harness: &Harness, id: u64) {
        harness
            .events
            .send(SessionEvent::Joined {
                participant: ParticipantId(id),
                vitality: Vitality {
                    current: 100.0,
                    max: 100.0,
                },
                resource: Some(ResourceId(id)),
            })
            .unwrap();
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let (_tx2, rx2) = mpsc::unbounded_channel();
        let mut sim = Simulation::new();
        assert!(sim.initialize(rx, |_: ResourceId| {}).is_ok());
        assert_eq!(
            sim.initialize(rx2, |_: ResourceId| {}),
            Err(SimError::AlreadyInitialized)
        );
        assert!(sim.is_initialized());
    }

    #[test]
    fn test_join_damage_death_reap_lifecycle() {
        let mut h = harness();
        join(&h, 1);
        h.sim.step(SIMULATION, TICK);

        let entity = crate::binder::Binder::entity_of(h.sim.world(), ParticipantId(1)).unwrap();
        assert_eq!(
            *h.sim.world().get::<Health>(entity).unwrap(),
            Health::new(100.0, 100.0)
        );

        // Non-lethal hit: health drops, damage is consumed, entity lives.
        h.sim.world_mut().insert(
            entity,
            Damage {
                amount: 30.0,
                source: None,
            },
        );
        h.sim.step(SIMULATION, TICK);
        assert_eq!(h.sim.world().get::<Health>(entity).unwrap().current, 70.0);
        assert!(!h.sim.world().has::<Damage>(entity));
        assert!(!h.sim.world().has::<Dead>(entity));

        // Lethal hit: clamped at zero, tagged dead, reaped in the same tick's
        // reaper pass since scheduling places the reaper after damage.
        h.sim.world_mut().insert(
            entity,
            Damage {
                amount: 100.0,
                source: None,
            },
        );
        h.sim.step(SIMULATION, TICK);
        assert!(!h.sim.world().contains(entity));
        assert_eq!(*h.released.lock().unwrap(), vec![ResourceId(1)]);
    }

    #[test]
    fn test_second_join_does_not_duplicate() {
        let mut h = harness();
        join(&h, 1);
        join(&h, 1);
        h.sim.step(SIMULATION, TICK);
        let links = h
            .sim
            .world()
            .query()
            .with::<crate::components::PlayerLink>()
            .ids();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn test_leave_removes_entity() {
        let mut h = harness();
        join(&h, 4);
        h.sim.step(SIMULATION, TICK);
        h.events
            .send(SessionEvent::Left {
                participant: ParticipantId(4),
            })
            .unwrap();
        h.sim.step(SIMULATION, TICK);
        assert!(crate::binder::Binder::entity_of(h.sim.world(), ParticipantId(4)).is_none());
    }

    #[test]
    fn test_late_added_system_runs_on_next_tick() {
        let mut h = harness();
        let hits = Arc::new(Mutex::new(0));
        {
            let hits = Arc::clone(&hits);
            h.sim.add_system(SIMULATION, "probe", move |_world, _ctx| {
                *hits.lock().unwrap() += 1;
            });
        }
        h.sim.step(SIMULATION, TICK);
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
