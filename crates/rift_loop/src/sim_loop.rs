//! The simulation loop: phase registry and tick execution.
//!
//! [`SimLoop`] owns the [`World`] and an ordered system list per phase.
//! Registration order is execution order; scheduling is append-only and
//! performs no duplicate checks. [`SimLoop::step`] runs one tick of one
//! phase synchronously; [`SimLoop::begin`] moves the loop onto a task and
//! drives every phase from its bound [`TickSource`], serializing all phases
//! against each other.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use rift_ecs::World;

use crate::context::{SystemContext, ThrottleStore};
use crate::phase::{Phase, SIMULATION};
use crate::source::TickSource;

/// A scheduled system body.
pub type SystemFn = Box<dyn FnMut(&mut World, &mut SystemContext<'_>) + Send>;

struct ScheduledSystem {
    name: String,
    run: SystemFn,
    throttles: ThrottleStore,
}

#[derive(Default)]
struct PhaseState {
    systems: Vec<ScheduledSystem>,
    tick_id: u64,
    clock: f64,
}

/// Commands applied by a running loop between ticks.
enum LoopCommand {
    Schedule {
        phase: Phase,
        name: String,
        system: SystemFn,
    },
}

/// The simulation loop.
pub struct SimLoop {
    world: World,
    phases: std::collections::HashMap<Phase, PhaseState>,
}

impl SimLoop {
    /// Create a loop with an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_world(World::new())
    }

    /// Create a loop around an existing world.
    #[must_use]
    pub fn with_world(world: World) -> Self {
        Self {
            world,
            phases: std::collections::HashMap::new(),
        }
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Append a system to a phase's ordered list.
    ///
    /// Registration order is execution order. No reordering, no duplicate
    /// detection — scheduling the same body twice runs it twice.
    pub fn schedule<F>(&mut self, phase: Phase, name: impl Into<String>, system: F)
    where
        F: FnMut(&mut World, &mut SystemContext<'_>) + Send + 'static,
    {
        self.schedule_boxed(phase, name.into(), Box::new(system));
    }

    fn schedule_boxed(&mut self, phase: Phase, name: String, system: SystemFn) {
        debug!(%phase, system = %name, "system scheduled");
        self.phases
            .entry(phase)
            .or_default()
            .systems
            .push(ScheduledSystem {
                name,
                run: system,
                throttles: ThrottleStore::default(),
            });
    }

    /// Returns the number of systems scheduled to a phase.
    #[must_use]
    pub fn system_count(&self, phase: Phase) -> usize {
        self.phases.get(&phase).map_or(0, |p| p.systems.len())
    }

    /// Returns a phase's tick counter.
    #[must_use]
    pub fn tick_id(&self, phase: Phase) -> u64 {
        self.phases.get(&phase).map_or(0, |p| p.tick_id)
    }

    /// Run one tick of `phase`: every currently scheduled system, in
    /// registration order, synchronously to completion.
    ///
    /// A tick of an unknown phase is a no-op. After a [`SIMULATION`] tick the
    /// world's retained change records are dropped.
    pub fn step(&mut self, phase: Phase, dt: f64) {
        let Some(state) = self.phases.get_mut(&phase) else {
            return;
        };
        state.tick_id += 1;
        state.clock += dt;
        let tick_id = state.tick_id;
        let clock = state.clock;

        debug!(%phase, tick_id, dt, systems = state.systems.len(), "tick start");

        // Index loop: the system list may not shrink, and appends only take
        // effect on the next tick.
        let count = state.systems.len();
        for i in 0..count {
            let ScheduledSystem {
                name,
                run,
                throttles,
            } = &mut state.systems[i];
            let mut ctx = SystemContext::new(tick_id, dt, clock, throttles);
            let _span = tracing::debug_span!("system", system = %name).entered();
            run(&mut self.world, &mut ctx);
        }

        if phase == SIMULATION {
            self.world.clear_changes();
        }
    }

    /// Bind phases to tick sources and drive the loop on a spawned task.
    ///
    /// Each received tick runs [`SimLoop::step`] for its phase; ticks from
    /// distinct phases are serialized through one task, so phases never
    /// mutate the world concurrently. Systems scheduled through the returned
    /// [`LoopHandle`] are appended between ticks and first run on the next
    /// tick of their phase.
    #[must_use]
    pub fn begin(mut self, sources: Vec<(Phase, TickSource)>) -> LoopHandle {
        let (cmd_tx, mut commands) = mpsc::unbounded_channel::<LoopCommand>();
        let (tick_tx, mut ticks) = mpsc::unbounded_channel::<(Phase, f64)>();

        info!(phases = sources.len(), "loop starting");
        for (phase, source) in sources {
            source.forward(phase, tick_tx.clone());
        }
        drop(tick_tx);

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    cmd = commands.recv() => {
                        match cmd {
                            Some(LoopCommand::Schedule { phase, name, system }) => {
                                self.schedule_boxed(phase, name, system);
                            }
                            // Handle dropped: ticks keep the loop alive.
                            None => {
                                while let Some((phase, dt)) = ticks.recv().await {
                                    self.step(phase, dt);
                                }
                                break;
                            }
                        }
                    }
                    tick = ticks.recv() => {
                        match tick {
                            Some((phase, dt)) => self.step(phase, dt),
                            None => break,
                        }
                    }
                }
            }
            info!("loop stopped");
            self
        });

        LoopHandle {
            commands: cmd_tx,
            join,
        }
    }
}

impl Default for SimLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running loop started with [`SimLoop::begin`].
pub struct LoopHandle {
    commands: mpsc::UnboundedSender<LoopCommand>,
    join: tokio::task::JoinHandle<SimLoop>,
}

impl LoopHandle {
    /// Append a system to a phase of the running loop. It first runs on the
    /// next tick of that phase; no tick is skipped or replayed.
    pub fn schedule<F>(&self, phase: Phase, name: impl Into<String>, system: F) -> bool
    where
        F: FnMut(&mut World, &mut SystemContext<'_>) + Send + 'static,
    {
        let sent = self
            .commands
            .send(LoopCommand::Schedule {
                phase,
                name: name.into(),
                system: Box::new(system),
            })
            .is_ok();
        if !sent {
            warn!("loop already stopped; system dropped");
        }
        sent
    }

    /// Wait for the loop to stop (all tick sources closed) and recover it.
    pub async fn join(self) -> Result<SimLoop, tokio::task::JoinError> {
        drop(self.commands);
        self.join.await
    }
}
