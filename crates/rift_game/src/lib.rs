//! # rift_game
//!
//! Gameplay on top of the rift entity core: the component roster, the
//! resolution systems (movement, damage, regeneration, reaping), the
//! participant lifecycle binder, and the [`Simulation`] facade that wires
//! them into the scheduler.

pub mod binder;
pub mod components;
pub mod simulation;
pub mod systems;

pub use binder::Binder;
pub use components::{
    Damage, Dead, Health, PlayerLink, Renderable, Replicated, Transform, Velocity,
};
pub use simulation::{SimError, Simulation};
pub use systems::{
    damage_system, movement_system, reaper_system, regen_system, PresentationSink,
};
