//! Resolution systems scheduled to the primary simulation phase.
//!
//! Each system snapshots its matching id list before mutating, so writes
//! made while resolving one entity never change which entities the same
//! pass visits.

pub mod damage;
pub mod movement;
pub mod reaper;

pub use damage::{damage_system, regen_system, REGEN_FRACTION, REGEN_INTERVAL_SECS};
pub use movement::movement_system;
pub use reaper::{reaper_system, PresentationSink};
