//! # rift_loop
//!
//! The tick-scheduling pipeline of the rift simulation.
//!
//! Systems are registered to named [`Phase`]s in explicit order; each phase
//! is driven by one [`TickSource`] and executes its systems synchronously to
//! completion on every tick. There is no intra-phase parallelism and no
//! re-entrant invocation of a phase — a received tick runs every scheduled
//! system before the next tick of that phase is accepted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rift_loop::{SimLoop, TickSource, SIMULATION};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut sim = SimLoop::new();
//!     sim.schedule(SIMULATION, "movement", |world, ctx| {
//!         let _ = (world, ctx); // system logic
//!     });
//!     let handle = sim.begin(vec![(SIMULATION, TickSource::fixed(60.0))]);
//!     let _ = handle.join().await;
//! }
//! ```

pub mod context;
pub mod phase;
pub mod sim_loop;
pub mod source;

pub use context::SystemContext;
pub use phase::{Phase, PRESENTATION, SIMULATION};
pub use sim_loop::{LoopHandle, SimLoop, SystemFn};
pub use source::{ManualTicker, TickSource};
