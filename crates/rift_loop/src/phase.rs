//! Phase keys.
//!
//! A phase is a named, ordered list of systems bound to one tick source.
//! Only [`SIMULATION`] is authoritative for game-state mutation; other
//! phases are expected to read or do non-authoritative bookkeeping. That is
//! a usage convention, not an enforced constraint.

/// A named phase key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phase(pub &'static str);

/// The fixed-cadence primary simulation phase.
pub const SIMULATION: Phase = Phase("simulation");

/// The variable-cadence presentation phase.
pub const PRESENTATION: Phase = Phase("presentation");

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}
