//! Per-tick execution context provided to system bodies.

use std::collections::HashMap;

/// Per-system throttle bookkeeping, keyed by label on the phase clock.
#[derive(Debug, Default)]
pub(crate) struct ThrottleStore {
    last_fired: HashMap<String, f64>,
}

impl ThrottleStore {
    /// Returns `true` at most once per `interval` seconds of phase time.
    ///
    /// The first call for a label fires and starts the interval; later calls
    /// fire only once the interval has elapsed, independent of tick rate.
    pub(crate) fn ready(&mut self, label: &str, interval: f64, clock: f64) -> bool {
        match self.last_fired.get(label) {
            Some(&last) if clock - last < interval => false,
            _ => {
                self.last_fired.insert(label.to_string(), clock);
                true
            }
        }
    }
}

/// Context handed to a system on each tick of its phase.
///
/// Carries the tick counter, the delta time since the previous tick of the
/// phase, and the phase clock backing [`SystemContext::use_throttle`].
#[derive(Debug)]
pub struct SystemContext<'a> {
    /// Monotonic tick counter of the phase (first tick is 1).
    pub tick_id: u64,
    /// Delta time since the previous tick of this phase, in seconds.
    pub dt: f64,
    /// Seconds of phase time elapsed since the loop started.
    pub clock: f64,
    throttles: &'a mut ThrottleStore,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(tick_id: u64, dt: f64, clock: f64, throttles: &'a mut ThrottleStore) -> Self {
        Self {
            tick_id,
            dt,
            clock,
            throttles,
        }
    }

    /// Throttle predicate: `true` at most once per `interval` seconds.
    ///
    /// Throttle state is scoped to the calling system and keyed by `label`,
    /// so one system can carry several independent gates.
    pub fn use_throttle(&mut self, label: &str, interval: f64) -> bool {
        self.throttles.ready(label, interval, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_call_fires() {
        let mut store = ThrottleStore::default();
        assert!(store.ready("regen", 2.0, 0.0));
    }

    #[test]
    fn test_within_interval_suppressed() {
        let mut store = ThrottleStore::default();
        assert!(store.ready("regen", 2.0, 0.0));
        assert!(!store.ready("regen", 2.0, 0.5));
        assert!(!store.ready("regen", 2.0, 1.9));
    }

    #[test]
    fn test_fires_again_after_interval() {
        let mut store = ThrottleStore::default();
        assert!(store.ready("regen", 2.0, 0.0));
        assert!(store.ready("regen", 2.0, 2.0));
        assert!(!store.ready("regen", 2.0, 3.5));
        assert!(store.ready("regen", 2.0, 4.0));
    }

    #[test]
    fn test_labels_are_independent() {
        let mut store = ThrottleStore::default();
        assert!(store.ready("a", 2.0, 0.0));
        assert!(store.ready("b", 5.0, 0.1));
        assert!(!store.ready("a", 2.0, 1.0));
        assert!(!store.ready("b", 5.0, 1.0));
    }
}
