//! External tick sources.
//!
//! A [`TickSource`] emits `(dt)` signals that drive one phase of the loop.
//! [`TickSource::fixed`] is backed by a tokio interval at a fixed cadence;
//! [`TickSource::manual`] hands the caller a [`ManualTicker`] for tests and
//! externally paced phases.

use tokio::sync::mpsc;

use crate::phase::Phase;

/// A stream of tick signals, each carrying a delta time in seconds.
#[derive(Debug)]
pub struct TickSource {
    rx: mpsc::UnboundedReceiver<f64>,
}

impl TickSource {
    /// A fixed-cadence source emitting `1/hz` second ticks.
    ///
    /// The backing task stops once the loop consuming the source is dropped.
    #[must_use]
    pub fn fixed(hz: f64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let dt = 1.0 / hz;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs_f64(dt));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(dt).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    /// A manually driven source. Each [`ManualTicker::tick`] call emits one
    /// tick signal.
    #[must_use]
    pub fn manual() -> (ManualTicker, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ManualTicker { tx }, Self { rx })
    }

    /// Forward this source's signals, tagged with `phase`, into the loop's
    /// merged tick channel.
    pub(crate) fn forward(mut self, phase: Phase, out: mpsc::UnboundedSender<(Phase, f64)>) {
        tokio::spawn(async move {
            while let Some(dt) = self.rx.recv().await {
                if out.send((phase, dt)).is_err() {
                    break;
                }
            }
        });
    }
}

/// Emitter half of a manual [`TickSource`].
#[derive(Debug, Clone)]
pub struct ManualTicker {
    tx: mpsc::UnboundedSender<f64>,
}

impl ManualTicker {
    /// Emit one tick with the given delta time. Returns `false` once the
    /// consuming loop has shut down.
    pub fn tick(&self, dt: f64) -> bool {
        self.tx.send(dt).is_ok()
    }
}
