//! Session signals and the subscription bus.
//!
//! Join/leave/defeated signals arrive from the participant-session
//! collaborator and fan out to explicit subscribers — the lifecycle binder
//! and the persistence synchronizer. Delivery is single-threaded and in
//! registration order.

use uuid::Uuid;

use rift_data::{ParticipantId, Vitality};

/// Opaque handle to an externally owned presentation resource.
///
/// The world only carries the id; releasing the resource is delegated to the
/// presentation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u64);

/// A participant lifecycle signal.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The participant connected.
    Joined {
        /// Who joined.
        participant: ParticipantId,
        /// Current vitality, seeding the spawned entity's health.
        vitality: Vitality,
        /// Presentation resource bound to the participant, when one could be
        /// established before the signal was emitted.
        resource: Option<ResourceId>,
    },
    /// The participant disconnected.
    Left {
        /// Who left.
        participant: ParticipantId,
    },
    /// The participant was defeated through a game-specific channel,
    /// independent of the generic damage path.
    Defeated {
        /// Who was defeated.
        participant: ParticipantId,
    },
}

impl SessionEvent {
    /// The participant the signal concerns.
    #[must_use]
    pub fn participant(&self) -> ParticipantId {
        match self {
            SessionEvent::Joined { participant, .. }
            | SessionEvent::Left { participant }
            | SessionEvent::Defeated { participant } => *participant,
        }
    }
}

/// Handle returned by [`SessionBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Handler = Box<dyn FnMut(&SessionEvent) + Send>;

/// In-process fan-out of session signals.
///
/// Handlers run synchronously on the publishing thread, in the order they
/// were registered.
#[derive(Default)]
pub struct SessionBus {
    subscribers: Vec<(SubscriptionId, Handler)>,
}

impl SessionBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for all session events.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber, in registration order.
    pub fn publish(&mut self, event: &SessionEvent) {
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for SessionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
