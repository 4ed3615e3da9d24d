//! The component roster of the rift simulation.
//!
//! All gameplay data lives here: spatial state, vitality, pending effects,
//! participant linkage, and the zero-payload tags marking entity state.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use rift_data::ParticipantId;
use rift_ecs::{Component, Entity};
use rift_net::ResourceId;

macro_rules! component {
    ($ty:ty, $name:literal) => {
        impl Component for $ty {
            fn kind_name() -> &'static str {
                $name
            }
        }
    };
}

/// Spatial state: world-space position and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation. Movement never writes this.
    pub rotation: Quat,
}

component!(Transform, "Transform");

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    /// A transform at `position` with identity orientation.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Desired motion: a direction (not required to be unit length) and a speed
/// in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    /// Direction of travel; normalized before use.
    pub direction: Vec3,
    /// Speed in units per second. Zero means the entity holds position.
    pub speed: f32,
}

component!(Velocity, "Velocity");

/// Current and maximum vitality. `current` is always within `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current vitality.
    pub current: f32,
    /// Maximum vitality.
    pub max: f32,
}

component!(Health, "Health");

impl Health {
    /// Build a health value with `current` clamped into `[0, max]`.
    #[must_use]
    pub fn new(current: f32, max: f32) -> Self {
        Self {
            current: current.clamp(0.0, max),
            max,
        }
    }

    /// Health after taking `amount` damage, floored at zero.
    #[must_use]
    pub fn damaged(self, amount: f32) -> Self {
        Self::new(self.current - amount, self.max)
    }

    /// Health after regaining `amount`, capped at `max`.
    #[must_use]
    pub fn healed(self, amount: f32) -> Self {
        Self::new(self.current + amount, self.max)
    }

    /// True once current vitality has reached zero.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    /// True at full vitality.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }
}

/// A pending damage effect, consumed exactly once by the damage resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damage {
    /// Amount of vitality to subtract.
    pub amount: f32,
    /// The entity responsible, when known.
    pub source: Option<Entity>,
}

component!(Damage, "Damage");

/// Binds an entity to the connected participant it represents.
///
/// At most one entity carries a given participant id at a time; the
/// lifecycle binder enforces this by checking before spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLink {
    /// The linked participant.
    pub participant: ParticipantId,
}

component!(PlayerLink, "PlayerLink");

/// Back-reference to an externally owned presentation resource.
///
/// The world only stores the id; the reaper asks the presentation
/// collaborator to release it on despawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    /// The externally owned resource.
    pub resource: ResourceId,
}

component!(Renderable, "Renderable");

/// Tag: the entity is dead. Once attached it is never removed in place;
/// the only exit is despawn by the reaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dead;

component!(Dead, "Dead");

/// Tag: the entity's components are mirrored to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Replicated;

component!(Replicated, "Replicated");
