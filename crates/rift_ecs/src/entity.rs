//! Entity identity.
//!
//! An [`Entity`] is a `u64` identifier with no inherent data. Existence is
//! defined solely by having components attached in a
//! [`World`](crate::World); a destroyed identifier is never handed out again
//! within a running process, so a stale reference can never alias a new
//! logical entity.

use serde::{Deserialize, Serialize};

/// A unique entity identifier. Id 0 is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// The invalid-entity sentinel. Never allocated.
    pub const INVALID: Entity = Entity(0);

    /// The raw `u64` identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// `false` only for [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity({})", self.0)
    }
}

/// Hands out entity ids, monotonically and exactly once each.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    issued: u64,
}

impl EntityAllocator {
    /// A fresh allocator. The first allocated id is 1; 0 stays reserved for
    /// [`Entity::INVALID`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id.
    pub fn allocate(&mut self) -> Entity {
        self.issued += 1;
        Entity(self.issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.allocate(), Entity(1));
        assert_eq!(alloc.allocate(), Entity(2));
        assert_eq!(alloc.allocate(), Entity(3));
    }

    #[test]
    fn test_zero_is_the_invalid_sentinel() {
        assert!(!Entity::INVALID.is_valid());
        assert!(Entity(1).is_valid());
        assert_ne!(EntityAllocator::new().allocate(), Entity::INVALID);
    }

    #[test]
    fn test_wire_roundtrip() {
        let entity = Entity(999);
        let bytes = rmp_serde::to_vec(&entity).unwrap();
        let restored: Entity = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(entity, restored);
    }
}
