//! Filtered queries over the world.
//!
//! A [`Query`] is a read view parameterized by required and excluded
//! component kinds, built with [`World::query`](crate::World::query):
//!
//! ```rust
//! # use rift_ecs::{Component, World};
//! # #[derive(Clone)] struct Health;
//! # impl Component for Health { fn kind_name() -> &'static str { "Health" } }
//! # #[derive(Clone)] struct Dead;
//! # impl Component for Dead { fn kind_name() -> &'static str { "Dead" } }
//! # let world = World::new();
//! for id in world.query().with::<Health>().without::<Dead>().ids() {
//!     // ...
//! }
//! ```
//!
//! [`Query::ids`] snapshots the matching id list up front. A system that
//! mutates the very kind it iterates sees a stable id list for that call and
//! observes removals through [`World::get`](crate::World::get) returning
//! `None`.

use crate::component::{Component, ComponentKind};
use crate::entity::Entity;
use crate::world::World;

/// A filtered, read-oriented view over a [`World`].
#[derive(Debug)]
pub struct Query<'w> {
    world: &'w World,
    with: Vec<ComponentKind>,
    without: Vec<ComponentKind>,
}

impl<'w> Query<'w> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self {
            world,
            with: Vec::new(),
            without: Vec::new(),
        }
    }

    /// Require component kind `T` to be present.
    #[must_use]
    pub fn with<T: Component>(mut self) -> Self {
        self.with.push(T::kind());
        self
    }

    /// Require component kind `T` to be absent.
    #[must_use]
    pub fn without<T: Component>(mut self) -> Self {
        self.without.push(T::kind());
        self
    }

    /// Collect the ids of all matching entities, in ascending id order.
    ///
    /// The list is valid for the world state at the moment of the call.
    #[must_use]
    pub fn ids(self) -> Vec<Entity> {
        self.world.matching_ids(&self.with, &self.without)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Marker;

    impl Component for Marker {
        fn kind_name() -> &'static str {
            "Marker"
        }
    }

    #[derive(Debug, Clone)]
    struct Other;

    impl Component for Other {
        fn kind_name() -> &'static str {
            "Other"
        }
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let mut world = World::new();
        let e1 = world.spawn();
        let e2 = world.spawn();
        assert_eq!(world.query().ids(), vec![e1, e2]);
    }

    #[test]
    fn test_ids_are_ordered() {
        let mut world = World::new();
        let mut spawned = Vec::new();
        for _ in 0..8 {
            let e = world.spawn();
            world.insert(e, Marker);
            spawned.push(e);
        }
        assert_eq!(world.query().with::<Marker>().ids(), spawned);
    }

    #[test]
    fn test_without_excludes() {
        let mut world = World::new();
        let e1 = world.spawn();
        world.insert(e1, Marker);
        let e2 = world.spawn();
        world.insert(e2, Marker);
        world.insert(e2, Other);

        let ids = world.query().with::<Marker>().without::<Other>().ids();
        assert_eq!(ids, vec![e1]);
    }
}
