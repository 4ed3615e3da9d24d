//! The authoritative entity → component store.
//!
//! The [`World`] maps each live entity to its attached components and keeps a
//! monotonically increasing generation counter per component kind. Every
//! insert and remove bumps the kind's counter and appends a change record, so
//! observers can ask "which entities had this kind change since generation G".
//!
//! Operations on a despawned entity are no-ops that report absence — they
//! never raise. This keeps system bodies free of error handling for entities
//! that died earlier in the same tick.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{Component, ComponentKind};
use crate::entity::{Entity, EntityAllocator};
use crate::query::Query;

type BoxedComponent = Box<dyn Any + Send + Sync>;

/// A single entity's component set.
#[derive(Debug, Default)]
struct EntityData {
    components: HashMap<ComponentKind, BoxedComponent>,
}

/// One recorded mutation of a component kind on an entity.
///
/// `old` is the value replaced or removed (absent on first attach); `new` is
/// the value written (absent on removal).
struct ChangeRecord {
    generation: u64,
    entity: Entity,
    old: Option<BoxedComponent>,
    new: Option<BoxedComponent>,
}

/// The authoritative mapping from entity → (component kind → value).
///
/// The world is the single shared mutable structure of the simulation. Only
/// scheduled systems (and the lifecycle binder acting as one) mutate it, and
/// only within their tick's execution window.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    entities: HashMap<Entity, EntityData>,
    generations: HashMap<ComponentKind, u64>,
    changes: HashMap<ComponentKind, Vec<ChangeRecord>>,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            generations: HashMap::new(),
            changes: HashMap::new(),
        }
    }

    // -- Entity lifecycle --

    /// Spawn a new empty entity. Attach components with [`World::insert`].
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, EntityData::default());
        entity
    }

    /// Despawn an entity, detaching all its components.
    ///
    /// Each detached kind gets a removal change record. Returns `false` if
    /// the entity was already despawned — a double despawn is a no-op.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        let Some(data) = self.entities.remove(&entity) else {
            return false;
        };
        for (kind, boxed) in data.components {
            let generation = self.bump(kind);
            self.changes.entry(kind).or_default().push(ChangeRecord {
                generation,
                entity,
                old: Some(boxed),
                new: None,
            });
        }
        true
    }

    /// Check if an entity is live.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Return the count of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // -- Component operations --

    /// Attach a component to an entity, replacing any previous value of the
    /// same kind.
    ///
    /// Returns `false` (and does nothing) if the entity has been despawned.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> bool {
        let recorded = value.clone();
        let old = match self.entities.get_mut(&entity) {
            Some(data) => data.components.insert(T::kind(), Box::new(value)),
            None => return false,
        };
        let generation = self.bump(T::kind());
        self.changes
            .entry(T::kind())
            .or_default()
            .push(ChangeRecord {
                generation,
                entity,
                old,
                new: Some(Box::new(recorded)),
            });
        true
    }

    /// Detach a component from an entity, returning the detached value.
    ///
    /// Returns `None` if the entity is despawned or the component is absent;
    /// either way the call is a no-op.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let boxed = self
            .entities
            .get_mut(&entity)?
            .components
            .remove(&T::kind())?;
        let value = *boxed.downcast::<T>().ok()?;
        let generation = self.bump(T::kind());
        self.changes
            .entry(T::kind())
            .or_default()
            .push(ChangeRecord {
                generation,
                entity,
                old: Some(Box::new(value.clone())),
                new: None,
            });
        Some(value)
    }

    /// Get a reference to an entity's component of kind `T`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.entities
            .get(&entity)?
            .components
            .get(&T::kind())?
            .downcast_ref::<T>()
    }

    /// Get a cloned copy of an entity's component of kind `T`.
    #[must_use]
    pub fn get_cloned<T: Component>(&self, entity: Entity) -> Option<T> {
        self.get::<T>(entity).cloned()
    }

    /// Check if an entity has a component of kind `T`.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.entities
            .get(&entity)
            .map(|data| data.components.contains_key(&T::kind()))
            .unwrap_or(false)
    }

    // -- Query --

    /// Start building a filtered query over the world.
    ///
    /// The id list is snapshotted when [`Query::ids`](crate::query::Query::ids)
    /// is called; mutations applied while walking the result never change
    /// which ids that call yielded.
    #[must_use]
    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }

    pub(crate) fn matching_ids(&self, with: &[ComponentKind], without: &[ComponentKind]) -> Vec<Entity> {
        let mut ids: Vec<Entity> = self
            .entities
            .iter()
            .filter(|(_, data)| {
                with.iter().all(|k| data.components.contains_key(k))
                    && without.iter().all(|k| !data.components.contains_key(k))
            })
            .map(|(id, _)| *id)
            .collect();
        // Map iteration order is arbitrary; sort for a deterministic pipeline.
        ids.sort();
        ids
    }

    // -- Change tracking --

    /// Returns the current generation counter for component kind `T`.
    ///
    /// The counter starts at 0 and bumps on every insert and remove of the
    /// kind. It never resets.
    #[must_use]
    pub fn generation<T: Component>(&self) -> u64 {
        self.generations.get(&T::kind()).copied().unwrap_or(0)
    }

    /// Returns `(entity, previous, new)` for every change of kind `T` with a
    /// generation greater than `since`, oldest first.
    ///
    /// `previous` is absent for a first attach, `new` is absent for a
    /// removal. Records are retained until [`World::clear_changes`]; callers
    /// track their own last-observed generation.
    #[must_use]
    pub fn changed_since<T: Component>(&self, since: u64) -> Vec<(Entity, Option<T>, Option<T>)> {
        let Some(records) = self.changes.get(&T::kind()) else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|record| record.generation > since)
            .map(|record| {
                let old = record.old.as_ref().and_then(|b| b.downcast_ref::<T>()).cloned();
                let new = record.new.as_ref().and_then(|b| b.downcast_ref::<T>()).cloned();
                (record.entity, old, new)
            })
            .collect()
    }

    /// Drop all retained change records. Generation counters are untouched.
    ///
    /// The scheduler calls this at the end of each primary tick.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn bump(&mut self, kind: ComponentKind) -> u64 {
        let generation = self.generations.entry(kind).or_insert(0);
        *generation += 1;
        *generation
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("kinds", &self.generations.len())
            .finish()
    }
}
