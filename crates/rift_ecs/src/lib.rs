//! # rift_ecs
//!
//! The entity-component core of the rift simulation: entity identity,
//! component storage, change tracking, and filtered queries.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers, never reused.
//! - [`EntityAllocator`] — monotonically increasing ID allocator.
//! - [`Component`] trait — the contract all simulation data must satisfy.
//! - [`World`] — the authoritative entity → component mapping.
//! - [`Query`] — filtered iteration by required/excluded component kinds.

pub mod component;
pub mod entity;
pub mod query;
pub mod world;

pub use component::{Component, ComponentKind};
pub use entity::{Entity, EntityAllocator};
pub use query::Query;
pub use world::World;
