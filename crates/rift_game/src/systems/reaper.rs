//! Dead-entity cleanup.

use rift_ecs::World;
use rift_loop::SystemContext;
use rift_net::ResourceId;

use crate::components::{Dead, Renderable};

/// Presentation collaborator: releases externally owned visual resources.
///
/// The world only carries resource ids; ownership stays with the
/// collaborator, and the reaper asks for release exactly once per despawned
/// entity that still holds a [`Renderable`].
pub trait PresentationSink: Send + 'static {
    /// Release the resource. Must tolerate ids already released.
    fn release(&self, resource: ResourceId);
}

impl<F> PresentationSink for F
where
    F: Fn(ResourceId) + Send + 'static,
{
    fn release(&self, resource: ResourceId) {
        self(resource);
    }
}

/// Build the reaper system over a presentation collaborator.
///
/// Each tick, every entity tagged [`Dead`] has its presentation resource
/// released (when one is attached) and is then despawned. A double pass is
/// safe: despawned ids are simply absent from the next query.
pub fn reaper_system<S: PresentationSink>(
    sink: S,
) -> impl FnMut(&mut World, &mut SystemContext) + Send {
    move |world, _ctx| {
        let ids = world.query().with::<Dead>().ids();
        for entity in ids {
            if let Some(renderable) = world.get_cloned::<Renderable>(entity) {
                sink.release(renderable.resource);
            }
            world.despawn(entity);
        }
    }
}
