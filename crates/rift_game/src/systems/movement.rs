//! Movement resolution.

use rift_ecs::World;
use rift_loop::SystemContext;

use crate::components::{Dead, Transform, Velocity};

/// Advance every live entity with a transform and a velocity along its
/// normalized direction at its speed.
///
/// Zero speed (or a zero-length direction) produces no write at all.
/// Orientation is never modified.
pub fn movement_system(world: &mut World, ctx: &mut SystemContext) {
    let dt = ctx.dt as f32;
    let ids = world
        .query()
        .with::<Transform>()
        .with::<Velocity>()
        .without::<Dead>()
        .ids();
    for entity in ids {
        let Some(velocity) = world.get_cloned::<Velocity>(entity) else {
            continue;
        };
        if velocity.speed == 0.0 {
            continue;
        }
        let direction = velocity.direction.normalize_or_zero();
        if direction == glam::Vec3::ZERO {
            continue;
        }
        let Some(mut transform) = world.get_cloned::<Transform>(entity) else {
            continue;
        };
        transform.position += direction * velocity.speed * dt;
        world.insert(entity, transform);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use rift_loop::{SimLoop, SIMULATION};

    use super::*;

    fn sim_with_movement() -> SimLoop {
        let mut sim = SimLoop::new();
        sim.schedule(SIMULATION, "movement", movement_system);
        sim
    }

    #[test]
    fn test_moves_along_normalized_direction() {
        let mut sim = sim_with_movement();
        let e = sim.world_mut().spawn();
        sim.world_mut().insert(e, Transform::at(Vec3::new(1.0, 0.0, 0.0)));
        sim.world_mut().insert(
            e,
            Velocity {
                direction: Vec3::new(0.0, 0.0, 2.0),
                speed: 4.0,
            },
        );
        sim.step(SIMULATION, 0.5);
        let t = sim.world().get::<Transform>(e).unwrap();
        // normalize((0,0,2)) * 4 * 0.5 = (0,0,2)
        assert_eq!(t.position, Vec3::new(1.0, 0.0, 2.0));
        assert_eq!(t.rotation, glam::Quat::IDENTITY);
    }

    #[test]
    fn test_zero_speed_produces_no_write() {
        let mut sim = sim_with_movement();
        let e = sim.world_mut().spawn();
        sim.world_mut().insert(e, Transform::at(Vec3::ONE));
        sim.world_mut().insert(
            e,
            Velocity {
                direction: Vec3::X,
                speed: 0.0,
            },
        );
        sim.world_mut().clear_changes();
        let generation = sim.world().generation::<Transform>();
        sim.step(SIMULATION, 1.0);
        assert_eq!(sim.world().generation::<Transform>(), generation);
        assert_eq!(sim.world().get::<Transform>(e).unwrap().position, Vec3::ONE);
    }

    #[test]
    fn test_dead_entities_are_skipped() {
        let mut sim = sim_with_movement();
        let e = sim.world_mut().spawn();
        sim.world_mut().insert(e, Transform::at(Vec3::ZERO));
        sim.world_mut().insert(
            e,
            Velocity {
                direction: Vec3::X,
                speed: 1.0,
            },
        );
        sim.world_mut().insert(e, Dead);
        sim.step(SIMULATION, 1.0);
        assert_eq!(sim.world().get::<Transform>(e).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_entities_missing_a_component_are_untouched() {
        let mut sim = sim_with_movement();
        let e = sim.world_mut().spawn();
        sim.world_mut().insert(e, Transform::at(Vec3::ZERO));
        sim.step(SIMULATION, 1.0);
        assert_eq!(sim.world().get::<Transform>(e).unwrap().position, Vec3::ZERO);
    }
}
