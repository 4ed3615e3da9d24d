//! Damage application and health regeneration.

use rift_ecs::World;
use rift_loop::SystemContext;

use crate::components::{Damage, Dead, Health};

/// Seconds of phase time between regeneration passes.
pub const REGEN_INTERVAL_SECS: f64 = 2.0;

/// Fraction of max vitality regained per pass, rounded up.
pub const REGEN_FRACTION: f32 = 0.05;

/// Apply every pending [`Damage`] to its entity's [`Health`].
///
/// Each damage component is consumed exactly once. An entity whose vitality
/// reaches zero gains the [`Dead`] tag in the same tick and takes no further
/// damage this tick.
pub fn damage_system(world: &mut World, _ctx: &mut SystemContext) {
    let ids = world
        .query()
        .with::<Health>()
        .with::<Damage>()
        .without::<Dead>()
        .ids();
    for entity in ids {
        let Some(damage) = world.remove::<Damage>(entity) else {
            continue;
        };
        let Some(health) = world.get_cloned::<Health>(entity) else {
            continue;
        };
        let health = health.damaged(damage.amount);
        world.insert(entity, health);
        if health.is_depleted() {
            world.insert(entity, Dead);
        }
    }
}

/// Regenerate vitality on every live, wounded entity.
///
/// Gated by a throttle so the pass runs at most once per
/// [`REGEN_INTERVAL_SECS`] of phase time regardless of tick rate. Entities
/// at full vitality get no write.
pub fn regen_system(world: &mut World, ctx: &mut SystemContext) {
    if !ctx.use_throttle("regen", REGEN_INTERVAL_SECS) {
        return;
    }
    let ids = world.query().with::<Health>().without::<Dead>().ids();
    for entity in ids {
        let Some(health) = world.get_cloned::<Health>(entity) else {
            continue;
        };
        if health.is_full() {
            continue;
        }
        let gain = (health.max * REGEN_FRACTION).ceil();
        world.insert(entity, health.healed(gain));
    }
}
