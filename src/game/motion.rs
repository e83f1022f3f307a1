//! Kinematic integration and play-field wrapping.

use glam::Quat;

use crate::engine::query::Query;
use crate::engine::scheduler::StageKind;
use crate::engine::systems::{FnSystem, System, SystemContext};
use crate::game::components::{Boundary, Rotation, Translation, Velocity};
use crate::game::ship::{SHIP_MOVEMENT, SHIP_RESPAWN};


pub const INTEGRATE_MOTION: &str = "integrate_motion";
pub const BOUNDARY_WRAP: &str = "boundary_wrap";

/// Advances `Translation` and `Rotation` by `Velocity` over one fixed step.
pub fn integrate_motion() -> impl System {
    let moving = Query::builder().with::<Translation>().with::<Velocity>().build();

    FnSystem::new(INTEGRATE_MOTION, StageKind::Fixed, move |ctx: &mut SystemContext<'_>| {
        let dt = ctx.time.delta;
        let mut batch = ctx.scratch.take();
        ctx.world.collect_into(&moving, &mut batch);

        for &entity in &batch {
            let Some(velocity) = ctx.world.get::<Velocity>(entity).copied() else { continue };
            if let Some(t) = ctx.world.get_mut::<Translation>(entity) {
                t.0 += velocity.linear * dt;
            }
            if velocity.angular.z != 0.0 {
                if let Some(r) = ctx.world.get_mut::<Rotation>(entity) {
                    r.0 = (Quat::from_rotation_z(velocity.angular.z * dt) * r.0).normalize();
                }
            }
        }
        ctx.scratch.give_back(batch);
    })
    .after(SHIP_MOVEMENT)
}

/// Wraps every position into the `Boundary` singleton.
pub fn boundary_wrap() -> impl System {
    let boundaries = Query::of::<Boundary>();
    let positions = Query::of::<Translation>();

    FnSystem::new(BOUNDARY_WRAP, StageKind::Fixed, move |ctx: &mut SystemContext<'_>| {
        if ctx.world.count(&boundaries) != 1 {
            return;
        }
        let Ok(boundary) = ctx.world.singleton::<Boundary>().copied() else { return };
        ctx.world.par_for_each_mut::<Translation, _>(&positions, |_, t| t.0 = boundary.wrap(t.0));
    })
    .after(SHIP_RESPAWN)
}
