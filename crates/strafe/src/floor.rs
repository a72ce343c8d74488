use glam::Vec3;

use crate::input::MoveInput;
use crate::math;
use crate::policy::MovementPolicy;
use crate::scene::{CollisionQuery, SweepHit};
use crate::simulator::{KINDA_SMALL_NUMBER, MAX_FLOOR_DIST, Simulator};
use crate::state::{FloorResult, MovementState};

/// A step's riser must be steeper than this to count as a step side.
const MAX_STEP_SIDE_Z: f32 = 0.08;

impl<P: MovementPolicy> Simulator<P> {
    /// Downward floor sweep at the character's current position.
    pub(crate) fn trace_floor(
        &self,
        state: &MovementState,
        scene: &dyn CollisionQuery,
    ) -> FloorResult {
        self.trace_floor_at(state, scene, state.position)
    }

    pub(crate) fn trace_floor_at(
        &self,
        state: &MovementState,
        scene: &dyn CollisionQuery,
        position: Vec3,
    ) -> FloorResult {
        let shape = self.probe(state);
        let reach = state.max_step_height + MAX_FLOOR_DIST;
        let Some(hit) = scene.sweep(&shape, position, position - Vec3::Z * reach) else {
            return FloorResult::none();
        };

        let mut floor = self.floor_from_hit(state, &hit);
        if hit.start_penetrating {
            floor.walkable = false;
            floor.distance = 0.0;
            return floor;
        }
        floor.distance = hit.distance;

        // Contacts on the rim of the base are ledge edges, not floor.
        if floor.walkable
            && hit.normal.z < 1.0 - KINDA_SMALL_NUMBER
            && !self.is_within_edge_tolerance(position, hit.point, state.capsule.radius)
        {
            floor.walkable = false;
        }
        floor
    }

    /// True if the contact point lies inside the base footprint, away from
    /// its rim.
    pub(crate) fn is_within_edge_tolerance(
        &self,
        location: Vec3,
        point: Vec3,
        radius: f32,
    ) -> bool {
        let reject = self.policy.edge_reject_distance();
        let dx = (point.x - location.x).abs();
        let dy = (point.y - location.y).abs();
        dx.max(dy) <= (radius - reject).max(reject)
    }

    /// Decides whether a falling-phase hit ends the fall. The base is flat,
    /// so hits above the base plane never count even with a vertical normal.
    pub(crate) fn is_valid_landing_spot(
        &self,
        state: &MovementState,
        scene: &dyn CollisionQuery,
        position: Vec3,
        hit: &SweepHit,
        _dt: f32,
    ) -> bool {
        // Sliding upward off a ramp is not a landing.
        if state.velocity.z > self.config().jump_apex_velocity {
            return false;
        }

        if hit.start_penetrating {
            if hit.normal.z < KINDA_SMALL_NUMBER {
                return false;
            }
        } else {
            if hit.normal.z < state.walkable_floor_z {
                return false;
            }
            let base = position.z - state.capsule.half_height
                + self.policy.edge_reject_distance()
                + KINDA_SMALL_NUMBER;
            if hit.normal.z >= 1.0 - KINDA_SMALL_NUMBER && hit.point.z > base {
                return false;
            }
            if !self.is_within_edge_tolerance(position, hit.point, state.capsule.radius) {
                return false;
            }
        }

        self.trace_floor_at(state, scene, position).is_walkable_floor()
    }

    /// True when a slope change at speed should launch the character instead
    /// of gluing it to the new floor.
    pub(crate) fn should_catch_air(
        &self,
        state: &MovementState,
        input: &MoveInput,
        old_floor: &FloorResult,
        new_floor: &FloorResult,
    ) -> bool {
        let speed = state.horizontal_speed();
        if speed < 1e-3 {
            return false;
        }
        let old_friction = self.policy.friction_from_hit(&old_floor.surface);

        // Faster movement tolerates less friction before sliding.
        let speed_mult = self.config().speed_mult_max / speed;
        let sliding = old_friction * speed_mult < 0.5;

        // Leveling out or holding the same slope.
        let gaining_ramp = new_floor.normal.z - old_floor.normal.z >= 0.0;

        // Horizontal velocity against a tilted old normal means we were
        // climbing it; strafing input can also carry us off the side.
        let going_up_ramp = state.velocity.dot(old_floor.normal) < 0.0;
        let strafing = math::dot_2d(input.wish_dir, input.right_2d()).abs() > 0.0;

        sliding && gaining_ramp && (going_up_ramp || strafing)
    }

    /// Up-forward-down maneuver around a blocking ledge. Returns true and
    /// moves the character if the ledge is climbable within the current step
    /// height; leaves the state untouched otherwise.
    pub(crate) fn step_up(
        &self,
        state: &mut MovementState,
        scene: &dyn CollisionQuery,
        delta: Vec3,
        hit: &SweepHit,
    ) -> bool {
        let step_height = state.max_step_height;
        if step_height < KINDA_SMALL_NUMBER {
            return false;
        }
        let base_z = state.position.z - state.capsule.half_height;
        if hit.point.z > base_z + step_height {
            return false;
        }
        // A tilted blocker in the steppable band is a slope, not a riser.
        if hit.normal.z > MAX_STEP_SIDE_Z && hit.normal.z < state.walkable_floor_z {
            return false;
        }

        let shape = self.probe(state);
        let (up_pos, up_hit) = self.safe_move(scene, &shape, state.position, Vec3::Z * step_height);
        if up_hit.is_some_and(|h| h.start_penetrating) {
            return false;
        }

        let forward = Vec3::new(delta.x, delta.y, 0.0);
        let (fwd_pos, fwd_hit) = self.safe_move(scene, &shape, up_pos, forward);
        if fwd_hit.is_some_and(|h| h.start_penetrating) {
            return false;
        }
        if (fwd_pos - up_pos).length_squared() < 1e-6 {
            return false;
        }

        let drop = (up_pos.z - state.position.z) + MAX_FLOOR_DIST;
        let (down_pos, down_hit) = self.safe_move(scene, &shape, fwd_pos, -Vec3::Z * drop);
        let Some(down_hit) = down_hit else {
            // Stepped clear over the ledge into open air.
            return false;
        };
        if down_hit.start_penetrating || down_hit.normal.z < state.walkable_floor_z {
            return false;
        }

        let climbed = down_pos.z - state.position.z;
        if climbed > step_height + KINDA_SMALL_NUMBER {
            return false;
        }
        if climbed > 0.0
            && !self.is_within_edge_tolerance(down_pos, down_hit.point, state.capsule.radius)
        {
            return false;
        }

        state.position = down_pos;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ProbeShape, SurfaceMaterial};
    use crate::simulator::test_support::grounded_state;

    /// Infinite horizontal plane with its top surface at `top`.
    struct FlatFloor {
        top: f32,
    }

    impl CollisionQuery for FlatFloor {
        fn sweep(&self, shape: &ProbeShape, start: Vec3, end: Vec3) -> Option<SweepHit> {
            let base_start = start.z - shape.half_extents.z;
            let base_end = end.z - shape.half_extents.z;
            if base_start < self.top {
                return Some(SweepHit {
                    toi: 0.0,
                    distance: 0.0,
                    normal: Vec3::Z,
                    point: Vec3::new(start.x, start.y, self.top),
                    start_penetrating: true,
                    surface: SurfaceMaterial::default(),
                });
            }
            if base_end >= self.top {
                return None;
            }
            let toi = (base_start - self.top) / (base_start - base_end);
            let at = start + (end - start) * toi;
            Some(SweepHit {
                toi,
                distance: (end - start).length() * toi,
                normal: Vec3::Z,
                point: Vec3::new(at.x, at.y, self.top),
                start_penetrating: false,
                surface: SurfaceMaterial::default(),
            })
        }

        fn overlaps(&self, shape: &ProbeShape, location: Vec3) -> bool {
            location.z - shape.half_extents.z < self.top
        }
    }

    fn floor_with_normal(normal: Vec3, friction: f32) -> FloorResult {
        FloorResult {
            blocking: true,
            walkable: true,
            distance: 2.0,
            normal,
            surface: SurfaceMaterial {
                friction,
                ..Default::default()
            },
        }
    }

    #[test]
    fn trace_floor_reports_gap_within_reach() {
        let sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.position.z = config.capsule_half_height + 10.0;

        let floor = sim.trace_floor(&state, &FlatFloor { top: 0.0 });
        assert!(floor.is_walkable_floor());
        assert!((floor.distance - 10.0).abs() < 1e-4);
    }

    #[test]
    fn trace_floor_misses_beyond_step_reach() {
        let sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.position.z = config.capsule_half_height + config.max_step_height + 10.0;

        let floor = sim.trace_floor(&state, &FlatFloor { top: 0.0 });
        assert!(!floor.is_walkable_floor());
        assert!(!floor.blocking);
    }

    #[test]
    fn landing_rejects_steep_normals() {
        let sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(0.0, 0.0, -300.0);
        let position = Vec3::new(0.0, 0.0, config.capsule_half_height + 1.0);

        let wall_hit = SweepHit {
            toi: 0.5,
            distance: 1.0,
            normal: Vec3::new(0.95, 0.0, 0.31),
            point: Vec3::new(0.0, 0.0, position.z - config.capsule_half_height),
            start_penetrating: false,
            surface: SurfaceMaterial::default(),
        };
        let scene = FlatFloor { top: 0.0 };
        assert!(!sim.is_valid_landing_spot(&state, &scene, position, &wall_hit, 1.0 / 60.0));

        state.mode = crate::state::MovementMode::Falling;
        let floor_hit = SweepHit {
            normal: Vec3::Z,
            ..wall_hit
        };
        assert!(sim.is_valid_landing_spot(&state, &scene, position, &floor_hit, 1.0 / 60.0));
    }

    #[test]
    fn landing_rejects_fast_upward_motion() {
        let sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(0.0, 0.0, config.jump_apex_velocity + 50.0);
        let position = Vec3::new(0.0, 0.0, config.capsule_half_height + 1.0);

        let hit = SweepHit {
            toi: 0.5,
            distance: 1.0,
            normal: Vec3::Z,
            point: Vec3::new(0.0, 0.0, 0.0),
            start_penetrating: false,
            surface: SurfaceMaterial::default(),
        };
        let scene = FlatFloor { top: 0.0 };
        assert!(!sim.is_valid_landing_spot(&state, &scene, position, &hit, 1.0 / 60.0));
    }

    #[test]
    fn catch_air_needs_speed_and_a_climb() {
        let sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        let mut input = MoveInput::new();
        input.wish_dir = Vec3::X;

        let ramp = floor_with_normal(Vec3::new(-0.342, 0.0, 0.94).normalize(), 0.8);
        let flat = floor_with_normal(Vec3::Z, 0.8);

        // Fast and climbing the ramp onto flat ground: launch.
        state.velocity = Vec3::new(config.speed_mult_max * 2.5, 0.0, 0.0);
        assert!(sim.should_catch_air(&state, &input, &ramp, &flat));

        // Walking pace sticks to the floor.
        state.velocity = Vec3::new(config.run_speed * 0.5, 0.0, 0.0);
        assert!(!sim.should_catch_air(&state, &input, &ramp, &flat));

        // Fast but descending toward a steeper floor: no launch.
        state.velocity = Vec3::new(-config.speed_mult_max * 2.5, 0.0, 0.0);
        assert!(!sim.should_catch_air(&state, &input, &flat, &ramp));
    }
}
