use glam::Vec3;

use crate::input::MoveInput;
use crate::math;
use crate::policy::MovementPolicy;
use crate::simulator::{MIN_TICK_TIME, Simulator};
use crate::state::{MovementMode, MovementState};

/// Velocity is considered stopped below this horizontal speed.
const BRAKE_TO_STOP_SPEED: f32 = 0.1;

impl<P: MovementPolicy> Simulator<P> {
    /// Top speed for the current stance and held modifiers.
    pub fn max_speed(&self, state: &MovementState, input: &MoveInput) -> f32 {
        let config = self.config();
        match state.mode {
            MovementMode::Ladder => config.ladder_climb_speed,
            MovementMode::Flying => {
                let base = if input.has(MoveInput::FLAG_SPRINT) {
                    config.sprint_speed
                } else {
                    config.walk_speed
                };
                base * 1.5
            }
            _ => {
                let crouched = state.crouched && state.crouch_frame_tolerated;
                if input.has(MoveInput::FLAG_SPRINT) {
                    if crouched {
                        config.crouch_speed * 1.7
                    } else {
                        config.sprint_speed
                    }
                } else if input.has(MoveInput::FLAG_WALK) {
                    config.walk_speed
                } else if crouched {
                    config.crouch_speed
                } else {
                    config.run_speed
                }
            }
        }
    }

    /// Friction and acceleration for one tick. `friction` is the mode's base
    /// friction before surface scaling.
    pub(crate) fn calc_velocity(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        friction: f32,
        braking_deceleration: f32,
        dt: f32,
    ) {
        if dt < MIN_TICK_TIME {
            return;
        }
        match state.mode {
            MovementMode::Ladder => {
                self.ladder_velocity(state, input);
                self.apply_axis_limit(state);
                return;
            }
            MovementMode::Flying => {
                self.noclip_velocity(state, input);
                return;
            }
            _ => {}
        }

        let config = self.config();
        let max_speed = self.max_speed(state, input);
        let ground_move = state.is_walking()
            && state.current_floor.is_walkable_floor()
            && state.braking_frame_tolerated;

        // Rising below the jump apex the player no longer controls the move
        // and air acceleration drops to a quarter; any stale floor friction
        // is overwritten either way.
        if state.is_falling() {
            let controlled =
                state.velocity.z > config.jump_apex_velocity || state.velocity.z <= 0.0;
            state.surface_friction = if controlled { 1.0 } else { 0.25 };
        }
        let friction = friction.max(0.0);

        let mut accel = state.acceleration;
        accel.z = 0.0;
        let accel = math::clamp_to_max_size_2d(accel, max_speed);
        let zero_accel = math::is_nearly_zero(accel, 1e-4);
        let old_velocity = state.velocity;
        let over_max = math::size_sq_2d(state.velocity) > max_speed * max_speed * 1.01;

        if ground_move {
            let base = if config.use_separate_braking_friction {
                config.braking_friction
            } else {
                friction
            };
            self.apply_velocity_braking(
                state,
                base * state.surface_friction,
                braking_deceleration,
                dt,
            );
        } else if over_max || (zero_accel && friction > 0.0) {
            self.apply_velocity_braking(state, friction, braking_deceleration, dt);
        }

        // Braking never drags a formerly-over-max velocity under max while
        // the player is still pushing the same way.
        if over_max
            && math::size_sq_2d(state.velocity) < max_speed * max_speed
            && math::dot_2d(accel, old_velocity) > 0.0
        {
            let dir = math::normal_2d(old_velocity);
            state.velocity.x = dir.x * max_speed;
            state.velocity.y = dir.y * max_speed;
        }

        self.rescale_step_limits(state, ground_move);

        if !zero_accel {
            let accel_dir = math::normal_2d(accel);
            let veer = math::dot_2d(state.velocity, accel_dir);
            let wish = if ground_move {
                accel
            } else {
                math::clamp_to_max_size_2d(accel, self.config().air_speed_cap)
            };
            let add_speed = math::size_2d(wish) - veer;
            if add_speed > 0.0 {
                let mult = if ground_move {
                    self.config().ground_acceleration_multiplier
                } else {
                    self.config().air_acceleration_multiplier
                };
                let delta = accel * (mult * state.surface_friction * dt);
                state.velocity += math::clamp_to_max_size_2d(delta, add_speed);
            }
        }

        self.apply_axis_limit(state);
    }

    /// Speed-dependent braking, sub-stepped for frame-rate independence.
    /// Never reverses the velocity; snaps to an exact stop at the end.
    pub(crate) fn apply_velocity_braking(
        &self,
        state: &mut MovementState,
        friction: f32,
        braking_deceleration: f32,
        dt: f32,
    ) {
        if dt < MIN_TICK_TIME || math::size_2d(state.velocity) <= BRAKE_TO_STOP_SPEED {
            return;
        }
        let friction = friction.max(0.0);
        let braking = braking_deceleration.max(0.0);
        if friction < 1e-6 && braking == 0.0 {
            return;
        }

        let old = state.velocity;
        let max_step = self
            .config()
            .braking_sub_step_time
            .clamp(1.0 / 75.0, 1.0 / 20.0);
        let mut remaining = dt;
        while remaining >= MIN_TICK_TIME {
            let step = if remaining > max_step && friction >= 1e-6 {
                max_step.min(remaining * 0.5)
            } else {
                remaining
            };
            remaining -= step;

            let speed = math::size_2d(state.velocity);
            if speed <= BRAKE_TO_STOP_SPEED {
                break;
            }
            // Deceleration never drops below current speed, so slow
            // characters still stop in bounded time.
            let control = braking.max(speed);
            let dir = math::normal_2d(state.velocity);
            state.velocity -= dir * (control * friction * step);

            if math::dot_2d(state.velocity, old) <= 0.0 {
                break;
            }
        }

        if math::dot_2d(state.velocity, old) <= 0.0
            || math::size_2d(state.velocity) <= BRAKE_TO_STOP_SPEED
        {
            state.velocity.x = 0.0;
            state.velocity.y = 0.0;
        }
    }

    /// No-clip recomputes velocity from scratch each tick: the look-aligned
    /// part of the input follows the full 3D view vector, the rest stays
    /// tangential, and the result is pinned to the cheat speed.
    fn noclip_velocity(&self, state: &mut MovementState, input: &MoveInput) {
        if math::is_nearly_zero(state.acceleration, 1e-4) {
            state.velocity = Vec3::ZERO;
            return;
        }
        let config = self.config();
        let look = input.view_forward;
        let look_2d = input.forward_2d();
        let accel = state.acceleration;
        let along = math::dot_2d(accel, look_2d);
        let perpendicular = look_2d * along;
        let tangential = accel - perpendicular;
        let dir = math::cosine_angle_2d(accel, look);
        let clamp = if input.has(MoveInput::FLAG_SPRINT) {
            2.0 * config.max_acceleration
        } else {
            config.max_acceleration
        };
        state.velocity = math::clamp_to_size(
            look * (dir * math::size_2d(perpendicular)) + tangential,
            clamp,
        );
    }

    /// Climbing velocity along the ladder plane; no inertia.
    fn ladder_velocity(&self, state: &mut MovementState, input: &MoveInput) {
        let config = self.config();
        let normal = state.ladder_normal;
        let axis = (Vec3::Z - normal * normal.z)
            .try_normalize()
            .unwrap_or(Vec3::Z);

        let up = math::dot_2d(input.wish_dir, input.forward_2d());
        let side = math::dot_2d(input.wish_dir, input.right_2d());
        let lateral = self.policy.slide_vector(input.right_2d(), normal);

        let wish = axis * up + lateral * side;
        state.velocity = if math::is_nearly_zero(wish, 1e-4) {
            Vec3::ZERO
        } else {
            wish.normalize() * (config.ladder_climb_speed * wish.length().min(1.0))
        };
    }

    /// Hard per-axis clamp applied after every velocity mutation.
    pub(crate) fn apply_axis_limit(&self, state: &mut MovementState) {
        let limit = self.config().axis_speed_limit;
        state.velocity.x = state.velocity.x.clamp(-limit, limit);
        state.velocity.y = state.velocity.y.clamp(-limit, limit);
        state.velocity.z = state.velocity.z.clamp(-limit, limit);
    }

    /// At very high speed the character steps lower and accepts steeper
    /// floors, so ramps launch instead of sticking.
    fn rescale_step_limits(&self, state: &mut MovementState, ground_move: bool) {
        let config = self.config();
        let speed = math::size_2d(state.velocity);
        let band = (speed - config.speed_mult_min)
            / (config.speed_mult_max - config.speed_mult_min);
        let mut mult = band.clamp(0.0, 1.0);
        mult *= mult;
        if ground_move {
            mult *= 1.0 - state.surface_friction;
        }
        state.max_step_height =
            math::lerp(config.max_step_height, config.min_step_height, mult);
        state.walkable_floor_z =
            math::lerp(config.walkable_floor_z, config.walkable_floor_z_steep, mult);
    }
}
