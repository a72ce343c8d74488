use glam::Vec3;

use crate::input::MoveInput;
use crate::math;
use crate::policy::MovementPolicy;
use crate::scene::{CollisionQuery, ProbeShape};
use crate::simulator::{KINDA_SMALL_NUMBER, Simulator};
use crate::state::{MovementMode, MovementState};

/// Wiggle room added to the standing probe so a successful uncrouch never
/// ends in penetration.
const SWEEP_INFLATION: f32 = KINDA_SMALL_NUMBER * 10.0;

impl<P: MovementPolicy> Simulator<P> {
    /// Drives the crouch/uncrouch transition one tick forward. Transition
    /// times depend on whether the character is on the ground; ladders
    /// cancel a pending crouch outright.
    pub(crate) fn update_crouch(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        scene: &dyn CollisionQuery,
        dt: f32,
    ) {
        let held = input.has(MoveInput::FLAG_CROUCH);
        if held != state.wants_crouch {
            state.wants_crouch = held;
            state.crouch_transition = true;
        }
        if !state.crouch_transition || state.cheat_flying {
            return;
        }

        let config = self.config();
        if !state.wants_crouch {
            let time = if state.is_walking() {
                config.uncrouch_time
            } else {
                config.uncrouch_jump_time
            };
            self.do_uncrouch_resize(state, scene, time, dt);
        } else if state.mode == MovementMode::Ladder {
            state.crouch_transition = false;
        } else {
            let time = if state.is_walking() {
                config.crouch_time
            } else {
                config.crouch_jump_time
            };
            self.do_crouch_resize(state, scene, time, dt);
        }
    }

    /// Shrinks the capsule toward the crouched height. On the ground the
    /// base stays put and the center drops; in the air the legs tuck up and
    /// the center rises. The final tick snaps to the exact crouched height.
    pub(crate) fn do_crouch_resize(
        &mut self,
        state: &mut MovementState,
        _scene: &dyn CollisionQuery,
        target_time: f32,
        dt: f32,
    ) {
        let config = self.config();
        let standing = config.capsule_half_height;
        let crouched = config.crouched_half_height;

        if math::nearly_equal(state.capsule.half_height, crouched, KINDA_SMALL_NUMBER) {
            state.capsule.half_height = crouched;
            state.eye_height = config.crouched_eye_height;
            state.crouched = true;
            state.crouch_transition = false;
            return;
        }

        let full_diff = standing - crouched;
        let current = state.capsule.half_height;
        let current_alpha = 1.0 - (current - crouched) / full_diff;

        let mut target_alpha = 1.0;
        if target_time > KINDA_SMALL_NUMBER {
            target_alpha = current_alpha + dt / target_time;
        }
        if target_alpha >= 1.0 - KINDA_SMALL_NUMBER {
            target_alpha = 1.0;
            state.crouched = true;
            state.crouch_transition = false;
        }

        let new_half = if target_alpha == 1.0 {
            crouched
        } else {
            (standing - full_diff * target_alpha).max(config.capsule_radius)
        };
        let shrink = current - new_half;
        state.capsule.half_height = new_half;
        if state.is_walking() {
            state.position.z -= shrink;
        } else {
            state.position.z += shrink;
        }
        state.eye_height = if target_alpha == 1.0 {
            config.crouched_eye_height
        } else {
            math::lerp(
                config.base_eye_height,
                config.crouched_eye_height,
                math::smoothstep(target_alpha),
            )
        };
    }

    /// Grows the capsule back toward standing height, aborting the tick when
    /// the standing shape would encroach on geometry. While on the ground a
    /// headroom probe also rejects partial uncrouches in tight spots.
    pub(crate) fn do_uncrouch_resize(
        &mut self,
        state: &mut MovementState,
        scene: &dyn CollisionQuery,
        target_time: f32,
        dt: f32,
    ) {
        let config = self.config();
        let standing = config.capsule_half_height;
        let crouched = config.crouched_half_height;

        if math::nearly_equal(state.capsule.half_height, standing, KINDA_SMALL_NUMBER) {
            state.capsule.half_height = standing;
            state.eye_height = config.base_eye_height;
            state.crouched = false;
            state.crouch_frame_tolerated = false;
            state.crouch_transition = false;
            return;
        }

        let full_diff = standing - crouched;
        let current = state.capsule.half_height;
        let current_alpha = 1.0 - (standing - current) / full_diff;

        let mut target_alpha = 1.0;
        if target_time > KINDA_SMALL_NUMBER {
            target_alpha = current_alpha + dt / target_time;

            // Don't start a partial uncrouch under a ceiling we could never
            // fully stand up beneath.
            if state.is_walking() {
                let needed =
                    (standing - current) * config.ground_uncrouch_check_factor;
                let probe = ProbeShape::capsule(
                    state.capsule.radius,
                    current + needed + SWEEP_INFLATION,
                );
                let test = state.position + Vec3::Z * (probe.half_extents.z - current);
                if scene.overlaps(&probe, test) {
                    return;
                }
            }
        }
        if target_alpha >= 1.0 - KINDA_SMALL_NUMBER {
            target_alpha = 1.0;
        }

        let new_half = if target_alpha == 1.0 {
            standing
        } else {
            standing - full_diff * (1.0 - target_alpha)
        };
        let grow = new_half - current;

        let probe = ProbeShape::capsule(state.capsule.radius, new_half + SWEEP_INFLATION);
        if state.is_walking() {
            // Grow while keeping the base planted.
            let mut test = state.position + Vec3::Z * grow;
            let mut encroached = scene.overlaps(&probe, test);
            if encroached
                && state.current_floor.blocking
                && state.current_floor.distance > SWEEP_INFLATION
            {
                // Something barely overhead: hug the floor and retry.
                test.z -= state.current_floor.distance - SWEEP_INFLATION;
                encroached = scene.overlaps(&probe, test);
            }
            if encroached {
                return;
            }
            state.position = test;
        } else {
            // Expand in place around the center.
            if scene.overlaps(&probe, state.position) {
                return;
            }
        }

        state.capsule.half_height = new_half;
        state.eye_height = if target_alpha == 1.0 {
            config.base_eye_height
        } else {
            math::lerp(
                config.crouched_eye_height,
                config.base_eye_height,
                math::smoothstep(target_alpha),
            )
        };
        if target_alpha == 1.0 {
            state.crouched = false;
            state.crouch_frame_tolerated = false;
            state.crouch_transition = false;
        }
    }
}
