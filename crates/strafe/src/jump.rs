use crate::events::MovementEvent;
use crate::input::MoveInput;
use crate::math;
use crate::policy::MovementPolicy;
use crate::simulator::Simulator;
use crate::state::{MovementMode, MovementState};

/// sin of the view-to-input angle past which a jump boost pushes backward.
const BACKWARD_BOOST_ANGLE_SIN: f32 = 0.642_79;

impl<P: MovementPolicy> Simulator<P> {
    /// Resolves jump intent for this tick. A rising edge always tries to
    /// jump; with auto-bhop enabled a held button retries every tick.
    pub(crate) fn check_jump_input(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        dt: f32,
    ) {
        let held = input.has(MoveInput::FLAG_JUMP);
        let pressed = held && (!state.jump_held_last || self.config().auto_bhop);
        state.jump_held_last = held;
        if held {
            state.jump_hold_time += dt;
        } else {
            state.jump_hold_time = 0.0;
        }

        if pressed && self.can_attempt_jump(state) {
            self.do_jump(state, input);
        }
    }

    /// Jumps need either a walkable floor underfoot or a mounted ladder.
    pub(crate) fn can_attempt_jump(&self, state: &MovementState) -> bool {
        if state.cheat_flying {
            return false;
        }
        match state.mode {
            MovementMode::Walking => {
                state.current_floor.blocking
                    && state.current_floor.normal.z
                        >= state.walkable_floor_z - crate::simulator::KINDA_SMALL_NUMBER
            }
            MovementMode::Falling => {
                // Walking off a ledge consumes the first jump.
                let used = state.jump_count.max(1);
                used < self.config().jump_max_count
            }
            MovementMode::Ladder => true,
            MovementMode::Flying => false,
        }
    }

    pub(crate) fn do_jump(&mut self, state: &mut MovementState, input: &MoveInput) {
        if state.mode == MovementMode::Ladder {
            self.jump_off_ladder(state);
            return;
        }

        let surface = state.current_floor.surface.kind;
        state.velocity.z = state.velocity.z.max(self.config().jump_z_velocity);
        // The transition clears jump counters; count this jump afterwards.
        self.set_mode(state, MovementMode::Falling);
        state.jump_count += 1;
        state.last_jump_time = state.clock;
        self.on_jumped(state, input);
        self.apply_axis_limit(state);
        if self.config().emit_move_events {
            self.push_event(MovementEvent::Jumped { surface });
        }
    }

    /// HL2 jump boost: a fraction of the forward input speed is added along
    /// the facing direction, throttled to once per full jump arc so chained
    /// hops near the boost window don't stack.
    fn on_jumped(&mut self, state: &mut MovementState, input: &MoveInput) {
        let config = self.config();
        let max_jump_time = -4.0 * config.jump_z_velocity / (3.0 * config.gravity_z);
        if state.clock < state.last_jump_boost_time + max_jump_time {
            return;
        }
        state.last_jump_boost_time = state.clock;

        let config = self.config();
        let facing = input.forward_2d();
        let wish = math::clamp_to_max_size_2d(input.wish_dir, 1.0) * config.max_acceleration;
        let forward_speed = math::dot_2d(wish, facing);

        let boost_pct = if input.has(MoveInput::FLAG_SPRINT) || state.crouched {
            0.1
        } else {
            0.5
        };
        let mut addition = (forward_speed * boost_pct).abs();
        let max_speed = self.max_speed(state, input);
        let max_boosted = max_speed + max_speed * boost_pct;
        let new_speed = addition + state.horizontal_speed();
        let mut addition_unclamped = addition;

        if new_speed > max_boosted {
            addition -= new_speed - max_boosted;
        }
        if forward_speed < -config.max_acceleration * BACKWARD_BOOST_ANGLE_SIN {
            addition = -addition;
            addition_unclamped = -addition_unclamped;
        }

        let mut boosted = state.velocity + facing * addition;
        let mut boosted_sq = math::size_sq_2d(boosted);
        if config.bunny_hopping {
            let unclamped = state.velocity + facing * addition_unclamped;
            if math::size_sq_2d(unclamped) > boosted_sq {
                boosted_sq = math::size_sq_2d(unclamped);
                boosted = unclamped;
            }
        }
        if math::size_sq_2d(state.velocity) < boosted_sq {
            state.velocity = boosted;
        }
    }

    /// Launches away from the ladder plane.
    fn jump_off_ladder(&mut self, state: &mut MovementState) {
        let normal = state.ladder_normal;
        state.velocity = normal * self.config().ladder_jump_off_speed;
        state.last_jump_time = state.clock;
        self.set_mode(state, MovementMode::Falling);
        if self.config().emit_move_events {
            self.push_event(MovementEvent::Jumped {
                surface: crate::scene::SurfaceKind::Ladder,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::config::SimulationConfig;
    use crate::simulator::test_support::grounded_state;

    const DT: f32 = 1.0 / 60.0;

    fn jump_input() -> MoveInput {
        let mut input = MoveInput::new();
        input.set(MoveInput::FLAG_JUMP, true);
        input
    }

    #[test]
    fn ground_jump_applies_full_impulse() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);

        sim.check_jump_input(&mut state, &jump_input(), DT);

        assert_eq!(state.mode, MovementMode::Falling);
        assert_eq!(state.velocity.z, config.jump_z_velocity);
        assert_eq!(state.jump_count, 1);
        let events: Vec<_> = sim.drain_events().collect();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, MovementEvent::Jumped { .. }))
        );
    }

    #[test]
    fn jump_boost_caps_at_max_boosted_speed() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(config.run_speed, 0.0, 0.0);

        let mut input = jump_input();
        input.wish_dir = Vec3::X;
        sim.check_jump_input(&mut state, &input, DT);

        assert!((state.horizontal_speed() - config.run_speed * 1.5).abs() < 1e-2);
    }

    #[test]
    fn jump_never_reduces_existing_upward_speed() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        let rising = config.jump_z_velocity + 120.0;
        state.velocity.z = rising;

        sim.check_jump_input(&mut state, &jump_input(), DT);

        assert_eq!(state.mode, MovementMode::Falling);
        assert_eq!(state.velocity.z, rising);
    }

    #[test]
    fn jump_boost_is_throttled_to_one_per_arc() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(config.run_speed, 0.0, 0.0);

        let mut input = jump_input();
        input.wish_dir = Vec3::X;
        sim.check_jump_input(&mut state, &input, DT);
        let boosted = state.horizontal_speed();

        // Land immediately and jump again inside the throttle window.
        state.mode = MovementMode::Walking;
        state.jump_count = 0;
        state.velocity.z = 0.0;
        state.clock += DT;
        sim.check_jump_input(&mut state, &input, DT);

        assert_eq!(state.horizontal_speed(), boosted);
    }

    #[test]
    fn sprint_jump_boost_is_small() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(config.run_speed, 0.0, 0.0);

        let mut input = jump_input();
        input.wish_dir = Vec3::X;
        input.set(MoveInput::FLAG_SPRINT, true);
        sim.check_jump_input(&mut state, &input, DT);

        let addition = state.horizontal_speed() - config.run_speed;
        assert!(addition > 0.0);
        assert!(addition <= config.max_acceleration * 0.1 + 1e-3);
    }

    #[test]
    fn no_jump_from_steep_floor() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.current_floor.normal = Vec3::new(0.8, 0.0, 0.6);
        state.current_floor.walkable = false;

        sim.check_jump_input(&mut state, &jump_input(), DT);
        assert_eq!(state.mode, MovementMode::Walking);
    }

    #[test]
    fn held_jump_rejumps_only_with_auto_bhop() {
        let config = SimulationConfig {
            auto_bhop: false,
            ..Default::default()
        };
        let mut sim = Simulator::new(config.clone());
        let mut state = grounded_state(&config);

        let input = jump_input();
        sim.check_jump_input(&mut state, &input, DT);
        assert_eq!(state.mode, MovementMode::Falling);

        // Land without releasing the button; no edge, no jump.
        state.mode = MovementMode::Walking;
        state.jump_count = 0;
        state.velocity = Vec3::ZERO;
        sim.check_jump_input(&mut state, &input, DT);
        assert_eq!(state.mode, MovementMode::Walking);
    }
}
