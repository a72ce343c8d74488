use glam::Vec3;

use crate::events::MovementEvent;
use crate::policy::MovementPolicy;
use crate::simulator::Simulator;
use crate::state::{FloorResult, MovementMode, MovementState};

impl<P: MovementPolicy> Simulator<P> {
    /// Switches the movement mode immediately and runs the transition
    /// bookkeeping. External callers normally queue through
    /// [`MovementState::request_mode`]; internal transitions (landing,
    /// jumping, mounting a ladder) go through here directly.
    pub fn set_mode(&mut self, state: &mut MovementState, mode: MovementMode) {
        if state.mode == mode {
            return;
        }
        let from = state.mode;
        state.mode = mode;
        log::trace!("movement mode {from:?} -> {mode:?}");
        self.on_mode_changed(state, from, mode);
    }

    fn on_mode_changed(&mut self, state: &mut MovementState, from: MovementMode, to: MovementMode) {
        // Mode-specific counters never survive a transition.
        state.step_side = false;
        state.jump_count = 0;
        state.jump_hold_time = 0.0;

        match (from, to) {
            (MovementMode::Falling, MovementMode::Walking) => {
                let impact_speed = (-state.velocity.z).max(0.0);
                // The spawn drop onto the first floor is silent.
                let first = !state.landed_since_spawn;
                state.landed_since_spawn = true;
                if self.config().emit_move_events && !first {
                    self.push_event(MovementEvent::Landed {
                        surface: state.current_floor.surface.kind,
                        impact_speed,
                    });
                }
            }
            (_, MovementMode::Falling) => {
                state.current_floor = FloorResult::none();
            }
            (_, MovementMode::Ladder) => {
                state.velocity = Vec3::ZERO;
            }
            _ => {}
        }

        if self.config().emit_move_events {
            self.push_event(MovementEvent::ModeChanged { from, to });
        }
    }

    /// No-clip cheat. Applies immediately and queues the same mode so the
    /// next tick's deferred slot can't undo it.
    pub fn set_no_clip(&mut self, state: &mut MovementState, enabled: bool) {
        state.cheat_flying = enabled;
        let mode = if enabled {
            MovementMode::Flying
        } else {
            MovementMode::Walking
        };
        self.set_mode(state, mode);
        state.request_mode(mode);
    }

    pub fn toggle_no_clip(&mut self, state: &mut MovementState) {
        self.set_no_clip(state, !state.cheat_flying);
    }

    /// Attaches to a ladder whose plane normal points away from its surface.
    /// Climbing happens against that plane; any crouch in progress is
    /// cancelled.
    pub fn mount_ladder(&mut self, state: &mut MovementState, normal: Vec3) {
        state.ladder_normal = normal.try_normalize().unwrap_or(Vec3::X);
        state.wants_crouch = false;
        state.crouch_transition = false;
        self.set_mode(state, MovementMode::Ladder);
    }

    /// Lets go of the ladder without a jump impulse.
    pub fn dismount_ladder(&mut self, state: &mut MovementState) {
        if state.mode == MovementMode::Ladder {
            self.set_mode(state, MovementMode::Falling);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MoveInput;
    use crate::simulator::test_support::{EmptyScene, grounded_state};

    #[test]
    fn landing_resets_jump_state_and_reports_impact() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.mode = MovementMode::Falling;
        state.jump_count = 1;
        state.velocity = Vec3::new(100.0, 0.0, -450.0);

        sim.set_mode(&mut state, MovementMode::Walking);

        assert_eq!(state.jump_count, 0);
        let events: Vec<_> = sim.drain_events().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            MovementEvent::Landed { impact_speed, .. } if (*impact_speed - 450.0).abs() < 1e-3
        )));
    }

    #[test]
    fn first_landing_after_spawn_is_silent() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.mode = MovementMode::Falling;
        state.landed_since_spawn = false;
        state.velocity = Vec3::new(0.0, 0.0, -200.0);

        sim.set_mode(&mut state, MovementMode::Walking);

        let events: Vec<_> = sim.drain_events().collect();
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, MovementEvent::Landed { .. }))
        );
        assert!(state.landed_since_spawn);
    }

    #[test]
    fn every_transition_clears_jump_counters() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.jump_count = 2;
        state.jump_hold_time = 0.5;

        sim.set_no_clip(&mut state, true);
        assert_eq!(state.jump_count, 0);
        assert_eq!(state.jump_hold_time, 0.0);

        state.jump_count = 1;
        state.jump_hold_time = 0.25;
        sim.mount_ladder(&mut state, Vec3::X);
        assert_eq!(state.jump_count, 0);
        assert_eq!(state.jump_hold_time, 0.0);
    }

    #[test]
    fn noclip_round_trip() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);

        sim.set_no_clip(&mut state, true);
        assert!(state.cheat_flying);
        assert_eq!(state.mode, MovementMode::Flying);
        assert!(state.has_pending_mode());

        sim.set_no_clip(&mut state, false);
        assert!(!state.cheat_flying);
        assert_eq!(state.mode, MovementMode::Walking);
    }

    #[test]
    fn mounting_a_ladder_zeroes_velocity() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.velocity = Vec3::new(250.0, 0.0, 0.0);
        state.wants_crouch = true;
        state.crouch_transition = true;

        sim.mount_ladder(&mut state, Vec3::new(2.0, 0.0, 0.0));

        assert_eq!(state.mode, MovementMode::Ladder);
        assert_eq!(state.velocity, Vec3::ZERO);
        assert_eq!(state.ladder_normal, Vec3::X);
        assert!(!state.crouch_transition);
    }

    #[test]
    fn deferred_mode_applies_at_tick_start() {
        let mut sim = Simulator::default();
        let config = sim.config().clone();
        let mut state = grounded_state(&config);
        state.cheat_flying = true;
        state.request_mode(MovementMode::Flying);

        sim.tick(&mut state, &MoveInput::new(), &EmptyScene, 1.0 / 60.0);

        assert_eq!(state.mode, MovementMode::Flying);
    }
}
