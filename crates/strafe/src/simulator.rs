use glam::Vec3;

use crate::config::SimulationConfig;
use crate::events::{MovementEvent, SpeedCategory};
use crate::input::MoveInput;
use crate::policy::{MovementPolicy, SourcePolicy};
use crate::scene::{CollisionQuery, ProbeShape, SurfaceKind, SweepHit};
use crate::state::{FloorResult, MovementMode, MovementState};

/// Ticks shorter than this are skipped outright.
pub(crate) const MIN_TICK_TIME: f32 = 1.0e-6;
pub(crate) const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Floor gap the character floats at while walking.
pub(crate) const MIN_FLOOR_DIST: f32 = 1.9;
pub(crate) const MAX_FLOOR_DIST: f32 = 2.4;

/// Pullback applied to sweep results so the probe never rests in contact.
const COLLISION_SKIN: f32 = 0.1;

/// Footstep cadence, seconds.
const STEP_INTERVAL_SPRINT: f32 = 0.3;
const STEP_INTERVAL_RUN: f32 = 0.4;
const STEP_INTERVAL_CROUCH_EXTRA: f32 = 0.1;
const STEP_INTERVAL_LADDER: f32 = 0.45;

/// One character's movement simulator: the composed strategy object driving
/// velocity integration, ground contact, stance, jumping and the mode state
/// machine over a [`MovementState`]. Deterministic: identical state, input,
/// dt and scene geometry produce identical results.
pub struct Simulator<P: MovementPolicy = SourcePolicy> {
    config: SimulationConfig,
    pub(crate) policy: P,
    events: Vec<MovementEvent>,
}

impl Simulator<SourcePolicy> {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_policy(config, SourcePolicy)
    }
}

impl Default for Simulator<SourcePolicy> {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl<P: MovementPolicy> Simulator<P> {
    pub fn with_policy(config: SimulationConfig, policy: P) -> Self {
        Self {
            config,
            policy,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Events raised since the last drain, in firing order.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, MovementEvent> {
        self.events.drain(..)
    }

    pub(crate) fn push_event(&mut self, event: MovementEvent) {
        self.events.push(event);
    }

    /// Advances one simulation tick. Invalid input (tiny dt, non-finite
    /// state) is a benign no-op.
    pub fn tick(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        scene: &dyn CollisionQuery,
        dt: f32,
    ) {
        if dt < MIN_TICK_TIME {
            return;
        }
        if !state.position.is_finite() || !state.velocity.is_finite() {
            log::warn!("skipping tick: non-finite movement state");
            return;
        }
        state.clock += dt;

        // Deferred mode request from last tick, applied exactly once.
        if let Some(mode) = state.take_pending_mode() {
            self.set_mode(state, mode);
        }

        let noclip_held = input.has(MoveInput::FLAG_NOCLIP);
        if noclip_held && !state.noclip_held_last {
            self.toggle_no_clip(state);
        }
        state.noclip_held_last = noclip_held;

        self.update_footsteps(state, dt);
        self.update_crouch(state, input, scene, dt);

        let wish = if input.wish_dir.length_squared() > 1.0 {
            input.wish_dir.normalize()
        } else {
            input.wish_dir
        };
        state.acceleration = wish * self.config.max_acceleration;

        self.check_jump_input(state, input, dt);

        match state.mode {
            MovementMode::Walking => self.phys_walking(state, input, scene, dt),
            MovementMode::Falling => self.phys_falling(state, input, scene, dt),
            MovementMode::Flying => self.phys_flying(state, input, dt),
            MovementMode::Ladder => self.phys_ladder(state, input, scene, dt),
        }

        state.braking_frame_tolerated = state.mode == MovementMode::Walking;
        state.crouch_frame_tolerated = state.crouched;
        state.acceleration = Vec3::ZERO;
    }

    pub(crate) fn probe(&self, state: &MovementState) -> ProbeShape {
        ProbeShape::capsule(state.capsule.radius, state.capsule.half_height)
    }

    /// Sweeps `delta` from `start`, stopping a skin's width short of the
    /// first blocking hit. Penetrating starts do not move at all.
    pub(crate) fn safe_move(
        &self,
        scene: &dyn CollisionQuery,
        shape: &ProbeShape,
        start: Vec3,
        delta: Vec3,
    ) -> (Vec3, Option<SweepHit>) {
        let len = delta.length();
        if len < 1e-8 {
            return (start, None);
        }
        match scene.sweep(shape, start, start + delta) {
            None => (start + delta, None),
            Some(hit) if hit.start_penetrating => (start, Some(hit)),
            Some(hit) => {
                let allowed = (hit.distance - COLLISION_SKIN).max(0.0);
                (start + delta * (allowed / len), Some(hit))
            }
        }
    }

    /// Redirects a horizontal delta to run parallel to a walkable ramp,
    /// preserving horizontal magnitude.
    pub(crate) fn ramp_vector(&self, delta: Vec3, normal: Vec3) -> Vec3 {
        if normal.z > KINDA_SMALL_NUMBER && normal.z < 1.0 - KINDA_SMALL_NUMBER {
            Vec3::new(
                delta.x,
                delta.y,
                -(normal.x * delta.x + normal.y * delta.y) / normal.z,
            )
        } else {
            delta
        }
    }

    fn phys_walking(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        scene: &dyn CollisionQuery,
        dt: f32,
    ) {
        self.calc_velocity(
            state,
            input,
            self.config.ground_friction,
            self.config.braking_deceleration_walking,
            dt,
        );
        state.velocity.z = 0.0;

        let delta = state.velocity * dt;
        let shape = self.probe(state);
        let ramp_delta = if state.current_floor.is_walkable_floor() {
            self.ramp_vector(delta, state.current_floor.normal)
        } else {
            delta
        };

        let (pos, hit) = self.safe_move(scene, &shape, state.position, ramp_delta);
        state.position = pos;

        if let Some(hit) = hit {
            let remaining = ramp_delta * (1.0 - hit.toi);
            if hit.normal.z >= state.walkable_floor_z {
                // Transitioning onto another walkable ramp.
                let next = self.ramp_vector(Vec3::new(remaining.x, remaining.y, 0.0), hit.normal);
                let (pos, _) = self.safe_move(scene, &shape, state.position, next);
                state.position = pos;
            } else if !self.step_up(state, scene, remaining, &hit) {
                let mut slide = self.policy.slide_vector(remaining, hit.normal);
                // No slope boosting off unwalkable surfaces.
                slide.z = slide.z.min(0.0);
                let (pos, second) = self.safe_move(scene, &shape, state.position, slide);
                state.position = pos;
                if let Some(second) = second {
                    // Two walls: keep only the component along the crease.
                    let crease = hit.normal.cross(second.normal);
                    if let Some(crease) = crease.try_normalize() {
                        let along = crease * slide.dot(crease) * (1.0 - second.toi);
                        let (pos, _) = self.safe_move(scene, &shape, state.position, along);
                        state.position = pos;
                    }
                }
            }
        }

        // Re-evaluate footing once per tick.
        let old_floor = state.current_floor;
        let floor = self.trace_floor(state, scene);
        if floor.is_walkable_floor() {
            if old_floor.is_walkable_floor()
                && self.should_catch_air(state, input, &old_floor, &floor)
            {
                state.current_floor = floor;
                self.set_mode(state, MovementMode::Falling);
            } else {
                state.current_floor = floor;
                state.surface_friction = self.policy.friction_from_hit(&floor.surface);
                self.adjust_floor_height(state);
            }
        } else {
            state.current_floor = floor;
            self.set_mode(state, MovementMode::Falling);
        }
    }

    fn phys_falling(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        scene: &dyn CollisionQuery,
        dt: f32,
    ) {
        self.calc_velocity(
            state,
            input,
            self.config.falling_lateral_friction,
            self.config.braking_deceleration_falling,
            dt,
        );

        let gravity = Vec3::new(0.0, 0.0, self.config.gravity_z);
        state.velocity += gravity * (0.5 * dt);

        let shape = self.probe(state);
        let delta = state.velocity * dt;
        let (pos, hit) = self.safe_move(scene, &shape, state.position, delta);
        state.position = pos;

        if let Some(hit) = hit {
            if self.is_valid_landing_spot(state, scene, state.position, &hit, dt) {
                self.land(state, scene);
                return;
            }
            // Not a floor: clip velocity and slide off.
            if state.velocity.dot(hit.normal) < 0.0 {
                state.velocity = self.policy.slide_vector(state.velocity, hit.normal);
            }
            let remaining = delta * (1.0 - hit.toi);
            let slide = self.policy.slide_vector(remaining, hit.normal);
            let (pos, second) = self.safe_move(scene, &shape, state.position, slide);
            state.position = pos;
            if let Some(second) = second {
                if self.is_valid_landing_spot(state, scene, state.position, &second, dt) {
                    self.land(state, scene);
                    return;
                }
                if state.velocity.dot(second.normal) < 0.0 {
                    state.velocity = self.policy.slide_vector(state.velocity, second.normal);
                }
            }
        }

        state.velocity += gravity * (0.5 * dt);
        self.apply_axis_limit(state);
    }

    fn land(&mut self, state: &mut MovementState, scene: &dyn CollisionQuery) {
        let floor = self.trace_floor(state, scene);
        state.current_floor = floor;
        self.set_mode(state, MovementMode::Walking);
        state.velocity.z = 0.0;
        if floor.is_walkable_floor() {
            state.surface_friction = self.policy.friction_from_hit(&floor.surface);
            self.adjust_floor_height(state);
        }
    }

    fn phys_flying(&mut self, state: &mut MovementState, input: &MoveInput, dt: f32) {
        self.calc_velocity(state, input, 0.0, 0.0, dt);

        // Vertical move intent: jump climbs, crouch descends.
        let vert = (input.has(MoveInput::FLAG_JUMP) as i32
            - input.has(MoveInput::FLAG_CROUCH) as i32) as f32;
        if vert != 0.0 {
            state.velocity.z += vert * self.max_speed(state, input);
        }
        self.apply_axis_limit(state);

        // No-clip ignores the scene entirely.
        state.position += state.velocity * dt;
    }

    fn phys_ladder(
        &mut self,
        state: &mut MovementState,
        input: &MoveInput,
        scene: &dyn CollisionQuery,
        dt: f32,
    ) {
        self.calc_velocity(state, input, 0.0, 0.0, dt);

        let shape = self.probe(state);
        let delta = state.velocity * dt;
        let (pos, hit) = self.safe_move(scene, &shape, state.position, delta);
        state.position = pos;
        if let Some(hit) = hit {
            let slide = self
                .policy
                .slide_vector(delta * (1.0 - hit.toi), hit.normal);
            let (pos, _) = self.safe_move(scene, &shape, state.position, slide);
            state.position = pos;
        }
    }

    /// Keeps the capsule floating a fixed gap above the current floor.
    pub(crate) fn adjust_floor_height(&self, state: &mut MovementState) {
        let dist = state.current_floor.distance;
        if !state.current_floor.is_walkable_floor() {
            return;
        }
        if !(MIN_FLOOR_DIST..=MAX_FLOOR_DIST).contains(&dist) {
            let target = 0.5 * (MIN_FLOOR_DIST + MAX_FLOOR_DIST);
            state.position.z += target - dist;
            state.current_floor.distance = target;
        }
    }

    /// Periodic footstep events while moving fast enough on ground or on a
    /// ladder. Sound selection lives outside the core; this only reports
    /// surface, cadence category and foot side.
    fn update_footsteps(&mut self, state: &mut MovementState, dt: f32) {
        if !self.config.emit_move_events {
            return;
        }
        if state.move_event_timer > 0.0 {
            state.move_event_timer = (state.move_event_timer - dt).max(0.0);
        }
        if state.move_event_timer > 0.0 {
            return;
        }

        let on_ladder = state.mode == MovementMode::Ladder;
        let speed_sq = state.velocity.length_squared();
        let (run_threshold, sprint_threshold) = if state.crouched || on_ladder {
            (self.config.crouch_speed, self.config.crouch_speed * 1.7)
        } else {
            (self.config.run_speed, self.config.sprint_speed)
        };

        let moving_on_ground = state.braking_frame_tolerated || on_ladder;
        if !moving_on_ground || speed_sq < run_threshold * run_threshold {
            return;
        }
        let sprinting = speed_sq >= sprint_threshold * sprint_threshold;

        let surface;
        if on_ladder {
            state.move_event_timer = STEP_INTERVAL_LADDER;
            surface = SurfaceKind::Ladder;
        } else {
            let mut interval = if sprinting {
                STEP_INTERVAL_SPRINT
            } else {
                STEP_INTERVAL_RUN
            };
            if state.crouched {
                interval += STEP_INTERVAL_CROUCH_EXTRA;
            }
            state.move_event_timer = interval;
            surface = state.current_floor.surface.kind;
        }

        self.push_event(MovementEvent::Footstep {
            surface,
            category: if sprinting {
                SpeedCategory::Sprint
            } else {
                SpeedCategory::Walk
            },
            left: state.step_side,
            crouched: state.crouched,
        });
        state.step_side = !state.step_side;
    }

    pub(crate) fn floor_from_hit(&self, state: &MovementState, hit: &SweepHit) -> FloorResult {
        FloorResult {
            blocking: true,
            walkable: hit.normal.z >= state.walkable_floor_z,
            distance: hit.distance,
            normal: hit.normal,
            surface: hit.surface,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A world with no geometry at all.
    pub(crate) struct EmptyScene;

    impl CollisionQuery for EmptyScene {
        fn sweep(&self, _shape: &ProbeShape, _start: Vec3, _end: Vec3) -> Option<SweepHit> {
            None
        }

        fn overlaps(&self, _shape: &ProbeShape, _location: Vec3) -> bool {
            false
        }
    }

    pub(crate) fn grounded_state(config: &SimulationConfig) -> MovementState {
        let mut state = MovementState::new(
            config,
            Vec3::new(0.0, 0.0, config.capsule_half_height + 2.15),
        );
        state.mode = MovementMode::Walking;
        state.braking_frame_tolerated = true;
        state.landed_since_spawn = true;
        state.current_floor = FloorResult {
            blocking: true,
            walkable: true,
            distance: 2.15,
            normal: Vec3::Z,
            surface: Default::default(),
        };
        state.surface_friction = 1.0;
        state
    }
}
