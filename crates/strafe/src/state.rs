use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::scene::SurfaceMaterial;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementMode {
    Walking,
    Falling,
    Flying,
    Ladder,
}

/// Result of the once-per-tick downward floor sweep.
#[derive(Debug, Clone, Copy)]
pub struct FloorResult {
    pub blocking: bool,
    pub walkable: bool,
    /// Gap between the capsule base and the hit, in world units.
    pub distance: f32,
    pub normal: Vec3,
    pub surface: SurfaceMaterial,
}

impl FloorResult {
    pub fn none() -> Self {
        Self {
            blocking: false,
            walkable: false,
            distance: 0.0,
            normal: Vec3::Z,
            surface: SurfaceMaterial::default(),
        }
    }

    pub fn is_walkable_floor(&self) -> bool {
        self.blocking && self.walkable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CapsuleDims {
    pub radius: f32,
    pub half_height: f32,
}

/// The whole mutable simulation state of one character. Owned by exactly one
/// character and mutated only by the simulator; cloning it clones the
/// character for prediction/replay purposes.
#[derive(Debug, Clone)]
pub struct MovementState {
    /// Capsule center, Z up.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Desired input-derived acceleration for this tick; discarded at tick end.
    pub acceleration: Vec3,

    pub mode: MovementMode,
    pending_mode: Option<MovementMode>,

    pub capsule: CapsuleDims,
    pub eye_height: f32,
    pub crouched: bool,
    pub wants_crouch: bool,
    pub crouch_transition: bool,

    /// No-clip cheat latch; drives the Flying mode request.
    pub cheat_flying: bool,
    /// Plane normal of the mounted ladder, valid while `mode == Ladder`.
    pub ladder_normal: Vec3,

    pub current_floor: FloorResult,
    pub surface_friction: f32,

    /// Effective step height; rescaled by the integrator at speed.
    pub max_step_height: f32,
    /// Effective walkable-floor threshold; rescaled with the step height.
    pub walkable_floor_z: f32,

    /// Deterministic simulation clock, advanced by dt each tick.
    pub clock: f32,

    pub jump_count: u32,
    pub jump_hold_time: f32,
    pub last_jump_time: f32,
    pub last_jump_boost_time: f32,

    /// Ground contact lasted a full frame; braking may apply.
    pub braking_frame_tolerated: bool,
    /// Crouch state lasted a full frame; crouch speed caps may apply.
    pub crouch_frame_tolerated: bool,

    pub step_side: bool,
    pub move_event_timer: f32,

    pub(crate) jump_held_last: bool,
    pub(crate) noclip_held_last: bool,
    pub(crate) landed_since_spawn: bool,
}

impl MovementState {
    pub fn new(config: &SimulationConfig, position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mode: MovementMode::Falling,
            pending_mode: None,
            capsule: CapsuleDims {
                radius: config.capsule_radius,
                half_height: config.capsule_half_height,
            },
            eye_height: config.base_eye_height,
            crouched: false,
            wants_crouch: false,
            crouch_transition: false,
            cheat_flying: false,
            ladder_normal: Vec3::X,
            current_floor: FloorResult::none(),
            surface_friction: 1.0,
            max_step_height: config.max_step_height,
            walkable_floor_z: config.walkable_floor_z,
            clock: 0.0,
            jump_count: 0,
            jump_hold_time: 0.0,
            last_jump_time: -1.0e9,
            last_jump_boost_time: -1.0e9,
            braking_frame_tolerated: true,
            crouch_frame_tolerated: false,
            step_side: false,
            move_event_timer: 0.0,
            jump_held_last: false,
            noclip_held_last: false,
            landed_since_spawn: false,
        }
    }

    /// Queues a mode change for the start of the next tick. A later request
    /// in the same tick supersedes an earlier one.
    pub fn request_mode(&mut self, mode: MovementMode) {
        self.pending_mode = Some(mode);
    }

    pub fn has_pending_mode(&self) -> bool {
        self.pending_mode.is_some()
    }

    pub(crate) fn take_pending_mode(&mut self) -> Option<MovementMode> {
        self.pending_mode.take()
    }

    pub fn base_z(&self) -> f32 {
        self.position.z - self.capsule.half_height
    }

    pub fn horizontal_speed(&self) -> f32 {
        crate::math::size_2d(self.velocity)
    }

    pub fn is_walking(&self) -> bool {
        self.mode == MovementMode::Walking
    }

    pub fn is_falling(&self) -> bool {
        self.mode == MovementMode::Falling
    }
}
