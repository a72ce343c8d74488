use serde::{Deserialize, Serialize};

/// Immutable per-character tuning. Built once, validated, then shared with the
/// simulator; nothing in here is mutated at runtime. Defaults reproduce
/// HL2-style movement (speeds in units/s, lengths in units, times in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Input acceleration magnitude for a full deflection (cl_forwardspeed).
    pub max_acceleration: f32,

    pub walk_speed: f32,
    pub run_speed: f32,
    pub sprint_speed: f32,
    /// Ground speed while crouched.
    pub crouch_speed: f32,

    /// sv_accelerate.
    pub ground_acceleration_multiplier: f32,
    /// sv_airaccelerate.
    pub air_acceleration_multiplier: f32,
    /// Cap on the per-tick added velocity while airborne (30 Hu in HL2).
    pub air_speed_cap: f32,

    /// sv_friction.
    pub ground_friction: f32,
    /// Used instead of ground friction when `use_separate_braking_friction`.
    pub braking_friction: f32,
    pub use_separate_braking_friction: bool,
    /// sv_stopspeed analogue; floored at current speed when braking.
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_falling: f32,
    /// Lateral friction while falling (0 keeps air control pure).
    pub falling_lateral_friction: f32,
    /// Braking sub-step length; clamped to [1/75, 1/20] s at use.
    pub braking_sub_step_time: f32,

    /// Hard per-axis velocity bound applied after every integrator mutation.
    pub axis_speed_limit: f32,

    pub gravity_z: f32,
    pub jump_z_velocity: f32,
    /// Vertical speed above which an airborne player no longer "controls"
    /// the move (jump apex); also the upward-slide landing rejection bound.
    pub jump_apex_velocity: f32,
    /// Maximum jumps before touching ground again.
    pub jump_max_count: u32,
    /// Holding jump re-jumps on every possible tick.
    pub auto_bhop: bool,
    /// Allows the unclamped jump-boost addition to win when larger.
    pub bunny_hopping: bool,

    pub max_step_height: f32,
    /// Step height floor when the dynamic slope scaling kicks in.
    pub min_step_height: f32,
    pub walkable_floor_z: f32,
    /// Walkable-Z the dynamic scaling relaxes toward at high speed.
    pub walkable_floor_z_steep: f32,
    /// Speed band over which step height and walkable-Z rescale.
    pub speed_mult_min: f32,
    pub speed_mult_max: f32,

    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    pub crouched_half_height: f32,
    pub base_eye_height: f32,
    pub crouched_eye_height: f32,

    pub crouch_time: f32,
    pub uncrouch_time: f32,
    pub crouch_jump_time: f32,
    pub uncrouch_jump_time: f32,
    /// Fraction of the remaining uncrouch growth probed for headroom before
    /// a partial uncrouch is allowed.
    pub ground_uncrouch_check_factor: f32,

    pub ladder_climb_speed: f32,
    pub ladder_jump_off_speed: f32,

    /// Emit footstep/jump/land events through the event queue.
    pub emit_move_events: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let sprint_speed = 609.6;
        let run_speed = 361.9;
        Self {
            max_acceleration: 857.25,

            walk_speed: 285.75,
            run_speed,
            sprint_speed,
            crouch_speed: run_speed / 3.0,

            ground_acceleration_multiplier: 10.0,
            air_acceleration_multiplier: 10.0,
            air_speed_cap: 57.15,

            ground_friction: 4.0,
            braking_friction: 4.0,
            use_separate_braking_friction: false,
            braking_deceleration_walking: 190.5,
            braking_deceleration_falling: 0.0,
            falling_lateral_friction: 0.0,
            braking_sub_step_time: 0.015,

            axis_speed_limit: 6667.5,

            gravity_z: -1143.0,
            // 160 Hu jump impulse: clears 72.11 units at the apex.
            jump_z_velocity: (2.0 * 1143.0 * 72.113_775_f32).sqrt(),
            jump_apex_velocity: 266.7,
            jump_max_count: 1,
            auto_bhop: true,
            bunny_hopping: false,

            max_step_height: 34.29,
            min_step_height: 7.5,
            // 45.57 degree slope limit.
            walkable_floor_z: 0.7,
            walkable_floor_z_steep: 0.9848,
            speed_mult_min: sprint_speed * 1.7,
            speed_mult_max: sprint_speed * 2.5,

            capsule_radius: 30.48,
            capsule_half_height: 68.58,
            crouched_half_height: 34.29,
            base_eye_height: 53.34,
            crouched_eye_height: 27.43,

            crouch_time: 0.4,
            uncrouch_time: 0.2,
            crouch_jump_time: 0.0,
            uncrouch_jump_time: 0.8,
            ground_uncrouch_check_factor: 0.75,

            ladder_climb_speed: 200.0,
            ladder_jump_off_speed: 300.0,

            emit_move_events: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("capsule half height {half_height} is below the radius {radius}")]
    CapsuleBelowRadius { half_height: f32, radius: f32 },
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("walkable floor z {0} must lie in (0, 1]")]
    WalkableFloorZ(f32),
    #[error("speed multiplier band inverted: min {min} >= max {max}")]
    SpeedBandInverted { min: f32, max: f32 },
    #[error("gravity_z must be negative, got {0}")]
    GravityNotDownward(f32),
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_acceleration", self.max_acceleration),
            ("run_speed", self.run_speed),
            ("sprint_speed", self.sprint_speed),
            ("walk_speed", self.walk_speed),
            ("crouch_speed", self.crouch_speed),
            ("jump_z_velocity", self.jump_z_velocity),
            ("axis_speed_limit", self.axis_speed_limit),
            ("capsule_radius", self.capsule_radius),
            ("max_step_height", self.max_step_height),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.capsule_half_height < self.capsule_radius {
            return Err(ConfigError::CapsuleBelowRadius {
                half_height: self.capsule_half_height,
                radius: self.capsule_radius,
            });
        }
        if self.crouched_half_height < self.capsule_radius {
            return Err(ConfigError::CapsuleBelowRadius {
                half_height: self.crouched_half_height,
                radius: self.capsule_radius,
            });
        }
        if !(self.walkable_floor_z > 0.0 && self.walkable_floor_z <= 1.0) {
            return Err(ConfigError::WalkableFloorZ(self.walkable_floor_z));
        }
        if self.speed_mult_min >= self.speed_mult_max {
            return Err(ConfigError::SpeedBandInverted {
                min: self.speed_mult_min,
                max: self.speed_mult_max,
            });
        }
        if self.gravity_z >= 0.0 {
            return Err(ConfigError::GravityNotDownward(self.gravity_z));
        }
        Ok(())
    }
}
