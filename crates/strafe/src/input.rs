use glam::Vec3;

use crate::math;

/// One tick of resolved player intent. The caller maps devices to this; the
/// simulator never sees raw input. The view vectors double as the narrow
/// character-query surface: everything the integrator needs to know about
/// the owning character travels in here.
#[derive(Debug, Clone, Copy)]
pub struct MoveInput {
    /// World-space desired move direction, magnitude <= 1.
    pub wish_dir: Vec3,
    /// Unit look vector (pitch included).
    pub view_forward: Vec3,
    pub flags: u16,
}

impl MoveInput {
    pub const FLAG_JUMP: u16 = 1 << 0;
    pub const FLAG_CROUCH: u16 = 1 << 1;
    pub const FLAG_SPRINT: u16 = 1 << 2;
    pub const FLAG_WALK: u16 = 1 << 3;
    pub const FLAG_NOCLIP: u16 = 1 << 4;

    pub fn new() -> Self {
        Self {
            wish_dir: Vec3::ZERO,
            view_forward: Vec3::X,
            flags: 0,
        }
    }

    #[inline]
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u16, value: bool) {
        if value {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Horizontal facing direction; falls back to +X for a straight-down view.
    pub fn forward_2d(&self) -> Vec3 {
        let fwd = math::normal_2d(self.view_forward);
        if fwd == Vec3::ZERO { Vec3::X } else { fwd }
    }

    /// Horizontal right vector matching `forward_2d`.
    pub fn right_2d(&self) -> Vec3 {
        let fwd = self.forward_2d();
        Vec3::new(fwd.y, -fwd.x, 0.0)
    }
}

impl Default for MoveInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_round_trip() {
        let mut input = MoveInput::new();
        assert!(!input.has(MoveInput::FLAG_JUMP));
        input.set(MoveInput::FLAG_JUMP, true);
        input.set(MoveInput::FLAG_SPRINT, true);
        assert!(input.has(MoveInput::FLAG_JUMP));
        input.set(MoveInput::FLAG_JUMP, false);
        assert!(!input.has(MoveInput::FLAG_JUMP));
        assert!(input.has(MoveInput::FLAG_SPRINT));
    }

    #[test]
    fn right_is_perpendicular_to_forward() {
        let mut input = MoveInput::new();
        input.view_forward = Vec3::new(0.6, 0.8, 0.0);
        let dot = input.forward_2d().dot(input.right_2d());
        assert!(dot.abs() < 1e-6);
    }
}
