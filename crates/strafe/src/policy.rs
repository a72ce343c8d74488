use glam::Vec3;

use crate::scene::SurfaceMaterial;

/// Swappable movement behaviors. One concrete simulator owns the state
/// machine; the policy decides the surface-dependent details, so variants
/// (slippery mods, stricter landing rules) swap this instead of subclassing.
pub trait MovementPolicy {
    /// Maps a physical-material friction coefficient to the [0, 1] surface
    /// friction used by braking and acceleration.
    fn friction_from_hit(&self, surface: &SurfaceMaterial) -> f32 {
        let raw = surface.friction.clamp(0.0, 1.25);
        (raw * 1.25).min(1.0)
    }

    /// Deflects a blocked movement delta along the blocking plane.
    fn slide_vector(&self, delta: Vec3, normal: Vec3) -> Vec3 {
        delta - normal * delta.dot(normal)
    }

    /// Hits within this distance of the capsule's outer radius don't count
    /// as a floor.
    fn edge_reject_distance(&self) -> f32 {
        0.15
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePolicy;

impl MovementPolicy for SourcePolicy {}
