mod rapier;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use rapier::RapierScene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Default,
    Concrete,
    Metal,
    Wood,
    Dirt,
    Ladder,
}

/// Physical-material data resolved from a hit collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub friction: f32,
    pub kind: SurfaceKind,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            friction: 0.8,
            kind: SurfaceKind::Default,
        }
    }
}

/// The swept query shape. Floor checks use a flat base, so the character is
/// probed as an axis-aligned box (radius, radius, half height); it never
/// rotates.
#[derive(Debug, Clone, Copy)]
pub struct ProbeShape {
    pub half_extents: Vec3,
}

impl ProbeShape {
    pub fn capsule(radius: f32, half_height: f32) -> Self {
        Self {
            half_extents: Vec3::new(radius, radius, half_height),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SweepHit {
    /// Fraction of the sweep at impact, in [0, 1].
    pub toi: f32,
    /// World-space distance traveled before impact.
    pub distance: f32,
    pub normal: Vec3,
    pub point: Vec3,
    /// The shape already overlapped geometry at the sweep start.
    pub start_penetrating: bool,
    pub surface: SurfaceMaterial,
}

/// Synchronous collision queries against world geometry. The simulator
/// treats results as a pure function of the scene at call time and performs
/// no caching across ticks.
pub trait CollisionQuery {
    /// Sweeps `shape` from `start` to `end`, returning the first blocking hit.
    fn sweep(&self, shape: &ProbeShape, start: Vec3, end: Vec3) -> Option<SweepHit>;

    /// True if `shape` placed at `location` overlaps any geometry.
    fn overlaps(&self, shape: &ProbeShape, location: Vec3) -> bool;
}
