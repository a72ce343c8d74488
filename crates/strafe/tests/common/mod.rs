use glam::Vec3;

use strafe::{CollisionQuery, ProbeShape, SurfaceMaterial, SweepHit};

struct Aabb {
    center: Vec3,
    half: Vec3,
    material: SurfaceMaterial,
}

/// Deterministic axis-aligned-box world with analytic swept-AABB queries.
/// Integration tests use this instead of the rapier scene so results are
/// exact and independent of any physics-engine version.
pub struct BoxWorld {
    boxes: Vec<Aabb>,
}

impl BoxWorld {
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    /// A large ground slab whose top surface sits at `top`.
    pub fn with_ground(top: f32, half_size: f32) -> Self {
        let mut world = Self::new();
        world.add_box(
            Vec3::new(0.0, 0.0, top - 50.0),
            Vec3::new(half_size, half_size, 50.0),
            SurfaceMaterial::default(),
        );
        world
    }

    pub fn add_box(&mut self, center: Vec3, half: Vec3, material: SurfaceMaterial) {
        self.boxes.push(Aabb {
            center,
            half,
            material,
        });
    }

    fn sweep_one(b: &Aabb, shape: &ProbeShape, start: Vec3, delta: Vec3) -> Option<SweepHit> {
        let ext = b.half + shape.half_extents;
        let rel = start - b.center;

        if rel.x.abs() < ext.x && rel.y.abs() < ext.y && rel.z.abs() < ext.z {
            // Already overlapping: report the axis of least penetration.
            let depth = ext - rel.abs();
            let axis = if depth.x <= depth.y && depth.x <= depth.z {
                0
            } else if depth.y <= depth.z {
                1
            } else {
                2
            };
            let mut normal = Vec3::ZERO;
            normal[axis] = if rel[axis] >= 0.0 { 1.0 } else { -1.0 };
            return Some(SweepHit {
                toi: 0.0,
                distance: 0.0,
                normal,
                point: start - normal * shape.half_extents[axis],
                start_penetrating: true,
                surface: b.material,
            });
        }

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut axis = 3usize;
        for a in 0..3 {
            let d = delta[a];
            let s = rel[a];
            if d.abs() < 1e-9 {
                if s <= -ext[a] || s >= ext[a] {
                    return None;
                }
            } else {
                let t1 = (-ext[a] - s) / d;
                let t2 = (ext[a] - s) / d;
                let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
                if near > t_enter {
                    t_enter = near;
                    axis = a;
                }
                t_exit = t_exit.min(far);
                if t_enter > t_exit {
                    return None;
                }
            }
        }
        if axis == 3 || !(0.0..=1.0).contains(&t_enter) {
            return None;
        }

        let mut normal = Vec3::ZERO;
        normal[axis] = -delta[axis].signum();
        let at = start + delta * t_enter;
        let mut point = Vec3::new(
            (at.x - b.center.x).clamp(-b.half.x, b.half.x) + b.center.x,
            (at.y - b.center.y).clamp(-b.half.y, b.half.y) + b.center.y,
            (at.z - b.center.z).clamp(-b.half.z, b.half.z) + b.center.z,
        );
        point[axis] = b.center[axis] + b.half[axis] * normal[axis];

        Some(SweepHit {
            toi: t_enter,
            distance: delta.length() * t_enter,
            normal,
            point,
            start_penetrating: false,
            surface: b.material,
        })
    }
}

impl CollisionQuery for BoxWorld {
    fn sweep(&self, shape: &ProbeShape, start: Vec3, end: Vec3) -> Option<SweepHit> {
        let delta = end - start;
        let mut best: Option<SweepHit> = None;
        for b in &self.boxes {
            if let Some(hit) = Self::sweep_one(b, shape, start, delta) {
                if best.as_ref().is_none_or(|h| hit.toi < h.toi) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    fn overlaps(&self, shape: &ProbeShape, location: Vec3) -> bool {
        self.boxes.iter().any(|b| {
            let ext = b.half + shape.half_extents;
            let rel = location - b.center;
            rel.x.abs() < ext.x && rel.y.abs() < ext.y && rel.z.abs() < ext.z
        })
    }
}
