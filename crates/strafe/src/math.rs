use glam::Vec3;

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Hermite ease used for eye-height interpolation during crouch transitions.
pub(crate) fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub(crate) fn size_2d(v: Vec3) -> f32 {
    (v.x * v.x + v.y * v.y).sqrt()
}

pub(crate) fn size_sq_2d(v: Vec3) -> f32 {
    v.x * v.x + v.y * v.y
}

pub(crate) fn dot_2d(a: Vec3, b: Vec3) -> f32 {
    a.x * b.x + a.y * b.y
}

/// Horizontal direction of `v`, or zero if `v` has no horizontal part.
pub(crate) fn normal_2d(v: Vec3) -> Vec3 {
    let len = size_2d(v);
    if len < 1e-8 {
        Vec3::ZERO
    } else {
        Vec3::new(v.x / len, v.y / len, 0.0)
    }
}

/// Scales the horizontal part of `v` down to `max`, leaving z untouched.
pub(crate) fn clamp_to_max_size_2d(v: Vec3, max: f32) -> Vec3 {
    let len_sq = size_sq_2d(v);
    if len_sq > max * max && len_sq > 1e-8 {
        let scale = max / len_sq.sqrt();
        Vec3::new(v.x * scale, v.y * scale, v.z)
    } else {
        v
    }
}

/// Rescales `v` to exactly `size` (both bounds of the clamp are equal).
pub(crate) fn clamp_to_size(v: Vec3, size: f32) -> Vec3 {
    let len = v.length();
    if len < 1e-8 { Vec3::ZERO } else { v * (size / len) }
}

/// Cosine of the angle between the horizontal projections of `a` and `b`.
pub(crate) fn cosine_angle_2d(a: Vec3, b: Vec3) -> f32 {
    let la = size_2d(a);
    let lb = size_2d(b);
    if la < 1e-8 || lb < 1e-8 {
        0.0
    } else {
        dot_2d(a, b) / (la * lb)
    }
}

pub(crate) fn is_nearly_zero(v: Vec3, tolerance: f32) -> bool {
    v.length_squared() <= tolerance * tolerance
}

pub(crate) fn nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_2d_preserves_z() {
        let v = clamp_to_max_size_2d(Vec3::new(30.0, 40.0, -7.0), 5.0);
        assert!((size_2d(v) - 5.0).abs() < 1e-4);
        assert_eq!(v.z, -7.0);
    }

    #[test]
    fn normal_2d_of_vertical_vector_is_zero() {
        assert_eq!(normal_2d(Vec3::new(0.0, 0.0, 12.0)), Vec3::ZERO);
    }

    #[test]
    fn smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
    }
}
