//! Small planar helpers shared by the simulation modules.
//!
//! Heading convention: heading 0 faces +Z, and increasing heading turns the
//! kart to its left. All course geometry lives on the XZ plane; Y is height.

use nalgebra::Vector3;
use std::f32::consts::{PI, TAU};

pub type Vec3 = Vector3<f32>;

#[inline]
pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vector3::new(x, y, z)
}

/// Unit forward vector for a heading.
#[inline]
pub fn heading_vector(heading: f32) -> Vec3 {
    vec3(heading.sin(), 0.0, heading.cos())
}

/// Unit vector pointing to the kart's left (the way positive steering turns).
#[inline]
pub fn left_vector(heading: f32) -> Vec3 {
    vec3(heading.cos(), 0.0, -heading.sin())
}

/// Heading that points from `from` to `to` on the XZ plane.
#[inline]
pub fn bearing(from: &Vec3, to: &Vec3) -> f32 {
    (to.x - from.x).atan2(to.z - from.z)
}

/// Wrap an angle into (-PI, PI].
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a <= -PI {
        a += TAU;
    }
    a
}

/// Signed smallest rotation from `from` to `to` (positive = turn left).
#[inline]
pub fn angle_between(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

#[inline]
pub fn planar_distance(a: &Vec3, b: &Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Cross product of two directions on the (x, z) plane.
/// Negative when `b` lies to the left of `a`.
#[inline]
pub fn planar_cross(a: &Vec3, b: &Vec3) -> f32 {
    a.x * b.z - a.z * b.x
}

#[inline]
pub fn is_finite_vec(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Move a value toward a target by at most `max_delta`.
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Frame-rate independent exponential smoothing factor.
#[inline]
pub fn smoothing(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_angle_stays_in_range() {
        for raw in [-10.0_f32, -PI, -1.0, 0.0, 1.0, PI, 7.5, 100.0] {
            let w = wrap_angle(raw);
            assert!(w > -PI - 1e-5 && w <= PI + 1e-5, "{raw} -> {w}");
        }
        assert_eq!(wrap_angle(f32::NAN), 0.0);
    }

    #[test]
    fn positive_angle_means_target_on_the_left() {
        let origin = Vec3::zeros();
        let heading = 0.0;
        let left_point = origin + left_vector(heading) * 5.0 + heading_vector(heading) * 5.0;
        let diff = angle_between(heading, bearing(&origin, &left_point));
        assert!(diff > 0.0);
        // Cross product of forward × to-target is negative for targets on the left.
        assert!(planar_cross(&heading_vector(heading), &(left_point - origin)) < 0.0);
    }

    #[test]
    fn move_toward_does_not_overshoot() {
        assert_eq!(move_toward(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_toward(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_toward(0.0, -1.0, 2.0), -1.0);
    }
}
