//! Right-handed orthonormal frames.

use orthodraft_math::{perpendicular, Dir3, Point3, Vec3};
use std::f64::consts::TAU;

/// An origin with three orthonormal axes, `z = x × y`.
///
/// Every analytic type in this crate is written in the local coordinates
/// of a frame: `z` is the axis of revolution (or the plane normal) and the
/// angular parameter is measured from `x` towards `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Local origin.
    pub origin: Point3,
    /// First axis; angle zero.
    pub x: Dir3,
    /// Second axis; angle π/2.
    pub y: Dir3,
    /// Third axis.
    pub z: Dir3,
}

impl Frame {
    /// The world axes moved to `origin`.
    pub fn world(origin: Point3) -> Self {
        Self {
            origin,
            x: Vec3::x_axis(),
            y: Vec3::y_axis(),
            z: Vec3::z_axis(),
        }
    }

    /// Frame with the given `z` axis. `x` follows `x_hint` with its `z`
    /// component removed; a hint parallel to `z` falls back to an arbitrary
    /// perpendicular.
    pub fn from_z(origin: Point3, z: Vec3, x_hint: Vec3) -> Self {
        let z = Dir3::new_normalize(z);
        let flat = x_hint - x_hint.dot(z.as_ref()) * z.as_ref();
        let x = if flat.norm() > 1e-12 {
            Dir3::new_normalize(flat)
        } else {
            Dir3::new_normalize(perpendicular(z.as_ref()))
        };
        let y = Dir3::new_normalize(z.cross(x.as_ref()));
        Self { origin, x, y, z }
    }

    /// Frame spanned by two in-plane directions; `z` is their cross product.
    pub fn from_xy(origin: Point3, x: Vec3, y: Vec3) -> Self {
        Self::from_z(origin, x.cross(&y), x)
    }

    /// Local coordinates of a world point.
    pub fn local_point(&self, p: &Point3) -> Vec3 {
        self.local_vector(&(p - self.origin))
    }

    /// Local components of a world vector.
    pub fn local_vector(&self, v: &Vec3) -> Vec3 {
        Vec3::new(
            v.dot(self.x.as_ref()),
            v.dot(self.y.as_ref()),
            v.dot(self.z.as_ref()),
        )
    }

    /// World vector from local components.
    pub fn world_vector(&self, local: &Vec3) -> Vec3 {
        local.x * self.x.as_ref() + local.y * self.y.as_ref() + local.z * self.z.as_ref()
    }

    /// Unit vector in the `xy` plane at `angle` from `x`.
    pub fn heading(&self, angle: f64) -> Vec3 {
        let (s, c) = angle.sin_cos();
        c * self.x.as_ref() + s * self.y.as_ref()
    }

    /// Angle of a local vector around `z`, in `[0, 2π)`. Vectors on the
    /// axis map to zero.
    pub fn angle_of(local: &Vec3) -> f64 {
        if local.x.hypot(local.y) < 1e-12 {
            0.0
        } else {
            wrap_angle(local.y.atan2(local.x))
        }
    }
}

/// Normalize an angle into `[0, 2π)`.
pub fn wrap_angle(a: f64) -> f64 {
    let w = a.rem_euclid(TAU);
    if w >= TAU {
        0.0
    } else {
        w
    }
}
