#![warn(missing_docs)]

//! Shared numeric vocabulary for the orthodraft crates.
//!
//! Everything is `f64` and backed by nalgebra. Model space is millimetres;
//! 2D points are either surface parameters or view-plane coordinates,
//! depending on context.

use nalgebra::{Unit, Vector2, Vector3};

/// Point in model space.
pub type Point3 = nalgebra::Point3<f64>;

/// Displacement in model space.
pub type Vec3 = Vector3<f64>;

/// Unit-length direction.
pub type Dir3 = Unit<Vector3<f64>>;

/// Point in a parameter plane or view plane.
pub type Point2 = nalgebra::Point2<f64>;

/// Displacement in a parameter plane or view plane.
pub type Vec2 = Vector2<f64>;

/// Proper rotation of model space.
pub type Rotation = nalgebra::Rotation3<f64>;

/// A unit vector orthogonal to `v`.
///
/// Deterministic: `v` is crossed with whichever of world x or y it is
/// farther from being parallel to.
pub fn perpendicular(v: &Vec3) -> Vec3 {
    let n = v.normalize();
    let helper = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    helper.cross(&n).normalize()
}

/// Geometric comparison thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Lengths below this are zero (mm).
    pub linear: f64,
    /// Sines of angles below this are zero.
    pub angular: f64,
}

impl Tolerance {
    /// 1e-6 mm and 1e-9 rad.
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Whether a length is indistinguishable from zero.
    pub fn is_zero(&self, length: f64) -> bool {
        length.abs() < self.linear
    }

    /// Whether two points coincide.
    pub fn same_point(&self, a: &Point3, b: &Point3) -> bool {
        self.is_zero((a - b).norm())
    }

    /// Whether two unit vectors lie on one line, in either sense.
    pub fn parallel(&self, a: &Vec3, b: &Vec3) -> bool {
        a.cross(b).norm() < self.angular.max(1e-12)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
