//! Rays and the hits they produce.

use orthodraft_math::{Dir3, Point2, Point3, Vec3};
use orthodraft_topo::FaceId;

use crate::bbox::Aabb3;

/// Half-line `origin + t · direction`, `t ≥ 0`.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Start point.
    pub origin: Point3,
    /// Unit direction.
    pub direction: Dir3,
    /// Component-wise reciprocal of `direction`; infinite on zero components.
    recip: Vec3,
}

impl Ray {
    /// Ray from `origin` along `direction`, which is normalized here.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let direction = Dir3::new_normalize(direction);
        Self {
            origin,
            direction,
            recip: direction.map(f64::recip),
        }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Parameter interval `(enter, exit)` inside `aabb`, with `enter`
    /// clamped to zero, or `None` when the box is missed or behind.
    ///
    /// `f64::max` and `f64::min` drop the NaN produced by `0 · ∞` when an
    /// axis-parallel ray starts on a slab plane, so that slab never rejects.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut enter = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;
        for k in 0..3 {
            let (first, second) = if self.recip[k] >= 0.0 {
                (aabb.min[k], aabb.max[k])
            } else {
                (aabb.max[k], aabb.min[k])
            };
            enter = enter.max((first - self.origin[k]) * self.recip[k]);
            exit = exit.min((second - self.origin[k]) * self.recip[k]);
        }
        (exit >= enter && exit >= 0.0).then(|| (enter.max(0.0), exit))
    }
}

/// A trimmed crossing of a ray with a face.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Ray parameter.
    pub t: f64,
    /// World point.
    pub point: Point3,
    /// Outward face normal.
    pub normal: Dir3,
    /// Surface parameters.
    pub uv: Point2,
    /// Face crossed.
    pub face_id: FaceId,
    /// Whether the crossing lies within tolerance of the face trim.
    pub on_boundary: bool,
}

impl RayHit {
    /// Cosine between ray and normal. Near zero means the ray grazes.
    pub fn incidence(&self, ray: &Ray) -> f64 {
        self.normal.dot(ray.direction.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Point3::origin(), Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(ray.at(5.0), Point3::new(5.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_box_interval() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::x());
        let (enter, exit) = ray.intersect_aabb(&unit_box()).unwrap();
        assert_relative_eq!(enter, 5.0, epsilon = 1e-10);
        assert_relative_eq!(exit, 6.0, epsilon = 1e-10);

        let inside = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 1.0, 0.0));
        let (enter, _) = inside.intersect_aabb(&unit_box()).unwrap();
        assert_eq!(enter, 0.0);
    }

    #[test]
    fn test_box_miss_and_behind() {
        let miss = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::x());
        assert!(miss.intersect_aabb(&unit_box()).is_none());
        let behind = Ray::new(Point3::new(-5.0, 0.5, 0.5), -Vec3::x());
        assert!(behind.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_start_on_slab_plane_is_not_rejected() {
        let ray = Ray::new(Point3::new(0.0, -1.0, 0.5), Vec3::y());
        assert!(ray.intersect_aabb(&unit_box()).is_some());
    }
}
