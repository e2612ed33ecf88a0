//! Axis-aligned bounding boxes for faces.

use orthodraft_math::{Point2, Point3, Vec3};
use orthodraft_topo::{FaceId, Shape, Trim};

/// Grid resolution for sampling curved faces.
const SURFACE_GRID: usize = 16;

/// Pieces per arc when sampling trim loops.
const LOOP_ARC_PIECES: usize = 64;

/// Box aligned with the world axes.
///
/// [`Aabb3::empty`] has inverted infinite corners and absorbs whatever is
/// included into it first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Lowest corner.
    pub min: Point3,
    /// Highest corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Box between two corners, given lowest first.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Box containing nothing.
    pub fn empty() -> Self {
        Self::new(
            Point3::from(Vec3::repeat(f64::INFINITY)),
            Point3::from(Vec3::repeat(f64::NEG_INFINITY)),
        )
    }

    /// Whether nothing has been included.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|k| self.min[k] > self.max[k])
    }

    /// Grow to contain `p`.
    pub fn include_point(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Grow to contain `other`; an empty `other` changes nothing.
    pub fn include_box(&mut self, other: &Aabb3) {
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Pad every side by `margin`.
    pub fn expand(&mut self, margin: f64) {
        let pad = Vec3::repeat(margin);
        self.min -= pad;
        self.max += pad;
    }

    /// Midpoint.
    pub fn centroid(&self) -> Point3 {
        self.min + 0.5 * (self.max - self.min)
    }

    /// Corner-to-corner length; zero when empty.
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    /// Total area of the six sides; zero when empty.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.max - self.min;
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }
}

/// Conservative bounding box of a face.
///
/// Planar faces are bounded by their trim boundary; curved faces are
/// sampled on a parameter grid over the trim's bounds. Either way the box
/// is padded so that the surface between samples stays inside it.
pub fn face_aabb(shape: &Shape, face_id: FaceId) -> Aabb3 {
    let face = shape.face(face_id);
    let surface = face.surface.as_ref();
    let mut aabb = Aabb3::empty();

    if surface.surface_type().is_curved() {
        let (lo, hi) = face.trim.bounds();
        for i in 0..=SURFACE_GRID {
            for j in 0..=SURFACE_GRID {
                let u = lo.x + (hi.x - lo.x) * i as f64 / SURFACE_GRID as f64;
                let v = lo.y + (hi.y - lo.y) * j as f64 / SURFACE_GRID as f64;
                aabb.include_point(&surface.evaluate(Point2::new(u, v)));
            }
        }
        // A 16-step grid sags by under 2% of the radius between samples.
        let pad = 0.05 * aabb.diagonal();
        aabb.expand(pad);
    } else {
        match &face.trim {
            Trim::Loops { outer, .. } => {
                for uv in outer.polyline(LOOP_ARC_PIECES) {
                    aabb.include_point(&surface.evaluate(uv));
                }
            }
            Trim::Domain { u, v } => {
                for (a, b) in [(u.0, v.0), (u.1, v.0), (u.1, v.1), (u.0, v.1)] {
                    aabb.include_point(&surface.evaluate(Point2::new(a, b)));
                }
            }
        }
        let pad = 2e-3 * aabb.diagonal();
        aabb.expand(pad);
    }

    aabb.expand(1e-9);
    aabb
}
