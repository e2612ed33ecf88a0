//! Closed-form ray intersection with the analytic surfaces.
//!
//! The ray is first expressed in the surface's own [`Frame`], where every
//! surface is a plane `z = 0`, a quadric around the `z` axis or a sphere at
//! the origin. Crossings come back sorted by ray parameter, with their
//! surface parameters, and never behind the ray origin.

use orthodraft_geom::{
    ConeSurface, CylinderSurface, Frame, Plane, SphereSurface, Surface, SurfaceKind,
};
use orthodraft_math::{Point2, Vec3};

use crate::Ray;

/// A crossing of a ray with an untrimmed surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    /// Ray parameter.
    pub t: f64,
    /// Surface parameters at the crossing.
    pub uv: Point2,
}

/// All forward crossings of `ray` with `surface`.
pub fn intersect_surface(ray: &Ray, surface: &dyn Surface) -> Vec<SurfaceHit> {
    let any = surface.as_any();
    let hits: Option<Vec<SurfaceHit>> = match surface.surface_type() {
        SurfaceKind::Plane => any
            .downcast_ref::<Plane>()
            .map(|p| intersect_plane(ray, p).into_iter().collect()),
        SurfaceKind::Cylinder => any
            .downcast_ref::<CylinderSurface>()
            .map(|c| intersect_cylinder(ray, c)),
        SurfaceKind::Cone => any.downcast_ref::<ConeSurface>().map(|c| intersect_cone(ray, c)),
        SurfaceKind::Sphere => any
            .downcast_ref::<SphereSurface>()
            .map(|s| intersect_sphere(ray, s)),
    };
    hits.unwrap_or_default()
}

/// Crossing with a plane; `None` when parallel or behind.
pub fn intersect_plane(ray: &Ray, plane: &Plane) -> Option<SurfaceHit> {
    let (o, d) = to_local(ray, &plane.frame);
    let t = forward_roots(0.0, d.z, o.z).into_iter().next()?;
    Some(SurfaceHit {
        t,
        uv: Point2::new(o.x + t * d.x, o.y + t * d.y),
    })
}

/// Crossings with an infinite cylinder. A ray along the axis has none.
pub fn intersect_cylinder(ray: &Ray, cylinder: &CylinderSurface) -> Vec<SurfaceHit> {
    let (o, d) = to_local(ray, &cylinder.frame);
    let a = d.x * d.x + d.y * d.y;
    let b = 2.0 * (o.x * d.x + o.y * d.y);
    let c = o.x * o.x + o.y * o.y - cylinder.radius * cylinder.radius;
    hits_on(ray, cylinder, forward_roots(a, b, c))
}

/// Crossings with the nappe of a cone that opens along its axis. The
/// mirror nappe behind the apex is not part of the surface.
pub fn intersect_cone(ray: &Ray, cone: &ConeSurface) -> Vec<SurfaceHit> {
    let (o, d) = to_local(ray, &cone.frame);
    // x² + y² = k z² with k = tan² α
    let k = cone.half_angle.tan().powi(2);
    let a = d.x * d.x + d.y * d.y - k * d.z * d.z;
    let b = 2.0 * (o.x * d.x + o.y * d.y - k * o.z * d.z);
    let c = o.x * o.x + o.y * o.y - k * o.z * o.z;
    let roots = forward_roots(a, b, c)
        .into_iter()
        .filter(|&t| o.z + t * d.z >= 0.0)
        .collect();
    hits_on(ray, cone, roots)
}

/// Entry and exit crossings with a sphere; only the exit from inside.
pub fn intersect_sphere(ray: &Ray, sphere: &SphereSurface) -> Vec<SurfaceHit> {
    let (o, d) = to_local(ray, &sphere.frame);
    let c = o.norm_squared() - sphere.radius * sphere.radius;
    hits_on(ray, sphere, forward_roots(1.0, 2.0 * o.dot(&d), c))
}

fn to_local(ray: &Ray, frame: &Frame) -> (Vec3, Vec3) {
    (
        frame.local_point(&ray.origin),
        frame.local_vector(ray.direction.as_ref()),
    )
}

fn hits_on(ray: &Ray, surface: &dyn Surface, roots: Vec<f64>) -> Vec<SurfaceHit> {
    roots
        .into_iter()
        .map(|t| SurfaceHit {
            t,
            uv: surface.parameters(&ray.at(t)),
        })
        .collect()
}

/// Non-negative roots of `a t² + b t + c`, ascending. A vanishing `a`
/// degrades to the linear equation.
pub(crate) fn forward_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    let roots = if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            vec![]
        } else {
            vec![-c / b]
        }
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            vec![]
        } else {
            // Pick the sign that avoids cancellation, then Vieta for the other.
            let q = -0.5 * (b + disc.sqrt().copysign(b));
            if q == 0.0 {
                vec![0.0]
            } else {
                let (r1, r2) = (q / a, c / q);
                vec![r1.min(r2), r1.max(r2)]
            }
        }
    };
    roots.into_iter().filter(|&t| t >= 0.0).collect()
}
