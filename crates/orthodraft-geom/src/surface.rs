//! Analytic surfaces: plane, cylinder, cone and sphere.
//!
//! Each surface lives in a [`Frame`] and is parameterized in its local
//! coordinates. The u parameter of every surface of revolution is the
//! angle around the frame's `z` axis and is periodic.

use orthodraft_math::{Dir3, Point2, Point3, Vec3};
use std::any::Any;
use std::fmt::Debug;

use crate::frame::Frame;

/// Which analytic family a surface belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Plane.
    Plane,
    /// Circular cylinder.
    Cylinder,
    /// Circular cone.
    Cone,
    /// Sphere.
    Sphere,
}

impl SurfaceKind {
    /// Whether the surface bends, so that its contour depends on the view.
    pub fn is_curved(&self) -> bool {
        *self != SurfaceKind::Plane
    }
}

/// Object-safe cloning and downcasting, implemented for every surface.
pub trait SurfaceObject {
    /// Boxed copy.
    fn clone_box(&self) -> Box<dyn Surface>;
    /// Concrete type access.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Surface + Clone + 'static> SurfaceObject for T {
    fn clone_box(&self) -> Box<dyn Surface> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A parametric surface `S(u, v)`.
pub trait Surface: SurfaceObject + Send + Sync + Debug {
    /// Point at `(u, v)`.
    fn evaluate(&self, uv: Point2) -> Point3;

    /// Unit normal at `(u, v)`, before any face orientation is applied.
    fn normal(&self, uv: Point2) -> Dir3;

    /// Parameters of the surface point nearest `p`; the inverse of
    /// [`evaluate`](Surface::evaluate) on the surface. Periodic u comes
    /// back in `[0, 2π)`.
    fn parameters(&self, p: &Point3) -> Point2;

    /// Family of this surface.
    fn surface_type(&self) -> SurfaceKind;

    /// Whether u wraps with period `2π`.
    fn is_u_periodic(&self) -> bool {
        self.surface_type().is_curved()
    }
}

impl Clone for Box<dyn Surface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A plane; `(u, v)` are the frame's `x` and `y` coordinates.
#[derive(Debug, Clone)]
pub struct Plane {
    /// Plane frame; `z` is the normal.
    pub frame: Frame,
}

impl Plane {
    /// Plane through `origin` spanned by `x_dir` and `y_dir`, which need not
    /// be unit length. The normal is `x_dir × y_dir`.
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3) -> Self {
        Self {
            frame: Frame::from_xy(origin, x_dir, y_dir),
        }
    }

    /// In-plane coordinates of the orthogonal projection of `p`.
    pub fn project(&self, p: &Point3) -> Point2 {
        Point2::from(self.frame.local_point(p).xy())
    }

    /// Plane normal.
    pub fn normal_dir(&self) -> Dir3 {
        self.frame.z
    }
}

impl Surface for Plane {
    fn evaluate(&self, uv: Point2) -> Point3 {
        self.frame.origin + self.frame.world_vector(&Vec3::new(uv.x, uv.y, 0.0))
    }

    fn normal(&self, _uv: Point2) -> Dir3 {
        self.frame.z
    }

    fn parameters(&self, p: &Point3) -> Point2 {
        self.project(p)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }
}

/// A circular cylinder around the frame's `z` axis.
///
/// `S(u, v) = origin + radius · heading(u) + v · z`
#[derive(Debug, Clone)]
pub struct CylinderSurface {
    /// Axis frame; `x` marks `u = 0`.
    pub frame: Frame,
    /// Radius.
    pub radius: f64,
}

impl CylinderSurface {
    /// Cylinder on the world z axis.
    pub fn new(radius: f64) -> Self {
        Self {
            frame: Frame::world(Point3::origin()),
            radius,
        }
    }

    /// Cylinder with base point `center`, axis `axis` and `u = 0` towards
    /// `ref_dir`.
    pub fn with_frame(center: Point3, axis: Vec3, ref_dir: Vec3, radius: f64) -> Self {
        Self {
            frame: Frame::from_z(center, axis, ref_dir),
            radius,
        }
    }
}

impl Surface for CylinderSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        self.frame.origin + self.radius * self.frame.heading(uv.x) + uv.y * self.frame.z.as_ref()
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        Dir3::new_normalize(self.frame.heading(uv.x))
    }

    fn parameters(&self, p: &Point3) -> Point2 {
        let local = self.frame.local_point(p);
        Point2::new(Frame::angle_of(&local), local.z)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }
}

/// A circular cone with its apex at the frame origin, opening along `z`.
///
/// `S(u, v) = apex + v · (cos α · z + sin α · heading(u))`, so `v` is the
/// distance from the apex along a generator.
#[derive(Debug, Clone)]
pub struct ConeSurface {
    /// Apex frame; `z` points into the cone.
    pub frame: Frame,
    /// Half-angle α at the apex, in radians.
    pub half_angle: f64,
}

impl ConeSurface {
    /// Lateral surface of a frustum standing on `center` along +z.
    ///
    /// Returns the cone and the sorted generator range the frustum covers.
    /// Equal radii (a cylinder) or a non-positive height give `None`.
    pub fn from_frustum(
        center: Point3,
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
    ) -> Option<(Self, (f64, f64))> {
        let shrink = radius_bottom - radius_top;
        if shrink.abs() < 1e-12 || height <= 0.0 {
            return None;
        }
        // Signed height at which the radius reaches zero.
        let apex_height = height * radius_bottom / shrink;
        let opens_up = shrink < 0.0;
        let axis = if opens_up { Vec3::z() } else { -Vec3::z() };
        let apex = center + apex_height * Vec3::z();
        let slant_per_radius = shrink.hypot(height) / shrink.abs();
        let v_bottom = slant_per_radius * radius_bottom;
        let v_top = slant_per_radius * radius_top;
        let cone = Self {
            frame: Frame::from_z(apex, axis, Vec3::x()),
            half_angle: (shrink.abs() / height).atan(),
        };
        Some((cone, (v_bottom.min(v_top), v_bottom.max(v_top))))
    }

    /// Apex point.
    pub fn apex(&self) -> Point3 {
        self.frame.origin
    }

    fn generator(&self, u: f64) -> Vec3 {
        let (s, c) = self.half_angle.sin_cos();
        c * self.frame.z.as_ref() + s * self.frame.heading(u)
    }
}

impl Surface for ConeSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        self.frame.origin + uv.y * self.generator(uv.x)
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        let (s, c) = self.half_angle.sin_cos();
        Dir3::new_normalize(c * self.frame.heading(uv.x) - s * self.frame.z.as_ref())
    }

    fn parameters(&self, p: &Point3) -> Point2 {
        let local = self.frame.local_point(p);
        Point2::new(Frame::angle_of(&local), local.z / self.half_angle.cos())
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Cone
    }
}

/// A sphere; u is longitude around `z`, v is latitude in `[-π/2, π/2]`.
#[derive(Debug, Clone)]
pub struct SphereSurface {
    /// Frame at the centre; `z` points at the north pole.
    pub frame: Frame,
    /// Radius.
    pub radius: f64,
}

impl SphereSurface {
    /// Sphere with poles on the world z axis.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            frame: Frame::world(center),
            radius,
        }
    }

    /// Centre point.
    pub fn center(&self) -> Point3 {
        self.frame.origin
    }

    fn direction(&self, uv: Point2) -> Vec3 {
        let (sin_lat, cos_lat) = uv.y.sin_cos();
        cos_lat * self.frame.heading(uv.x) + sin_lat * self.frame.z.as_ref()
    }
}

impl Surface for SphereSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        self.frame.origin + self.radius * self.direction(uv)
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        Dir3::new_normalize(self.direction(uv))
    }

    fn parameters(&self, p: &Point3) -> Point2 {
        let local = self.frame.local_point(p);
        let lat = (local.z / self.radius).clamp(-1.0, 1.0).asin();
        Point2::new(Frame::angle_of(&local), lat)
    }

    fn surface_type(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }
}
