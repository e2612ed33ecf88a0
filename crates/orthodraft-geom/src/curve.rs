//! Edge and reference curves: segments, circular arcs and surface
//! isoparameter lines.

use orthodraft_math::{perpendicular, Point2, Point3, Vec3};
use std::fmt::Debug;
use std::f64::consts::TAU;

use crate::frame::Frame;
use crate::surface::Surface;

/// Which family a curve belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    /// Straight segment.
    Line,
    /// Circle or arc.
    Circle,
    /// Line of constant u or v on a surface.
    Isoparametric,
}

/// Object-safe cloning for curves.
pub trait CurveObject {
    /// Boxed copy.
    fn clone_box(&self) -> Box<dyn Curve3d>;
}

impl<T: Curve3d + Clone + 'static> CurveObject for T {
    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

/// A parametric curve `C(t)`.
pub trait Curve3d: CurveObject + Send + Sync + Debug {
    /// Point at `t`.
    fn evaluate(&self, t: f64) -> Point3;

    /// Natural parameter interval.
    fn domain(&self) -> (f64, f64);

    /// Family of this curve.
    fn curve_type(&self) -> CurveKind;
}

impl Clone for Box<dyn Curve3d> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Straight segment from `start` (t = 0) to `end` (t = 1).
#[derive(Debug, Clone)]
pub struct Line3d {
    /// Point at t = 0.
    pub start: Point3,
    /// Point at t = 1.
    pub end: Point3,
}

impl Line3d {
    /// Segment between two points.
    pub fn from_points(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

impl Curve3d for Line3d {
    fn evaluate(&self, t: f64) -> Point3 {
        self.start.lerp(&self.end, t)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Line
    }
}

/// Circle in the `xy` plane of a frame, centred on its origin.
///
/// `C(t) = origin + radius · heading(t)` for `t` in `span`.
#[derive(Debug, Clone)]
pub struct Circle3d {
    /// Circle frame; `z` is the plane normal, `x` marks t = 0.
    pub frame: Frame,
    /// Radius.
    pub radius: f64,
    /// Angular interval; `(0, 2π)` for a full circle.
    pub span: (f64, f64),
}

impl Circle3d {
    /// Full circle around `normal`, starting towards `x_dir`.
    pub fn from_frame(center: Point3, radius: f64, normal: Vec3, x_dir: Vec3) -> Self {
        Self {
            frame: Frame::from_z(center, normal, x_dir),
            radius,
            span: (0.0, TAU),
        }
    }

    /// Full circle around `normal` with an arbitrary start direction.
    pub fn with_normal(center: Point3, radius: f64, normal: Vec3) -> Self {
        Self::from_frame(center, radius, normal, perpendicular(&normal))
    }

    /// The same circle limited to `[start, end]`.
    pub fn arc(self, start: f64, end: f64) -> Self {
        Self {
            span: (start, end),
            ..self
        }
    }

    /// Centre point.
    pub fn center(&self) -> Point3 {
        self.frame.origin
    }

    /// Whether the span covers a whole turn.
    pub fn is_full(&self) -> bool {
        (self.span.1 - self.span.0 - TAU).abs() < 1e-12
    }
}

impl Curve3d for Circle3d {
    fn evaluate(&self, t: f64) -> Point3 {
        self.frame.origin + self.radius * self.frame.heading(t)
    }

    fn domain(&self) -> (f64, f64) {
        self.span
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Circle
    }
}

/// The surface parameter held fixed along an [`IsoCurve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IsoParameter {
    /// Fixed u; t runs over v.
    U(f64),
    /// Fixed v; t runs over u.
    V(f64),
}

impl IsoParameter {
    /// Surface parameters at running value `t`.
    pub fn uv(self, t: f64) -> Point2 {
        match self {
            IsoParameter::U(u) => Point2::new(u, t),
            IsoParameter::V(v) => Point2::new(t, v),
        }
    }
}

/// Isoparameter line on a surface, drawn as a visual reference.
#[derive(Debug, Clone)]
pub struct IsoCurve {
    /// Carrying surface.
    pub surface: Box<dyn Surface>,
    /// Fixed parameter.
    pub parameter: IsoParameter,
    /// Interval of the running parameter.
    pub range: (f64, f64),
}

impl IsoCurve {
    /// Isoparameter line over `range`.
    pub fn new(surface: Box<dyn Surface>, parameter: IsoParameter, range: (f64, f64)) -> Self {
        Self {
            surface,
            parameter,
            range,
        }
    }
}

impl Curve3d for IsoCurve {
    fn evaluate(&self, t: f64) -> Point3 {
        self.surface.evaluate(self.parameter.uv(t))
    }

    fn domain(&self) -> (f64, f64) {
        self.range
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Isoparametric
    }
}
