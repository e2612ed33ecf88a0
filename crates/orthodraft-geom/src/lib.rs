#![warn(missing_docs)]

//! Analytic geometry carried by orthodraft shapes.
//!
//! Faces are backed by planes, cylinders, cones and spheres; edges by
//! straight segments, circular arcs and isoparameter lines. All of them are
//! expressed in a local [`Frame`], which is what lets the hidden-line code
//! invert a surface exactly: [`Surface::parameters`] maps a ray hit back to
//! `(u, v)` so it can be tested against the face trim.

mod curve;
mod frame;
mod surface;

pub use curve::{Circle3d, Curve3d, CurveKind, CurveObject, IsoCurve, IsoParameter, Line3d};
pub use frame::{wrap_angle, Frame};
pub use surface::{
    ConeSurface, CylinderSurface, Plane, SphereSurface, Surface, SurfaceKind, SurfaceObject,
};
