//! Edge taxonomy: static edge kinds, view-dependent outlines, and the
//! silhouette and isoparameter curves synthesized on curved faces.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use orthodraft_geom::{
    wrap_angle, Circle3d, ConeSurface, Curve3d, CylinderSurface, Frame, IsoCurve, IsoParameter,
    Line3d, SphereSurface, SurfaceKind,
};
use orthodraft_math::{Point2, Vec3};
use orthodraft_raytrace::trim::point_in_face;
use orthodraft_topo::{Continuity, EdgeId, Face, FaceId, Shape, Trim};

use crate::direction::ViewBasis;
use crate::settings::DraftSettings;
use crate::types::EdgeKind;

/// Samples used to locate where a synthesized curve leaves its face.
const CLIP_SAMPLES: usize = 32;

/// Bisection steps when clipping synthesized curves to a trim.
const CLIP_BISECTION: u32 = 40;

/// Positions along an edge where face normals are compared.
const PROBE_POSITIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Static kind of an edge, independent of any view.
///
/// Free edges, seams and junctions between bodies are sewn. Otherwise a
/// recorded continuity decides, and failing that the largest dihedral
/// angle along the edge is compared with `sharp_angle`.
pub fn static_kind(shape: &Shape, id: EdgeId, settings: &DraftSettings) -> EdgeKind {
    let edge = shape.edge(id);
    if edge.is_free() || edge.is_seam() {
        return EdgeKind::Sewn;
    }
    let (fa, fb) = (shape.face(edge.faces[0]), shape.face(edge.faces[1]));
    if fa.body != fb.body {
        return EdgeKind::Sewn;
    }
    match edge.continuity {
        Some(Continuity::C0) => return EdgeKind::Sharp,
        Some(Continuity::G1) => return EdgeKind::Smooth,
        None => {}
    }

    let max_angle = PROBE_POSITIONS
        .iter()
        .map(|&s| {
            let p = edge.point_at(edge.param(s));
            let na = fa.normal_near(&p);
            let nb = fb.normal_near(&p);
            na.dot(nb.as_ref()).clamp(-1.0, 1.0).acos()
        })
        .fold(0.0, f64::max);

    if max_angle > settings.sharp_angle {
        EdgeKind::Sharp
    } else {
        EdgeKind::Smooth
    }
}

/// Kind of an edge in a particular view.
///
/// Smooth edges and seams whose face is seen edge-on along the whole edge
/// are the silhouette of that face, so they are drawn as outlines.
pub fn view_kind(
    shape: &Shape,
    id: EdgeId,
    static_kind: EdgeKind,
    basis: &ViewBasis,
    settings: &DraftSettings,
) -> EdgeKind {
    let edge = shape.edge(id);
    let candidate = match static_kind {
        EdgeKind::Smooth => true,
        EdgeKind::Sewn => edge.is_seam(),
        _ => false,
    };
    if !candidate {
        return static_kind;
    }
    let face = shape.face(edge.faces[0]);
    let edge_on = PROBE_POSITIONS.iter().all(|&s| {
        let p = edge.point_at(edge.param(s));
        face.normal_near(&p).dot(&basis.normal).abs() < settings.grazing_cosine
    });
    if edge_on {
        EdgeKind::Outline
    } else {
        static_kind
    }
}

/// Count of edges per static kind.
pub fn kind_counts(shape: &Shape, settings: &DraftSettings) -> BTreeMap<EdgeKind, usize> {
    let mut counts = BTreeMap::new();
    for (id, _) in shape.edges() {
        *counts.entry(static_kind(shape, id, settings)).or_insert(0) += 1;
    }
    counts
}

/// A curve synthesized on a face for one view.
#[derive(Debug, Clone)]
pub struct SyntheticCurve {
    /// Face the curve lies on.
    pub face: FaceId,
    /// Outline or isoparameter.
    pub kind: EdgeKind,
    /// The curve.
    pub curve: Box<dyn Curve3d>,
    /// Parameter range to draw.
    pub range: (f64, f64),
}

/// Silhouette curves of every curved face for this view.
///
/// Cylinders and cones get straight generators where the surface normal is
/// perpendicular to the view; spheres get their contour circle. Each curve
/// is clipped to the face trim. Generators that coincide with a seam or
/// with the u-limit of a partial face are already true edges and are
/// skipped.
pub fn silhouettes(shape: &Shape, basis: &ViewBasis, settings: &DraftSettings) -> Vec<SyntheticCurve> {
    let mut out = Vec::new();
    for (face_id, face) in shape.faces() {
        let surface = face.surface.as_any();
        match face.surface.surface_type() {
            SurfaceKind::Plane => {}
            SurfaceKind::Cylinder => {
                if let Some(cyl) = surface.downcast_ref::<CylinderSurface>() {
                    let roots = generator_roots(&basis.normal, &cyl.frame, 0.0);
                    out.extend(generators(shape, face_id, face, &roots, settings));
                }
            }
            SurfaceKind::Cone => {
                if let Some(cone) = surface.downcast_ref::<ConeSurface>() {
                    let roots = generator_roots(&basis.normal, &cone.frame, cone.half_angle);
                    out.extend(generators(shape, face_id, face, &roots, settings));
                }
            }
            SurfaceKind::Sphere => {
                if let Some(sphere) = surface.downcast_ref::<SphereSurface>() {
                    let circle = Circle3d::from_frame(
                        sphere.center(),
                        sphere.radius,
                        basis.normal,
                        basis.right,
                    );
                    let uv_at = |t: f64| face.surface.parameters(&circle.evaluate(t));
                    for range in clip_to_face(face, uv_at, (0.0, TAU), settings) {
                        out.push(SyntheticCurve {
                            face: face_id,
                            kind: EdgeKind::Outline,
                            curve: Box::new(circle.clone()),
                            range,
                        });
                    }
                }
            }
        }
    }
    out
}

/// Angles `u` at which a cylinder or cone normal is perpendicular to `view`.
///
/// The normal is `cos α · heading(u) − sin α · z`; with the view in frame
/// coordinates `(a, b, c)` the condition is `a cos u + b sin u = tan α · c`.
fn generator_roots(view: &Vec3, frame: &Frame, half_angle: f64) -> Vec<f64> {
    let local = frame.local_vector(view);
    let (a, b, c) = (local.x, local.y, local.z);
    let r = a.hypot(b);
    if r < 1e-12 {
        return Vec::new();
    }
    let k = half_angle.tan() * c / r;
    if k.abs() > 1.0 {
        return Vec::new();
    }
    let phi = b.atan2(a);
    let spread = k.clamp(-1.0, 1.0).acos();
    let first = wrap_angle(phi - spread);
    let second = wrap_angle(phi + spread);
    if angular_gap(first, second) < 1e-12 {
        vec![first]
    } else {
        vec![first, second]
    }
}

fn angular_gap(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

fn generators(
    shape: &Shape,
    face_id: FaceId,
    face: &Face,
    roots: &[f64],
    settings: &DraftSettings,
) -> Vec<SyntheticCurve> {
    let (lo, hi) = face.trim.bounds();
    let full_turn = hi.x - lo.x >= TAU - settings.boundary_tolerance;

    // u of every seam on this face
    let seams: Vec<f64> = face
        .edges
        .iter()
        .map(|&e| shape.edge(e))
        .filter(|e| e.is_seam())
        .map(|e| face.surface.parameters(&e.point_at(e.param(0.5))).x)
        .collect();

    let mut out = Vec::new();
    for &u in roots {
        let on_limit = if full_turn {
            seams.iter().any(|&s| angular_gap(s, u) < 1e-6)
        } else {
            angular_gap(u, lo.x) < 1e-6 || angular_gap(u, hi.x) < 1e-6
        };
        if on_limit {
            continue;
        }
        for (v0, v1) in clip_to_face(face, |v| Point2::new(u, v), (lo.y, hi.y), settings) {
            let a = face.surface.evaluate(Point2::new(u, v0));
            let b = face.surface.evaluate(Point2::new(u, v1));
            if (b - a).norm() < settings.depth_epsilon {
                continue;
            }
            out.push(SyntheticCurve {
                face: face_id,
                kind: EdgeKind::Outline,
                curve: Box::new(Line3d::from_points(a, b)),
                range: (0.0, 1.0),
            });
        }
    }
    out
}

/// Reference parameter lines on every curved face.
///
/// `iso_count` lines run along v at evenly spaced u, and as many along u
/// at evenly spaced v, each clipped to the face trim.
pub fn isolines(shape: &Shape, settings: &DraftSettings) -> Vec<SyntheticCurve> {
    let n = settings.iso_count;
    if n == 0 || !settings.show_smooth {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (face_id, face) in shape.faces() {
        if !face.surface.surface_type().is_curved() {
            continue;
        }
        let (lo, hi) = face.trim.bounds();
        for i in 0..n {
            let u = lo.x + (i as f64 + 0.5) / n as f64 * (hi.x - lo.x);
            let ranges = clip_to_face(face, |v| Point2::new(u, v), (lo.y, hi.y), settings);
            for range in ranges {
                out.push(SyntheticCurve {
                    face: face_id,
                    kind: EdgeKind::Isoparameter,
                    curve: Box::new(IsoCurve::new(
                        face.surface.clone(),
                        IsoParameter::U(u),
                        range,
                    )),
                    range,
                });
            }
        }
        for j in 0..n {
            let v = lo.y + (j as f64 + 1.0) / (n as f64 + 1.0) * (hi.y - lo.y);
            // Latitude lines collapse at a sphere's poles.
            if face.surface.surface_type() == SurfaceKind::Sphere
                && (v.abs() - FRAC_PI_2).abs() < 1e-9
            {
                continue;
            }
            let ranges = clip_to_face(face, |u| Point2::new(u, v), (lo.x, hi.x), settings);
            for range in ranges {
                out.push(SyntheticCurve {
                    face: face_id,
                    kind: EdgeKind::Isoparameter,
                    curve: Box::new(IsoCurve::new(
                        face.surface.clone(),
                        IsoParameter::V(v),
                        range,
                    )),
                    range,
                });
            }
        }
    }
    out
}

/// Sub-ranges of `range` over which `uv_at(t)` lies inside the face trim.
fn clip_to_face(
    face: &Face,
    uv_at: impl Fn(f64) -> Point2,
    range: (f64, f64),
    settings: &DraftSettings,
) -> Vec<(f64, f64)> {
    let tol = settings.boundary_tolerance;
    let inside = |t: f64| point_in_face(face, uv_at(t), tol);
    // Rectangular domains need no search along constant-parameter lines.
    if matches!(face.trim, Trim::Domain { .. })
        && inside(range.0)
        && inside(range.1)
        && inside(0.5 * (range.0 + range.1))
    {
        return vec![range];
    }

    let (t0, t1) = range;
    let ts: Vec<f64> = (0..=CLIP_SAMPLES)
        .map(|i| t0 + (t1 - t0) * i as f64 / CLIP_SAMPLES as f64)
        .collect();
    let states: Vec<bool> = ts.iter().map(|&t| inside(t)).collect();

    // Samples are classified with the boundary band; the change itself is
    // located on the exact trim whenever the band does not hide it.
    let exact = |t: f64| point_in_face(face, uv_at(t), 0.0);
    let crossing = |a: f64, b: f64, a_in: bool| {
        let use_exact = exact(a) != exact(b);
        let side = |t: f64| if use_exact { exact(t) } else { inside(t) };
        let a_side = side(a);
        let (mut lo, mut hi) = (a, b);
        for _ in 0..CLIP_BISECTION {
            let mid = 0.5 * (lo + hi);
            if side(mid) == a_side {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        // Keep the endpoint on the inside of the change.
        if a_in {
            lo
        } else {
            hi
        }
    };

    let mut out = Vec::new();
    let mut start = if states[0] { Some(t0) } else { None };
    for i in 0..CLIP_SAMPLES {
        if states[i] == states[i + 1] {
            continue;
        }
        let t = crossing(ts[i], ts[i + 1], states[i]);
        match start.take() {
            Some(s) => out.push((s, t)),
            None => start = Some(t),
        }
    }
    if let Some(s) = start {
        out.push((s, t1));
    }
    let min_len = 1e-9 * (t1 - t0).abs();
    out.retain(|(a, b)| b - a > min_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthodraft_math::Point3;
    use orthodraft_primitives::{make_box, make_cone, make_cylinder, make_sheet, make_slot, make_sphere};
    use orthodraft_topo::{BodyId, Orientation, ShapeBuilder};
    use orthodraft_geom::Plane;

    fn kinds(shape: &Shape) -> BTreeMap<EdgeKind, usize> {
        kind_counts(shape, &DraftSettings::default())
    }

    #[test]
    fn test_box_edges_are_sharp() {
        let shape = make_box(10.0, 20.0, 30.0).unwrap();
        assert_eq!(kinds(&shape), BTreeMap::from([(EdgeKind::Sharp, 12)]));
    }

    #[test]
    fn test_cylinder_edges() {
        let shape = make_cylinder(5.0, 10.0).unwrap();
        let counts = kinds(&shape);
        assert_eq!(counts.get(&EdgeKind::Sharp), Some(&2));
        assert_eq!(counts.get(&EdgeKind::Sewn), Some(&1));
    }

    #[test]
    fn test_slot_tangent_edges_are_smooth() {
        let shape = make_slot(30.0, 10.0, 5.0).unwrap();
        let counts = kinds(&shape);
        assert_eq!(counts.get(&EdgeKind::Smooth), Some(&4));
        assert_eq!(counts.get(&EdgeKind::Sharp), Some(&8));
    }

    #[test]
    fn test_sheet_edges_are_sewn() {
        let shape = make_sheet(4.0, 2.0).unwrap();
        assert_eq!(kinds(&shape), BTreeMap::from([(EdgeKind::Sewn, 4)]));
    }

    #[test]
    fn test_edge_between_bodies_is_sewn() {
        let mut b = ShapeBuilder::new();
        let body_a = b.add_body();
        let body_b = b.add_body();
        let square = |x0: f64| {
            Trim::polygon(&[
                Point2::new(x0, 0.0),
                Point2::new(x0 + 1.0, 0.0),
                Point2::new(x0 + 1.0, 1.0),
                Point2::new(x0, 1.0),
            ])
        };
        let plane = || Plane::new(Point3::origin(), Vec3::x(), Vec3::y());
        let fa = b.add_face(plane(), Orientation::Forward, body_a, square(0.0));
        let fb = b.add_face(plane(), Orientation::Forward, body_b, square(1.0));
        let e = b.add_edge(
            Line3d::from_points(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)),
            &[fa, fb],
        );
        let shape = b.build().unwrap();
        assert_eq!(shape.face(fa).body, BodyId(0));
        assert_eq!(static_kind(&shape, e, &DraftSettings::default()), EdgeKind::Sewn);
    }

    #[test]
    fn test_coplanar_faces_meet_smoothly() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let plane = || Plane::new(Point3::origin(), Vec3::x(), Vec3::y());
        let fa = b.add_face(
            plane(),
            Orientation::Forward,
            body,
            Trim::polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ]),
        );
        let fb = b.add_face(
            plane(),
            Orientation::Forward,
            body,
            Trim::polygon(&[
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(2.0, 1.0),
                Point2::new(1.0, 1.0),
            ]),
        );
        let e = b.add_edge(
            Line3d::from_points(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)),
            &[fa, fb],
        );
        let shape = b.build().unwrap();
        assert_eq!(static_kind(&shape, e, &DraftSettings::default()), EdgeKind::Smooth);
    }

    #[test]
    fn test_seam_becomes_outline_when_edge_on() {
        let shape = make_cylinder(5.0, 10.0).unwrap();
        let settings = DraftSettings::default();
        let (seam, _) = shape.edges().find(|(_, e)| e.is_seam()).unwrap();
        // The seam sits at +X; seen from the front it is on the contour.
        let front = ViewBasis::front();
        assert_eq!(view_kind(&shape, seam, EdgeKind::Sewn, &front, &settings), EdgeKind::Outline);
        let right = front.secondary(crate::direction::ViewSlot::Right).unwrap();
        assert_eq!(view_kind(&shape, seam, EdgeKind::Sewn, &right, &settings), EdgeKind::Sewn);
    }

    #[test]
    fn test_cylinder_front_silhouette_skips_seam() {
        let shape = make_cylinder(5.0, 10.0).unwrap();
        let curves = silhouettes(&shape, &ViewBasis::front(), &DraftSettings::default());
        // Only the -X generator; the +X one is the seam.
        assert_eq!(curves.len(), 1);
        let p = curves[0].curve.evaluate(0.0);
        assert!((p.x + 5.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_cylinder_top_view_has_no_generators() {
        let shape = make_cylinder(5.0, 10.0).unwrap();
        let top = ViewBasis::front().secondary(crate::direction::ViewSlot::Top).unwrap();
        assert!(silhouettes(&shape, &top, &DraftSettings::default()).is_empty());
    }

    #[test]
    fn test_cone_generators_touch_contour() {
        let shape = make_cone(5.0, 2.0, 6.0).unwrap();
        let right = ViewBasis::front().secondary(crate::direction::ViewSlot::Right).unwrap();
        let curves = silhouettes(&shape, &right, &DraftSettings::default());
        assert_eq!(curves.len(), 2);
        for c in &curves {
            let bottom = c.curve.evaluate(0.0);
            let top = c.curve.evaluate(1.0);
            // Seen from +X the contour runs through y = ±r
            let (lo, hi) = if bottom.z < top.z { (bottom, top) } else { (top, bottom) };
            assert!((lo.y.abs() - 5.0).abs() < 1e-9);
            assert!((hi.y.abs() - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sphere_silhouette_is_full_circle() {
        let shape = make_sphere(Point3::new(1.0, 2.0, 3.0), 4.0).unwrap();
        let curves = silhouettes(&shape, &ViewBasis::front(), &DraftSettings::default());
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].range, (0.0, TAU));
        let p = curves[0].curve.evaluate(1.0);
        assert!(((p - Point3::new(1.0, 2.0, 3.0)).norm() - 4.0).abs() < 1e-12);
        assert!((p.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolines_need_show_smooth() {
        let shape = make_sphere(Point3::origin(), 1.0).unwrap();
        let settings = DraftSettings {
            iso_count: 2,
            ..Default::default()
        };
        assert_eq!(isolines(&shape, &settings).len(), 4);
        let hidden = DraftSettings {
            show_smooth: false,
            ..settings
        };
        assert!(isolines(&shape, &hidden).is_empty());
    }

    #[test]
    fn test_clip_to_loop_trim() {
        // A cylinder patch trimmed by a triangle in (u, v)
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        b.add_face(
            CylinderSurface::new(1.0),
            Orientation::Forward,
            body,
            Trim::polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 0.0),
                Point2::new(0.0, 2.0),
            ]),
        );
        let shape = b.build().unwrap();
        let face = shape.face(FaceId(0));
        let runs = clip_to_face(face, |v| Point2::new(1.0, v), (0.0, 2.0), &DraftSettings::default());
        assert_eq!(runs.len(), 1);
        assert!(runs[0].0.abs() < 1e-9);
        assert!((runs[0].1 - 1.0).abs() < 1e-9);

        // Crossing between two samples still lands on the hypotenuse.
        let runs = clip_to_face(face, |v| Point2::new(0.3, v), (0.0, 2.0), &DraftSettings::default());
        assert_eq!(runs.len(), 1);
        assert!((runs[0].1 - 1.7).abs() < 1e-9);
    }
}
