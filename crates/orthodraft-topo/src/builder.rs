//! Incremental shape construction with validation.

use orthodraft_geom::{Curve3d, Surface};
use orthodraft_math::{Point2, Point3, Tolerance};

use crate::error::{Result, TopoError};
use crate::trim::{Trim, TrimLoop};
use crate::{BodyId, Continuity, Edge, EdgeId, Face, FaceId, Orientation, Shape, Vertex, VertexId};

/// Number of samples used to probe an edge curve during validation.
const EDGE_PROBES: usize = 16;

/// Pieces per arc when a trim loop is flattened for the crossing test.
const LOOP_ARC_PIECES: usize = 16;

/// Grid resolution used to sample domain-trimmed faces for the shape bounds.
const DOMAIN_GRID: usize = 16;

/// Collects vertices, edges and faces, then validates them into a [`Shape`].
///
/// Face boundary lists are derived from the edges' face references, so the
/// two directions of adjacency can never disagree.
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    bodies: u32,
    tolerance: Tolerance,
}

impl ShapeBuilder {
    /// Create an empty builder with default tolerances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new body. Faces from different bodies meeting at an edge make
    /// that edge a sewn edge.
    pub fn add_body(&mut self) -> BodyId {
        let id = BodyId(self.bodies);
        self.bodies += 1;
        id
    }

    /// Add a vertex.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.push(Vertex { point });
        VertexId(self.vertices.len() as u32 - 1)
    }

    /// Add a face on `surface`, restricted to `trim`.
    pub fn add_face(
        &mut self,
        surface: impl Surface + 'static,
        orientation: Orientation,
        body: BodyId,
        trim: Trim,
    ) -> FaceId {
        self.faces.push(Face {
            surface: Box::new(surface),
            orientation,
            body,
            trim,
            edges: Vec::new(),
        });
        FaceId(self.faces.len() as u32 - 1)
    }

    /// Add an edge over the curve's whole domain, bounding `faces`.
    pub fn add_edge(&mut self, curve: impl Curve3d + 'static, faces: &[FaceId]) -> EdgeId {
        let range = curve.domain();
        self.add_edge_with_range(Box::new(curve), range, faces)
    }

    /// Add an edge over part of a curve, bounding `faces`.
    pub fn add_edge_with_range(
        &mut self,
        curve: Box<dyn Curve3d>,
        range: (f64, f64),
        faces: &[FaceId],
    ) -> EdgeId {
        self.edges.push(Edge {
            curve,
            range,
            vertices: None,
            faces: faces.to_vec(),
            continuity: None,
        });
        EdgeId(self.edges.len() as u32 - 1)
    }

    /// Record the end vertices of an edge.
    pub fn connect(&mut self, edge: EdgeId, start: VertexId, end: VertexId) -> Result<()> {
        let e = self.edge_mut(edge)?;
        e.vertices = Some((start, end));
        Ok(())
    }

    /// Record the continuity of an edge as declared by the modeller.
    pub fn set_continuity(&mut self, edge: EdgeId, continuity: Continuity) -> Result<()> {
        let e = self.edge_mut(edge)?;
        e.continuity = Some(continuity);
        Ok(())
    }

    fn edge_mut(&mut self, edge: EdgeId) -> Result<&mut Edge> {
        self.edges
            .get_mut(edge.index())
            .ok_or_else(|| TopoError::InvalidReference {
                entity: "builder".into(),
                target: "edge",
                index: edge.0,
            })
    }

    /// Validate everything and freeze it into a [`Shape`].
    pub fn build(mut self) -> Result<Shape> {
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.point.iter().all(|c| c.is_finite()) {
                return Err(TopoError::NonFinite(format!("vertex #{i}")));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            let id = i as u32;
            if face.body.0 >= self.bodies {
                return Err(TopoError::InvalidReference {
                    entity: format!("face #{id}"),
                    target: "body",
                    index: face.body.0,
                });
            }
            validate_trim(id, face, &self.tolerance)?;
        }

        for (i, edge) in self.edges.iter().enumerate() {
            self.validate_edge(i as u32, edge)?;
        }

        // Derive face boundary lists from edge adjacency.
        for (i, edge) in self.edges.iter().enumerate() {
            let mut seen: Vec<FaceId> = Vec::with_capacity(2);
            for &f in &edge.faces {
                if !seen.contains(&f) {
                    seen.push(f);
                    self.faces[f.index()].edges.push(EdgeId(i as u32));
                }
            }
        }

        let bounds = compute_bounds(&self.vertices, &self.edges, &self.faces);

        Ok(Shape {
            vertices: self.vertices,
            edges: self.edges,
            faces: self.faces,
            bodies: self.bodies as usize,
            bounds,
        })
    }

    fn validate_edge(&self, id: u32, edge: &Edge) -> Result<()> {
        if edge.faces.is_empty() {
            return Err(TopoError::DanglingEdge(id));
        }
        if edge.faces.len() > 2 {
            return Err(TopoError::NonManifoldEdge(id, edge.faces.len()));
        }
        for f in &edge.faces {
            if f.index() >= self.faces.len() {
                return Err(TopoError::InvalidReference {
                    entity: format!("edge #{id}"),
                    target: "face",
                    index: f.0,
                });
            }
        }
        if let Some((a, b)) = edge.vertices {
            for v in [a, b] {
                if v.index() >= self.vertices.len() {
                    return Err(TopoError::InvalidReference {
                        entity: format!("edge #{id}"),
                        target: "vertex",
                        index: v.0,
                    });
                }
            }
        }

        let (t0, t1) = edge.range;
        if !t0.is_finite() || !t1.is_finite() {
            return Err(TopoError::NonFinite(format!("edge #{id} parameter range")));
        }
        if t1 <= t0 {
            return Err(TopoError::EmptyParameterRange(id));
        }

        let probes: Vec<Point3> = (0..=EDGE_PROBES)
            .map(|k| edge.point_at(edge.param(k as f64 / EDGE_PROBES as f64)))
            .collect();
        if probes.iter().any(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(TopoError::NonFinite(format!("edge #{id} curve")));
        }
        let extent = probes
            .iter()
            .map(|p| (p - probes[0]).norm())
            .fold(0.0, f64::max);
        if extent < self.tolerance.linear {
            return Err(TopoError::DegenerateEdge(id));
        }
        Ok(())
    }
}

fn validate_trim(id: u32, face: &Face, tol: &Tolerance) -> Result<()> {
    match &face.trim {
        Trim::Domain { u, v } => {
            let bounded = [u.0, u.1, v.0, v.1].iter().all(|c| c.is_finite());
            if !bounded {
                return Err(TopoError::UnboundedFace(id));
            }
            if u.1 <= u.0 || v.1 <= v.0 {
                return Err(TopoError::InvalidDimension(format!(
                    "face #{id} has an empty parameter domain"
                )));
            }
        }
        Trim::Loops { outer, .. } => {
            if outer.segments.is_empty() {
                return Err(TopoError::UnboundedFace(id));
            }
            for lp in face.trim.loops() {
                if lp.segments.iter().any(|s| !s.is_finite()) {
                    return Err(TopoError::NonFinite(format!("face #{id} trim")));
                }
                if lp.segments.is_empty() || lp.closure_gap() > tol.linear {
                    return Err(TopoError::OpenLoop(id));
                }
                if loop_self_intersects(lp) {
                    return Err(TopoError::SelfIntersectingLoop(id));
                }
            }
        }
    }
    Ok(())
}

/// Whether any two non-adjacent pieces of the flattened loop cross.
fn loop_self_intersects(lp: &TrimLoop) -> bool {
    let pts = lp.polyline(LOOP_ARC_PIECES);
    let n = pts.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a0, a1) = (pts[i], pts[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b0, b1) = (pts[j], pts[(j + 1) % n]);
            if segments_cross(&a0, &a1, &b0, &b1) {
                return true;
            }
        }
    }
    false
}

/// Proper crossing test: touching endpoints do not count.
fn segments_cross(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let orient = |p: &Point2, q: &Point2, r: &Point2| {
        (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x)
    };
    let eps = 1e-12;
    let d1 = orient(b0, b1, a0);
    let d2 = orient(b0, b1, a1);
    let d3 = orient(a0, a1, b0);
    let d4 = orient(a0, a1, b1);
    ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
}

fn compute_bounds(vertices: &[Vertex], edges: &[Edge], faces: &[Face]) -> (Point3, Point3) {
    let mut lo = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
    let mut hi = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut include = |p: Point3| {
        lo = lo.inf(&p);
        hi = hi.sup(&p);
    };

    for v in vertices {
        include(v.point);
    }
    for e in edges {
        for k in 0..=32 {
            include(e.point_at(e.param(k as f64 / 32.0)));
        }
    }
    for f in faces {
        match &f.trim {
            Trim::Domain { u, v } => {
                for i in 0..=DOMAIN_GRID {
                    for j in 0..=DOMAIN_GRID {
                        let uu = u.0 + (u.1 - u.0) * i as f64 / DOMAIN_GRID as f64;
                        let vv = v.0 + (v.1 - v.0) * j as f64 / DOMAIN_GRID as f64;
                        include(f.surface.evaluate(Point2::new(uu, vv)));
                    }
                }
            }
            Trim::Loops { outer, .. } => {
                for uv in outer.polyline(32) {
                    include(f.surface.evaluate(uv));
                }
            }
        }
    }

    if lo.x > hi.x {
        return (Point3::origin(), Point3::origin());
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthodraft_geom::{Line3d, Plane, SphereSurface};
    use orthodraft_math::Vec3;

    fn unit_square_face(b: &mut ShapeBuilder, body: BodyId) -> FaceId {
        b.add_face(
            Plane::new(Point3::origin(), Vec3::x(), Vec3::y()),
            Orientation::Forward,
            body,
            Trim::polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ]),
        )
    }

    #[test]
    fn test_build_sheet() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let f = unit_square_face(&mut b, body);
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        for i in 0..4 {
            b.add_edge(Line3d::from_points(corners[i], corners[(i + 1) % 4]), &[f]);
        }
        let shape = b.build().unwrap();
        assert_eq!(shape.num_faces(), 1);
        assert_eq!(shape.num_edges(), 4);
        assert_eq!(shape.face(f).edges.len(), 4);
        assert!(shape.edges().all(|(_, e)| e.is_free()));
        assert!((shape.diagonal() - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        unit_square_face(&mut b, body);
        b.add_edge(
            Line3d::from_points(Point3::origin(), Point3::new(1.0, 0.0, 0.0)),
            &[],
        );
        assert_eq!(b.build().unwrap_err(), TopoError::DanglingEdge(0));
    }

    #[test]
    fn test_non_manifold_edge_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let f0 = unit_square_face(&mut b, body);
        let f1 = unit_square_face(&mut b, body);
        let f2 = unit_square_face(&mut b, body);
        b.add_edge(
            Line3d::from_points(Point3::origin(), Point3::new(1.0, 0.0, 0.0)),
            &[f0, f1, f2],
        );
        assert!(matches!(b.build(), Err(TopoError::NonManifoldEdge(0, 3))));
    }

    #[test]
    fn test_degenerate_edge_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let f = unit_square_face(&mut b, body);
        b.add_edge(Line3d::from_points(Point3::origin(), Point3::origin()), &[f]);
        assert_eq!(b.build().unwrap_err(), TopoError::DegenerateEdge(0));
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let f = unit_square_face(&mut b, body);
        b.add_edge_with_range(
            Box::new(Line3d::from_points(
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
            )),
            (0.5, 0.5),
            &[f],
        );
        assert_eq!(b.build().unwrap_err(), TopoError::EmptyParameterRange(0));
    }

    #[test]
    fn test_unbounded_face_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        b.add_face(
            Plane::new(Point3::origin(), Vec3::x(), Vec3::y()),
            Orientation::Forward,
            body,
            Trim::Domain {
                u: (f64::NEG_INFINITY, f64::INFINITY),
                v: (0.0, 1.0),
            },
        );
        assert_eq!(b.build().unwrap_err(), TopoError::UnboundedFace(0));
    }

    #[test]
    fn test_non_finite_vertex_rejected() {
        let mut b = ShapeBuilder::new();
        b.add_vertex(Point3::new(f64::NAN, 0.0, 0.0));
        assert!(matches!(b.build(), Err(TopoError::NonFinite(_))));
    }

    #[test]
    fn test_open_loop_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let mut outer = TrimLoop::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ]);
        outer.segments.pop();
        b.add_face(
            Plane::new(Point3::origin(), Vec3::x(), Vec3::y()),
            Orientation::Forward,
            body,
            Trim::Loops {
                outer,
                holes: vec![],
            },
        );
        assert_eq!(b.build().unwrap_err(), TopoError::OpenLoop(0));
    }

    #[test]
    fn test_bow_tie_loop_rejected() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        b.add_face(
            Plane::new(Point3::origin(), Vec3::x(), Vec3::y()),
            Orientation::Forward,
            body,
            Trim::polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ]),
        );
        assert_eq!(b.build().unwrap_err(), TopoError::SelfIntersectingLoop(0));
    }

    #[test]
    fn test_missing_body_rejected() {
        let mut b = ShapeBuilder::new();
        unit_square_face(&mut b, BodyId(3));
        assert!(matches!(
            b.build(),
            Err(TopoError::InvalidReference { target: "body", .. })
        ));
    }

    #[test]
    fn test_seam_edge_lists_face_once() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let f = unit_square_face(&mut b, body);
        let e = b.add_edge(
            Line3d::from_points(Point3::origin(), Point3::new(0.0, 1.0, 0.0)),
            &[f, f],
        );
        b.set_continuity(e, Continuity::G1).unwrap();
        let shape = b.build().unwrap();
        assert!(shape.edge(e).is_seam());
        assert_eq!(shape.face(f).edges, vec![e]);
        assert_eq!(shape.edge(e).continuity, Some(Continuity::G1));
    }

    #[test]
    fn test_sphere_bounds_from_domain_grid() {
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        b.add_face(
            SphereSurface::new(Point3::origin(), 2.0),
            Orientation::Forward,
            body,
            Trim::Domain {
                u: (0.0, 2.0 * std::f64::consts::PI),
                v: (-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2),
            },
        );
        let shape = b.build().unwrap();
        let (lo, hi) = shape.bounds();
        assert!((hi.z - 2.0).abs() < 1e-9);
        assert!((lo.x + 2.0).abs() < 1e-9);
        assert_eq!(shape.num_edges(), 0);
    }

    #[test]
    fn test_face_normals_follow_orientation() {
        let domain = || Trim::Domain {
            u: (0.0, 2.0 * std::f64::consts::PI),
            v: (-std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2),
        };
        let mut b = ShapeBuilder::new();
        let body = b.add_body();
        let solid = b.add_face(
            SphereSurface::new(Point3::origin(), 2.0),
            Orientation::Forward,
            body,
            domain(),
        );
        let cavity = b.add_face(
            SphereSurface::new(Point3::origin(), 1.0),
            Orientation::Reversed,
            body,
            domain(),
        );
        let shape = b.build().unwrap();
        let equator = Point2::new(0.0, 0.0);

        let outer = shape.face(solid);
        assert!((outer.normal_at(equator).into_inner() - Vec3::x()).norm() < 1e-12);
        assert!((outer.inward_normal_at(equator).into_inner() + Vec3::x()).norm() < 1e-12);

        let inner = shape.face(cavity);
        assert!((inner.normal_at(equator).into_inner() + Vec3::x()).norm() < 1e-12);
        assert!((inner.inward_normal_at(equator).into_inner() - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_connect_unknown_edge() {
        let mut b = ShapeBuilder::new();
        let v = b.add_vertex(Point3::origin());
        assert!(b.connect(EdgeId(7), v, v).is_err());
    }
}
