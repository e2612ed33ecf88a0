#![warn(missing_docs)]

//! Read-only boundary representation consumed by the orthodraft engine.
//!
//! A [`Shape`] is an immutable arena of vertices, edges and faces addressed
//! by integer ids. Adjacency is stored as id lists in both directions (an
//! edge lists its 1–2 faces, a face lists its boundary edges) so there are
//! no back-pointers and no ownership cycles. Shapes are created through
//! [`ShapeBuilder`], which validates the topology before handing out the
//! snapshot; once built, a shape is never mutated and can be shared across
//! threads behind an `Arc`.

mod builder;
mod error;
pub mod trim;

pub use builder::ShapeBuilder;
pub use error::{Result, TopoError};
pub use trim::{Trim, TrimLoop, TrimSegment};

use orthodraft_geom::{Curve3d, Surface};
use orthodraft_math::{Dir3, Point2, Point3};
use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the entity in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Handle to a vertex in a [`Shape`].
    VertexId
);
arena_id!(
    /// Handle to an edge in a [`Shape`].
    EdgeId
);
arena_id!(
    /// Handle to a face in a [`Shape`].
    FaceId
);
arena_id!(
    /// Handle to a body (an originally separate solid or sheet) in a [`Shape`].
    BodyId
);

/// Orientation of a face relative to its underlying surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Face normal agrees with the surface normal.
    #[default]
    Forward,
    /// Face normal is opposite to the surface normal.
    Reversed,
}

/// Continuity across an edge, when the modeller recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Continuity {
    /// Positional continuity only: a crease.
    C0,
    /// Tangent continuity: the faces blend smoothly.
    G1,
}

/// A vertex: a point in model space.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position.
    pub point: Point3,
}

/// An edge: a bounded piece of a 3D curve between faces.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Carrying curve.
    pub curve: Box<dyn Curve3d>,
    /// Parameter range `(t0, t1)` with `t0 < t1`.
    pub range: (f64, f64),
    /// End vertices, if the edge has any (closed edges may have none).
    pub vertices: Option<(VertexId, VertexId)>,
    /// Adjacent faces: one for a free boundary, two otherwise. A seam lists
    /// the same face twice.
    pub faces: Vec<FaceId>,
    /// Recorded continuity, overriding the dihedral-angle test.
    pub continuity: Option<Continuity>,
}

impl Edge {
    /// Point on the edge at curve parameter `t`.
    pub fn point_at(&self, t: f64) -> Point3 {
        self.curve.evaluate(t)
    }

    /// Whether the edge bounds only one face side.
    pub fn is_free(&self) -> bool {
        self.faces.len() == 1
    }

    /// Whether the edge is a seam (both sides belong to the same face).
    pub fn is_seam(&self) -> bool {
        self.faces.len() == 2 && self.faces[0] == self.faces[1]
    }

    /// Parameter at normalized position `s ∈ [0, 1]`.
    pub fn param(&self, s: f64) -> f64 {
        self.range.0 + s * (self.range.1 - self.range.0)
    }
}

/// A face: the trimmed part of a surface.
#[derive(Debug, Clone)]
pub struct Face {
    /// Carrying surface.
    pub surface: Box<dyn Surface>,
    /// Orientation relative to the surface normal.
    pub orientation: Orientation,
    /// Owning body.
    pub body: BodyId,
    /// Trim region in surface parameter space.
    pub trim: Trim,
    /// Boundary edges, in id order.
    pub edges: Vec<EdgeId>,
}

impl Face {
    /// Outward face normal at `uv`, honouring orientation.
    pub fn normal_at(&self, uv: Point2) -> Dir3 {
        let n = self.surface.normal(uv);
        match self.orientation {
            Orientation::Forward => n,
            Orientation::Reversed => Dir3::new_unchecked(-n.into_inner()),
        }
    }

    /// Inward face normal at `uv`, pointing into the material.
    pub fn inward_normal_at(&self, uv: Point2) -> Dir3 {
        Dir3::new_unchecked(-self.normal_at(uv).into_inner())
    }

    /// Outward face normal at the surface point nearest `p`.
    pub fn normal_near(&self, p: &Point3) -> Dir3 {
        self.normal_at(self.surface.parameters(p))
    }
}

/// Summary counts of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapeStats {
    /// Number of bodies.
    pub bodies: usize,
    /// Number of faces.
    pub faces: usize,
    /// Number of edges.
    pub edges: usize,
    /// Number of vertices.
    pub vertices: usize,
}

/// An immutable, validated boundary representation.
#[derive(Debug, Clone)]
pub struct Shape {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    faces: Vec<Face>,
    bodies: usize,
    bounds: (Point3, Point3),
}

impl Shape {
    /// Vertex by id.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Edge by id.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Face by id.
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// All vertices in id order.
    pub fn vertices(&self) -> impl ExactSizeIterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(i, v)| (VertexId(i as u32), v))
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl ExactSizeIterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, e)| (EdgeId(i as u32), e))
    }

    /// All faces in id order.
    pub fn faces(&self) -> impl ExactSizeIterator<Item = (FaceId, &Face)> {
        self.faces
            .iter()
            .enumerate()
            .map(|(i, f)| (FaceId(i as u32), f))
    }

    /// Number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of bodies.
    pub fn num_bodies(&self) -> usize {
        self.bodies
    }

    /// Axis-aligned model-space bounds `(min, max)`.
    pub fn bounds(&self) -> (Point3, Point3) {
        self.bounds
    }

    /// Length of the bounding-box diagonal.
    pub fn diagonal(&self) -> f64 {
        (self.bounds.1 - self.bounds.0).norm()
    }

    /// Summary counts.
    pub fn stats(&self) -> ShapeStats {
        ShapeStats {
            bodies: self.bodies,
            faces: self.faces.len(),
            edges: self.edges.len(),
            vertices: self.vertices.len(),
        }
    }
}
