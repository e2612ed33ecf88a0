//! Core types for projected views.

use orthodraft_topo::{EdgeId, FaceId};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::direction::{ProjectionConvention, ViewBasis, ViewSlot};

/// A view-plane or page coordinate, serialized as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point2D {
    /// `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Point at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<orthodraft_math::Point2> for Point2D {
    fn from(p: orthodraft_math::Point2) -> Self {
        Self::new(p.x, p.y)
    }
}

/// Axis-aligned rectangle in view or page coordinates.
///
/// The empty box has inverted infinite limits, so including any point
/// makes it valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// Left edge.
    pub min_x: f64,
    /// Lower edge in view space, upper edge on the page.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Upper edge in view space, lower edge on the page.
    pub max_y: f64,
}

impl BoundingBox2D {
    /// A box containing nothing.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Smallest box containing both corners.
    pub fn from_corners(a: Point2D, b: Point2D) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Grow to contain `p`.
    pub fn include_point(&mut self, p: Point2D) {
        *self = Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        };
    }

    /// Whether at least one point has been included.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Horizontal extent; zero when empty.
    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    /// Vertical extent; zero when empty.
    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    /// Midpoint.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            0.5 * (self.min_x + self.max_x),
            0.5 * (self.min_y + self.max_y),
        )
    }

    /// Area shared with `other`; boxes that only touch share none.
    pub fn overlap_area(&self, other: &Self) -> f64 {
        let w = self.max_x.min(other.max_x) - self.min_x.max(other.min_x);
        let h = self.max_y.min(other.max_y) - self.min_y.max(other.min_y);
        w.max(0.0) * h.max(0.0)
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::empty()
    }
}

/// Visibility of an edge in the projected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Edge is visible (not occluded by any face).
    Visible,
    /// Edge is hidden (occluded by at least one face).
    Hidden,
}

/// Geometric character of a drawn curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Crease between two faces.
    Sharp,
    /// Tangent-continuous junction between two faces.
    Smooth,
    /// Free boundary, seam, or junction between separate bodies.
    Sewn,
    /// Silhouette of a curved face for this view.
    Outline,
    /// Surface parameter line drawn for reference.
    Isoparameter,
}

/// The ten-way drawing category: an [`EdgeKind`] crossed with a [`Visibility`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeCategory {
    SharpVisible,
    SharpHidden,
    SmoothVisible,
    SmoothHidden,
    SewnVisible,
    SewnHidden,
    OutlineVisible,
    OutlineHidden,
    IsoparameterVisible,
    IsoparameterHidden,
}

impl EdgeCategory {
    /// Every category, in rendering order.
    pub const ALL: [EdgeCategory; 10] = [
        EdgeCategory::SharpVisible,
        EdgeCategory::SharpHidden,
        EdgeCategory::SmoothVisible,
        EdgeCategory::SmoothHidden,
        EdgeCategory::SewnVisible,
        EdgeCategory::SewnHidden,
        EdgeCategory::OutlineVisible,
        EdgeCategory::OutlineHidden,
        EdgeCategory::IsoparameterVisible,
        EdgeCategory::IsoparameterHidden,
    ];

    /// Combine a kind and a visibility state.
    pub fn new(kind: EdgeKind, visibility: Visibility) -> Self {
        use EdgeCategory::*;
        match (kind, visibility) {
            (EdgeKind::Sharp, Visibility::Visible) => SharpVisible,
            (EdgeKind::Sharp, Visibility::Hidden) => SharpHidden,
            (EdgeKind::Smooth, Visibility::Visible) => SmoothVisible,
            (EdgeKind::Smooth, Visibility::Hidden) => SmoothHidden,
            (EdgeKind::Sewn, Visibility::Visible) => SewnVisible,
            (EdgeKind::Sewn, Visibility::Hidden) => SewnHidden,
            (EdgeKind::Outline, Visibility::Visible) => OutlineVisible,
            (EdgeKind::Outline, Visibility::Hidden) => OutlineHidden,
            (EdgeKind::Isoparameter, Visibility::Visible) => IsoparameterVisible,
            (EdgeKind::Isoparameter, Visibility::Hidden) => IsoparameterHidden,
        }
    }

    /// The geometric kind.
    pub fn kind(self) -> EdgeKind {
        use EdgeCategory::*;
        match self {
            SharpVisible | SharpHidden => EdgeKind::Sharp,
            SmoothVisible | SmoothHidden => EdgeKind::Smooth,
            SewnVisible | SewnHidden => EdgeKind::Sewn,
            OutlineVisible | OutlineHidden => EdgeKind::Outline,
            IsoparameterVisible | IsoparameterHidden => EdgeKind::Isoparameter,
        }
    }

    /// The visibility state.
    pub fn visibility(self) -> Visibility {
        use EdgeCategory::*;
        match self {
            SharpVisible | SmoothVisible | SewnVisible | OutlineVisible
            | IsoparameterVisible => Visibility::Visible,
            _ => Visibility::Hidden,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Which categories a consumer wants drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMask {
    enabled: [bool; 10],
}

impl CategoryMask {
    /// Every category enabled.
    pub fn all() -> Self {
        Self { enabled: [true; 10] }
    }

    /// Only the five visible categories.
    pub fn visible_only() -> Self {
        let mut mask = Self { enabled: [false; 10] };
        for c in EdgeCategory::ALL {
            if c.visibility() == Visibility::Visible {
                mask.set(c, true);
            }
        }
        mask
    }

    /// Mask following the "show hidden lines" and "show smooth lines" toggles.
    ///
    /// Smooth and isoparameter categories follow `show_smooth`; hidden
    /// categories additionally require `show_hidden`.
    pub fn from_flags(show_hidden: bool, show_smooth: bool) -> Self {
        let mut mask = Self::all();
        for c in EdgeCategory::ALL {
            let smooth_like = matches!(c.kind(), EdgeKind::Smooth | EdgeKind::Isoparameter);
            let hidden = c.visibility() == Visibility::Hidden;
            if (smooth_like && !show_smooth) || (hidden && !show_hidden) {
                mask.set(c, false);
            }
        }
        mask
    }

    /// Enable or disable one category.
    pub fn set(&mut self, category: EdgeCategory, enabled: bool) {
        self.enabled[category.index()] = enabled;
    }

    /// Whether a category is enabled.
    pub fn contains(&self, category: EdgeCategory) -> bool {
        self.enabled[category.index()]
    }
}

impl Default for CategoryMask {
    fn default() -> Self {
        Self::all()
    }
}

/// What a projected curve was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeSource {
    /// A topological edge of the shape.
    Edge {
        /// The edge.
        id: EdgeId,
    },
    /// A silhouette synthesized on a curved face for this view.
    Silhouette {
        /// The face the silhouette lies on.
        face: FaceId,
        /// Index among the face's silhouette curves.
        index: u32,
    },
    /// A reference parameter line on a curved face.
    Isoline {
        /// The face the line lies on.
        face: FaceId,
        /// Index among the face's isolines.
        index: u32,
    },
}

impl EdgeSource {
    /// The topological edge, if any.
    pub fn edge_id(&self) -> Option<EdgeId> {
        match self {
            EdgeSource::Edge { id } => Some(*id),
            _ => None,
        }
    }
}

/// A maximal run of an edge with a single visibility state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSegment {
    /// Curve parameter range `(t0, t1)` covered by this run.
    pub range: (f64, f64),
    /// Visibility over the whole run.
    pub visibility: Visibility,
    /// Drawing category.
    pub category: EdgeCategory,
    /// Polyline in view-plane coordinates, from `range.0` to `range.1`.
    pub points: Vec<Point2D>,
}

/// One curve of a view with its visibility runs.
///
/// The segments partition the curve's parameter range: they are ordered,
/// the first starts at the range start, each starts where the previous one
/// ends, and the last ends at the range end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    /// Where the curve came from.
    pub source: EdgeSource,
    /// Geometric character in this view.
    pub kind: EdgeKind,
    /// Parameter range of the whole curve.
    pub range: (f64, f64),
    /// Visibility runs in parameter order.
    pub segments: Vec<EdgeSegment>,
}

impl ProjectedEdge {
    /// Parameter intervals that are visible.
    pub fn visible_intervals(&self) -> Vec<(f64, f64)> {
        self.segments
            .iter()
            .filter(|s| s.visibility == Visibility::Visible)
            .map(|s| s.range)
            .collect()
    }

    /// Whether every run is visible.
    pub fn is_fully_visible(&self) -> bool {
        self.segments
            .iter()
            .all(|s| s.visibility == Visibility::Visible)
    }

    /// Whether every run is hidden.
    pub fn is_fully_hidden(&self) -> bool {
        self.segments
            .iter()
            .all(|s| s.visibility == Visibility::Hidden)
    }
}

/// A complete projected view.
///
/// Coordinates are in the view's own plane (model units, y up); page
/// placement is kept separately in a [`Layout`](crate::Layout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Role of the view on the drawing.
    pub slot: ViewSlot,
    /// Projection basis.
    pub basis: ViewBasis,
    /// Convention the slot placement follows.
    pub convention: ProjectionConvention,
    /// 2D bounding box of the projected shape, including dropped edges.
    pub bounds: BoundingBox2D,
    /// Projected curves in deterministic order: true edges by id, then
    /// silhouettes, then isolines.
    pub edges: Vec<ProjectedEdge>,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
}

impl View {
    /// Polylines of the enabled categories, in edge then segment order.
    pub fn polylines(&self, mask: &CategoryMask) -> impl Iterator<Item = (EdgeCategory, &[Point2D])> + '_ {
        let mask = *mask;
        self.edges
            .iter()
            .flat_map(|e| e.segments.iter())
            .filter(move |s| mask.contains(s.category))
            .map(|s| (s.category, s.points.as_slice()))
    }

    /// Number of segments in a category.
    pub fn count(&self, category: EdgeCategory) -> usize {
        self.edges
            .iter()
            .flat_map(|e| e.segments.iter())
            .filter(|s| s.category == category)
            .count()
    }

    /// Curves of a given kind.
    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// The projected curve of a topological edge, if it was drawn.
    pub fn edge(&self, id: EdgeId) -> Option<&ProjectedEdge> {
        self.edges
            .iter()
            .find(|e| e.source == EdgeSource::Edge { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_kind_and_visibility() {
        for c in EdgeCategory::ALL {
            assert_eq!(EdgeCategory::new(c.kind(), c.visibility()), c);
        }
    }

    #[test]
    fn test_mask_from_flags() {
        let m = CategoryMask::from_flags(false, false);
        assert!(m.contains(EdgeCategory::SharpVisible));
        assert!(m.contains(EdgeCategory::OutlineVisible));
        assert!(!m.contains(EdgeCategory::SharpHidden));
        assert!(!m.contains(EdgeCategory::SmoothVisible));
        assert!(!m.contains(EdgeCategory::IsoparameterVisible));

        let m = CategoryMask::from_flags(true, true);
        assert_eq!(m, CategoryMask::all());

        let m = CategoryMask::visible_only();
        assert!(m.contains(EdgeCategory::SewnVisible));
        assert!(!m.contains(EdgeCategory::SewnHidden));
    }

    #[test]
    fn test_bounding_box_overlap() {
        let a = BoundingBox2D::from_corners(Point2D::new(0.0, 0.0), Point2D::new(2.0, 2.0));
        let b = BoundingBox2D::from_corners(Point2D::new(1.0, 1.0), Point2D::new(3.0, 3.0));
        let c = BoundingBox2D::from_corners(Point2D::new(2.0, 0.0), Point2D::new(4.0, 2.0));
        assert!((a.overlap_area(&b) - 1.0).abs() < 1e-12);
        // Touching boxes do not overlap
        assert_eq!(a.overlap_area(&c), 0.0);
        assert_eq!(BoundingBox2D::empty().width(), 0.0);
    }
}
