//! Face trim regions in surface parameter space.
//!
//! A face is the part of its carrying surface selected by a trim. Trims are
//! either closed loops of line and circular-arc segments (an outer boundary
//! plus holes) or a plain rectangular parameter domain, which is how closed
//! curved faces such as a sphere or a seamed cylinder band are bounded.

use orthodraft_math::{Point2, Vec2};
use std::f64::consts::PI;

/// One piece of a trim loop, in (u, v) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimSegment {
    /// Straight segment.
    Line {
        /// Start point.
        start: Point2,
        /// End point.
        end: Point2,
    },
    /// Circular arc, counter-clockwise when `end_angle > start_angle`.
    Arc {
        /// Arc center.
        center: Point2,
        /// Arc radius.
        radius: f64,
        /// Angle at the start point.
        start_angle: f64,
        /// Angle at the end point.
        end_angle: f64,
    },
}

impl TrimSegment {
    /// Point at normalized parameter `s ∈ [0, 1]`.
    pub fn point_at(&self, s: f64) -> Point2 {
        match self {
            TrimSegment::Line { start, end } => start + s * (end - start),
            TrimSegment::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let a = start_angle + s * (end_angle - start_angle);
                center + *radius * Vec2::new(a.cos(), a.sin())
            }
        }
    }

    /// Start point.
    pub fn start(&self) -> Point2 {
        self.point_at(0.0)
    }

    /// End point.
    pub fn end(&self) -> Point2 {
        self.point_at(1.0)
    }

    /// Polyline approximation with the given number of pieces per arc.
    ///
    /// The last point is omitted so consecutive segments can be chained.
    pub fn polyline(&self, arc_pieces: usize) -> Vec<Point2> {
        match self {
            TrimSegment::Line { start, .. } => vec![*start],
            TrimSegment::Arc { .. } => {
                let n = arc_pieces.max(2);
                (0..n).map(|i| self.point_at(i as f64 / n as f64)).collect()
            }
        }
    }

    /// Whether every coordinate of the segment is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            TrimSegment::Line { start, end } => {
                start.iter().all(|c| c.is_finite()) && end.iter().all(|c| c.is_finite())
            }
            TrimSegment::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                center.iter().all(|c| c.is_finite())
                    && radius.is_finite()
                    && start_angle.is_finite()
                    && end_angle.is_finite()
            }
        }
    }
}

/// A closed chain of trim segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrimLoop {
    /// Segments in traversal order; each ends where the next starts.
    pub segments: Vec<TrimSegment>,
}

impl TrimLoop {
    /// A closed polygon through the given corners.
    pub fn polygon(corners: &[Point2]) -> Self {
        let n = corners.len();
        let segments = (0..n)
            .map(|i| TrimSegment::Line {
                start: corners[i],
                end: corners[(i + 1) % n],
            })
            .collect();
        Self { segments }
    }

    /// A full counter-clockwise circle.
    pub fn circle(center: Point2, radius: f64) -> Self {
        Self {
            segments: vec![TrimSegment::Arc {
                center,
                radius,
                start_angle: 0.0,
                end_angle: 2.0 * PI,
            }],
        }
    }

    /// Polygon approximation of the whole loop.
    pub fn polyline(&self, arc_pieces: usize) -> Vec<Point2> {
        self.segments
            .iter()
            .flat_map(|s| s.polyline(arc_pieces))
            .collect()
    }

    /// Largest gap between the end of one segment and the start of the next.
    pub fn closure_gap(&self) -> f64 {
        let n = self.segments.len();
        (0..n)
            .map(|i| (self.segments[i].end() - self.segments[(i + 1) % n].start()).norm())
            .fold(0.0, f64::max)
    }

    /// Parameter-space bounding box `(min, max)`.
    pub fn bounds(&self) -> (Point2, Point2) {
        let mut lo = Point2::new(f64::INFINITY, f64::INFINITY);
        let mut hi = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in self.polyline(32) {
            lo = Point2::new(lo.x.min(p.x), lo.y.min(p.y));
            hi = Point2::new(hi.x.max(p.x), hi.y.max(p.y));
        }
        (lo, hi)
    }
}

/// The region of a surface that belongs to a face.
#[derive(Debug, Clone, PartialEq)]
pub enum Trim {
    /// Bounded by an outer loop with optional holes.
    Loops {
        /// Outer boundary.
        outer: TrimLoop,
        /// Holes cut out of the outer region.
        holes: Vec<TrimLoop>,
    },
    /// The rectangle `u.0..=u.1` × `v.0..=v.1`.
    Domain {
        /// Range of the u parameter.
        u: (f64, f64),
        /// Range of the v parameter.
        v: (f64, f64),
    },
}

impl Trim {
    /// A polygonal region without holes.
    pub fn polygon(corners: &[Point2]) -> Self {
        Trim::Loops {
            outer: TrimLoop::polygon(corners),
            holes: Vec::new(),
        }
    }

    /// Parameter-space bounding box `(min, max)`.
    pub fn bounds(&self) -> (Point2, Point2) {
        match self {
            Trim::Loops { outer, .. } => outer.bounds(),
            Trim::Domain { u, v } => (Point2::new(u.0, v.0), Point2::new(u.1, v.1)),
        }
    }

    /// Every loop of the trim, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &TrimLoop> + Clone {
        let (outer, holes): (Option<&TrimLoop>, &[TrimLoop]) = match self {
            Trim::Loops { outer, holes } => (Some(outer), holes.as_slice()),
            Trim::Domain { .. } => (None, &[]),
        };
        outer.into_iter().chain(holes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_loop_is_closed() {
        let lp = TrimLoop::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
        ]);
        assert_eq!(lp.segments.len(), 3);
        assert!(lp.closure_gap() < 1e-12);
    }

    #[test]
    fn test_circle_bounds() {
        let lp = TrimLoop::circle(Point2::new(1.0, 1.0), 2.0);
        assert!(lp.closure_gap() < 1e-12);
        let (lo, hi) = lp.bounds();
        assert!((lo.x + 1.0).abs() < 1e-9);
        assert!((hi.y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_arc_midpoint() {
        let arc = TrimSegment::Arc {
            center: Point2::origin(),
            radius: 1.0,
            start_angle: 0.0,
            end_angle: PI,
        };
        let mid = arc.point_at(0.5);
        assert!(mid.x.abs() < 1e-12);
        assert!((mid.y - 1.0).abs() < 1e-12);
        assert_eq!(arc.polyline(8).len(), 8);
    }

    #[test]
    fn test_loops_outer_first_and_reusable() {
        let trim = Trim::Loops {
            outer: TrimLoop::polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ]),
            holes: vec![TrimLoop::circle(Point2::new(2.0, 2.0), 1.0)],
        };
        let loops = trim.loops();
        let segments: usize = loops.clone().map(|l| l.segments.len()).sum();
        let first = loops.clone().next().unwrap();
        assert_eq!(first.segments.len(), 4);
        assert_eq!(loops.count(), 2);
        assert!(segments > 4);
    }

    #[test]
    fn test_domain_trim_has_no_loops() {
        let trim = Trim::Domain {
            u: (0.0, 1.0),
            v: (0.0, 2.0),
        };
        assert_eq!(trim.loops().count(), 0);
        let (lo, hi) = trim.bounds();
        assert_eq!(lo, Point2::new(0.0, 0.0));
        assert_eq!(hi, Point2::new(1.0, 2.0));
    }
}
