//! Trim testing for determining if a UV point lies within a face boundary.
//!
//! Faces are bounded by trim loops (or a parameter rectangle) that select
//! the valid region of the underlying surface. Points within the boundary
//! tolerance are reported separately so callers can decide how to treat
//! hits that land exactly on an edge.

use orthodraft_math::Point2;
use orthodraft_topo::{Face, Trim, TrimLoop, TrimSegment};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Where a parameter-space point lies relative to a face's trim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimClass {
    /// Strictly inside the trimmed region.
    Inside,
    /// Within tolerance of a trim boundary.
    Boundary,
    /// Outside the trimmed region.
    Outside,
}

/// Classify a UV point against a face's trim.
///
/// For u-periodic surfaces the u coordinate is first shifted into the
/// period that starts at the trim's lowest u.
pub fn classify_uv(face: &Face, uv: Point2, tol: f64) -> TrimClass {
    let periodic = face.surface.is_u_periodic();
    let (lo, hi) = face.trim.bounds();
    let uv = if periodic {
        Point2::new(unwrap_u(uv.x, lo.x, tol), uv.y)
    } else {
        uv
    };

    match &face.trim {
        Trim::Domain { u, v } => {
            let full_turn = periodic && u.1 - u.0 >= TAU - tol;
            classify_domain(uv, *u, *v, full_turn, tol)
        }
        Trim::Loops { .. } => {
            if uv.x < lo.x - tol || uv.x > hi.x + tol || uv.y < lo.y - tol || uv.y > hi.y + tol {
                return TrimClass::Outside;
            }
            classify_loops(face.trim.loops(), uv, tol)
        }
    }
}

/// Test if a UV point is inside a face's trim, counting the boundary as inside.
pub fn point_in_face(face: &Face, uv: Point2, tol: f64) -> bool {
    classify_uv(face, uv, tol) != TrimClass::Outside
}

/// Shift `u` into `[u0, u0 + 2π)`, snapping values just below the period end
/// back onto `u0`.
fn unwrap_u(u: f64, u0: f64, tol: f64) -> f64 {
    let shifted = u0 + (u - u0).rem_euclid(TAU);
    if u0 + TAU - shifted <= tol {
        u0
    } else {
        shifted
    }
}

fn classify_domain(
    uv: Point2,
    u: (f64, f64),
    v: (f64, f64),
    full_turn: bool,
    tol: f64,
) -> TrimClass {
    let range_class = |x: f64, (a, b): (f64, f64)| {
        if x < a - tol || x > b + tol {
            TrimClass::Outside
        } else if x <= a + tol || x >= b - tol {
            TrimClass::Boundary
        } else {
            TrimClass::Inside
        }
    };
    let cu = if full_turn {
        TrimClass::Inside
    } else {
        range_class(uv.x, u)
    };
    let cv = range_class(uv.y, v);
    match (cu, cv) {
        (TrimClass::Outside, _) | (_, TrimClass::Outside) => TrimClass::Outside,
        (TrimClass::Boundary, _) | (_, TrimClass::Boundary) => TrimClass::Boundary,
        _ => TrimClass::Inside,
    }
}

fn classify_loops<'a>(
    loops: impl Iterator<Item = &'a TrimLoop> + Clone,
    p: Point2,
    tol: f64,
) -> TrimClass {
    let on_boundary = loops
        .clone()
        .flat_map(|l| l.segments.iter())
        .any(|s| segment_distance(s, p) <= tol);
    if on_boundary {
        return TrimClass::Boundary;
    }

    // Even-odd rule over every loop: holes toggle parity back to outside.
    let crossings: usize = loops
        .flat_map(|l| l.segments.iter())
        .map(|s| crossings_right_of(s, p))
        .sum();
    if crossings % 2 == 1 {
        TrimClass::Inside
    } else {
        TrimClass::Outside
    }
}

/// Euclidean distance from `p` to a trim segment.
fn segment_distance(seg: &TrimSegment, p: Point2) -> f64 {
    match seg {
        TrimSegment::Line { start, end } => {
            let d = end - start;
            let len2 = d.norm_squared();
            if len2 < 1e-30 {
                return (p - start).norm();
            }
            let s = ((p - start).dot(&d) / len2).clamp(0.0, 1.0);
            (p - (start + s * d)).norm()
        }
        TrimSegment::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => {
            let to_p = p - center;
            let dist = to_p.norm();
            if angle_in_span(to_p.y.atan2(to_p.x), *start_angle, *end_angle) {
                (dist - radius).abs()
            } else {
                (p - seg.start()).norm().min((p - seg.end()).norm())
            }
        }
    }
}

fn angle_in_span(angle: f64, a: f64, b: f64) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if hi - lo >= TAU {
        return true;
    }
    lo + (angle - lo).rem_euclid(TAU) <= hi
}

/// Number of times the segment crosses the ray `p + s·(1, 0)`, `s > 0`.
///
/// Crossings use the half-open rule on y so a ray through a shared vertex
/// is counted once.
fn crossings_right_of(seg: &TrimSegment, p: Point2) -> usize {
    match seg {
        TrimSegment::Line { start, end } => usize::from(line_crosses(*start, *end, p)),
        TrimSegment::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => {
            let (lo, hi) = if start_angle <= end_angle {
                (*start_angle, *end_angle)
            } else {
                (*end_angle, *start_angle)
            };
            // Split at the top and bottom of the circle so every piece is
            // monotone in y.
            let mut cuts = vec![lo];
            let mut k = ((lo - FRAC_PI_2) / PI).ceil();
            loop {
                let a = FRAC_PI_2 + k * PI;
                if a >= hi {
                    break;
                }
                if a > lo {
                    cuts.push(a);
                }
                k += 1.0;
            }
            cuts.push(hi);

            cuts.windows(2)
                .filter(|w| arc_piece_crosses(*center, *radius, w[0], w[1], p))
                .count()
        }
    }
}

fn line_crosses(a: Point2, b: Point2, p: Point2) -> bool {
    if (a.y > p.y) == (b.y > p.y) {
        return false;
    }
    let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
    x > p.x
}

fn arc_piece_crosses(center: Point2, radius: f64, a0: f64, a1: f64, p: Point2) -> bool {
    let y0 = center.y + radius * a0.sin();
    let y1 = center.y + radius * a1.sin();
    if (y0 > p.y) == (y1 > p.y) {
        return false;
    }
    let dy = p.y - center.y;
    let half_chord = (radius * radius - dy * dy).max(0.0).sqrt();
    let side = (0.5 * (a0 + a1)).cos().signum();
    let x = center.x + side * half_chord;
    x > p.x
}
