//! Adaptive curve sampling and orthographic projection onto a view plane.
//!
//! Curves are first cut into `min_samples` equal parameter pieces, then
//! each piece is halved until the chord deviates from the curve by less
//! than the chord tolerance. Orthographic projection never lengthens a
//! distance, so the 3D deviation bound also holds for the 2D polyline.

use orthodraft_geom::{Curve3d, CurveKind};
use orthodraft_math::Point3;

use crate::direction::ViewBasis;
use crate::settings::DraftSettings;
use crate::types::Point2D;

/// A sampled point on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    /// Curve parameter.
    pub t: f64,
    /// Model-space point.
    pub point: Point3,
    /// Projected view-plane point.
    pub projected: Point2D,
}

/// Sample a curve over `range` and project every sample.
///
/// The first and last samples sit exactly on the range ends. Output is a
/// pure function of its inputs.
pub fn sample_curve(
    curve: &dyn Curve3d,
    range: (f64, f64),
    basis: &ViewBasis,
    settings: &DraftSettings,
) -> Vec<CurveSample> {
    let (t0, t1) = range;
    let pieces = settings.min_samples.max(1);
    let make = |t: f64| {
        let point = curve.evaluate(t);
        CurveSample {
            t,
            point,
            projected: basis.project(&point),
        }
    };

    let mut out = Vec::with_capacity(pieces * 2 + 1);
    out.push(make(t0));
    let straight = curve.curve_type() == CurveKind::Line;
    let mut prev = out[0];
    for i in 0..pieces {
        let b = if i + 1 == pieces {
            t1
        } else {
            t0 + (t1 - t0) * (i + 1) as f64 / pieces as f64
        };
        let next = make(b);
        if straight {
            out.push(next);
        } else {
            refine(&make, prev, next, 0, settings, &mut out);
        }
        prev = next;
    }
    out
}

fn refine(
    make: &impl Fn(f64) -> CurveSample,
    a: CurveSample,
    b: CurveSample,
    depth: u32,
    settings: &DraftSettings,
    out: &mut Vec<CurveSample>,
) {
    let mid = make(0.5 * (a.t + b.t));
    if depth < settings.max_subdivision_depth
        && chord_deviation(&a.point, &b.point, &mid.point) > settings.chord_tolerance
    {
        refine(make, a, mid, depth + 1, settings, out);
        refine(make, mid, b, depth + 1, settings, out);
    } else {
        out.push(b);
    }
}

/// Distance from `p` to the segment `a`–`b`.
fn chord_deviation(a: &Point3, b: &Point3, p: &Point3) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-30 {
        return (p - a).norm();
    }
    let s = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + s * ab)).norm()
}

/// Largest distance of any projected sample from the first one.
pub fn projected_extent(samples: &[CurveSample]) -> f64 {
    let Some(first) = samples.first() else {
        return 0.0;
    };
    samples
        .iter()
        .map(|s| s.projected.distance(&first.projected))
        .fold(0.0, f64::max)
}
