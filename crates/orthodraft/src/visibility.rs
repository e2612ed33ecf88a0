//! Hidden-line classification by ray casting.
//!
//! A sample point is hidden when a ray cast from it toward the viewer hits
//! a face of the shape. Rays use the face BVH, so each probe only tests
//! the faces whose boxes the ray crosses. Between samples with different
//! states the change is located by bisection, and runs too short to see
//! are absorbed by their neighbours.

use std::collections::BTreeMap;

use orthodraft_geom::Curve3d;
use orthodraft_math::{Point3, Vec3};
use orthodraft_raytrace::{Bvh, Ray};
use orthodraft_topo::FaceId;

use crate::error::{DraftError, Result};
use crate::projection::CurveSample;
use crate::scheduler::CancelToken;
use crate::settings::DraftSettings;
use crate::types::Visibility;

/// Grazing hits followed along one ray before giving up.
const MAX_GRAZING_HOPS: usize = 8;

/// Outcome of a single occlusion probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Resolved state.
    pub visibility: Visibility,
    /// Face grazed by the ray, when the state was decided by policy.
    pub grazed: Option<FaceId>,
}

/// A maximal parameter run with one visibility state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Run {
    /// Parameter range.
    pub range: (f64, f64),
    /// State over the range.
    pub visibility: Visibility,
}

/// Visibility runs of one curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Runs partitioning the curve range, in order.
    pub runs: Vec<Run>,
    /// Ambiguous probe counts per grazed face.
    pub ambiguous: BTreeMap<FaceId, usize>,
}

/// Casts occlusion rays toward the viewer of one view.
pub struct Occluder<'a> {
    bvh: &'a Bvh,
    toward_viewer: Vec3,
    settings: &'a DraftSettings,
    flicker_length: f64,
}

impl<'a> Occluder<'a> {
    /// Create an occluder for rays along `toward_viewer`.
    pub fn new(bvh: &'a Bvh, toward_viewer: Vec3, settings: &'a DraftSettings) -> Self {
        let flicker_length = settings.flicker_fraction * bvh.shape().diagonal();
        Self {
            bvh,
            toward_viewer,
            settings,
            flicker_length,
        }
    }

    /// Decide whether `p` is seen, ignoring faces in `exclude`.
    ///
    /// Hits closer than the depth epsilon are the point's own surface and
    /// are skipped. A ray that only grazes faces resolves to visible.
    pub fn probe(&self, p: &Point3, exclude: &[FaceId]) -> Probe {
        let ray = Ray::new(*p, self.toward_viewer);
        let mut t_min = self.settings.depth_epsilon;
        let mut grazed = None;
        for _ in 0..MAX_GRAZING_HOPS {
            let Some(hit) = self.bvh.first_hit(&ray, t_min, exclude) else {
                break;
            };
            if hit.incidence(&ray).abs() >= self.settings.grazing_cosine {
                return Probe {
                    visibility: Visibility::Hidden,
                    grazed: None,
                };
            }
            grazed.get_or_insert(hit.face_id);
            t_min = hit.t + self.settings.depth_epsilon;
        }
        Probe {
            visibility: Visibility::Visible,
            grazed,
        }
    }

    /// Classify a sampled curve into visibility runs.
    ///
    /// The runs cover `samples[0].t ..= samples[last].t` without gaps or
    /// overlaps.
    pub fn classify(
        &self,
        curve: &dyn Curve3d,
        samples: &[CurveSample],
        exclude: &[FaceId],
        cancel: &CancelToken,
    ) -> Result<Classification> {
        if cancel.is_cancelled() {
            return Err(DraftError::Cancelled);
        }
        let mut ambiguous = BTreeMap::new();
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Ok(Classification {
                runs: Vec::new(),
                ambiguous,
            });
        };

        let mut probe = |p: &Point3| {
            let r = self.probe(p, exclude);
            if let Some(face) = r.grazed {
                *ambiguous.entry(face).or_insert(0) += 1;
            }
            r.visibility
        };

        let states: Vec<Visibility> = samples.iter().map(|s| probe(&s.point)).collect();

        let mut runs = Vec::new();
        let mut start = first.t;
        for i in 0..samples.len() - 1 {
            if states[i] == states[i + 1] {
                continue;
            }
            let (mut lo, mut hi) = (samples[i].t, samples[i + 1].t);
            for _ in 0..self.settings.bisection_steps {
                let mid = 0.5 * (lo + hi);
                if probe(&curve.evaluate(mid)) == states[i] {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let change = 0.5 * (lo + hi);
            runs.push(Run {
                range: (start, change),
                visibility: states[i],
            });
            start = change;
        }
        runs.push(Run {
            range: (start, last.t),
            visibility: states[states.len() - 1],
        });

        absorb_flicker(&mut runs, self.flicker_length, |t| curve.evaluate(t));
        Ok(Classification { runs, ambiguous })
    }
}

/// Merge runs whose chord is shorter than `min_length` into their
/// neighbours, then fuse neighbours with equal state.
fn absorb_flicker(runs: &mut Vec<Run>, min_length: f64, eval: impl Fn(f64) -> Point3) {
    loop {
        if runs.len() < 2 {
            return;
        }
        let shortest = runs
            .iter()
            .enumerate()
            .map(|(i, r)| (i, (eval(r.range.1) - eval(r.range.0)).norm()))
            .filter(|&(_, len)| len < min_length)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        let Some((i, _)) = shortest else {
            return;
        };
        let removed = runs.remove(i);
        if i == 0 {
            runs[0].range.0 = removed.range.0;
        } else {
            runs[i - 1].range.1 = removed.range.1;
        }
        // Fuse equal neighbours created by the removal.
        let mut fused: Vec<Run> = Vec::with_capacity(runs.len());
        for r in runs.drain(..) {
            match fused.last_mut() {
                Some(prev) if prev.visibility == r.visibility => prev.range.1 = r.range.1,
                _ => fused.push(r),
            }
        }
        *runs = fused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orthodraft_geom::Line3d;
    use orthodraft_primitives::make_box;
    use std::sync::Arc;

    use crate::direction::ViewBasis;
    use crate::projection::sample_curve;

    fn run(a: f64, b: f64, visibility: Visibility) -> Run {
        Run {
            range: (a, b),
            visibility,
        }
    }

    #[test]
    fn test_absorb_flicker_merges_short_run() {
        let mut runs = vec![
            run(0.0, 0.5, Visibility::Visible),
            run(0.5, 0.50001, Visibility::Hidden),
            run(0.50001, 1.0, Visibility::Visible),
        ];
        absorb_flicker(&mut runs, 1e-3, |t| Point3::new(t, 0.0, 0.0));
        assert_eq!(runs, vec![run(0.0, 1.0, Visibility::Visible)]);
    }

    #[test]
    fn test_absorb_flicker_keeps_long_runs() {
        let mut runs = vec![
            run(0.0, 0.4, Visibility::Visible),
            run(0.4, 1.0, Visibility::Hidden),
        ];
        let before = runs.clone();
        absorb_flicker(&mut runs, 1e-3, |t| Point3::new(t, 0.0, 0.0));
        assert_eq!(runs, before);
    }

    #[test]
    fn test_absorb_leading_flicker() {
        let mut runs = vec![
            run(0.0, 1e-6, Visibility::Hidden),
            run(1e-6, 1.0, Visibility::Visible),
        ];
        absorb_flicker(&mut runs, 1e-3, |t| Point3::new(t, 0.0, 0.0));
        assert_eq!(runs, vec![run(0.0, 1.0, Visibility::Visible)]);
    }

    #[test]
    fn test_line_behind_box_changes_state() {
        // A 10 mm cube in front of a line that sticks out on both sides.
        let bvh = Bvh::build(Arc::new(make_box(10.0, 10.0, 10.0).unwrap()));
        let settings = DraftSettings::default();
        let basis = ViewBasis::front();
        let occluder = Occluder::new(&bvh, basis.normal, &settings);

        let line = Line3d::from_points(Point3::new(-10.0, 20.0, 5.0), Point3::new(20.0, 20.0, 5.0));
        let samples = sample_curve(&line, (0.0, 1.0), &basis, &settings);
        let c = occluder
            .classify(&line, &samples, &[], &CancelToken::new())
            .unwrap();

        assert_eq!(c.runs.len(), 3);
        assert_eq!(c.runs[0].visibility, Visibility::Visible);
        assert_eq!(c.runs[1].visibility, Visibility::Hidden);
        assert_eq!(c.runs[2].visibility, Visibility::Visible);
        // The cube spans x ∈ [0, 10], i.e. t ∈ [1/3, 2/3]
        assert!((c.runs[1].range.0 - 1.0 / 3.0).abs() < 1e-6);
        assert!((c.runs[1].range.1 - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(c.runs[0].range.0, 0.0);
        assert_eq!(c.runs[2].range.1, 1.0);
        for w in c.runs.windows(2) {
            assert_eq!(w[0].range.1, w[1].range.0);
        }
        assert!(c.ambiguous.is_empty());
    }

    #[test]
    fn test_cancelled_classification() {
        let bvh = Bvh::build(Arc::new(make_box(1.0, 1.0, 1.0).unwrap()));
        let settings = DraftSettings::default();
        let basis = ViewBasis::front();
        let occluder = Occluder::new(&bvh, basis.normal, &settings);
        let line = Line3d::from_points(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        let samples = sample_curve(&line, (0.0, 1.0), &basis, &settings);
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            occluder.classify(&line, &samples, &[], &token),
            Err(DraftError::Cancelled)
        ));
    }
}
