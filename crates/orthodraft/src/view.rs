//! The per-view pipeline: sample, classify and categorize every curve.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use orthodraft_geom::{Curve3d, SurfaceKind};
use orthodraft_raytrace::Bvh;
use orthodraft_topo::{EdgeId, FaceId, Shape};
use rayon::prelude::*;
use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::direction::{ProjectionConvention, ViewBasis, ViewSlot, ViewSpec};
use crate::error::{DraftError, Result};
use crate::projection::{projected_extent, sample_curve, CurveSample};
use crate::scheduler::CancelToken;
use crate::settings::DraftSettings;
use crate::taxonomy::{isolines, silhouettes, static_kind, view_kind, SyntheticCurve};
use crate::types::{
    BoundingBox2D, EdgeCategory, EdgeKind, EdgeSegment, EdgeSource, Point2D, ProjectedEdge, View,
};
use crate::visibility::{Classification, Occluder};

/// One curve queued for classification.
struct Job<'a> {
    source: EdgeSource,
    kind: EdgeKind,
    curve: &'a dyn Curve3d,
    range: (f64, f64),
    exclude: Vec<FaceId>,
    samples: Vec<CurveSample>,
}

/// Project a shape into a single view, classifying every curve.
///
/// Convenience wrapper that builds the BVH for one view; use a
/// [`ViewComposer`](crate::ViewComposer) to share it across views.
pub fn project_shape(shape: Arc<Shape>, spec: &ViewSpec, settings: &DraftSettings) -> Result<View> {
    settings.validate()?;
    let basis = spec.basis()?;
    let bvh = Bvh::build(shape.clone()).with_boundary_tolerance(settings.boundary_tolerance);
    compute_view(
        &shape,
        &bvh,
        basis,
        ViewSlot::Primary,
        ProjectionConvention::default(),
        settings,
        &CancelToken::new(),
    )
}

/// Compute one view against a prebuilt BVH.
///
/// The result depends only on the inputs: curves are classified in
/// parallel but collected in a fixed order.
///
/// Runs whose category is switched off by `show_hidden` or `show_smooth`
/// are dropped, and so is a curve left with no runs. Bounds still cover
/// every sampled curve.
pub fn compute_view(
    shape: &Shape,
    bvh: &Bvh,
    basis: ViewBasis,
    slot: ViewSlot,
    convention: ProjectionConvention,
    settings: &DraftSettings,
    cancel: &CancelToken,
) -> Result<View> {
    let started = Instant::now();
    let eps = settings.depth_epsilon;

    let (kinds, (synthetic, edge_samples)) = rayon::join(
        || {
            shape
                .edges()
                .map(|(id, _)| static_kind(shape, id, settings))
                .collect::<Vec<_>>()
        },
        || {
            let mut synthetic = silhouettes(shape, &basis, settings);
            synthetic.extend(isolines(shape, settings));
            let samples: Vec<Vec<CurveSample>> = shape
                .edges()
                .collect::<Vec<_>>()
                .par_iter()
                .map(|(_, e)| sample_curve(e.curve.as_ref(), e.range, &basis, settings))
                .collect();
            (synthetic, samples)
        },
    );
    if cancel.is_cancelled() {
        return Err(DraftError::Cancelled);
    }

    let mut bounds = BoundingBox2D::empty();
    let mut diagnostics = Vec::new();
    let mut jobs = Vec::with_capacity(edge_samples.len() + synthetic.len());

    for ((id, edge), samples) in shape.edges().zip(edge_samples) {
        for s in &samples {
            bounds.include_point(s.projected);
        }
        if projected_extent(&samples) < eps {
            diagnostics.push(Diagnostic::ProjectionDegenerate { edge: id });
            continue;
        }
        let kind = view_kind(shape, id, kinds[id.index()], &basis, settings);
        jobs.push(Job {
            source: EdgeSource::Edge { id },
            kind,
            curve: edge.curve.as_ref(),
            range: edge.range,
            exclude: edge_exclusions(shape, id, kind),
            samples,
        });
    }

    let mut counters = BTreeMap::new();
    for syn in &synthetic {
        let samples = sample_curve(syn.curve.as_ref(), syn.range, &basis, settings);
        for s in &samples {
            bounds.include_point(s.projected);
        }
        if projected_extent(&samples) < eps {
            continue;
        }
        jobs.push(synthetic_job(syn, samples, &mut counters));
    }

    let mask = settings.category_mask();
    let occluder = Occluder::new(bvh, basis.normal, settings);
    let classified: Vec<Classification> = jobs
        .par_iter()
        .map(|job| occluder.classify(job.curve, &job.samples, &job.exclude, cancel))
        .collect::<Result<_>>()?;

    let mut edges = Vec::with_capacity(jobs.len());
    for (job, class) in jobs.iter().zip(classified) {
        for (face, samples) in class.ambiguous {
            diagnostics.push(Diagnostic::ClassificationAmbiguous {
                edge: job.source.edge_id(),
                face,
                samples,
            });
        }
        let segments: Vec<EdgeSegment> = class
            .runs
            .iter()
            .map(|run| (run, EdgeCategory::new(job.kind, run.visibility)))
            .filter(|(_, category)| mask.contains(*category))
            .map(|(run, category)| EdgeSegment {
                range: run.range,
                visibility: run.visibility,
                category,
                points: segment_points(job, run.range, &basis),
            })
            .collect();
        if segments.is_empty() {
            continue;
        }
        edges.push(ProjectedEdge {
            source: job.source,
            kind: job.kind,
            range: job.range,
            segments,
        });
    }

    if !bounds.is_valid() || bounds.width() < eps || bounds.height() < eps {
        diagnostics.push(Diagnostic::ViewDegenerate {
            width: bounds.width(),
            height: bounds.height(),
        });
    }
    for d in &diagnostics {
        d.log();
    }

    debug!(
        ?slot,
        edges = edges.len(),
        diagnostics = diagnostics.len(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
        "computed view"
    );

    Ok(View {
        slot,
        basis,
        convention,
        bounds,
        edges,
        diagnostics,
    })
}

/// Faces a true edge's rays must ignore.
///
/// Planar neighbours contain the edge, so every ray from it starts on
/// them. Curved neighbours are kept and their self-hits are filtered by
/// depth, which lets them hide the far side of their own boundary.
/// Outlines lie where their faces turn away, so all neighbours are skipped.
fn edge_exclusions(shape: &Shape, id: EdgeId, kind: EdgeKind) -> Vec<FaceId> {
    let edge = shape.edge(id);
    let mut out: Vec<FaceId> = edge
        .faces
        .iter()
        .copied()
        .filter(|&f| {
            kind == EdgeKind::Outline || shape.face(f).surface.surface_type() == SurfaceKind::Plane
        })
        .collect();
    out.dedup();
    out
}

fn synthetic_job<'a>(
    syn: &'a SyntheticCurve,
    samples: Vec<CurveSample>,
    counters: &mut BTreeMap<(FaceId, bool), u32>,
) -> Job<'a> {
    let outline = syn.kind == EdgeKind::Outline;
    let index = counters.entry((syn.face, outline)).or_insert(0);
    let source = if outline {
        EdgeSource::Silhouette {
            face: syn.face,
            index: *index,
        }
    } else {
        EdgeSource::Isoline {
            face: syn.face,
            index: *index,
        }
    };
    *index += 1;
    Job {
        source,
        kind: syn.kind,
        curve: syn.curve.as_ref(),
        range: syn.range,
        exclude: if outline { vec![syn.face] } else { Vec::new() },
        samples,
    }
}

/// Polyline of a run: its end points plus the curve samples strictly inside.
fn segment_points(job: &Job<'_>, range: (f64, f64), basis: &ViewBasis) -> Vec<Point2D> {
    let (a, b) = range;
    let mut points = Vec::new();
    points.push(basis.project(&job.curve.evaluate(a)));
    points.extend(
        job.samples
            .iter()
            .filter(|s| s.t > a && s.t < b)
            .map(|s| s.projected),
    );
    points.push(basis.project(&job.curve.evaluate(b)));
    points
}
