#![warn(missing_docs)]

//! Primitive shape construction for orthodraft.
//!
//! Builds validated [`Shape`] snapshots for the standard drafting test
//! parts: box, extruded polygon (prism), slot, cylinder, cone, sphere and a
//! single open sheet. All solids sit on the XY plane and extrude along +Z.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};

use orthodraft_geom::{Circle3d, ConeSurface, CylinderSurface, Line3d, Plane, SphereSurface};
use orthodraft_math::{Point2, Point3, Vec3};
use orthodraft_topo::{
    BodyId, Continuity, FaceId, Orientation, Result, Shape, ShapeBuilder, TopoError, Trim,
    TrimLoop, TrimSegment, VertexId,
};

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TopoError::InvalidDimension(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Add a closed polyhedral body: `loops` lists each face's corner indices
/// counter-clockwise when viewed from outside.
fn add_polyhedron(
    b: &mut ShapeBuilder,
    body: BodyId,
    points: &[Point3],
    loops: &[Vec<usize>],
) -> Result<()> {
    let verts: Vec<VertexId> = points.iter().map(|p| b.add_vertex(*p)).collect();

    // Faces sharing each undirected corner pair; BTreeMap keeps edge ids stable.
    let mut edge_faces: BTreeMap<(usize, usize), Vec<FaceId>> = BTreeMap::new();

    for corners in loops {
        let p0 = points[corners[0]];
        // Newell normal handles concave outlines.
        let mut normal = Vec3::zeros();
        for i in 0..corners.len() {
            let a = points[corners[i]];
            let c = points[corners[(i + 1) % corners.len()]];
            normal += Vec3::new(
                (a.y - c.y) * (a.z + c.z),
                (a.z - c.z) * (a.x + c.x),
                (a.x - c.x) * (a.y + c.y),
            );
        }
        if normal.norm() < 1e-12 {
            return Err(TopoError::InvalidDimension("face has zero area".into()));
        }
        let x_dir = points[corners[1]] - p0;
        let y_dir = normal.normalize().cross(&x_dir);
        let plane = Plane::new(p0, x_dir, y_dir);
        let uv: Vec<Point2> = corners.iter().map(|&i| plane.project(&points[i])).collect();
        let face = b.add_face(plane, Orientation::Forward, body, Trim::polygon(&uv));

        for i in 0..corners.len() {
            let (a, c) = (corners[i], corners[(i + 1) % corners.len()]);
            edge_faces
                .entry((a.min(c), a.max(c)))
                .or_default()
                .push(face);
        }
    }

    for ((a, c), faces) in edge_faces {
        let e = b.add_edge(Line3d::from_points(points[a], points[c]), &faces);
        b.connect(e, verts[a], verts[c])?;
    }
    Ok(())
}

/// Build a box with one corner at the origin and dimensions `(sx, sy, sz)`.
///
/// 6 planar faces, 12 line edges, 8 vertices.
/// ```text
///     v7----v6
///    /|    /|
///   v4----v5|    z
///   | v3--|-v2   | y
///   |/    |/     |/
///   v0----v1     +---x
/// ```
pub fn make_box(sx: f64, sy: f64, sz: f64) -> Result<Shape> {
    require_positive("box width", sx)?;
    require_positive("box depth", sy)?;
    require_positive("box height", sz)?;

    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(sx, 0.0, 0.0),
        Point3::new(sx, sy, 0.0),
        Point3::new(0.0, sy, 0.0),
        Point3::new(0.0, 0.0, sz),
        Point3::new(sx, 0.0, sz),
        Point3::new(sx, sy, sz),
        Point3::new(0.0, sy, sz),
    ];
    let loops = vec![
        vec![0, 3, 2, 1], // bottom (-Z)
        vec![4, 5, 6, 7], // top (+Z)
        vec![0, 1, 5, 4], // front (-Y)
        vec![2, 3, 7, 6], // back (+Y)
        vec![0, 4, 7, 3], // left (-X)
        vec![1, 2, 6, 5], // right (+X)
    ];

    let mut b = ShapeBuilder::new();
    let body = b.add_body();
    add_polyhedron(&mut b, body, &points, &loops)?;
    b.build()
}

/// Extrude a closed polygon in the XY plane by `height` along +Z.
///
/// The profile may be given in either winding; it must have at least three
/// corners and must not cross itself.
pub fn make_prism(profile: &[Point2], height: f64) -> Result<Shape> {
    require_positive("prism height", height)?;
    if profile.len() < 3 {
        return Err(TopoError::InvalidDimension(format!(
            "prism profile needs at least 3 corners, got {}",
            profile.len()
        )));
    }

    let signed_area: f64 = (0..profile.len())
        .map(|i| {
            let a = profile[i];
            let c = profile[(i + 1) % profile.len()];
            a.x * c.y - c.x * a.y
        })
        .sum::<f64>()
        / 2.0;
    if signed_area.abs() < 1e-12 {
        return Err(TopoError::InvalidDimension(
            "prism profile has zero area".into(),
        ));
    }
    let ring: Vec<Point2> = if signed_area > 0.0 {
        profile.to_vec()
    } else {
        profile.iter().rev().copied().collect()
    };

    let n = ring.len();
    let mut points: Vec<Point3> = ring.iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect();
    points.extend(ring.iter().map(|p| Point3::new(p.x, p.y, height)));

    let mut loops = Vec::with_capacity(n + 2);
    loops.push((0..n).rev().collect::<Vec<_>>());
    loops.push((n..2 * n).collect::<Vec<_>>());
    for i in 0..n {
        let j = (i + 1) % n;
        loops.push(vec![i, j, j + n, i + n]);
    }

    let mut b = ShapeBuilder::new();
    let body = b.add_body();
    add_polyhedron(&mut b, body, &points, &loops)?;
    b.build()
}

/// Build a slot (obround prism): two half-cylinder ends of diameter `width`
/// whose centers are `length` apart along X, extruded by `height`.
///
/// The first end is centered on the origin. The four vertical lines where
/// the flat sides meet the round ends are tangent-continuous.
pub fn make_slot(length: f64, width: f64, height: f64) -> Result<Shape> {
    require_positive("slot length", length)?;
    require_positive("slot width", width)?;
    require_positive("slot height", height)?;
    let r = width / 2.0;

    let mut b = ShapeBuilder::new();
    let body = b.add_body();

    let outline = TrimLoop {
        segments: vec![
            TrimSegment::Line {
                start: Point2::new(0.0, -r),
                end: Point2::new(length, -r),
            },
            TrimSegment::Arc {
                center: Point2::new(length, 0.0),
                radius: r,
                start_angle: -FRAC_PI_2,
                end_angle: FRAC_PI_2,
            },
            TrimSegment::Line {
                start: Point2::new(length, r),
                end: Point2::new(0.0, r),
            },
            TrimSegment::Arc {
                center: Point2::origin(),
                radius: r,
                start_angle: FRAC_PI_2,
                end_angle: 3.0 * FRAC_PI_2,
            },
        ],
    };
    let cap = |z: f64| Plane::new(Point3::new(0.0, 0.0, z), Vec3::x(), Vec3::y());
    let cap_trim = Trim::Loops {
        outer: outline,
        holes: Vec::new(),
    };
    let bottom = b.add_face(cap(0.0), Orientation::Reversed, body, cap_trim.clone());
    let top = b.add_face(cap(height), Orientation::Forward, body, cap_trim);

    let front = b.add_face(
        Plane::new(Point3::new(0.0, -r, 0.0), Vec3::x(), Vec3::z()),
        Orientation::Forward,
        body,
        Trim::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(length, 0.0),
            Point2::new(length, height),
            Point2::new(0.0, height),
        ]),
    );
    let back = b.add_face(
        Plane::new(Point3::new(0.0, r, 0.0), Vec3::z(), Vec3::x()),
        Orientation::Forward,
        body,
        Trim::polygon(&[
            Point2::new(0.0, 0.0),
            Point2::new(height, 0.0),
            Point2::new(height, length),
            Point2::new(0.0, length),
        ]),
    );
    let end_face = |b: &mut ShapeBuilder, cx: f64, u: (f64, f64)| {
        b.add_face(
            CylinderSurface::with_frame(Point3::new(cx, 0.0, 0.0), Vec3::z(), Vec3::x(), r),
            Orientation::Forward,
            body,
            Trim::Domain { u, v: (0.0, height) },
        )
    };
    let right_end = end_face(&mut b, length, (-FRAC_PI_2, FRAC_PI_2));
    let left_end = end_face(&mut b, 0.0, (FRAC_PI_2, 3.0 * FRAC_PI_2));

    for (z, cap_face) in [(0.0, bottom), (height, top)] {
        let arc = |cx: f64, a0: f64, a1: f64| {
            Circle3d::from_frame(Point3::new(cx, 0.0, z), r, Vec3::z(), Vec3::x()).arc(a0, a1)
        };
        b.add_edge(
            Line3d::from_points(Point3::new(0.0, -r, z), Point3::new(length, -r, z)),
            &[cap_face, front],
        );
        b.add_edge(arc(length, -FRAC_PI_2, FRAC_PI_2), &[cap_face, right_end]);
        b.add_edge(
            Line3d::from_points(Point3::new(length, r, z), Point3::new(0.0, r, z)),
            &[cap_face, back],
        );
        b.add_edge(arc(0.0, FRAC_PI_2, 3.0 * FRAC_PI_2), &[cap_face, left_end]);
    }

    let tangent_lines = [
        (Point2::new(length, -r), front, right_end),
        (Point2::new(length, r), back, right_end),
        (Point2::new(0.0, r), back, left_end),
        (Point2::new(0.0, -r), front, left_end),
    ];
    for (xy, flat, round) in tangent_lines {
        let e = b.add_edge(
            Line3d::from_points(
                Point3::new(xy.x, xy.y, 0.0),
                Point3::new(xy.x, xy.y, height),
            ),
            &[flat, round],
        );
        b.set_continuity(e, Continuity::G1)?;
    }

    b.build()
}

/// Build a cylinder with the given radius and height, axis along Z.
///
/// One cylindrical lateral face with a seam at `u = 0` (the +X side), two
/// planar caps, two circular edges and the seam edge.
pub fn make_cylinder(radius: f64, height: f64) -> Result<Shape> {
    require_positive("cylinder radius", radius)?;
    require_positive("cylinder height", height)?;

    let mut b = ShapeBuilder::new();
    let body = b.add_body();

    let lateral = b.add_face(
        CylinderSurface::new(radius),
        Orientation::Forward,
        body,
        Trim::Domain {
            u: (0.0, 2.0 * PI),
            v: (0.0, height),
        },
    );
    let disk = Trim::Loops {
        outer: TrimLoop::circle(Point2::origin(), radius),
        holes: Vec::new(),
    };
    let cap = |z: f64| Plane::new(Point3::new(0.0, 0.0, z), Vec3::x(), Vec3::y());
    let bottom = b.add_face(cap(0.0), Orientation::Reversed, body, disk.clone());
    let top = b.add_face(cap(height), Orientation::Forward, body, disk);

    let v_bot = b.add_vertex(Point3::new(radius, 0.0, 0.0));
    let v_top = b.add_vertex(Point3::new(radius, 0.0, height));

    let circle = |z: f64| Circle3d::from_frame(Point3::new(0.0, 0.0, z), radius, Vec3::z(), Vec3::x());
    let e_bot = b.add_edge(circle(0.0), &[lateral, bottom]);
    b.connect(e_bot, v_bot, v_bot)?;
    let e_top = b.add_edge(circle(height), &[lateral, top]);
    b.connect(e_top, v_top, v_top)?;
    let seam = b.add_edge(
        Line3d::from_points(Point3::new(radius, 0.0, 0.0), Point3::new(radius, 0.0, height)),
        &[lateral, lateral],
    );
    b.connect(seam, v_bot, v_top)?;

    b.build()
}

/// Build a cone frustum with bottom radius, top radius and height along Z.
///
/// A zero radius at either end gives a pointed cone with no cap there.
/// Equal radii fall back to [`make_cylinder`].
pub fn make_cone(radius_bottom: f64, radius_top: f64, height: f64) -> Result<Shape> {
    require_positive("cone height", height)?;
    if !(radius_bottom >= 0.0 && radius_top >= 0.0) || radius_bottom.max(radius_top) <= 0.0 {
        return Err(TopoError::InvalidDimension(format!(
            "cone radii must be non-negative and not both zero, got {radius_bottom} and {radius_top}"
        )));
    }
    if (radius_bottom - radius_top).abs() < 1e-12 {
        return make_cylinder(radius_bottom, height);
    }

    let (surface, v_range) =
        ConeSurface::from_frustum(Point3::origin(), radius_bottom, radius_top, height).ok_or_else(
            || TopoError::InvalidDimension("cone frustum is degenerate".into()),
        )?;

    let mut b = ShapeBuilder::new();
    let body = b.add_body();
    let lateral = b.add_face(
        surface,
        Orientation::Forward,
        body,
        Trim::Domain {
            u: (0.0, 2.0 * PI),
            v: v_range,
        },
    );

    let rim_point = |r: f64, z: f64| Point3::new(r, 0.0, z);
    let v_bot = b.add_vertex(rim_point(radius_bottom, 0.0));
    let v_top = b.add_vertex(rim_point(radius_top, height));

    for (r, z, orientation, v) in [
        (radius_bottom, 0.0, Orientation::Reversed, v_bot),
        (radius_top, height, Orientation::Forward, v_top),
    ] {
        if r <= 0.0 {
            continue;
        }
        let cap = b.add_face(
            Plane::new(Point3::new(0.0, 0.0, z), Vec3::x(), Vec3::y()),
            orientation,
            body,
            Trim::Loops {
                outer: TrimLoop::circle(Point2::origin(), r),
                holes: Vec::new(),
            },
        );
        let rim = b.add_edge(
            Circle3d::from_frame(Point3::new(0.0, 0.0, z), r, Vec3::z(), Vec3::x()),
            &[lateral, cap],
        );
        b.connect(rim, v, v)?;
    }

    let seam = b.add_edge(
        Line3d::from_points(rim_point(radius_bottom, 0.0), rim_point(radius_top, height)),
        &[lateral, lateral],
    );
    b.connect(seam, v_bot, v_top)?;

    b.build()
}

/// Build a sphere: one closed face, no edges, no vertices.
pub fn make_sphere(center: Point3, radius: f64) -> Result<Shape> {
    require_positive("sphere radius", radius)?;

    let mut b = ShapeBuilder::new();
    let body = b.add_body();
    b.add_face(
        SphereSurface::new(center, radius),
        Orientation::Forward,
        body,
        Trim::Domain {
            u: (0.0, 2.0 * PI),
            v: (-FRAC_PI_2, FRAC_PI_2),
        },
    );
    b.build()
}

/// Build an open rectangular sheet `width × depth` in the XY plane, facing +Z.
///
/// All four edges are free boundaries.
pub fn make_sheet(width: f64, depth: f64) -> Result<Shape> {
    require_positive("sheet width", width)?;
    require_positive("sheet depth", depth)?;

    let corners = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(width, 0.0, 0.0),
        Point3::new(width, depth, 0.0),
        Point3::new(0.0, depth, 0.0),
    ];
    let mut b = ShapeBuilder::new();
    let body = b.add_body();
    let face = b.add_face(
        Plane::new(Point3::origin(), Vec3::x(), Vec3::y()),
        Orientation::Forward,
        body,
        Trim::polygon(&corners.map(|p| Point2::new(p.x, p.y))),
    );
    let verts = corners.map(|p| b.add_vertex(p));
    for i in 0..4 {
        let j = (i + 1) % 4;
        let e = b.add_edge(Line3d::from_points(corners[i], corners[j]), &[face]);
        b.connect(e, verts[i], verts[j])?;
    }
    b.build()
}
