//! Face bounding volume hierarchy.
//!
//! Nodes live in one flat vector; the root is node 0 and a leaf owns a
//! contiguous run of the reordered face list. Splits are chosen with a
//! bucketed surface area heuristic and traversal uses an explicit stack.

use std::sync::Arc;

use orthodraft_topo::{FaceId, Shape};

use crate::bbox::{face_aabb, Aabb3};
use crate::intersect::intersect_surface;
use crate::trim::{classify_uv, TrimClass};
use crate::{Ray, RayHit};

/// Largest face count kept in a leaf.
const LEAF_SIZE: usize = 4;

/// Centroid buckets per axis for split evaluation.
const BUCKETS: usize = 12;

/// Cost of visiting a node, relative to one face test.
const TRAVERSAL_COST: f64 = 0.125;

/// Default trim tolerance as a fraction of the shape diagonal.
const RELATIVE_BOUNDARY_TOL: f64 = 1e-7;

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb3,
    kind: NodeKind,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Faces `order[first..first + count]`.
    Leaf { first: usize, count: usize },
    /// Children; the first child always directly follows its parent.
    Split { second: usize },
}

#[derive(Debug, Clone, Copy)]
struct Item {
    face: FaceId,
    bounds: Aabb3,
    centroid: [f64; 3],
}

/// Bounding volume hierarchy over the faces of a shared [`Shape`].
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<Node>,
    order: Vec<FaceId>,
    shape: Arc<Shape>,
    boundary_tol: f64,
}

impl Bvh {
    /// Build the hierarchy over every face of `shape`.
    pub fn build(shape: Arc<Shape>) -> Self {
        let mut items: Vec<Item> = shape
            .faces()
            .map(|(face, _)| {
                let bounds = face_aabb(&shape, face);
                let c = bounds.centroid();
                Item {
                    face,
                    bounds,
                    centroid: [c.x, c.y, c.z],
                }
            })
            .collect();

        let mut nodes = Vec::with_capacity(2 * items.len());
        if !items.is_empty() {
            subdivide(&mut items, 0, &mut nodes);
        }
        tracing::trace!(faces = items.len(), nodes = nodes.len(), "built face bvh");

        let boundary_tol = RELATIVE_BOUNDARY_TOL * shape.diagonal().max(1.0);
        Self {
            nodes,
            order: items.into_iter().map(|item| item.face).collect(),
            shape,
            boundary_tol,
        }
    }

    /// Use `tol` to decide when a hit lies on a trim boundary.
    pub fn with_boundary_tolerance(mut self, tol: f64) -> Self {
        self.boundary_tol = tol;
        self
    }

    /// The shape the hierarchy covers.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Every trimmed hit along the ray, nearest first.
    pub fn trace(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();
        self.visit(ray, |face| hits.extend(self.face_hits(ray, face)));
        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    /// Nearest hit with `t > t_min` on a face not in `exclude`.
    pub fn first_hit(&self, ray: &Ray, t_min: f64, exclude: &[FaceId]) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        let mut stack = Vec::with_capacity(32);
        if !self.nodes.is_empty() {
            stack.push(0);
        }
        while let Some(index) = stack.pop() {
            let limit = best.map_or(f64::INFINITY, |hit| hit.t);
            let node = &self.nodes[index];
            match ray.intersect_aabb(&node.bounds) {
                Some((enter, _)) if enter < limit => {}
                _ => continue,
            }
            match node.kind {
                NodeKind::Leaf { first, count } => {
                    for &face in &self.order[first..first + count] {
                        if exclude.contains(&face) {
                            continue;
                        }
                        for hit in self.face_hits(ray, face) {
                            if hit.t > t_min && best.map_or(true, |b| hit.t < b.t) {
                                best = Some(hit);
                            }
                        }
                    }
                }
                NodeKind::Split { second } => {
                    // Push the farther child first so the nearer pops next.
                    let entry = |i: usize| {
                        ray.intersect_aabb(&self.nodes[i].bounds)
                            .map_or(f64::INFINITY, |(t, _)| t)
                    };
                    let (near, far) = if entry(index + 1) <= entry(second) {
                        (index + 1, second)
                    } else {
                        (second, index + 1)
                    };
                    stack.push(far);
                    stack.push(near);
                }
            }
        }
        best
    }

    fn visit(&self, ray: &Ray, mut leaf: impl FnMut(FaceId)) {
        let mut stack = Vec::with_capacity(32);
        if !self.nodes.is_empty() {
            stack.push(0);
        }
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if ray.intersect_aabb(&node.bounds).is_none() {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { first, count } => {
                    self.order[first..first + count].iter().for_each(|&f| leaf(f));
                }
                NodeKind::Split { second } => {
                    stack.push(second);
                    stack.push(index + 1);
                }
            }
        }
    }

    fn face_hits<'s>(&'s self, ray: &'s Ray, face_id: FaceId) -> impl Iterator<Item = RayHit> + 's {
        let face = self.shape.face(face_id);
        intersect_surface(ray, face.surface.as_ref())
            .into_iter()
            .filter_map(move |hit| {
                let class = classify_uv(face, hit.uv, self.boundary_tol);
                (class != TrimClass::Outside).then(|| RayHit {
                    t: hit.t,
                    point: ray.at(hit.t),
                    normal: face.normal_at(hit.uv),
                    uv: hit.uv,
                    face_id,
                    on_boundary: class == TrimClass::Boundary,
                })
            })
    }
}

/// Append the subtree over `items` (whose leaves start at `offset` in the
/// final face order) and return its node index.
fn subdivide(items: &mut [Item], offset: usize, nodes: &mut Vec<Node>) -> usize {
    let bounds = items.iter().fold(Aabb3::empty(), |mut acc, item| {
        acc.include_box(&item.bounds);
        acc
    });
    let index = nodes.len();
    nodes.push(Node {
        bounds,
        kind: NodeKind::Leaf {
            first: offset,
            count: items.len(),
        },
    });
    if items.len() <= LEAF_SIZE {
        return index;
    }

    let mid = best_split(items, &bounds)
        .map(|(axis, at)| partition(items, axis, at))
        .filter(|&m| m > 0 && m < items.len())
        .unwrap_or(items.len() / 2);

    let (left, right) = items.split_at_mut(mid);
    subdivide(left, offset, nodes);
    let second = subdivide(right, offset + mid, nodes);
    nodes[index].kind = NodeKind::Split { second };
    index
}

/// Cheapest `(axis, position)` under the surface area heuristic.
fn best_split(items: &[Item], bounds: &Aabb3) -> Option<(usize, f64)> {
    let area = bounds.surface_area();
    if area <= 0.0 {
        return None;
    }
    let mut best: Option<(f64, usize, f64)> = None;
    for axis in 0..3 {
        let lo = bounds.min[axis];
        let extent = bounds.max[axis] - lo;
        if extent < 1e-10 {
            continue;
        }

        let mut counts = [0usize; BUCKETS];
        let mut boxes = [Aabb3::empty(); BUCKETS];
        for item in items {
            let b = ((item.centroid[axis] - lo) / extent * BUCKETS as f64) as usize;
            let b = b.min(BUCKETS - 1);
            counts[b] += 1;
            boxes[b].include_box(&item.bounds);
        }

        // Suffix sweep: cost contribution of buckets at or above each split.
        let mut right_cost = [0.0; BUCKETS];
        let mut right_count = [0usize; BUCKETS];
        let mut acc = Aabb3::empty();
        let mut n = 0;
        for b in (1..BUCKETS).rev() {
            acc.include_box(&boxes[b]);
            n += counts[b];
            right_cost[b] = acc.surface_area() * n as f64;
            right_count[b] = n;
        }

        let mut acc = Aabb3::empty();
        let mut n = 0;
        for split in 1..BUCKETS {
            acc.include_box(&boxes[split - 1]);
            n += counts[split - 1];
            if n == 0 || right_count[split] == 0 {
                continue;
            }
            let cost = TRAVERSAL_COST + (acc.surface_area() * n as f64 + right_cost[split]) / area;
            if best.map_or(true, |(c, _, _)| cost < c) {
                best = Some((cost, axis, lo + extent * split as f64 / BUCKETS as f64));
            }
        }
    }
    best.map(|(_, axis, at)| (axis, at))
}

/// Move items with centroid below `at` to the front; returns their count.
fn partition(items: &mut [Item], axis: usize, at: f64) -> usize {
    let mut front = 0;
    for i in 0..items.len() {
        if items[i].centroid[axis] < at {
            items.swap(front, i);
            front += 1;
        }
    }
    front
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use orthodraft_math::{Point2, Point3, Vec3};
    use orthodraft_primitives::{make_box, make_cylinder, make_prism, make_sphere};

    fn cube_bvh() -> Bvh {
        Bvh::build(Arc::new(make_box(10.0, 10.0, 10.0).unwrap()))
    }

    fn up_through_cube() -> Ray {
        Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::z())
    }

    #[test]
    fn test_cube_root_splits() {
        let bvh = cube_bvh();
        assert_eq!(bvh.order.len(), 6);
        assert_eq!(bvh.shape().num_faces(), 6);
        assert!(matches!(bvh.nodes[0].kind, NodeKind::Split { .. }));
    }

    #[test]
    fn test_trace_cube() {
        let bvh = cube_bvh();
        let ray = up_through_cube();
        let hits = bvh.trace(&ray);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.z, 0.0, epsilon = 1e-8);
        assert_relative_eq!(hits[1].point.z, 10.0, epsilon = 1e-8);
        assert!(hits.iter().all(|h| !h.on_boundary));
        // Entering through the bottom: the outward normal opposes the ray.
        assert!(hits[0].incidence(&ray) < -0.99);
    }

    #[test]
    fn test_miss() {
        let bvh = cube_bvh();
        let ray = Ray::new(Point3::new(50.0, 50.0, -5.0), Vec3::z());
        assert!(bvh.trace(&ray).is_empty());
        assert!(bvh.first_hit(&ray, 0.0, &[]).is_none());
    }

    #[test]
    fn test_first_hit_skips_excluded_and_near() {
        let bvh = cube_bvh();
        let ray = up_through_cube();
        let entry = bvh.first_hit(&ray, 0.0, &[]).unwrap();
        assert_relative_eq!(entry.point.z, 0.0, epsilon = 1e-8);

        let beyond = bvh.first_hit(&ray, 0.0, &[entry.face_id]).unwrap();
        assert_relative_eq!(beyond.point.z, 10.0, epsilon = 1e-8);

        let after = bvh.first_hit(&ray, entry.t + 1e-6, &[]).unwrap();
        assert_eq!(after.face_id, beyond.face_id);
    }

    #[test]
    fn test_ray_along_edge_is_boundary() {
        let bvh = cube_bvh();
        // Runs in the bottom plane and meets the x = 0 face on its edge.
        let ray = Ray::new(Point3::new(-5.0, 5.0, 0.0), Vec3::x());
        let hits = bvh.trace(&ray);
        assert!(!hits.is_empty());
        assert!(hits[0].on_boundary);
        assert!(hits[0].point.x.abs() < 1e-8);
    }

    #[test]
    fn test_cylinder_side_and_caps() {
        let bvh = Bvh::build(Arc::new(make_cylinder(5.0, 10.0).unwrap()));
        let across = Ray::new(Point3::new(-20.0, 0.0, 5.0), Vec3::x());
        let hits = bvh.trace(&across);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.x, -5.0, epsilon = 1e-8);
        assert_relative_eq!(hits[1].point.x, 5.0, epsilon = 1e-8);

        let down = Ray::new(Point3::new(1.0, 1.0, 20.0), -Vec3::z());
        let hits = bvh.trace(&down);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0].point.z, 10.0, epsilon = 1e-8);
    }

    #[test]
    fn test_many_faces_split_and_agree() {
        // A 24-sided prism needs several levels.
        let profile: Vec<Point2> = (0..24)
            .map(|i| {
                let a = i as f64 / 24.0 * std::f64::consts::TAU;
                Point2::new(10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        let bvh = Bvh::build(Arc::new(make_prism(&profile, 5.0).unwrap()));
        assert!(bvh.nodes.len() > 3);
        let mut seen = bvh.order.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 26);

        let ray = Ray::new(Point3::new(-30.0, 0.3, 2.5), Vec3::x());
        let hits = bvh.trace(&ray);
        assert_eq!(hits.len(), 2);
        let first = bvh.first_hit(&ray, 0.0, &[]).unwrap();
        assert_eq!(first.face_id, hits[0].face_id);
    }

    #[test]
    fn test_sphere_from_inside() {
        let bvh = Bvh::build(Arc::new(make_sphere(Point3::origin(), 2.0).unwrap()));
        let ray = Ray::new(Point3::origin(), Vec3::y());
        let hit = bvh.first_hit(&ray, 0.0, &[]).unwrap();
        assert_relative_eq!(hit.t, 2.0, epsilon = 1e-9);
    }
}
