#![warn(missing_docs)]

//! Occlusion queries for hidden-line removal.
//!
//! A ray is intersected in closed form with each face's analytic surface
//! ([`intersect`]) and the crossing is kept only if its surface parameters
//! fall inside the face trim ([`trim`]). The [`Bvh`] prunes faces whose
//! boxes ([`bbox`]) the ray misses, so a probe touches a handful of faces
//! and nothing is ever tessellated.
//!
//! ```ignore
//! let bvh = Bvh::build(Arc::new(make_box(10.0, 10.0, 10.0)?));
//! let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::z());
//! let nearest = bvh.first_hit(&ray, 0.0, &[]);
//! ```

mod ray;
pub mod bbox;
pub mod bvh;
pub mod intersect;
pub mod trim;

pub use bbox::{face_aabb, Aabb3};
pub use bvh::Bvh;
pub use ray::{Ray, RayHit};
