#![warn(missing_docs)]

//! Ray-tracing acceleration structures for lumen.
//!
//! Answers "does this ray hit any primitive, and where" in far less than
//! O(N) per query, through two interchangeable structures that both
//! implement [`lumen_shapes::Primitive`]:
//!
//! - [`Bvh`] - Bounding volume hierarchy, SAH / middle / equal-counts splits,
//!   flattened into a depth-first node array
//! - [`KdTree`] - K-d tree built with an exact edge-sweep SAH
//! - [`Accelerator`] - Either one, chosen from an [`AcceleratorConfig`]
//!
//! Both are built once from an immutable primitive list and are then
//! read-only: any number of threads may query them at once. Aggregates are
//! primitives themselves, so a BVH of k-d trees works as expected.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lumen_accel::{Bvh, BvhConfig};
//! use lumen_math::{Point3, Ray, Vec3};
//! use lumen_shapes::{Primitive, Sphere};
//!
//! let spheres: Vec<Arc<dyn Primitive>> = (0..100)
//!     .map(|i| Arc::new(Sphere::new(Point3::new(i as f64 * 3.0, 0.0, 0.0), 1.0, i)) as Arc<dyn Primitive>)
//!     .collect();
//! let bvh = Bvh::new(spheres, &BvhConfig::default());
//!
//! let mut ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
//! let hit = bvh.intersect(&mut ray).unwrap();
//! assert_eq!(hit.prim_id, 0);
//! ```

mod accelerator;
pub mod bvh;
pub mod config;
mod error;
pub mod kdtree;
mod primitive_info;

pub use accelerator::Accelerator;
pub use bvh::{Bvh, BvhStats};
pub use config::{AcceleratorConfig, BvhConfig, KdTreeConfig, SplitMethod};
pub use error::{AccelError, Result};
pub use kdtree::{KdTree, KdTreeStats};
