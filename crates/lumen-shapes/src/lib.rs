#![warn(missing_docs)]

//! Primitive intersection contract for the lumen ray tracer.
//!
//! Everything a ray can hit implements [`Primitive`]: simple shapes, and the
//! aggregates in `lumen-accel` that index collections of other primitives.
//! Because aggregates are primitives too, acceleration structures nest.
//!
//! # Architecture
//!
//! - [`Primitive`] - World bounds, nearest-hit and any-hit queries
//! - [`SurfaceInteraction`] - Hit record returned by nearest-hit queries
//! - [`Sphere`], [`Triangle`] - Reference shapes
//! - [`LinearAggregate`] - Brute-force aggregate that tests every primitive
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lumen_math::{Point3, Ray, Vec3};
//! use lumen_shapes::{LinearAggregate, Primitive, Sphere};
//!
//! let scene = LinearAggregate::new(vec![
//!     Arc::new(Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0, 0)) as Arc<dyn Primitive>,
//! ]);
//! let mut ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, 1.0));
//! let hit = scene.intersect(&mut ray).unwrap();
//! assert!((hit.t - 4.0).abs() < 1e-12);
//! assert_eq!(ray.t_max, hit.t);
//! ```

mod linear;
mod primitive;
mod sphere;
mod triangle;

pub use linear::LinearAggregate;
pub use primitive::{Primitive, SurfaceInteraction};
pub use sphere::Sphere;
pub use triangle::Triangle;
