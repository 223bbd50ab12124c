//! The primitive intersection contract.

use std::fmt;
use std::sync::Arc;

use lumen_math::{Bounds3, Point2, Point3, Ray, Vec3};

/// Result of a successful nearest-hit query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInteraction {
    /// Parameter along the ray where the hit occurs.
    pub t: f64,
    /// World-space hit point.
    pub point: Point3,
    /// Unit geometric normal at the hit point.
    pub normal: Vec3,
    /// Surface parameter coordinates at the hit point.
    pub uv: Point2,
    /// Caller-assigned id of the shape that was hit.
    pub prim_id: usize,
}

/// Anything a ray can be intersected with.
///
/// Implementations must be safe to query from many threads at once; queries
/// never mutate the primitive.
pub trait Primitive: Send + Sync + fmt::Debug {
    /// Bounding box of everything this primitive contains.
    fn world_bound(&self) -> Bounds3;

    /// Find the closest hit with `0 < t < ray.t_max`.
    ///
    /// On success `ray.t_max` is narrowed to the hit distance. On failure
    /// the ray is left unchanged.
    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction>;

    /// Occlusion query: true if any hit exists with `0 < t < ray.t_max`.
    fn intersect_p(&self, ray: &Ray) -> bool;
}

impl<P: Primitive + ?Sized> Primitive for Arc<P> {
    fn world_bound(&self) -> Bounds3 {
        (**self).world_bound()
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        (**self).intersect(ray)
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        (**self).intersect_p(ray)
    }
}
