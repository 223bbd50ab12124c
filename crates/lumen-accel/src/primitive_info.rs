//! Per-primitive bounds and centroids, computed once per build.

use std::sync::Arc;

use lumen_math::{Bounds3, Point3};
use lumen_shapes::Primitive;

/// Build-time summary of one input primitive.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrimitiveRef {
    /// Index into the caller's primitive list.
    pub index: usize,
    /// World-space bounds.
    pub bounds: Bounds3,
    /// Center of `bounds`.
    pub centroid: Point3,
}

/// Query every primitive's bounds exactly once.
pub(crate) fn extract(primitives: &[Arc<dyn Primitive>]) -> Vec<PrimitiveRef> {
    primitives
        .iter()
        .enumerate()
        .map(|(index, prim)| {
            let bounds = prim.world_bound();
            PrimitiveRef {
                index,
                bounds,
                centroid: bounds.centroid(),
            }
        })
        .collect()
}

/// Union of all primitive bounds; the empty box for an empty list.
pub(crate) fn total_bounds(refs: &[PrimitiveRef]) -> Bounds3 {
    refs.iter()
        .fold(Bounds3::empty(), |acc, r| acc.union(&r.bounds))
}
