//! Brute-force aggregate.

use std::sync::Arc;

use lumen_math::{Bounds3, Ray};

use crate::{Primitive, SurfaceInteraction};

/// Aggregate that tests every primitive on every query.
///
/// O(N) per ray; used as the reference answer for the acceleration
/// structures and for very small primitive sets.
#[derive(Debug, Clone)]
pub struct LinearAggregate {
    primitives: Vec<Arc<dyn Primitive>>,
    bounds: Bounds3,
}

impl LinearAggregate {
    /// Wrap a list of primitives.
    pub fn new(primitives: Vec<Arc<dyn Primitive>>) -> Self {
        let bounds = primitives
            .iter()
            .fold(Bounds3::empty(), |b, p| b.union(&p.world_bound()));
        Self { primitives, bounds }
    }

    /// The wrapped primitives, in insertion order.
    pub fn primitives(&self) -> &[Arc<dyn Primitive>] {
        &self.primitives
    }
}

impl Primitive for LinearAggregate {
    fn world_bound(&self) -> Bounds3 {
        self.bounds
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let mut closest = None;
        for prim in &self.primitives {
            // Each hit narrows ray.t_max, so later hits are strictly closer.
            if let Some(hit) = prim.intersect(ray) {
                closest = Some(hit);
            }
        }
        closest
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        self.primitives.iter().any(|p| p.intersect_p(ray))
    }
}
