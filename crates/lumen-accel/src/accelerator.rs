//! Choosing an acceleration structure at run time.

use std::sync::Arc;

use lumen_math::{Bounds3, Ray};
use lumen_shapes::{Primitive, SurfaceInteraction};

use crate::bvh::Bvh;
use crate::config::AcceleratorConfig;
use crate::kdtree::KdTree;

/// Either acceleration structure behind one type.
#[derive(Debug)]
pub enum Accelerator {
    /// Bounding volume hierarchy.
    Bvh(Bvh),
    /// K-d tree.
    KdTree(KdTree),
}

impl Accelerator {
    /// Build the structure selected by `config` over `primitives`.
    pub fn build(primitives: Vec<Arc<dyn Primitive>>, config: &AcceleratorConfig) -> Self {
        match config {
            AcceleratorConfig::Bvh(c) => Self::Bvh(Bvh::new(primitives, c)),
            AcceleratorConfig::KdTree(c) => Self::KdTree(KdTree::new(primitives, c)),
        }
    }

    /// Short name of the structure.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bvh(_) => "bvh",
            Self::KdTree(_) => "kdtree",
        }
    }
}

impl Primitive for Accelerator {
    fn world_bound(&self) -> Bounds3 {
        match self {
            Self::Bvh(b) => b.world_bound(),
            Self::KdTree(k) => k.world_bound(),
        }
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        match self {
            Self::Bvh(b) => b.intersect(ray),
            Self::KdTree(k) => k.intersect(ray),
        }
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        match self {
            Self::Bvh(b) => b.intersect_p(ray),
            Self::KdTree(k) => k.intersect_p(ray),
        }
    }
}
