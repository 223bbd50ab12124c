//! Bounding volume hierarchy.
//!
//! Built top-down over primitive bounds with a selectable split heuristic,
//! then flattened into a single array of [`LinearBvhNode`]s. Queries walk
//! that array with a small explicit stack.

mod build;
mod flatten;

pub use flatten::{LinearBvhNode, LinearNodeKind};

use std::mem;
use std::sync::Arc;

use lumen_math::{Bounds3, Ray};
use lumen_shapes::{Primitive, SurfaceInteraction};
use serde::Serialize;
use smallvec::SmallVec;

use crate::config::{BvhConfig, SplitMethod};
use crate::primitive_info;

/// Inline capacity of the traversal stack; deeper trees spill to the heap.
const STACK_INLINE: usize = 64;

/// Summary of a finished BVH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BvhStats {
    /// Primitives indexed.
    pub total_primitives: usize,
    /// Linear nodes.
    pub total_nodes: usize,
    /// Interior nodes.
    pub interior_nodes: usize,
    /// Leaf nodes.
    pub leaf_nodes: usize,
    /// Largest number of primitives in one leaf.
    pub max_leaf_primitives: usize,
    /// Deepest leaf, with the root at depth 0.
    pub max_depth: usize,
    /// Approximate heap size of nodes and primitive handles.
    pub memory_bytes: usize,
}

impl BvhStats {
    /// Mean number of primitives per leaf.
    pub fn avg_leaf_primitives(&self) -> f64 {
        if self.leaf_nodes == 0 {
            return 0.0;
        }
        self.total_primitives as f64 / self.leaf_nodes as f64
    }
}

/// Bounding volume hierarchy over a fixed set of primitives.
#[derive(Debug)]
pub struct Bvh {
    primitives: Vec<Arc<dyn Primitive>>,
    nodes: Vec<LinearBvhNode>,
    stats: BvhStats,
}

impl Bvh {
    /// Build a BVH over `primitives`.
    ///
    /// An empty list produces a single empty leaf that every ray misses.
    #[tracing::instrument(skip_all, fields(prims = primitives.len(), split = %config.split_method))]
    pub fn new(primitives: Vec<Arc<dyn Primitive>>, config: &BvhConfig) -> Self {
        if primitives.is_empty() {
            let nodes = vec![LinearBvhNode {
                bounds: Bounds3::empty(),
                kind: LinearNodeKind::Leaf {
                    primitives_offset: 0,
                    count: 0,
                },
            }];
            let stats = compute_stats(&nodes, 0, 0);
            return Self {
                primitives,
                nodes,
                stats,
            };
        }

        let mut split_method = config.split_method;
        if split_method == SplitMethod::Hlbvh {
            tracing::warn!("HLBVH construction is not implemented, using SAH");
            split_method = SplitMethod::Sah;
        }

        let mut refs = primitive_info::extract(&primitives);
        let tree = build::build(
            &primitives,
            &mut refs,
            config.effective_max_prims(),
            split_method,
        );
        let nodes = flatten::flatten(&tree);
        let build::BuildTree {
            nodes: arena,
            max_depth,
            ordered,
            ..
        } = tree;
        drop(arena);
        drop(refs);

        let stats = compute_stats(&nodes, ordered.len(), max_depth);
        tracing::debug!(
            nodes = stats.total_nodes,
            leaves = stats.leaf_nodes,
            max_depth = stats.max_depth,
            max_leaf_prims = stats.max_leaf_primitives,
            avg_leaf_prims = stats.avg_leaf_primitives(),
            memory_kb = stats.memory_bytes / 1024,
            "BVH built"
        );

        Self {
            primitives: ordered,
            nodes,
            stats,
        }
    }

    /// Primitives in leaf order: each leaf owns a contiguous range.
    pub fn primitives(&self) -> &[Arc<dyn Primitive>] {
        &self.primitives
    }

    /// The flattened node array; index 0 is the root.
    pub fn nodes(&self) -> &[LinearBvhNode] {
        &self.nodes
    }

    /// Build statistics.
    pub fn stats(&self) -> &BvhStats {
        &self.stats
    }

    /// Stack for one traversal, sized to the tree's depth.
    fn traversal_stack(&self) -> SmallVec<[usize; STACK_INLINE]> {
        SmallVec::with_capacity(self.stats.max_depth + 1)
    }
}

impl Primitive for Bvh {
    fn world_bound(&self) -> Bounds3 {
        self.nodes[0].bounds
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let mut closest = None;
        let mut to_visit = self.traversal_stack();
        let mut current = 0;

        loop {
            let node = &self.nodes[current];
            if ray.hits_bounds(&node.bounds) {
                match node.kind {
                    LinearNodeKind::Leaf {
                        primitives_offset,
                        count,
                    } => {
                        for prim in &self.primitives[primitives_offset..primitives_offset + count] {
                            // A hit shrinks ray.t_max, pruning farther nodes.
                            if let Some(hit) = prim.intersect(ray) {
                                closest = Some(hit);
                            }
                        }
                    }
                    LinearNodeKind::Interior {
                        second_child_offset,
                        axis,
                    } => {
                        if ray.dir_is_neg(axis.index()) {
                            to_visit.push(current + 1);
                            current = second_child_offset;
                        } else {
                            to_visit.push(second_child_offset);
                            current += 1;
                        }
                        continue;
                    }
                }
            }
            match to_visit.pop() {
                Some(next) => current = next,
                None => break,
            }
        }

        closest
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        let mut to_visit = self.traversal_stack();
        let mut current = 0;

        loop {
            let node = &self.nodes[current];
            if ray.hits_bounds(&node.bounds) {
                match node.kind {
                    LinearNodeKind::Leaf {
                        primitives_offset,
                        count,
                    } => {
                        if self.primitives[primitives_offset..primitives_offset + count]
                            .iter()
                            .any(|prim| prim.intersect_p(ray))
                        {
                            return true;
                        }
                    }
                    LinearNodeKind::Interior {
                        second_child_offset,
                        axis,
                    } => {
                        if ray.dir_is_neg(axis.index()) {
                            to_visit.push(current + 1);
                            current = second_child_offset;
                        } else {
                            to_visit.push(second_child_offset);
                            current += 1;
                        }
                        continue;
                    }
                }
            }
            match to_visit.pop() {
                Some(next) => current = next,
                None => return false,
            }
        }
    }
}

fn compute_stats(nodes: &[LinearBvhNode], total_primitives: usize, max_depth: usize) -> BvhStats {
    let mut stats = BvhStats {
        total_primitives,
        total_nodes: nodes.len(),
        max_depth,
        memory_bytes: nodes.len() * mem::size_of::<LinearBvhNode>()
            + total_primitives * mem::size_of::<Arc<dyn Primitive>>(),
        ..BvhStats::default()
    };
    for node in nodes {
        match node.kind {
            LinearNodeKind::Leaf { count, .. } => {
                stats.leaf_nodes += 1;
                stats.max_leaf_primitives = stats.max_leaf_primitives.max(count);
            }
            LinearNodeKind::Interior { .. } => stats.interior_nodes += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_math::{Point3, Vec3};
    use lumen_shapes::Sphere;

    fn sphere_row(n: usize) -> Vec<Arc<dyn Primitive>> {
        (0..n)
            .map(|i| {
                Arc::new(Sphere::new(Point3::new(i as f64 * 3.0, 0.0, 0.0), 1.0, i))
                    as Arc<dyn Primitive>
            })
            .collect()
    }

    #[test]
    fn test_bvh_build() {
        let bvh = Bvh::new(sphere_row(10), &BvhConfig::default());
        let stats = bvh.stats();
        assert_eq!(stats.total_primitives, 10);
        assert_eq!(stats.total_nodes, stats.interior_nodes + stats.leaf_nodes);
        assert_eq!(bvh.primitives().len(), 10);
    }

    #[test]
    fn test_bvh_single_primitive_is_leaf() {
        let bvh = Bvh::new(sphere_row(1), &BvhConfig::default());
        assert_eq!(bvh.nodes().len(), 1);
        assert!(matches!(
            bvh.nodes()[0].kind,
            LinearNodeKind::Leaf { primitives_offset: 0, count: 1 }
        ));
    }

    #[test]
    fn test_bvh_trace_closest() {
        let bvh = Bvh::new(sphere_row(10), &BvhConfig::default());
        let mut ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let hit = bvh.intersect(&mut ray).unwrap();
        assert_eq!(hit.prim_id, 0);
        assert!((hit.t - 4.0).abs() < 1e-10);
        assert_eq!(ray.t_max, hit.t);

        // From the other side, the last sphere is closest.
        let mut ray = Ray::new(Point3::new(100.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        let hit = bvh.intersect(&mut ray).unwrap();
        assert_eq!(hit.prim_id, 9);
    }

    #[test]
    fn test_bvh_trace_miss() {
        let bvh = Bvh::new(sphere_row(10), &BvhConfig::default());
        let mut ray = Ray::new(Point3::new(-5.0, 5.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(bvh.intersect(&mut ray).is_none());
        assert!(!bvh.intersect_p(&ray));
        assert_eq!(ray.t_max, f64::INFINITY);
    }

    #[test]
    fn test_bvh_hlbvh_falls_back() {
        let config = BvhConfig {
            split_method: SplitMethod::Hlbvh,
            ..BvhConfig::default()
        };
        let bvh = Bvh::new(sphere_row(20), &config);
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(bvh.intersect_p(&ray));
    }

    #[test]
    fn test_bvh_avg_leaf_primitives() {
        let bvh = Bvh::new(sphere_row(10), &BvhConfig::default());
        let stats = bvh.stats();
        let expected = 10.0 / stats.leaf_nodes as f64;
        assert_eq!(stats.avg_leaf_primitives(), expected);
        assert!(stats.avg_leaf_primitives() <= stats.max_leaf_primitives as f64);

        let empty = Bvh::new(Vec::new(), &BvhConfig::default());
        assert_eq!(empty.stats().avg_leaf_primitives(), 0.0);
    }

    #[test]
    fn test_bvh_world_bound() {
        let bvh = Bvh::new(sphere_row(4), &BvhConfig::default());
        let b = bvh.world_bound();
        assert_eq!(b.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(b.max, Point3::new(10.0, 1.0, 1.0));
    }
}
