//! K-d tree over primitive bounds.
//!
//! Splits space (not objects) with an exact edge-sweep surface area
//! heuristic, so a primitive may be referenced from several leaves. Queries
//! walk the tree front to back with an explicit to-do list and stop as soon
//! as the closest hit so far lies before the next pending region.

mod build;
mod node;

pub use node::{KdLeaf, KdNode};

use std::mem;
use std::sync::Arc;

use lumen_math::{Bounds3, Ray};
use lumen_shapes::{Primitive, SurfaceInteraction};
use serde::Serialize;
use smallvec::SmallVec;

use crate::config::KdTreeConfig;
use crate::primitive_info;
use build::{CostModel, KdBuilder};

/// Inline capacity of the to-do list; deeper trees spill to the heap.
const TODO_INLINE: usize = 64;

/// Summary of a finished k-d tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KdTreeStats {
    /// Primitives indexed.
    pub total_primitives: usize,
    /// All nodes.
    pub nodes: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Leaves holding no primitives.
    pub empty_leaves: usize,
    /// Primitive references summed over all leaves (at least `total_primitives`).
    pub primitive_refs: usize,
    /// Largest number of primitives in one leaf.
    pub max_leaf_primitives: usize,
    /// Depth limit used for the build.
    pub max_depth: usize,
    /// Deepest leaf actually produced, with the root at depth 0.
    pub depth_reached: usize,
    /// Approximate heap size of nodes, index list and primitive handles.
    pub memory_bytes: usize,
}

impl KdTreeStats {
    /// Mean number of primitive references per leaf, empty leaves included.
    pub fn avg_leaf_primitives(&self) -> f64 {
        if self.leaves == 0 {
            return 0.0;
        }
        self.primitive_refs as f64 / self.leaves as f64
    }
}

/// A leaf as seen by [`KdTree::for_each_leaf`].
#[derive(Debug, Clone, Copy)]
pub struct LeafView<'a> {
    /// Region of space covered by the leaf.
    pub bounds: Bounds3,
    /// Depth of the leaf, with the root at depth 0.
    pub depth: usize,
    /// Indices into [`KdTree::primitives`].
    pub primitives: &'a [usize],
}

#[derive(Debug, Clone, Copy)]
struct KdToDo {
    node: usize,
    t_min: f64,
    t_max: f64,
}

/// K-d tree over a fixed set of primitives.
#[derive(Debug)]
pub struct KdTree {
    primitives: Vec<Arc<dyn Primitive>>,
    nodes: Vec<KdNode>,
    primitive_indices: Vec<usize>,
    bounds: Bounds3,
    stats: KdTreeStats,
}

impl KdTree {
    /// Build a k-d tree over `primitives`.
    ///
    /// An empty list produces a single empty leaf that every ray misses.
    #[tracing::instrument(skip_all, fields(prims = primitives.len()))]
    pub fn new(primitives: Vec<Arc<dyn Primitive>>, config: &KdTreeConfig) -> Self {
        let max_depth = config.resolved_max_depth(primitives.len());
        let refs = primitive_info::extract(&primitives);
        let bounds = primitive_info::total_bounds(&refs);
        let prim_bounds: Vec<Bounds3> = refs.iter().map(|r| r.bounds).collect();
        drop(refs);

        let cost = CostModel {
            isect_cost: f64::from(config.isect_cost),
            traversal_cost: f64::from(config.traversal_cost),
            empty_bonus: config.empty_bonus,
            max_prims: config.max_prims,
        };
        let built = KdBuilder::new(cost, &prim_bounds).build(bounds, max_depth);

        let mut tree = Self {
            primitives,
            nodes: built.nodes,
            primitive_indices: built.primitive_indices,
            bounds,
            stats: KdTreeStats::default(),
        };
        tree.stats = tree.compute_stats(max_depth);
        tracing::debug!(
            nodes = tree.stats.nodes,
            leaves = tree.stats.leaves,
            empty_leaves = tree.stats.empty_leaves,
            prim_refs = tree.stats.primitive_refs,
            avg_leaf_prims = tree.stats.avg_leaf_primitives(),
            depth = tree.stats.depth_reached,
            max_depth,
            memory_kb = tree.stats.memory_bytes / 1024,
            "kd-tree built"
        );
        tree
    }

    /// Primitives in input order.
    pub fn primitives(&self) -> &[Arc<dyn Primitive>] {
        &self.primitives
    }

    /// Node array; index 0 is the root.
    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Build statistics.
    pub fn stats(&self) -> &KdTreeStats {
        &self.stats
    }

    /// Visit every leaf with the region it covers.
    pub fn for_each_leaf<'a>(&'a self, mut f: impl FnMut(LeafView<'a>)) {
        let mut pending = vec![(0usize, self.bounds, 0usize)];
        while let Some((index, bounds, depth)) = pending.pop() {
            match &self.nodes[index] {
                KdNode::Leaf(leaf) => f(LeafView {
                    bounds,
                    depth,
                    primitives: self.leaf_primitives(leaf),
                }),
                KdNode::Interior {
                    axis,
                    split,
                    above_child,
                } => {
                    let a = axis.index();
                    let mut above = bounds;
                    above.min[a] = *split;
                    let mut below = bounds;
                    below.max[a] = *split;
                    pending.push((*above_child, above, depth + 1));
                    pending.push((index + 1, below, depth + 1));
                }
            }
        }
    }

    fn leaf_primitives<'a>(&'a self, leaf: &'a KdLeaf) -> &'a [usize] {
        match leaf {
            KdLeaf::Empty => &[],
            KdLeaf::One(index) => std::slice::from_ref(index),
            KdLeaf::Many { offset, count } => &self.primitive_indices[*offset..offset + count],
        }
    }

    fn compute_stats(&self, max_depth: usize) -> KdTreeStats {
        let mut stats = KdTreeStats {
            total_primitives: self.primitives.len(),
            nodes: self.nodes.len(),
            max_depth,
            memory_bytes: self.nodes.len() * mem::size_of::<KdNode>()
                + self.primitive_indices.len() * mem::size_of::<usize>()
                + self.primitives.len() * mem::size_of::<Arc<dyn Primitive>>(),
            ..KdTreeStats::default()
        };
        self.for_each_leaf(|leaf| {
            stats.leaves += 1;
            if leaf.primitives.is_empty() {
                stats.empty_leaves += 1;
            }
            stats.primitive_refs += leaf.primitives.len();
            stats.max_leaf_primitives = stats.max_leaf_primitives.max(leaf.primitives.len());
            stats.depth_reached = stats.depth_reached.max(leaf.depth);
        });
        stats
    }

    /// Child visited first: the side of the plane containing the origin, or
    /// for an origin on the plane, the side the ray heads into.
    #[inline]
    fn children_in_order(node: usize, ray: &Ray, a: usize, split: f64, above_child: usize) -> (usize, usize) {
        let o = ray.origin()[a];
        let below_first = o < split || (o == split && ray.direction()[a] <= 0.0);
        if below_first {
            (node + 1, above_child)
        } else {
            (above_child, node + 1)
        }
    }
}

impl Primitive for KdTree {
    fn world_bound(&self) -> Bounds3 {
        self.bounds
    }

    fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        let (mut t_min, mut t_max) = ray.intersect_bounds(&self.bounds)?;
        let inv_dir = *ray.inv_direction();
        let mut todo: SmallVec<[KdToDo; TODO_INLINE]> = SmallVec::new();
        let mut closest = None;
        let mut node = 0;

        loop {
            // A hit before this region cannot be beaten by anything in it.
            if ray.t_max < t_min {
                break;
            }
            match self.nodes[node] {
                KdNode::Interior {
                    axis,
                    split,
                    above_child,
                } => {
                    let a = axis.index();
                    let t_plane = (split - ray.origin()[a]) * inv_dir[a];
                    let (first, second) = Self::children_in_order(node, ray, a, split, above_child);

                    if t_plane > t_max || t_plane <= 0.0 {
                        node = first;
                    } else if t_plane < t_min {
                        node = second;
                    } else {
                        todo.push(KdToDo {
                            node: second,
                            t_min: t_plane,
                            t_max,
                        });
                        node = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf(ref leaf) => {
                    for &index in self.leaf_primitives(leaf) {
                        if let Some(hit) = self.primitives[index].intersect(ray) {
                            closest = Some(hit);
                        }
                    }
                    match todo.pop() {
                        Some(next) => {
                            node = next.node;
                            t_min = next.t_min;
                            t_max = next.t_max;
                        }
                        None => break,
                    }
                }
            }
        }

        closest
    }

    fn intersect_p(&self, ray: &Ray) -> bool {
        let Some((mut t_min, mut t_max)) = ray.intersect_bounds(&self.bounds) else {
            return false;
        };
        let inv_dir = ray.inv_direction();
        let mut todo: SmallVec<[KdToDo; TODO_INLINE]> = SmallVec::new();
        let mut node = 0;

        loop {
            match self.nodes[node] {
                KdNode::Interior {
                    axis,
                    split,
                    above_child,
                } => {
                    let a = axis.index();
                    let t_plane = (split - ray.origin()[a]) * inv_dir[a];
                    let (first, second) = Self::children_in_order(node, ray, a, split, above_child);

                    if t_plane > t_max || t_plane <= 0.0 {
                        node = first;
                    } else if t_plane < t_min {
                        node = second;
                    } else {
                        todo.push(KdToDo {
                            node: second,
                            t_min: t_plane,
                            t_max,
                        });
                        node = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf(ref leaf) => {
                    if self
                        .leaf_primitives(leaf)
                        .iter()
                        .any(|&index| self.primitives[index].intersect_p(ray))
                    {
                        return true;
                    }
                    match todo.pop() {
                        Some(next) => {
                            node = next.node;
                            t_min = next.t_min;
                            t_max = next.t_max;
                        }
                        None => return false,
                    }
                }
            }
        }
    }
}
