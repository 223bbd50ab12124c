//! Top-down BVH construction into an index-addressed arena.
//!
//! The arena is a plain `Vec` of build nodes with integer child links. It
//! lives only until [`super::flatten`] has produced the linear node array,
//! then the whole thing is dropped at once.

use std::sync::Arc;

use lumen_math::{Axis, Bounds3};
use lumen_shapes::Primitive;

use crate::config::SplitMethod;
use crate::primitive_info::PrimitiveRef;

/// Number of SAH buckets along the split axis.
const NUM_BUCKETS: usize = 12;

/// Relative cost of visiting an interior node vs. testing one primitive.
const TRAVERSAL_COST: f64 = 0.125;

/// At or below this many primitives SAH falls back to an object median.
const SAH_MIN_PRIMS: usize = 4;

/// Transient node of the build tree.
#[derive(Debug, Clone)]
pub(crate) enum BuildNode {
    /// Range `[first_offset, first_offset + count)` of the ordered primitives.
    Leaf {
        bounds: Bounds3,
        first_offset: usize,
        count: usize,
    },
    /// Two arena indices; `children[0]` holds the smaller centroids.
    Interior {
        bounds: Bounds3,
        children: [usize; 2],
        axis: Axis,
    },
}

/// Output of the recursive build, consumed by flattening.
#[derive(Debug)]
pub(crate) struct BuildTree {
    pub nodes: Vec<BuildNode>,
    pub root: usize,
    pub max_depth: usize,
    pub ordered: Vec<Arc<dyn Primitive>>,
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: usize,
    bounds: Bounds3,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Bounds3::empty(),
        }
    }
}

struct Builder<'a> {
    primitives: &'a [Arc<dyn Primitive>],
    max_prims_in_node: usize,
    split_method: SplitMethod,
    nodes: Vec<BuildNode>,
    ordered: Vec<Arc<dyn Primitive>>,
    max_depth: usize,
}

/// Build the pointer-free build tree over `refs`, which must be non-empty.
///
/// `refs` is reordered in place; the returned `ordered` list is the
/// matching permutation of `primitives`.
pub(crate) fn build(
    primitives: &[Arc<dyn Primitive>],
    refs: &mut [PrimitiveRef],
    max_prims_in_node: usize,
    split_method: SplitMethod,
) -> BuildTree {
    let mut builder = Builder {
        primitives,
        max_prims_in_node,
        split_method,
        nodes: Vec::with_capacity(2 * refs.len()),
        ordered: Vec::with_capacity(refs.len()),
        max_depth: 0,
    };
    let root = builder.build_recursive(refs, 0);
    BuildTree {
        nodes: builder.nodes,
        root,
        max_depth: builder.max_depth,
        ordered: builder.ordered,
    }
}

impl Builder<'_> {
    fn build_recursive(&mut self, refs: &mut [PrimitiveRef], depth: usize) -> usize {
        self.max_depth = self.max_depth.max(depth);

        let bounds = refs
            .iter()
            .fold(Bounds3::empty(), |acc, r| acc.union(&r.bounds));

        if refs.len() == 1 {
            return self.push_leaf(refs, bounds);
        }

        let centroid_bounds = refs
            .iter()
            .fold(Bounds3::empty(), |acc, r| acc.union_point(&r.centroid));
        let axis = centroid_bounds.maximum_extent();
        let dim = axis.index();

        // All centroids coincide (or are NaN) along the widest axis.
        if !(centroid_bounds.max[dim] > centroid_bounds.min[dim]) {
            return self.push_leaf(refs, bounds);
        }

        let mid = match self.split_method {
            SplitMethod::Middle => split_middle(refs, &centroid_bounds, dim)
                .unwrap_or_else(|| split_equal_counts(refs, dim)),
            SplitMethod::EqualCounts => split_equal_counts(refs, dim),
            SplitMethod::Sah | SplitMethod::Hlbvh => {
                match split_sah(refs, &centroid_bounds, &bounds, dim, self.max_prims_in_node) {
                    Some(mid) => mid,
                    None => return self.push_leaf(refs, bounds),
                }
            }
        };

        let (below, above) = refs.split_at_mut(mid);
        let first = self.build_recursive(below, depth + 1);
        let second = self.build_recursive(above, depth + 1);

        self.nodes.push(BuildNode::Interior {
            bounds,
            children: [first, second],
            axis,
        });
        self.nodes.len() - 1
    }

    fn push_leaf(&mut self, refs: &[PrimitiveRef], bounds: Bounds3) -> usize {
        let primitives = self.primitives;
        let first_offset = self.ordered.len();
        self.ordered
            .extend(refs.iter().map(|r| Arc::clone(&primitives[r.index])));
        self.nodes.push(BuildNode::Leaf {
            bounds,
            first_offset,
            count: refs.len(),
        });
        self.nodes.len() - 1
    }
}

/// Split at the midpoint of the centroid bounds.
///
/// Returns `None` if every primitive falls on the same side.
fn split_middle(refs: &mut [PrimitiveRef], centroid_bounds: &Bounds3, dim: usize) -> Option<usize> {
    let pmid = 0.5 * (centroid_bounds.min[dim] + centroid_bounds.max[dim]);
    let mid = partition(refs, |r| r.centroid[dim] < pmid);
    (mid != 0 && mid != refs.len()).then_some(mid)
}

/// Split into equal halves around the centroid median.
fn split_equal_counts(refs: &mut [PrimitiveRef], dim: usize) -> usize {
    let mid = refs.len() / 2;
    refs.select_nth_unstable_by(mid, |a, b| a.centroid[dim].total_cmp(&b.centroid[dim]));
    mid
}

/// Bucketed surface area heuristic.
///
/// Returns the partition point, or `None` when a leaf is the cheaper choice.
fn split_sah(
    refs: &mut [PrimitiveRef],
    centroid_bounds: &Bounds3,
    bounds: &Bounds3,
    dim: usize,
    max_prims_in_node: usize,
) -> Option<usize> {
    let count = refs.len();
    if count <= SAH_MIN_PRIMS {
        return Some(split_equal_counts(refs, dim));
    }

    let bucket_index = |r: &PrimitiveRef| {
        let b = (NUM_BUCKETS as f64 * centroid_bounds.offset(&r.centroid)[dim]) as usize;
        b.min(NUM_BUCKETS - 1)
    };

    let mut buckets = [Bucket::default(); NUM_BUCKETS];
    for r in refs.iter() {
        let b = &mut buckets[bucket_index(r)];
        b.count += 1;
        b.bounds = b.bounds.union(&r.bounds);
    }

    let total_area = bounds.surface_area();
    if !(total_area > 0.0 && total_area.is_finite()) {
        // No meaningful cost; only split if the leaf would be too big.
        return (count > max_prims_in_node).then(|| split_equal_counts(refs, dim));
    }

    // Forward sweep: primitives in buckets [0, i].
    let mut weighted = [0.0; NUM_BUCKETS - 1];
    let mut below_count = 0;
    let mut below_bounds = Bounds3::empty();
    for (i, w) in weighted.iter_mut().enumerate() {
        below_count += buckets[i].count;
        below_bounds = below_bounds.union(&buckets[i].bounds);
        *w = below_count as f64 * below_bounds.surface_area();
    }

    // Backward sweep: primitives in buckets [i + 1, NUM_BUCKETS).
    let mut above_count = 0;
    let mut above_bounds = Bounds3::empty();
    for i in (0..NUM_BUCKETS - 1).rev() {
        above_count += buckets[i + 1].count;
        above_bounds = above_bounds.union(&buckets[i + 1].bounds);
        weighted[i] += above_count as f64 * above_bounds.surface_area();
    }

    let mut min_cost = f64::INFINITY;
    let mut min_cost_bucket = 0;
    for (i, w) in weighted.iter().enumerate() {
        let cost = TRAVERSAL_COST + w / total_area;
        if cost < min_cost {
            min_cost = cost;
            min_cost_bucket = i;
        }
    }

    let leaf_cost = count as f64;
    if count > max_prims_in_node || min_cost < leaf_cost {
        let mid = partition(refs, |r| bucket_index(r) <= min_cost_bucket);
        if mid == 0 || mid == count {
            return Some(split_equal_counts(refs, dim));
        }
        Some(mid)
    } else {
        None
    }
}

/// Move every element satisfying `pred` to the front.
///
/// Returns the number of such elements.
fn partition<T>(items: &mut [T], pred: impl Fn(&T) -> bool) -> usize {
    let mut left = 0;
    let mut right = items.len();

    while left < right {
        if pred(&items[left]) {
            left += 1;
        } else {
            right -= 1;
            items.swap(left, right);
        }
    }

    left
}
