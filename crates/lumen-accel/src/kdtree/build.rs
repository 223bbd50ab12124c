//! Edge-sweep SAH construction of the k-d tree.

use lumen_math::{Axis, Bounds3};

use super::node::{KdLeaf, KdNode};

/// Nodes below this many primitives give up on very expensive splits.
const EXPENSIVE_SPLIT_MAX_PRIMS: usize = 16;

/// Consecutive non-improving splits tolerated along one path.
const MAX_BAD_REFINES: u32 = 3;

/// Start edges sort before end edges at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeType {
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct BoundEdge {
    t: f64,
    prim: usize,
    edge_type: EdgeType,
}

impl BoundEdge {
    fn new(t: f64, prim: usize, edge_type: EdgeType) -> Self {
        // `+ 0.0` folds -0.0 into 0.0 so total_cmp agrees with `==`.
        Self {
            t: t + 0.0,
            prim,
            edge_type,
        }
    }
}

/// Chosen split of one node.
#[derive(Debug, Clone, Copy)]
struct Split {
    axis: Axis,
    offset: usize,
    cost: f64,
}

/// Cost model parameters, already converted to floats.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CostModel {
    pub isect_cost: f64,
    pub traversal_cost: f64,
    pub empty_bonus: f64,
    pub max_prims: usize,
}

/// Finished node storage.
#[derive(Debug)]
pub(crate) struct KdBuild {
    pub nodes: Vec<KdNode>,
    pub primitive_indices: Vec<usize>,
}

pub(crate) struct KdBuilder<'a> {
    cost: CostModel,
    prim_bounds: &'a [Bounds3],
    /// Per-axis edge scratch, reused by every node.
    edges: [Vec<BoundEdge>; 3],
    nodes: Vec<KdNode>,
    primitive_indices: Vec<usize>,
}

impl<'a> KdBuilder<'a> {
    pub(crate) fn new(cost: CostModel, prim_bounds: &'a [Bounds3]) -> Self {
        let n = prim_bounds.len();
        Self {
            cost,
            prim_bounds,
            edges: std::array::from_fn(|_| Vec::with_capacity(2 * n)),
            nodes: Vec::new(),
            primitive_indices: Vec::new(),
        }
    }

    /// Build the whole tree over every primitive.
    pub(crate) fn build(mut self, bounds: Bounds3, max_depth: usize) -> KdBuild {
        let all: Vec<usize> = (0..self.prim_bounds.len()).collect();
        self.build_node(bounds, &all, max_depth, 0);
        KdBuild {
            nodes: self.nodes,
            primitive_indices: self.primitive_indices,
        }
    }

    fn build_node(&mut self, node_bounds: Bounds3, prim_nums: &[usize], depth: usize, mut bad_refines: u32) {
        let node_num = self.nodes.len();
        self.nodes.push(KdNode::Leaf(KdLeaf::Empty));

        let n = prim_nums.len();
        if n <= self.cost.max_prims || depth == 0 {
            self.nodes[node_num] = self.make_leaf(prim_nums);
            return;
        }

        let total_sa = node_bounds.surface_area();
        if !(total_sa > 0.0 && total_sa.is_finite()) {
            self.nodes[node_num] = self.make_leaf(prim_nums);
            return;
        }

        let old_cost = self.cost.isect_cost * n as f64;
        let Some(split) = self.find_split(&node_bounds, prim_nums, total_sa) else {
            self.nodes[node_num] = self.make_leaf(prim_nums);
            return;
        };

        if split.cost > old_cost {
            bad_refines += 1;
        }
        if (split.cost > 4.0 * old_cost && n < EXPENSIVE_SPLIT_MAX_PRIMS)
            || bad_refines == MAX_BAD_REFINES
        {
            self.nodes[node_num] = self.make_leaf(prim_nums);
            return;
        }

        // Straddling primitives end up in both lists.
        let a = split.axis.index();
        let edges = &self.edges[a];
        let below: Vec<usize> = edges[..split.offset]
            .iter()
            .filter(|e| e.edge_type == EdgeType::Start)
            .map(|e| e.prim)
            .collect();
        let above: Vec<usize> = edges[split.offset + 1..]
            .iter()
            .filter(|e| e.edge_type == EdgeType::End)
            .map(|e| e.prim)
            .collect();
        let t_split = edges[split.offset].t;

        let mut bounds_below = node_bounds;
        bounds_below.max[a] = t_split;
        let mut bounds_above = node_bounds;
        bounds_above.min[a] = t_split;

        self.build_node(bounds_below, &below, depth - 1, bad_refines);
        let above_child = self.nodes.len();
        self.nodes[node_num] = KdNode::Interior {
            axis: split.axis,
            split: t_split,
            above_child,
        };
        self.build_node(bounds_above, &above, depth - 1, bad_refines);
    }

    /// Cheapest split along the widest axis, trying the other two axes only
    /// if no edge lies strictly inside the node.
    fn find_split(&mut self, node_bounds: &Bounds3, prim_nums: &[usize], total_sa: f64) -> Option<Split> {
        let inv_total_sa = 1.0 / total_sa;
        let d = node_bounds.diagonal();
        let n = prim_nums.len();
        let mut axis = node_bounds.maximum_extent();

        for _ in 0..3 {
            let a = axis.index();
            let edges = &mut self.edges[a];
            edges.clear();
            for &pn in prim_nums {
                let b = &self.prim_bounds[pn];
                edges.push(BoundEdge::new(b.min[a], pn, EdgeType::Start));
                edges.push(BoundEdge::new(b.max[a], pn, EdgeType::End));
            }
            edges.sort_by(|e0, e1| e0.t.total_cmp(&e1.t).then(e0.edge_type.cmp(&e1.edge_type)));

            let (o0, o1) = ((a + 1) % 3, (a + 2) % 3);
            let cap = d[o0] * d[o1];
            let perimeter = d[o0] + d[o1];
            let mut best: Option<Split> = None;
            let mut n_below = 0usize;
            let mut n_above = n;

            for (i, edge) in edges.iter().enumerate() {
                if edge.edge_type == EdgeType::End {
                    n_above -= 1;
                }
                let t = edge.t;
                if t > node_bounds.min[a] && t < node_bounds.max[a] {
                    let below_sa = 2.0 * (cap + (t - node_bounds.min[a]) * perimeter);
                    let above_sa = 2.0 * (cap + (node_bounds.max[a] - t) * perimeter);
                    let p_below = below_sa * inv_total_sa;
                    let p_above = above_sa * inv_total_sa;
                    let eb = if n_above == 0 || n_below == 0 {
                        self.cost.empty_bonus
                    } else {
                        0.0
                    };
                    let cost = self.cost.traversal_cost
                        + self.cost.isect_cost
                            * (1.0 - eb)
                            * (p_below * n_below as f64 + p_above * n_above as f64);
                    if best.map_or(true, |b| cost < b.cost) {
                        best = Some(Split {
                            axis,
                            offset: i,
                            cost,
                        });
                    }
                }
                if edge.edge_type == EdgeType::Start {
                    n_below += 1;
                }
            }

            if best.is_some() {
                return best;
            }
            axis = axis.next();
        }
        None
    }

    fn make_leaf(&mut self, prim_nums: &[usize]) -> KdNode {
        let leaf = match prim_nums {
            [] => KdLeaf::Empty,
            [single] => KdLeaf::One(*single),
            many => {
                let offset = self.primitive_indices.len();
                self.primitive_indices.extend_from_slice(many);
                KdLeaf::Many {
                    offset,
                    count: many.len(),
                }
            }
        };
        KdNode::Leaf(leaf)
    }
}
