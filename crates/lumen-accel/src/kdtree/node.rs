//! K-d tree node layout.

use lumen_math::Axis;

/// Primitive references held by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdLeaf {
    /// No primitives.
    Empty,
    /// Exactly one primitive, stored inline.
    One(usize),
    /// A run of the shared primitive-index list.
    Many {
        /// Start of the run.
        offset: usize,
        /// Length of the run.
        count: usize,
    },
}

impl KdLeaf {
    /// Number of primitive references.
    pub fn len(&self) -> usize {
        match self {
            KdLeaf::Empty => 0,
            KdLeaf::One(_) => 1,
            KdLeaf::Many { count, .. } => *count,
        }
    }

    /// True for a leaf with no primitives.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node of the k-d tree. Nodes are stored depth-first: the below child of
/// an interior node is always the next slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KdNode {
    /// Terminal node.
    Leaf(KdLeaf),
    /// Axis-aligned split.
    Interior {
        /// Split axis.
        axis: Axis,
        /// Position of the splitting plane along `axis`.
        split: f64,
        /// Array index of the child above the plane.
        above_child: usize,
    },
}

impl KdNode {
    /// True for leaf nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self, KdNode::Leaf(_))
    }
}
