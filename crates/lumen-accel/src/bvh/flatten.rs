//! Depth-first linearization of the build tree.

use lumen_math::{Axis, Bounds3};

use super::build::{BuildNode, BuildTree};

/// What a linear node holds besides its bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearNodeKind {
    /// Range of the reordered primitive array.
    Leaf {
        /// Index of the first primitive.
        primitives_offset: usize,
        /// Number of primitives.
        count: usize,
    },
    /// Branch; the first child is the next array slot.
    Interior {
        /// Array index of the second child.
        second_child_offset: usize,
        /// Axis the children were split along.
        axis: Axis,
    },
}

/// A node of the flattened, pointer-free BVH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearBvhNode {
    /// Bounds of everything below this node.
    pub bounds: Bounds3,
    /// Leaf or interior payload.
    pub kind: LinearNodeKind,
}

/// Lay the build tree out depth-first so every interior node's first child
/// directly follows it.
pub(crate) fn flatten(tree: &BuildTree) -> Vec<LinearBvhNode> {
    let mut nodes = Vec::with_capacity(tree.nodes.len());
    flatten_node(&tree.nodes, tree.root, &mut nodes);
    nodes
}

fn flatten_node(arena: &[BuildNode], index: usize, out: &mut Vec<LinearBvhNode>) -> usize {
    let offset = out.len();
    match arena[index] {
        BuildNode::Leaf {
            bounds,
            first_offset,
            count,
        } => {
            out.push(LinearBvhNode {
                bounds,
                kind: LinearNodeKind::Leaf {
                    primitives_offset: first_offset,
                    count,
                },
            });
        }
        BuildNode::Interior {
            bounds,
            children,
            axis,
        } => {
            // Second child offset is patched once the first subtree is laid out.
            out.push(LinearBvhNode {
                bounds,
                kind: LinearNodeKind::Interior {
                    second_child_offset: 0,
                    axis,
                },
            });
            flatten_node(arena, children[0], out);
            let second = flatten_node(arena, children[1], out);
            if let LinearNodeKind::Interior {
                second_child_offset,
                ..
            } = &mut out[offset].kind
            {
                *second_child_offset = second;
            }
        }
    }
    offset
}
