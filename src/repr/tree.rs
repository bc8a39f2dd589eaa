//! Structure-of-Arrays decision tree storage.

// Trees carry all their parallel arrays through one constructor.
#![allow(clippy::too_many_arguments)]

use super::NodeId;

/// Structural validation errors for [`Tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// A child pointer references an out-of-bounds node.
    ChildOutOfBounds {
        node: NodeId,
        side: &'static str,
        child: NodeId,
        n_nodes: usize,
    },
    /// A node references itself as a child.
    SelfLoop { node: NodeId },
    /// A node was reached by more than one path (DAG or cycle).
    DuplicateVisit { node: NodeId },
    /// A node exists in storage but is unreachable from the root.
    UnreachableNode { node: NodeId },
}

/// A single decision tree in flat-array form.
///
/// Nodes are stored in parallel arrays for cache-friendly traversal; child
/// indices are local to this tree (0 = root). Splits are numeric only: the
/// frozen label encoding feeds category codes to the model as plain numbers,
/// which is how the classifier was fitted.
#[derive(Debug, Clone)]
pub struct Tree {
    split_indices: Box<[u32]>,
    split_thresholds: Box<[f32]>,
    left_children: Box<[u32]>,
    right_children: Box<[u32]>,
    default_left: Box<[bool]>,
    is_leaf: Box<[bool]>,
    leaf_values: Box<[f32]>,
    /// Split gain per node (0 at leaves); feeds feature importance.
    gains: Box<[f32]>,
}

impl Tree {
    /// Create a tree from parallel arrays. All arrays must share one length.
    pub fn new(
        split_indices: Vec<u32>,
        split_thresholds: Vec<f32>,
        left_children: Vec<u32>,
        right_children: Vec<u32>,
        default_left: Vec<bool>,
        is_leaf: Vec<bool>,
        leaf_values: Vec<f32>,
        gains: Vec<f32>,
    ) -> Self {
        let n_nodes = split_indices.len();
        debug_assert_eq!(n_nodes, split_thresholds.len());
        debug_assert_eq!(n_nodes, left_children.len());
        debug_assert_eq!(n_nodes, right_children.len());
        debug_assert_eq!(n_nodes, default_left.len());
        debug_assert_eq!(n_nodes, is_leaf.len());
        debug_assert_eq!(n_nodes, leaf_values.len());
        debug_assert_eq!(n_nodes, gains.len());

        Self {
            split_indices: split_indices.into_boxed_slice(),
            split_thresholds: split_thresholds.into_boxed_slice(),
            left_children: left_children.into_boxed_slice(),
            right_children: right_children.into_boxed_slice(),
            default_left: default_left.into_boxed_slice(),
            is_leaf: is_leaf.into_boxed_slice(),
            leaf_values: leaf_values.into_boxed_slice(),
            gains: gains.into_boxed_slice(),
        }
    }

    /// A single-leaf tree with the given value. Used in tests and for stump
    /// ensembles.
    pub fn leaf(value: f32) -> Self {
        Self::new(
            vec![0],
            vec![0.0],
            vec![0],
            vec![0],
            vec![false],
            vec![true],
            vec![value],
            vec![0.0],
        )
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.split_indices.len()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.is_leaf[node as usize]
    }

    #[inline]
    pub fn split_index(&self, node: NodeId) -> u32 {
        self.split_indices[node as usize]
    }

    #[inline]
    pub fn split_threshold(&self, node: NodeId) -> f32 {
        self.split_thresholds[node as usize]
    }

    #[inline]
    pub fn left_child(&self, node: NodeId) -> NodeId {
        self.left_children[node as usize]
    }

    #[inline]
    pub fn right_child(&self, node: NodeId) -> NodeId {
        self.right_children[node as usize]
    }

    #[inline]
    pub fn default_left(&self, node: NodeId) -> bool {
        self.default_left[node as usize]
    }

    #[inline]
    pub fn leaf_value(&self, node: NodeId) -> f32 {
        self.leaf_values[node as usize]
    }

    /// Split gain recorded at a node (0 at leaves).
    #[inline]
    pub fn gain(&self, node: NodeId) -> f32 {
        self.gains[node as usize]
    }

    /// Traverse from the root to a leaf for one sample.
    ///
    /// `sample` is indexed by contract feature position. NaN feature values
    /// take the recorded default direction; otherwise `value < threshold`
    /// goes left.
    #[inline]
    pub fn traverse_to_leaf(&self, sample: &[f32]) -> NodeId {
        let mut node: NodeId = 0;

        while !self.is_leaf(node) {
            let fvalue = sample[self.split_index(node) as usize];
            node = if fvalue.is_nan() {
                if self.default_left(node) {
                    self.left_child(node)
                } else {
                    self.right_child(node)
                }
            } else if fvalue < self.split_threshold(node) {
                self.left_child(node)
            } else {
                self.right_child(node)
            };
        }

        node
    }

    /// Leaf value reached by one sample.
    #[inline]
    pub fn predict_one(&self, sample: &[f32]) -> f32 {
        self.leaf_value(self.traverse_to_leaf(sample))
    }

    /// Validate structural invariants: bounds, no self-loops, every node
    /// reached exactly once from the root.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(TreeValidationError::EmptyTree);
        }

        let mut visited = vec![false; n_nodes];
        let mut stack: Vec<NodeId> = vec![0];

        while let Some(node) = stack.pop() {
            if visited[node as usize] {
                return Err(TreeValidationError::DuplicateVisit { node });
            }
            visited[node as usize] = true;

            if self.is_leaf(node) {
                continue;
            }
            for (side, child) in [
                ("left", self.left_child(node)),
                ("right", self.right_child(node)),
            ] {
                if child as usize >= n_nodes {
                    return Err(TreeValidationError::ChildOutOfBounds {
                        node,
                        side,
                        child,
                        n_nodes,
                    });
                }
                if child == node {
                    return Err(TreeValidationError::SelfLoop { node });
                }
                stack.push(child);
            }
        }

        if let Some(node) = visited.iter().position(|&v| !v) {
            return Err(TreeValidationError::UnreachableNode {
                node: node as NodeId,
            });
        }
        Ok(())
    }
}
