//! Forest of decision trees with multi-class group assignments.

use super::{NodeId, Tree, TreeValidationError};

/// Structural validation errors for [`Forest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    BaseScoreLenMismatch { n_groups: u32, len: usize },
    TreeGroupsLenMismatch { n_trees: usize, len: usize },
    TreeGroupOutOfRange { tree_idx: usize, group: u32, n_groups: u32 },
    InvalidTree { tree_idx: usize, error: TreeValidationError },
}

/// Trees plus their output-group assignments.
///
/// Multi-class models interleave trees across groups (XGBoost `tree_info`);
/// each tree's leaf values accumulate into its group's margin.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_groups: Vec<u32>,
    n_groups: u32,
    base_score: Vec<f32>,
}

impl Forest {
    /// Create an empty forest with the given number of output groups.
    pub fn new(n_groups: u32) -> Self {
        Self {
            trees: Vec::new(),
            tree_groups: Vec::new(),
            n_groups,
            base_score: vec![0.0; n_groups as usize],
        }
    }

    /// Set the per-group base score.
    pub fn with_base_score(mut self, base_score: Vec<f32>) -> Self {
        debug_assert_eq!(base_score.len(), self.n_groups as usize);
        self.base_score = base_score;
        self
    }

    /// Add a tree to the forest.
    pub fn push_tree(&mut self, tree: Tree, group: u32) {
        debug_assert!(group < self.n_groups, "group out of range");
        self.trees.push(tree);
        self.tree_groups.push(group);
    }

    /// Number of trees.
    #[inline]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of output groups (1 for binary, n_classes for multiclass).
    #[inline]
    pub fn n_groups(&self) -> u32 {
        self.n_groups
    }

    /// Per-group base score.
    #[inline]
    pub fn base_score(&self) -> &[f32] {
        &self.base_score
    }

    /// Get a reference to a specific tree.
    #[inline]
    pub fn tree(&self, idx: usize) -> &Tree {
        &self.trees[idx]
    }

    /// Iterate over trees.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Iterate over trees with their group assignments.
    pub fn trees_with_groups(&self) -> impl Iterator<Item = (&Tree, u32)> {
        self.trees
            .iter()
            .zip(self.tree_groups.iter())
            .map(|(t, &g)| (t, g))
    }

    /// Largest feature index referenced by any split, plus one.
    pub fn min_feature_count(&self) -> usize {
        let mut max_index: Option<u32> = None;
        for tree in &self.trees {
            for node in 0..tree.n_nodes() as NodeId {
                if !tree.is_leaf(node) {
                    max_index = Some(max_index.map_or(tree.split_index(node), |m| {
                        m.max(tree.split_index(node))
                    }));
                }
            }
        }
        max_index.map_or(0, |m| m as usize + 1)
    }

    /// Validate structural invariants for the forest and every tree.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.base_score.len() != self.n_groups as usize {
            return Err(ForestValidationError::BaseScoreLenMismatch {
                n_groups: self.n_groups,
                len: self.base_score.len(),
            });
        }
        if self.tree_groups.len() != self.trees.len() {
            return Err(ForestValidationError::TreeGroupsLenMismatch {
                n_trees: self.trees.len(),
                len: self.tree_groups.len(),
            });
        }
        for (tree_idx, &group) in self.tree_groups.iter().enumerate() {
            if group >= self.n_groups {
                return Err(ForestValidationError::TreeGroupOutOfRange {
                    tree_idx,
                    group,
                    n_groups: self.n_groups,
                });
            }
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|error| ForestValidationError::InvalidTree { tree_idx, error })?;
        }
        Ok(())
    }
}
