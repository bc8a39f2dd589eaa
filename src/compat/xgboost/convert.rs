//! Conversion from XGBoost JSON types to the native forest.

use crate::inference::OutputTransform;
use crate::repr::{Forest, Tree};

use super::json::{GradientBooster, TreeData, XgbModel};

/// Error type for XGBoost model conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("tree {0} has no nodes")]
    EmptyTree(usize),

    #[error(
        "invalid node index in tree {tree}: node {node} references child {child} but tree has {num_nodes} nodes"
    )]
    InvalidNodeIndex {
        tree: usize,
        node: usize,
        child: i32,
        num_nodes: usize,
    },

    #[error("unsupported booster `{0}`; only gbtree models convert")]
    UnsupportedBooster(&'static str),

    #[error("unsupported objective `{0}`")]
    UnsupportedObjective(String),

    #[error(
        "tree {tree} node {node} uses a categorical split; label-encoded models split numerically"
    )]
    UnsupportedSplit { tree: usize, node: usize },
}

/// Convert base_score from probability space to margin space.
///
/// XGBoost stores base_score in probability space in JSON for logistic
/// objectives; multiclass softmax uses it as a margin directly.
fn prob_to_margin(base_score: f32, objective: &str) -> f32 {
    match objective {
        "binary:logistic" | "reg:logistic" => {
            let p = base_score.clamp(1e-7, 1.0 - 1e-7);
            (p / (1.0 - p)).ln()
        }
        _ => base_score,
    }
}

impl XgbModel {
    /// Convert to a native [`Forest`] plus the margin-to-output transform
    /// implied by the training objective.
    ///
    /// Only gbtree boosters with classification objectives convert; anything
    /// else is a named [`ConversionError`].
    pub fn to_forest(&self) -> Result<(Forest, OutputTransform), ConversionError> {
        let model_trees = match &self.learner.gradient_booster {
            GradientBooster::Gbtree { model } => model,
            GradientBooster::Gblinear { .. } => {
                return Err(ConversionError::UnsupportedBooster("gblinear"));
            }
            GradientBooster::Dart { .. } => {
                return Err(ConversionError::UnsupportedBooster("dart"));
            }
        };

        let objective = self.learner.objective.name.as_str();
        let transform = match objective {
            "multi:softprob" | "multi:softmax" => OutputTransform::Softmax,
            "binary:logistic" => OutputTransform::Sigmoid,
            other => return Err(ConversionError::UnsupportedObjective(other.to_string())),
        };

        let num_class = self.learner.learner_model_param.n_class;
        let num_groups = if num_class <= 1 { 1 } else { num_class as u32 };

        let margin_base_score =
            prob_to_margin(self.learner.learner_model_param.base_score, objective);
        let mut forest = Forest::new(num_groups)
            .with_base_score(vec![margin_base_score; num_groups as usize]);

        for (tree_idx, tree_data) in model_trees.trees.iter().enumerate() {
            let group = model_trees.tree_info.get(tree_idx).copied().unwrap_or(0) as u32;
            forest.push_tree(convert_tree(tree_data, tree_idx)?, group);
        }

        Ok((forest, transform))
    }
}

/// Convert a single XGBoost tree to a native [`Tree`].
fn convert_tree(data: &TreeData, tree_idx: usize) -> Result<Tree, ConversionError> {
    let num_nodes = data.tree_param.num_nodes as usize;
    if num_nodes == 0 {
        return Err(ConversionError::EmptyTree(tree_idx));
    }

    let mut split_indices = vec![0u32; num_nodes];
    let mut split_thresholds = vec![0f32; num_nodes];
    let mut left_children = vec![0u32; num_nodes];
    let mut right_children = vec![0u32; num_nodes];
    let mut default_left = vec![false; num_nodes];
    let mut is_leaf = vec![false; num_nodes];
    let mut leaf_values = vec![0f32; num_nodes];
    let mut gains = vec![0f32; num_nodes];

    // XGBoost stores nodes in BFS order; index 0 is the root.
    for node_idx in 0..num_nodes {
        let left_child = data.left_children[node_idx];
        let right_child = data.right_children[node_idx];

        // A node is a leaf if left_child == -1 (XGBoost convention).
        if left_child == -1 {
            is_leaf[node_idx] = true;
            leaf_values[node_idx] = data.base_weights[node_idx];
            continue;
        }

        for child in [left_child, right_child] {
            if child < 0 || child as usize >= num_nodes {
                return Err(ConversionError::InvalidNodeIndex {
                    tree: tree_idx,
                    node: node_idx,
                    child,
                    num_nodes,
                });
            }
        }

        // split_type: 0 = numeric, 1 = categorical; absent means numeric.
        if data.split_type.get(node_idx).copied().unwrap_or(0) != 0 {
            return Err(ConversionError::UnsupportedSplit {
                tree: tree_idx,
                node: node_idx,
            });
        }

        split_indices[node_idx] = data.split_indices[node_idx] as u32;
        split_thresholds[node_idx] = data.split_conditions[node_idx];
        left_children[node_idx] = left_child as u32;
        right_children[node_idx] = right_child as u32;
        default_left[node_idx] = data.default_left[node_idx] != 0;
        gains[node_idx] = data.loss_changes[node_idx] as f32;
    }

    Ok(Tree::new(
        split_indices,
        split_thresholds,
        left_children,
        right_children,
        default_left,
        is_leaf,
        leaf_values,
        gains,
    ))
}
