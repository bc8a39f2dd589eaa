//! Gain-based feature importance.

use crate::repr::Forest;

/// Total split gain per feature, normalized to sum to 1.
///
/// This is the intrinsic gbtree importance the classifier reports
/// (`feature_importances_` in the training stack): each split node
/// contributes its gain to the feature it splits on. The vector always has
/// exactly `n_features` entries, in feature (contract) order, and is not
/// re-normalized anywhere else. A forest with no splits yields all zeros.
pub fn gain_importance(forest: &Forest, n_features: usize) -> Vec<f32> {
    let mut totals = vec![0f64; n_features];

    for tree in forest.trees() {
        for node in 0..tree.n_nodes() as u32 {
            if !tree.is_leaf(node) {
                let feature = tree.split_index(node) as usize;
                debug_assert!(feature < n_features, "split feature out of contract range");
                if feature < n_features {
                    totals[feature] += tree.gain(node) as f64;
                }
            }
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter().map(|&g| (g / sum) as f32).collect()
    } else {
        vec![0.0; n_features]
    }
}
