//! Margin accumulation over the forest.

use ndarray::{Array2, ArrayView2};

use crate::repr::Forest;

use super::OutputTransform;

/// Predictor over an immutable forest.
///
/// Borrows the forest for its lifetime and never mutates it; construction is
/// free, so one can be built per request against a process-wide forest.
#[derive(Debug)]
pub struct Predictor<'f> {
    forest: &'f Forest,
}

impl<'f> Predictor<'f> {
    pub fn new(forest: &'f Forest) -> Self {
        Self { forest }
    }

    /// Accumulate raw margins for every sample.
    ///
    /// `features` is feature-major `[n_features, n_samples]`; the result is
    /// sample-major `[n_samples, n_groups]`, initialized with the per-group
    /// base score. Samples are buffered one at a time so tree traversal sees
    /// a contiguous feature slice.
    pub fn predict_margins(&self, features: ArrayView2<'_, f32>) -> Array2<f32> {
        let n_samples = features.ncols();
        let n_features = features.nrows();
        let n_groups = self.forest.n_groups() as usize;

        let mut margins = Array2::<f32>::zeros((n_samples, n_groups));
        for (group, &base) in self.forest.base_score().iter().enumerate() {
            margins.column_mut(group).fill(base);
        }

        let mut sample = vec![0f32; n_features];
        for row in 0..n_samples {
            for (feat, slot) in sample.iter_mut().enumerate() {
                *slot = features[[feat, row]];
            }
            for (tree, group) in self.forest.trees_with_groups() {
                margins[[row, group as usize]] += tree.predict_one(&sample);
            }
        }

        margins
    }

    /// Transformed per-class scores, `[n_samples, n_groups]`.
    pub fn predict_scores(
        &self,
        features: ArrayView2<'_, f32>,
        transform: OutputTransform,
    ) -> Array2<f32> {
        let mut margins = self.predict_margins(features);
        let n_groups = margins.ncols();
        // Row-major throughout, so the flat buffer is (n_rows, n_groups).
        let buf = margins
            .as_slice_mut()
            .expect("margins are freshly allocated row-major");
        transform.transform_inplace(buf, n_groups);
        margins
    }

    /// Zero-based class labels: argmax of the per-class scores.
    ///
    /// The display layer adds one; this function never does.
    pub fn predict_classes(
        &self,
        features: ArrayView2<'_, f32>,
        transform: OutputTransform,
    ) -> Vec<u32> {
        let scores = self.predict_scores(features, transform);
        scores
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0usize;
                let mut best_score = f32::NEG_INFINITY;
                for (group, &score) in row.iter().enumerate() {
                    if score > best_score {
                        best = group;
                        best_score = score;
                    }
                }
                best as u32
            })
            .collect()
    }
}
