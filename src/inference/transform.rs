//! Margin-to-output transformation.

/// Inference-time output transformation implied by the training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputTransform {
    /// No transformation; output = margin.
    #[default]
    Identity,

    /// Logistic sigmoid: output = 1 / (1 + exp(-margin)). Binary models.
    Sigmoid,

    /// Softmax across groups per row. Multiclass models.
    Softmax,
}

impl OutputTransform {
    /// Apply the transformation in-place to a row-major buffer of shape
    /// `(n_rows, n_outputs)`.
    ///
    /// Sigmoid clamps its input and softmax subtracts the per-row max before
    /// exponentiating, so neither overflows.
    ///
    /// # Panics
    ///
    /// Panics if `n_outputs` is 0 or does not divide `predictions.len()`.
    pub fn transform_inplace(&self, predictions: &mut [f32], n_outputs: usize) {
        assert!(n_outputs > 0, "n_outputs must be > 0");
        assert!(
            predictions.len() % n_outputs == 0,
            "predictions.len() must be divisible by n_outputs"
        );

        match self {
            OutputTransform::Identity => {}
            OutputTransform::Sigmoid => {
                for x in predictions.iter_mut() {
                    *x = sigmoid(*x);
                }
            }
            OutputTransform::Softmax => {
                for row in predictions.chunks_mut(n_outputs) {
                    softmax_inplace(row);
                }
            }
        }
    }
}

/// Numerically stable sigmoid.
#[inline]
fn sigmoid(x: f32) -> f32 {
    let clamped = x.clamp(-500.0, 500.0);
    if clamped >= 0.0 {
        1.0 / (1.0 + (-clamped).exp())
    } else {
        let e = clamped.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax in-place.
#[inline]
fn softmax_inplace(row: &mut [f32]) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in row.iter_mut() {
        *x /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn softmax_rows_sum_to_one() {
        let mut buf = vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0];
        OutputTransform::Softmax.transform_inplace(&mut buf, 3);
        for row in buf.chunks(3) {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        }
        // Largest margin keeps the largest probability.
        assert!(buf[2] > buf[1] && buf[1] > buf[0]);
    }

    #[test]
    fn softmax_survives_large_margins() {
        let mut buf = vec![1000.0, 0.0];
        OutputTransform::Softmax.transform_inplace(&mut buf, 2);
        assert_abs_diff_eq!(buf[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn sigmoid_is_bounded() {
        let mut buf = vec![-1000.0, 0.0, 1000.0];
        OutputTransform::Sigmoid.transform_inplace(&mut buf, 1);
        assert_abs_diff_eq!(buf[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(buf[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(buf[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn identity_is_a_no_op() {
        let mut buf = vec![0.25, -4.0];
        OutputTransform::Identity.transform_inplace(&mut buf, 1);
        assert_eq!(buf, vec![0.25, -4.0]);
    }
}
