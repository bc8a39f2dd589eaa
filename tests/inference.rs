//! Model loading and inference properties.

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use surgecast::compat::xgboost::XgbModel;
use surgecast::inference::{gain_importance, OutputTransform, Predictor};

mod common;

fn load_forest() -> (surgecast::repr::Forest, OutputTransform) {
    let model = XgbModel::from_value(&common::surge_model_json()).unwrap();
    model.to_forest().unwrap()
}

/// Feature-major matrix for the three fixture rows (types 1, 2, 3).
fn fixture_features() -> Array2<f32> {
    let mut features = Array2::<f32>::zeros((12, 3));
    // Trip_Distance
    features[[0, 0]] = 5.0;
    features[[0, 1]] = 50.0;
    features[[0, 2]] = 50.0;
    // Type_of_Cab codes: A, C, A
    features[[1, 1]] = 2.0;
    // Customer_Rating
    features[[6, 0]] = 1.0;
    features[[6, 1]] = 1.0;
    features[[6, 2]] = 5.0;
    features
}

#[test]
fn model_converts_and_validates() {
    let (forest, transform) = load_forest();
    assert_eq!(transform, OutputTransform::Softmax);
    assert_eq!(forest.n_groups(), 3);
    assert_eq!(forest.n_trees(), 3);
    assert!(forest.min_feature_count() <= 12);
    forest.validate().unwrap();
}

#[test]
fn predicted_classes_are_zero_based() {
    let (forest, transform) = load_forest();
    let classes = Predictor::new(&forest).predict_classes(fixture_features().view(), transform);
    assert_eq!(classes, vec![0, 1, 2]);
}

#[test]
fn softmax_scores_sum_to_one_per_row() {
    let (forest, transform) = load_forest();
    let scores = Predictor::new(&forest).predict_scores(fixture_features().view(), transform);
    assert_eq!(scores.shape(), &[3, 3]);
    for row in scores.rows() {
        assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn missing_features_follow_default_direction() {
    let (forest, transform) = load_forest();
    // All-NaN sample: every stump defaults left, so class 0 wins
    // (its left leaf is the only positive one).
    let features = Array2::<f32>::from_elem((12, 1), f32::NAN);
    let classes = Predictor::new(&forest).predict_classes(features.view(), transform);
    assert_eq!(classes, vec![0]);
}

#[test]
fn importance_matches_contract_length_and_gains() {
    let (forest, _) = load_forest();
    let importance = gain_importance(&forest, 12);

    assert_eq!(importance.len(), 12);
    assert_abs_diff_eq!(importance.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    // Gains were 5 / 3 / 2 on Trip_Distance, Type_of_Cab, Customer_Rating.
    assert_abs_diff_eq!(importance[0], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(importance[1], 0.3, epsilon = 1e-6);
    assert_abs_diff_eq!(importance[6], 0.2, epsilon = 1e-6);
    assert_eq!(importance[2], 0.0);
}
