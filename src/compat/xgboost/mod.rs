//! XGBoost JSON model support.
//!
//! [`XgbModel`] parses the XGBoost >= 2.0 JSON format; conversion produces
//! the native [`Forest`](crate::repr::Forest) used for inference.

mod convert;
mod json;

pub use convert::ConversionError;
pub use json::{
    FeatureType, GradientBooster, Learner, LearnerModelParam, ModelLoadError, ModelTrees,
    Objective, SoftmaxMulticlassParam, TreeData, TreeParam, XgbModel,
};
