//! Loaders for externally trained model artifacts.

pub mod xgboost;

pub use xgboost::{ConversionError, ModelLoadError, XgbModel};
