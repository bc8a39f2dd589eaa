//! surgecast: frozen-preprocessing inference for cab surge pricing.
//!
//! Loads a pre-trained XGBoost gbtree classifier and the categorical
//! encoders it was fitted with, reproduces the training-time preprocessing
//! exactly, and predicts a three-class surge pricing type per uploaded row.
//!
//! # Key Types
//!
//! - [`SurgeService`] - One-time artifact load, per-request prediction
//! - [`FeatureContract`] - The ordered column schema the classifier expects
//! - [`EncoderRegistry`] - Frozen label-to-code mappings from training time
//! - [`Preprocessor`] - Contract selection + frozen encoding + coercion
//!
//! # Loading XGBoost Models
//!
//! Use [`compat::xgboost::XgbModel`] to load JSON models.
//! See the [`compat`] module for details.

pub mod compat;
pub mod contract;
pub mod data;
pub mod encode;
pub mod inference;
pub mod pipeline;
pub mod repr;
pub mod service;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use contract::{ContractViolation, FeatureContract, FeatureKind, FeatureSpec};
pub use data::{RawTable, SelectedTable, TableError};
pub use encode::{EncodeError, EncoderLoadError, EncoderRegistry, LabelEncoder, UnknownPolicy};
pub use pipeline::{EncodedTable, PreprocessError, Preprocessor};
pub use service::{ServiceConfig, ServiceError, SurgeReport, SurgeService};
