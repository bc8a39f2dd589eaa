//! Inference over the fitted forest: margin accumulation, output transform,
//! class selection, and feature importance.
//!
//! Single-request, single-threaded by design: each table is predicted to
//! completion with no shared mutable state, so a process-wide forest can be
//! read concurrently without locking.

mod importance;
mod predictor;
mod transform;

pub use importance::gain_importance;
pub use predictor::Predictor;
pub use transform::OutputTransform;
