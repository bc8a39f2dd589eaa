//! Native representation of the fitted gradient-boosted-tree ensemble.
//!
//! Immutable after conversion from the model artifact; shared read-only for
//! the lifetime of the process.

mod forest;
mod tree;

/// Node index within a single tree (0 = root).
pub type NodeId = u32;

pub use forest::{Forest, ForestValidationError};
pub use tree::{Tree, TreeValidationError};
