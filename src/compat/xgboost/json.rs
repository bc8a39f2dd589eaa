//! XGBoost JSON model loader.
//!
//! Parses the XGBoost >= 2.0 JSON format. These are foreign types used only
//! for parsing; [`XgbModel::to_forest`] converts them to native types.
//! Scoped to what a fitted gbtree classifier carries: tree parallel arrays,
//! learner params, feature names/types.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;

/// Failures loading a model artifact. Fatal at startup.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact")]
    Parse(#[from] serde_json::Error),
}

// =============================================================================
// Custom deserializers for XGBoost-specific formats
// =============================================================================

/// XGBoost writes `base_score` as a number, a stringified number, an array,
/// or a bracketed string like `"[5.0E-1]"` depending on version.
fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let mut cur = Value::deserialize(deserializer)?;
    loop {
        match cur {
            Value::Number(n) => {
                return n
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SerdeError::custom("invalid number for base_score"));
            }
            Value::String(s) => {
                let t = s.trim();
                if let Ok(f) = t.parse::<f32>() {
                    return Ok(f);
                }
                if let Some(inner) = t.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                    if let Ok(f) = inner.parse::<f32>() {
                        return Ok(f);
                    }
                }
                return Err(SerdeError::custom(format!(
                    "cannot parse base_score from string: {s}"
                )));
            }
            Value::Array(arr) => {
                cur = arr
                    .into_iter()
                    .next()
                    .ok_or_else(|| SerdeError::custom("empty base_score array"))?;
            }
            _ => {
                return Err(SerdeError::custom(
                    "base_score must be number, string, or array",
                ));
            }
        }
    }
}

fn default_num_class() -> i64 {
    1
}

// =============================================================================
// Tree / model level definitions
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_nodes: i64,
    #[serde_as(as = "DisplayFromStr")]
    pub num_feature: i64,
}

/// One tree as parallel arrays, in BFS node order.
///
/// A node is a leaf when `left_children[i] == -1`; `base_weights` holds the
/// leaf value and `loss_changes` the split gain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeData {
    pub tree_param: TreeParam,
    pub loss_changes: Vec<f64>,
    pub base_weights: Vec<f32>,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_indices: Vec<i32>,
    pub split_conditions: Vec<f32>,
    /// 0 = numeric, 1 = categorical. Absent in older models (all numeric).
    #[serde(default)]
    pub split_type: Vec<i32>,
    pub default_left: Vec<i32>,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GBTreeModelParam {
    #[serde_as(as = "DisplayFromStr")]
    pub num_trees: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrees {
    pub trees: Vec<TreeData>,
    /// Output group per tree (class index for multiclass models).
    pub tree_info: Vec<i32>,
    pub gbtree_model_param: GBTreeModelParam,
}

/// Gradient booster variants. Only `gbtree` converts; the others are parsed
/// so rejection can name them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Gblinear {
        model: Value,
    },
    Dart {
        gbtree: Value,
        weight_drop: Vec<f32>,
    },
}

// =============================================================================
// Objective / learner-level definitions
// =============================================================================

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxMulticlassParam {
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_num_class")]
    pub num_class: i64,
}

impl Default for SoftmaxMulticlassParam {
    fn default() -> Self {
        Self { num_class: 1 }
    }
}

/// Training objective, kept as its raw name so unsupported objectives are
/// reported at conversion rather than rejected at parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub name: String,
    #[serde(default)]
    pub softmax_multiclass_param: SoftmaxMulticlassParam,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    pub base_score: f32,
    #[serde(rename = "num_class")]
    #[serde_as(as = "DisplayFromStr")]
    pub n_class: i64,
    #[serde(rename = "num_feature")]
    #[serde_as(as = "DisplayFromStr")]
    pub n_features: i64,
}

/// Feature dtype annotations carried by the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureType {
    #[serde(rename = "float", alias = "float32", alias = "f")]
    Float,
    #[serde(rename = "int", alias = "i")]
    Int,
    #[serde(rename = "q", alias = "quantitative")]
    Quantitative,
    #[serde(rename = "c", alias = "categorical")]
    Categorical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_types: Vec<FeatureType>,
    pub gradient_booster: GradientBooster,
    pub objective: Objective,
    pub learner_model_param: LearnerModelParam,
}

// =============================================================================
// Top-level XGBoost model
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XgbModel {
    pub version: [u32; 3],
    pub learner: Learner,
}

impl XgbModel {
    /// Load a model from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Load a model from any reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ModelLoadError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse a model from a serde_json Value.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}
