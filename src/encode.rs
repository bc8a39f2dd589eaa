//! Frozen categorical encoders.
//!
//! Each categorical contract column has one [`LabelEncoder`] established at
//! training time: an ordered class list whose index is the integer code. The
//! [`EncoderRegistry`] holds one encoder per column and is read-only after
//! load, so code `3` means the same category value across every inference
//! run. Refitting on uploaded data is exactly the defect this module exists
//! to rule out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::FeatureContract;

/// Encoding failures at inference time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The raw value was never seen at training time.
    #[error("unknown category `{value}` in column `{column}`")]
    UnknownCategory { column: String, value: String },

    /// No frozen encoder exists for the column.
    #[error("no frozen encoder for column `{column}`")]
    MissingEncoder { column: String },
}

/// Failures while loading encoder artifacts at startup. All are fatal.
#[derive(Debug, Error)]
pub enum EncoderLoadError {
    #[error("encoder artifact for column `{column}` not found at {path}")]
    Missing { column: String, path: PathBuf },

    #[error("failed to read encoder artifact for column `{column}`")]
    Io {
        column: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse encoder artifact for column `{column}`")]
    Parse {
        column: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("encoder artifact at {path} is for column `{found}`, expected `{expected}`")]
    WrongColumn {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// What to do when an upload contains a category absent from the frozen
/// vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPolicy {
    /// Reject the whole file. Predictable; the default.
    #[default]
    RejectFile,

    /// Drop the offending rows and predict the rest, reporting what was
    /// dropped.
    DropRow,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct LabelEncoderData {
    column: String,
    classes: Vec<String>,
}

/// A frozen label-to-code mapping for one categorical column.
///
/// Codes are positions in the `classes` list, fixed at training time.
/// Lookup keys are trimmed raw values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LabelEncoderData", into = "LabelEncoderData")]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl From<LabelEncoderData> for LabelEncoder {
    fn from(data: LabelEncoderData) -> Self {
        Self::new(data.column, data.classes)
    }
}

impl From<LabelEncoder> for LabelEncoderData {
    fn from(encoder: LabelEncoder) -> Self {
        Self {
            column: encoder.column,
            classes: encoder.classes,
        }
    }
}

impl LabelEncoder {
    /// Build an encoder from the training-time class list. Code = index.
    pub fn new(column: impl Into<String>, classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i as u32))
            .collect();
        Self {
            column: column.into(),
            classes,
            index,
        }
    }

    /// The column this encoder belongs to.
    #[inline]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Training-time classes in code order.
    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Vocabulary size.
    #[inline]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Code for a raw value, or `None` if it was never seen at training time.
    ///
    /// The lookup key is the trimmed textual form of the raw value.
    pub fn code(&self, raw: &str) -> Option<u32> {
        self.index.get(raw.trim()).copied()
    }
}

/// One frozen encoder per categorical contract column, read-only after load.
#[derive(Debug, Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<String, LabelEncoder>,
}

impl EncoderRegistry {
    /// Build a registry from already-loaded encoders.
    pub fn from_encoders(encoders: impl IntoIterator<Item = LabelEncoder>) -> Self {
        Self {
            encoders: encoders
                .into_iter()
                .map(|e| (e.column.clone(), e))
                .collect(),
        }
    }

    /// Load one `{column}.json` artifact per categorical contract column.
    ///
    /// Every categorical column must have an artifact; any missing or corrupt
    /// file fails the whole load, which callers treat as startup-fatal.
    pub fn load_dir(
        dir: impl AsRef<Path>,
        contract: &FeatureContract,
    ) -> Result<Self, EncoderLoadError> {
        let dir = dir.as_ref();
        let mut encoders = HashMap::new();

        for spec in contract.categorical() {
            let path = dir.join(format!("{}.json", spec.name));
            if !path.exists() {
                return Err(EncoderLoadError::Missing {
                    column: spec.name.clone(),
                    path,
                });
            }
            let file = std::fs::File::open(&path).map_err(|source| EncoderLoadError::Io {
                column: spec.name.clone(),
                source,
            })?;
            let encoder: LabelEncoder = serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|source| EncoderLoadError::Parse {
                    column: spec.name.clone(),
                    source,
                })?;
            if encoder.column() != spec.name {
                return Err(EncoderLoadError::WrongColumn {
                    path,
                    expected: spec.name.clone(),
                    found: encoder.column().to_string(),
                });
            }
            tracing::debug!(
                column = %spec.name,
                classes = encoder.len(),
                "loaded frozen encoder"
            );
            encoders.insert(spec.name.clone(), encoder);
        }

        Ok(Self { encoders })
    }

    /// The encoder for a column, if loaded.
    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Number of loaded encoders.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Encode a raw value with the column's frozen mapping.
    ///
    /// Deterministic: the same value maps to the same code on every call.
    pub fn encode(&self, column: &str, raw: &str) -> Result<u32, EncodeError> {
        let encoder = self
            .encoders
            .get(column)
            .ok_or_else(|| EncodeError::MissingEncoder {
                column: column.to_string(),
            })?;
        encoder
            .code(raw)
            .ok_or_else(|| EncodeError::UnknownCategory {
                column: column.to_string(),
                value: raw.trim().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{FeatureContract, FeatureSpec};

    fn cab_encoder() -> LabelEncoder {
        LabelEncoder::new("Type_of_Cab", vec!["A".into(), "B".into(), "C".into()])
    }

    #[test]
    fn codes_are_class_positions() {
        let enc = cab_encoder();
        assert_eq!(enc.code("A"), Some(0));
        assert_eq!(enc.code("C"), Some(2));
        assert_eq!(enc.code("D"), None);
    }

    #[test]
    fn lookup_key_is_trimmed() {
        let enc = cab_encoder();
        assert_eq!(enc.code("  B "), Some(1));
    }

    #[test]
    fn registry_reports_unknown_category_with_column_and_value() {
        let registry = EncoderRegistry::from_encoders([cab_encoder()]);
        let err = registry.encode("Type_of_Cab", "Z").unwrap_err();
        assert_eq!(
            err,
            EncodeError::UnknownCategory {
                column: "Type_of_Cab".into(),
                value: "Z".into()
            }
        );
    }

    #[test]
    fn registry_reports_missing_encoder() {
        let registry = EncoderRegistry::default();
        let err = registry.encode("Gender", "Male").unwrap_err();
        assert_eq!(
            err,
            EncodeError::MissingEncoder {
                column: "Gender".into()
            }
        );
    }

    #[test]
    fn encoder_deserializes_from_training_artifact() {
        let json = r#"{"column": "Gender", "classes": ["Female", "Male"]}"#;
        let enc: LabelEncoder = serde_json::from_str(json).unwrap();
        assert_eq!(enc.column(), "Gender");
        assert_eq!(enc.code("Male"), Some(1));
    }

    #[test]
    fn load_dir_requires_every_categorical_column() {
        let dir = tempfile::tempdir().unwrap();
        let contract = FeatureContract::new(
            vec![FeatureSpec::categorical("Gender")],
            None,
        );
        let err = EncoderRegistry::load_dir(dir.path(), &contract).unwrap_err();
        assert!(matches!(err, EncoderLoadError::Missing { column, .. } if column == "Gender"));

        std::fs::write(
            dir.path().join("Gender.json"),
            r#"{"column": "Gender", "classes": ["Female", "Male"]}"#,
        )
        .unwrap();
        let registry = EncoderRegistry::load_dir(dir.path(), &contract).unwrap();
        assert_eq!(registry.encode("Gender", "Female").unwrap(), 0);
    }

    #[test]
    fn load_dir_rejects_mislabeled_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let contract = FeatureContract::new(
            vec![FeatureSpec::categorical("Gender")],
            None,
        );
        std::fs::write(
            dir.path().join("Gender.json"),
            r#"{"column": "Type_of_Cab", "classes": ["A"]}"#,
        )
        .unwrap();
        let err = EncoderRegistry::load_dir(dir.path(), &contract).unwrap_err();
        assert!(matches!(err, EncoderLoadError::WrongColumn { .. }));
    }
}
