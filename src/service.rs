//! One-time artifact loading and per-request orchestration.
//!
//! [`SurgeService::load`] reads the model and encoder artifacts exactly once;
//! any failure there is fatal and the service must not serve predictions.
//! The loaded service is immutable, so it can sit behind an `Arc` and take
//! requests without locking.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use bon::Builder;
use thiserror::Error;

use crate::compat::xgboost::{ModelLoadError, XgbModel};
use crate::compat::ConversionError;
use crate::contract::FeatureContract;
use crate::data::{self, RawTable, SelectedTable, TableError};
use crate::encode::{EncoderLoadError, EncoderRegistry, UnknownPolicy};
use crate::inference::{gain_importance, OutputTransform, Predictor};
use crate::pipeline::{PreprocessError, Preprocessor};
use crate::repr::Forest;

/// Header of the appended prediction column, display space {1,2,3}.
pub const PREDICTION_COLUMN: &str = "Predicted_Surge_Pricing_Type";

/// Service failures: fatal startup conditions plus per-request rejections.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to load model artifact from {path}")]
    Model {
        path: PathBuf,
        #[source]
        source: ModelLoadError,
    },

    #[error(transparent)]
    Convert(#[from] ConversionError),

    #[error(transparent)]
    Encoder(#[from] EncoderLoadError),

    #[error("model was fitted on {model} features but the contract has {contract}")]
    FeatureCountMismatch { model: usize, contract: usize },

    #[error("model feature names [{model}] do not match the contract [{contract}]")]
    FeatureNameMismatch { model: String, contract: String },

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Where the artifacts live and how the pipeline treats unknown categories.
#[derive(Debug, Clone, Builder)]
pub struct ServiceConfig {
    /// Path to the XGBoost JSON model artifact.
    #[builder(into)]
    pub model_path: PathBuf,

    /// Directory of per-column encoder artifacts (`{column}.json`).
    #[builder(into)]
    pub encoder_dir: PathBuf,

    /// Unknown-category handling; defaults to whole-file rejection.
    #[builder(default)]
    pub unknown_policy: UnknownPolicy,

    /// Contract override; defaults to the surge pricing schema.
    pub contract: Option<FeatureContract>,
}

/// The per-upload result: validated table, labels, and importances.
#[derive(Debug, Clone)]
pub struct SurgeReport {
    selected: SelectedTable,
    labels: Vec<u32>,
    importances: Vec<(String, f32)>,
    dropped_rows: Vec<usize>,
}

impl SurgeReport {
    /// Rows predicted.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    /// Zero-based class labels, one per row.
    #[inline]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Display-space labels in {1,2,3}: internal label + 1, applied here and
    /// nowhere else.
    pub fn display_labels(&self) -> Vec<u32> {
        self.labels.iter().map(|&l| l + 1).collect()
    }

    /// Count per display label, ordered by label.
    pub fn class_counts(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for label in self.display_labels() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Contract-ordered `(column, importance)` pairs; scores sum to 1 for
    /// any model with at least one split.
    #[inline]
    pub fn importances(&self) -> &[(String, f32)] {
        &self.importances
    }

    /// The validated table the labels belong to.
    #[inline]
    pub fn selected(&self) -> &SelectedTable {
        &self.selected
    }

    /// Original indices of rows dropped for unknown categories (empty under
    /// the default policy).
    #[inline]
    pub fn dropped_rows(&self) -> &[usize] {
        &self.dropped_rows
    }

    /// Write the submission file: validated input plus the prediction column.
    pub fn write_csv(&self, path: impl AsRef<std::path::Path>) -> Result<(), TableError> {
        data::write_csv(path, &self.selected, &self.display_labels(), PREDICTION_COLUMN)
    }

    /// Write the submission CSV to any writer.
    pub fn write_csv_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        data::write_csv_writer(writer, &self.selected, &self.display_labels(), PREDICTION_COLUMN)
    }
}

/// The loaded classifier plus its frozen preprocessing, immutable for the
/// process lifetime.
#[derive(Debug)]
pub struct SurgeService {
    preprocessor: Preprocessor,
    forest: Forest,
    transform: OutputTransform,
}

impl SurgeService {
    /// Load all artifacts once. Every failure here is startup-fatal: a
    /// service missing its model or any frozen encoder must not predict.
    pub fn load(config: ServiceConfig) -> Result<Self, ServiceError> {
        let contract = config
            .contract
            .unwrap_or_else(FeatureContract::surge_pricing);

        let model =
            XgbModel::from_file(&config.model_path).map_err(|source| ServiceError::Model {
                path: config.model_path.clone(),
                source,
            })?;
        Self::check_feature_contract(&model, &contract)?;
        let (forest, transform) = model.to_forest()?;

        let registry = EncoderRegistry::load_dir(&config.encoder_dir, &contract)?;

        tracing::info!(
            model = %config.model_path.display(),
            trees = forest.n_trees(),
            classes = forest.n_groups(),
            encoders = registry.len(),
            "artifacts loaded"
        );

        Ok(Self {
            preprocessor: Preprocessor::new(contract, registry, config.unknown_policy),
            forest,
            transform,
        })
    }

    /// The contract requests are validated against.
    #[inline]
    pub fn contract(&self) -> &FeatureContract {
        self.preprocessor.contract()
    }

    /// Cross-check the artifact's recorded feature schema against the
    /// contract, turning silent shape mismatches into named startup errors.
    fn check_feature_contract(
        model: &XgbModel,
        contract: &FeatureContract,
    ) -> Result<(), ServiceError> {
        let n_features = model.learner.learner_model_param.n_features as usize;
        if n_features != 0 && n_features != contract.len() {
            return Err(ServiceError::FeatureCountMismatch {
                model: n_features,
                contract: contract.len(),
            });
        }
        let names = &model.learner.feature_names;
        if !names.is_empty() && !contract.matches_names(names) {
            return Err(ServiceError::FeatureNameMismatch {
                model: names.join(", "),
                contract: contract.names().collect::<Vec<_>>().join(", "),
            });
        }
        Ok(())
    }

    /// Run one upload through validate → encode → predict.
    ///
    /// Preprocessing errors surface before any prediction happens; no row is
    /// predicted unless the whole table passed validation.
    pub fn predict_table(&self, raw: &RawTable) -> Result<SurgeReport, ServiceError> {
        let encoded = self.preprocessor.run(raw)?;

        let predictor = Predictor::new(&self.forest);
        let labels = predictor.predict_classes(encoded.features(), self.transform);

        // Importance is transient, recomputed per request from the forest.
        let contract = self.preprocessor.contract();
        let scores = gain_importance(&self.forest, contract.len());
        let importances = contract
            .names()
            .map(str::to_owned)
            .zip(scores)
            .collect::<Vec<_>>();

        tracing::info!(
            rows = labels.len(),
            dropped = encoded.dropped_rows().len(),
            "prediction complete"
        );

        let (selected, dropped_rows) = encoded.into_parts();
        Ok(SurgeReport {
            selected,
            labels,
            importances,
            dropped_rows,
        })
    }
}
