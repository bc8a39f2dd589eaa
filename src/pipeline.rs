//! Preprocessing pipeline: contract selection, frozen encoding, numeric
//! coercion.
//!
//! Transforms a raw upload into the exact feature-major matrix the classifier
//! requires, in a fixed stage order: identifier drop + contract selection,
//! then frozen categorical encoding, then numeric coercion to `f32`. Each
//! stage consumes its predecessor, so no run re-enters an earlier stage and
//! no partially-encoded table can escape: the first violation rejects the
//! run.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::contract::{ContractViolation, FeatureContract, FeatureKind};
use crate::data::{RawTable, SelectedTable};
use crate::encode::{EncodeError, EncoderRegistry, UnknownPolicy};

/// Preprocessing failures. All are deterministic functions of the input;
/// none warrant a retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    /// A contracted column is absent from the upload.
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    /// A categorical value was never seen at training time.
    #[error("unknown category `{value}` in column `{column}` (row {row})")]
    UnknownCategory {
        column: String,
        value: String,
        row: usize,
    },

    /// A numeric column contains non-numeric text.
    #[error("cannot coerce `{value}` in numeric column `{column}` (row {row})")]
    TypeCoercion {
        column: String,
        value: String,
        row: usize,
    },

    /// A categorical contract column has no frozen encoder. Callers catch
    /// this at startup; reaching it per-request indicates a misbuilt
    /// preprocessor.
    #[error("no frozen encoder for column `{column}`")]
    MissingEncoder { column: String },
}

/// The model-ready table: contracted features as a feature-major `f32`
/// matrix, plus the validated raw cells for display and output.
#[derive(Debug, Clone)]
pub struct EncodedTable {
    /// Feature matrix `[n_features, n_samples]` (feature-major).
    features: Array2<f32>,
    /// Validated cells, contract order, same rows as `features`.
    selected: SelectedTable,
    /// Original row indices removed under [`UnknownPolicy::DropRow`].
    dropped_rows: Vec<usize>,
}

impl EncodedTable {
    /// Feature matrix view, `[n_features, n_samples]`.
    #[inline]
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// Rows surviving preprocessing.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.features.ncols()
    }

    /// Contracted feature count.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    /// The validated table these features were encoded from.
    #[inline]
    pub fn selected(&self) -> &SelectedTable {
        &self.selected
    }

    /// Original row indices dropped for unknown categories, in order.
    /// Empty under the default whole-file policy.
    #[inline]
    pub fn dropped_rows(&self) -> &[usize] {
        &self.dropped_rows
    }

    /// Decompose into the validated table and the dropped-row indices.
    pub fn into_parts(self) -> (SelectedTable, Vec<usize>) {
        (self.selected, self.dropped_rows)
    }
}

/// Values pandas-style CSVs leave for missing data. Encoded as `f32::NAN`,
/// the missing-value convention the trees were trained with.
fn is_missing(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t == "NA" || t == "N/A" || t == "null"
}

/// Applies the feature contract and the frozen encoder registry to uploads.
///
/// Holds no mutable state; the same preprocessor can serve any number of
/// requests and always produces byte-identical output for identical input.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    contract: FeatureContract,
    registry: EncoderRegistry,
    unknown_policy: UnknownPolicy,
}

impl Preprocessor {
    pub fn new(
        contract: FeatureContract,
        registry: EncoderRegistry,
        unknown_policy: UnknownPolicy,
    ) -> Self {
        Self {
            contract,
            registry,
            unknown_policy,
        }
    }

    /// The contract this preprocessor enforces.
    #[inline]
    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Run the full pipeline on one upload.
    ///
    /// Stage order is fixed: selection before encoding, encoding before
    /// coercion. Under [`UnknownPolicy::RejectFile`] the first unknown
    /// category rejects the whole upload; under [`UnknownPolicy::DropRow`]
    /// offending rows are removed before encoding and reported in the
    /// result.
    pub fn run(&self, raw: &RawTable) -> Result<EncodedTable, PreprocessError> {
        let selected = self.contract.validate(raw)?;
        tracing::debug!(
            rows = selected.n_rows(),
            features = selected.n_cols(),
            "upload validated against contract"
        );

        let (selected, dropped_rows) = match self.unknown_policy {
            UnknownPolicy::RejectFile => (selected, Vec::new()),
            UnknownPolicy::DropRow => self.drop_unknown_rows(selected)?,
        };

        let features = self.encode(&selected)?;
        if !dropped_rows.is_empty() {
            tracing::warn!(
                dropped = dropped_rows.len(),
                "rows dropped for unknown categories"
            );
        }

        Ok(EncodedTable {
            features,
            selected,
            dropped_rows,
        })
    }

    /// Remove rows holding any out-of-vocabulary category.
    ///
    /// Returns the filtered table and the original indices of dropped rows.
    fn drop_unknown_rows(
        &self,
        selected: SelectedTable,
    ) -> Result<(SelectedTable, Vec<usize>), PreprocessError> {
        let mut keep = vec![true; selected.n_rows()];

        for (col_idx, spec) in self.contract.features().iter().enumerate() {
            if !spec.kind.is_categorical() {
                continue;
            }
            let encoder = self.registry.get(&spec.name).ok_or_else(|| {
                PreprocessError::MissingEncoder {
                    column: spec.name.clone(),
                }
            })?;
            for (row, cell) in selected.column_at(col_idx).iter().enumerate() {
                if !is_missing(cell) && encoder.code(cell).is_none() {
                    keep[row] = false;
                }
            }
        }

        let kept: Vec<usize> = (0..selected.n_rows()).filter(|&r| keep[r]).collect();
        let dropped: Vec<usize> = (0..selected.n_rows()).filter(|&r| !keep[r]).collect();
        if dropped.is_empty() {
            return Ok((selected, dropped));
        }
        Ok((selected.take_rows(&kept), dropped))
    }

    /// Encode a validated table into the feature-major matrix.
    fn encode(&self, selected: &SelectedTable) -> Result<Array2<f32>, PreprocessError> {
        let n_features = self.contract.len();
        let n_samples = selected.n_rows();
        let mut features = Array2::<f32>::zeros((n_features, n_samples));

        for (feat_idx, spec) in self.contract.features().iter().enumerate() {
            let cells = selected.column_at(feat_idx);
            let mut out = features.row_mut(feat_idx);

            match spec.kind {
                FeatureKind::Categorical => {
                    for (row, cell) in cells.iter().enumerate() {
                        out[row] = if is_missing(cell) {
                            f32::NAN
                        } else {
                            match self.registry.encode(&spec.name, cell) {
                                Ok(code) => code as f32,
                                Err(EncodeError::UnknownCategory { column, value }) => {
                                    return Err(PreprocessError::UnknownCategory {
                                        column,
                                        value,
                                        row,
                                    });
                                }
                                Err(EncodeError::MissingEncoder { column }) => {
                                    return Err(PreprocessError::MissingEncoder { column });
                                }
                            }
                        };
                    }
                }
                FeatureKind::Numeric => {
                    for (row, cell) in cells.iter().enumerate() {
                        out[row] = if is_missing(cell) {
                            f32::NAN
                        } else {
                            cell.trim().parse::<f32>().map_err(|_| {
                                PreprocessError::TypeCoercion {
                                    column: spec.name.clone(),
                                    value: cell.trim().to_string(),
                                    row,
                                }
                            })?
                        };
                    }
                }
            }
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FeatureSpec;
    use crate::encode::LabelEncoder;

    fn contract() -> FeatureContract {
        FeatureContract::new(
            vec![
                FeatureSpec::numeric("Trip_Distance"),
                FeatureSpec::categorical("Type_of_Cab"),
            ],
            Some("Trip_ID".to_string()),
        )
    }

    fn registry() -> EncoderRegistry {
        EncoderRegistry::from_encoders([LabelEncoder::new(
            "Type_of_Cab",
            vec!["A".into(), "B".into(), "C".into()],
        )])
    }

    fn raw(rows: &[(&str, &str, &str)]) -> RawTable {
        RawTable::from_columns(
            vec!["Trip_ID".into(), "Type_of_Cab".into(), "Trip_Distance".into()],
            vec![
                rows.iter().map(|r| r.0.to_string()).collect(),
                rows.iter().map(|r| r.1.to_string()).collect(),
                rows.iter().map(|r| r.2.to_string()).collect(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn encodes_in_contract_order() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = raw(&[("T1", "B", "6.5"), ("T2", "A", "12.0")]);
        let encoded = pre.run(&table).unwrap();

        assert_eq!(encoded.n_features(), 2);
        assert_eq!(encoded.n_samples(), 2);
        // Feature 0 is Trip_Distance, feature 1 the encoded cab type.
        assert_eq!(encoded.features()[[0, 0]], 6.5);
        assert_eq!(encoded.features()[[1, 0]], 1.0);
        assert_eq!(encoded.features()[[1, 1]], 0.0);
    }

    #[test]
    fn unknown_category_rejects_file_by_default() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = raw(&[("T1", "B", "6.5"), ("T2", "Z", "12.0")]);
        let err = pre.run(&table).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::UnknownCategory {
                column: "Type_of_Cab".into(),
                value: "Z".into(),
                row: 1
            }
        );
    }

    #[test]
    fn drop_row_policy_removes_only_offending_rows() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::DropRow);
        let table = raw(&[("T1", "B", "6.5"), ("T2", "Z", "12.0"), ("T3", "C", "3.2")]);
        let encoded = pre.run(&table).unwrap();

        assert_eq!(encoded.n_samples(), 2);
        assert_eq!(encoded.dropped_rows(), &[1]);
        assert_eq!(encoded.features()[[1, 1]], 2.0);
        assert_eq!(encoded.selected().column_at(0), &["6.5".to_string(), "3.2".into()]);
    }

    #[test]
    fn non_numeric_text_is_a_coercion_error() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = raw(&[("T1", "A", "fast")]);
        let err = pre.run(&table).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::TypeCoercion {
                column: "Trip_Distance".into(),
                value: "fast".into(),
                row: 0
            }
        );
    }

    #[test]
    fn missing_cells_become_nan() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = raw(&[("T1", "", "NA")]);
        let encoded = pre.run(&table).unwrap();
        assert!(encoded.features()[[0, 0]].is_nan());
        assert!(encoded.features()[[1, 0]].is_nan());
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = raw(&[("T1", "B", "6.5"), ("T2", "", ""), ("T3", "C", "1e3")]);
        let a = pre.run(&table).unwrap();
        let b = pre.run(&table).unwrap();

        // Bitwise comparison so NaN cells compare equal too.
        let bits_a: Vec<u32> = a.features().iter().map(|v| v.to_bits()).collect();
        let bits_b: Vec<u32> = b.features().iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn missing_column_propagates_from_contract() {
        let pre = Preprocessor::new(contract(), registry(), UnknownPolicy::RejectFile);
        let table = RawTable::from_columns(
            vec!["Trip_ID".into(), "Type_of_Cab".into()],
            vec![vec!["T1".into()], vec!["A".into()]],
        )
        .unwrap();
        let err = pre.run(&table).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::Contract(ContractViolation::MissingColumn {
                column: "Trip_Distance".into()
            })
        );
    }
}
