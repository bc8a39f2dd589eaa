//! Feature contract: the fixed, ordered column schema the classifier was
//! fitted against.
//!
//! Validation turns an arbitrary upload into a table with exactly the
//! contracted columns in contract order, before any encoding happens. A
//! missing contracted column is a named, reportable error; extra columns are
//! tolerated and dropped.

use thiserror::Error;

use crate::data::{RawTable, SelectedTable};

/// Logical feature types.
///
/// Encoded features are stored as `f32` regardless of kind. The kind decides
/// whether a column goes through the frozen encoder or numeric coercion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FeatureKind {
    /// Continuous numeric feature. Missing values: `f32::NAN`.
    #[default]
    Numeric,

    /// Categorical feature, replaced by its frozen integer code.
    Categorical,
}

impl FeatureKind {
    /// Returns true if this is a categorical feature.
    #[inline]
    pub fn is_categorical(&self) -> bool {
        matches!(self, FeatureKind::Categorical)
    }

    /// Returns true if this is a numeric feature.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureKind::Numeric)
    }
}

/// One contracted column: name plus kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
}

impl FeatureSpec {
    /// A numeric contracted column.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
        }
    }

    /// A categorical contracted column.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Categorical,
        }
    }
}

/// Mismatch between an upload and the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    /// A contracted column is absent from the input table.
    #[error("contracted column `{column}` is missing from the input table")]
    MissingColumn { column: String },
}

/// The ordered, fixed column schema for inference.
///
/// Column order and membership must match training exactly; the pipeline
/// presents columns to the model in this order and no other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureContract {
    features: Vec<FeatureSpec>,
    id_column: Option<String>,
}

impl FeatureContract {
    /// Build a contract from ordered specs and an optional identifier column.
    ///
    /// The identifier column is dropped during validation when present;
    /// its absence is not an error.
    pub fn new(features: Vec<FeatureSpec>, id_column: Option<String>) -> Self {
        Self {
            features,
            id_column,
        }
    }

    /// The schema the surge pricing classifier was trained against.
    pub fn surge_pricing() -> Self {
        Self::new(
            vec![
                FeatureSpec::numeric("Trip_Distance"),
                FeatureSpec::categorical("Type_of_Cab"),
                FeatureSpec::numeric("Customer_Since_Months"),
                FeatureSpec::numeric("Life_Style_Index"),
                FeatureSpec::categorical("Confidence_Life_Style_Index"),
                FeatureSpec::categorical("Destination_Type"),
                FeatureSpec::numeric("Customer_Rating"),
                FeatureSpec::numeric("Cancellation_Last_1Month"),
                FeatureSpec::numeric("Var1"),
                FeatureSpec::numeric("Var2"),
                FeatureSpec::numeric("Var3"),
                FeatureSpec::categorical("Gender"),
            ],
            Some("Trip_ID".to_string()),
        )
    }

    /// Number of contracted features.
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Contracted specs in order.
    #[inline]
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Contracted names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// Categorical specs in contract order.
    pub fn categorical(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter().filter(|f| f.kind.is_categorical())
    }

    /// The identifier column dropped during validation, if any.
    pub fn id_column(&self) -> Option<&str> {
        self.id_column.as_deref()
    }

    /// Spec by position.
    pub fn get(&self, index: usize) -> Option<&FeatureSpec> {
        self.features.get(index)
    }

    /// Whether `names` matches the contracted names exactly, in order.
    pub fn matches_names<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.len() == self.features.len()
            && names
                .iter()
                .zip(self.features.iter())
                .all(|(n, f)| n.as_ref() == f.name)
    }

    /// Select the contracted columns from an upload, in contract order.
    ///
    /// Drops the identifier column if present and silently drops any
    /// unexpected extras, tolerating superset uploads. A missing contracted
    /// column is a [`ContractViolation::MissingColumn`]. Selection happens
    /// before any encoding so the registry only ever sees the columns it was
    /// trained on.
    pub fn validate(&self, table: &RawTable) -> Result<SelectedTable, ContractViolation> {
        let mut headers = Vec::with_capacity(self.features.len());
        let mut columns = Vec::with_capacity(self.features.len());

        for spec in &self.features {
            let index = table.column_index(&spec.name).ok_or_else(|| {
                ContractViolation::MissingColumn {
                    column: spec.name.clone(),
                }
            })?;
            headers.push(spec.name.clone());
            columns.push(table.column_at(index).to_vec());
        }

        Ok(SelectedTable::new(headers, columns, table.n_rows()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        let columns = headers.iter().map(|h| vec![format!("{h}-0")]).collect();
        RawTable::from_columns(headers.iter().map(|h| h.to_string()).collect(), columns).unwrap()
    }

    fn contract() -> FeatureContract {
        FeatureContract::new(
            vec![
                FeatureSpec::numeric("Trip_Distance"),
                FeatureSpec::categorical("Gender"),
            ],
            Some("Trip_ID".to_string()),
        )
    }

    #[test]
    fn selects_in_contract_order_and_drops_extras() {
        // Input order differs from contract order; Trip_ID and Extra present.
        let raw = table(&["Gender", "Trip_ID", "Extra", "Trip_Distance"]);
        let selected = contract().validate(&raw).unwrap();
        assert_eq!(
            selected.headers(),
            &["Trip_Distance".to_string(), "Gender".into()]
        );
        assert_eq!(selected.n_rows(), 1);
        assert_eq!(selected.column_at(1), &["Gender-0".to_string()]);
    }

    #[test]
    fn missing_id_column_is_not_an_error() {
        let raw = table(&["Trip_Distance", "Gender"]);
        assert!(contract().validate(&raw).is_ok());
    }

    #[test]
    fn missing_contracted_column_is_named() {
        let raw = table(&["Trip_ID", "Gender"]);
        let err = contract().validate(&raw).unwrap_err();
        assert_eq!(
            err,
            ContractViolation::MissingColumn {
                column: "Trip_Distance".into()
            }
        );
    }

    #[test]
    fn surge_pricing_contract_shape() {
        let c = FeatureContract::surge_pricing();
        assert_eq!(c.len(), 12);
        assert_eq!(c.id_column(), Some("Trip_ID"));
        assert_eq!(c.categorical().count(), 4);
        let names: Vec<_> = c.names().collect();
        assert_eq!(names[0], "Trip_Distance");
        assert_eq!(names[11], "Gender");
    }

    #[test]
    fn matches_names_requires_exact_order() {
        let c = contract();
        assert!(c.matches_names(&["Trip_Distance", "Gender"]));
        assert!(!c.matches_names(&["Gender", "Trip_Distance"]));
        assert!(!c.matches_names(&["Trip_Distance"]));
    }
}
