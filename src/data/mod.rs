//! Raw table containers for uploaded trip records.
//!
//! An upload is parsed once into a [`RawTable`] of string cells, consumed by
//! the preprocessing pipeline, and never persisted. Columns are stored
//! column-major so per-column validation and encoding walk contiguous data.

mod io;

pub use io::{read_csv, read_csv_reader, write_csv, write_csv_writer};

use thiserror::Error;

/// Errors from reading or constructing raw tables.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read input table: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column `{column}` has {len} rows but the table has {expected}")]
    ColumnLengthMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("prediction column has {len} values but the table has {expected} rows")]
    PredictionLengthMismatch { len: usize, expected: usize },
}

/// A raw uploaded table: header names in file order, cells as strings.
///
/// Column-major storage: `columns[i]` holds every cell of `headers[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    columns: Vec<Vec<String>>,
    n_rows: usize,
}

impl RawTable {
    /// Build a table from parallel header/column vectors.
    ///
    /// All columns must have the same length.
    pub fn from_columns(
        headers: Vec<String>,
        columns: Vec<Vec<String>>,
    ) -> Result<Self, TableError> {
        debug_assert_eq!(headers.len(), columns.len());
        let n_rows = columns.first().map(Vec::len).unwrap_or(0);
        for (header, column) in headers.iter().zip(columns.iter()) {
            if column.len() != n_rows {
                return Err(TableError::ColumnLengthMismatch {
                    column: header.clone(),
                    len: column.len(),
                    expected: n_rows,
                });
            }
        }
        Ok(Self {
            headers,
            columns,
            n_rows,
        })
    }

    /// Number of rows (excluding the header).
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    /// Header names in file order.
    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a column, by name.
    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.column_index(name).map(|i| self.columns[i].as_slice())
    }

    /// All cells of a column, by position.
    #[inline]
    pub fn column_at(&self, index: usize) -> &[String] {
        &self.columns[index]
    }
}

/// A table whose columns are exactly the contracted ones, in contract order.
///
/// Produced by [`FeatureContract::validate`](crate::FeatureContract::validate):
/// the identifier column and any extra columns are gone, and every contracted
/// column is present. Cells are still the raw (unencoded) strings so the
/// output file can mirror the validated input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedTable {
    headers: Vec<String>,
    columns: Vec<Vec<String>>,
    n_rows: usize,
}

impl SelectedTable {
    /// Internal constructor; callers guarantee contract order.
    pub(crate) fn new(headers: Vec<String>, columns: Vec<Vec<String>>, n_rows: usize) -> Self {
        debug_assert_eq!(headers.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self {
            headers,
            columns,
            n_rows,
        }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All cells of the `index`-th contracted column.
    #[inline]
    pub fn column_at(&self, index: usize) -> &[String] {
        &self.columns[index]
    }

    /// One row of cells, in contract order.
    pub fn row(&self, row: usize) -> Vec<&str> {
        self.columns.iter().map(|c| c[row].as_str()).collect()
    }

    /// Copy of this table with only the listed rows retained, in order.
    pub(crate) fn take_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| rows.iter().map(|&r| c[r].clone()).collect())
            .collect();
        Self::new(self.headers.clone(), columns, rows.len())
    }
}
