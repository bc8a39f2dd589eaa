//! CSV input and output.
//!
//! Reading produces a [`RawTable`]; writing emits the validated table plus
//! the appended display-space prediction column.

use std::io::{Read, Write};
use std::path::Path;

use super::{RawTable, SelectedTable, TableError};

/// Read a CSV file into a [`RawTable`].
///
/// The first record is the header. Records with a different field count than
/// the header are a [`TableError::Csv`].
pub fn read_csv(path: impl AsRef<Path>) -> Result<RawTable, TableError> {
    let file = std::fs::File::open(path)?;
    read_csv_reader(std::io::BufReader::new(file))
}

/// Read CSV from any reader into a [`RawTable`].
pub fn read_csv_reader<R: Read>(reader: R) -> Result<RawTable, TableError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            column.push(cell.to_owned());
        }
    }

    RawTable::from_columns(headers, columns)
}

/// Write the validated table plus one prediction column to a CSV file.
///
/// `predictions` must be display-space labels (one per row) and is appended
/// under `prediction_header` after the contracted columns.
pub fn write_csv(
    path: impl AsRef<Path>,
    table: &SelectedTable,
    predictions: &[u32],
    prediction_header: &str,
) -> Result<(), TableError> {
    let file = std::fs::File::create(path)?;
    write_csv_writer(file, table, predictions, prediction_header)
}

/// Write the output CSV to any writer.
pub fn write_csv_writer<W: Write>(
    writer: W,
    table: &SelectedTable,
    predictions: &[u32],
    prediction_header: &str,
) -> Result<(), TableError> {
    if predictions.len() != table.n_rows() {
        return Err(TableError::PredictionLengthMismatch {
            len: predictions.len(),
            expected: table.n_rows(),
        });
    }

    let mut writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.push(prediction_header);
    writer.write_record(&header)?;

    for row in 0..table.n_rows() {
        let prediction = predictions[row].to_string();
        let mut record = table.row(row);
        record.push(&prediction);
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
