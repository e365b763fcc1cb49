//! Tabular (CSV) encoding of a single realization's record.
//!
//! The storage service keeps record matrices as CSV whose first column is
//! the realization index. One encoded record is a header row of index
//! labels and one data row:
//!
//! ```text
//! ,a,b
//! 2,1.0,2.5
//! ```
//!
//! The header's first cell names the index column and is left empty. The
//! record kind is not part of the payload; decoding takes it from the
//! record's [`RecordMetadata`](ensemble_types::RecordMetadata).
//!
//! Floats are written with Rust's shortest round-trip formatting, so the
//! text parses back to the identical `f64`.

use std::collections::BTreeMap;

use ensemble_types::{Record, RecordKind};

use crate::error::StorageError;

/// Encode one realization's record as CSV.
///
/// # Errors
///
/// Returns [`StorageError::Codec`] if the CSV writer fails.
pub fn encode(record: &Record, realization: usize) -> Result<Vec<u8>, StorageError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(record.len().saturating_add(1));
    header.push(String::new());
    header.extend(record.index_labels());
    writer.write_record(&header).map_err(codec_error)?;

    let mut row = Vec::with_capacity(header.len());
    row.push(realization.to_string());
    row.extend(record.values().into_iter().map(format_float));
    writer.write_record(&row).map_err(codec_error)?;

    writer
        .into_inner()
        .map_err(|e| StorageError::Codec(format!("cannot flush CSV: {e}")))
}

/// Decode the row for `realization` from a CSV record matrix.
///
/// # Errors
///
/// Returns [`StorageError::Codec`] if the CSV is malformed, has no row for
/// `realization`, or contains labels or values that do not fit `kind`.
pub fn decode(bytes: &[u8], kind: RecordKind, realization: usize) -> Result<Record, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(codec_error)?.clone();
    let labels: Vec<&str> = headers.iter().skip(1).collect();

    for row in reader.records() {
        let row = row.map_err(codec_error)?;
        let is_target = row
            .get(0)
            .and_then(|index| index.trim().parse::<usize>().ok())
            .is_some_and(|index| index == realization);
        if !is_target {
            continue;
        }

        let values = row
            .iter()
            .skip(1)
            .map(parse_float)
            .collect::<Result<Vec<f64>, StorageError>>()?;
        return build_record(kind, &labels, values);
    }

    Err(StorageError::Codec(format!(
        "no row for realization {realization} in record matrix"
    )))
}

/// Reconstruct a record of `kind` from column labels and one row of values.
fn build_record(kind: RecordKind, labels: &[&str], values: Vec<f64>) -> Result<Record, StorageError> {
    match kind {
        RecordKind::SequenceFloat => Ok(Record::SequenceFloat(values)),
        RecordKind::MappingIntFloat => {
            let mut map = BTreeMap::new();
            for (label, value) in labels.iter().zip(values) {
                let key: i64 = label.trim().parse().map_err(|e| {
                    StorageError::Codec(format!("index label {label:?} is not an integer: {e}"))
                })?;
                if map.insert(key, value).is_some() {
                    return Err(duplicate_label(label));
                }
            }
            Ok(Record::MappingIntFloat(map))
        }
        RecordKind::MappingStrFloat => {
            let mut map = BTreeMap::new();
            for (label, value) in labels.iter().zip(values) {
                if map.insert((*label).to_owned(), value).is_some() {
                    return Err(duplicate_label(label));
                }
            }
            Ok(Record::MappingStrFloat(map))
        }
    }
}

/// Shortest text that parses back to exactly `value`.
fn format_float(value: f64) -> String {
    format!("{value:?}")
}

/// Parse a CSV cell; an empty cell is a missing value.
fn parse_float(cell: &str) -> Result<f64, StorageError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse()
        .map_err(|e| StorageError::Codec(format!("value {cell:?} is not a float: {e}")))
}

fn duplicate_label(label: &str) -> StorageError {
    StorageError::Codec(format!("duplicate index label {label:?}"))
}

fn codec_error(err: csv::Error) -> StorageError {
    StorageError::Codec(err.to_string())
}
