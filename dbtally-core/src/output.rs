//! CSV report writer.
//!
//! One header record, then one record per [`MetadataRow`], with standard
//! CSV quoting handled by the `csv` crate. A row that fails to serialize is
//! logged and skipped so the rest of the report still comes out; a header
//! or flush failure aborts, since nothing useful can follow it.

use crate::error::DbTallyError;
use crate::models::MetadataRow;
use crate::Result;
use std::io::Write;

/// Report column names, in output order. `index_size` is dropped when the
/// report is configured without it.
pub const REPORT_COLUMNS: &[&str] = &[
    "database_name",
    "table_name",
    "table_size",
    "index_size",
    "table_rows",
];

/// Writes the CSV report to `writer`.
///
/// # Errors
/// Returns a serialization error if the header cannot be written or the
/// writer cannot be flushed. Per-row failures are logged at error level and
/// the row is skipped.
pub fn write_report<W: Write>(
    writer: W,
    rows: &[MetadataRow],
    include_index_size: bool,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header: Vec<&str> = REPORT_COLUMNS
        .iter()
        .copied()
        .filter(|column| include_index_size || *column != "index_size")
        .collect();
    csv_writer
        .write_record(&header)
        .map_err(|e| DbTallyError::serialization_failed("failed to write CSV header", e))?;

    for row in rows {
        let record = to_record(row, include_index_size);
        if let Err(e) = csv_writer.write_record(&record) {
            tracing::error!(
                "skipping row for table '{}.{}': {}",
                row.database_name,
                row.table_name,
                e
            );
        }
    }

    csv_writer
        .flush()
        .map_err(|e| DbTallyError::serialization_failed("failed to flush CSV output", e))
}

/// Renders one row as CSV fields in column order.
fn to_record(row: &MetadataRow, include_index_size: bool) -> Vec<String> {
    let mut record = vec![
        row.database_name.clone(),
        row.table_name.clone(),
        row.table_size_bytes.to_string(),
    ];
    if include_index_size {
        record.push(
            row.index_size_bytes
                .map(|size| size.to_string())
                .unwrap_or_default(),
        );
    }
    record.push(row.row_count_estimate.to_string());
    record
}
