use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ExportError;

use super::model::UnifiedRecord;
use super::schema::Column;

// ---------------------------------------------------------------------------
// CSV export of a record slice
// ---------------------------------------------------------------------------

/// UTF-8 byte-order mark; spreadsheet tools need it to detect the encoding.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text fields for one record, in `columns` order. Nulls are empty.
fn record_fields(columns: &[Column], record: &UnifiedRecord) -> Vec<String> {
    columns.iter().map(|c| record.value(c).to_field()).collect()
}

/// Write a header row plus one row per record.
pub fn write_csv<W: Write>(
    mut writer: W,
    columns: &[Column],
    records: &[&UnifiedRecord],
) -> Result<(), ExportError> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(columns.iter().map(Column::header))?;
    for record in records {
        csv_writer.write_record(record_fields(columns, record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the export to `path`.
pub fn export_file(
    path: &Path,
    columns: &[Column],
    records: &[&UnifiedRecord],
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), columns, records)?;
    log::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
