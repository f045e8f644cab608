use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::LoadError;

use super::join::left_join;
use super::model::{CellValue, IndexRecord, IndustryRecord, Metric, StockCode};
use super::query::Dataset;
use super::schema::{normalize_header, IndexLayout, IndustryLayout};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// The primary table with its resolved column layout.
#[derive(Debug, Clone)]
pub struct IndexTable {
    pub layout: IndexLayout,
    pub records: Vec<IndexRecord>,
}

/// Load both sources, join them and build the immutable [`Dataset`].
pub fn load_dataset(index_path: &Path, industry_path: &Path) -> Result<Dataset, LoadError> {
    let started = Instant::now();

    let index = load_index_table(index_path)?;
    let industry = load_industry_table(industry_path)?;
    log::info!(
        "Read {} index rows from {} and {} industry rows from {}",
        index.records.len(),
        index_path.display(),
        industry.len(),
        industry_path.display()
    );

    let records = left_join(index_path, industry_path, &index.layout, index.records, industry)?;
    let dataset = Dataset::new(&index.layout, records);

    log::info!(
        "Dataset ready: {} records, {} companies in {:.2?}",
        dataset.len(),
        dataset.companies().len(),
        started.elapsed()
    );
    Ok(dataset)
}

/// Read the transformation-index table and coerce every fixed field.
pub fn load_index_table(path: &Path) -> Result<IndexTable, LoadError> {
    let table = read_table(path)?;
    let layout = IndexLayout::resolve(path, &table.headers)?;

    let records = table
        .rows
        .iter()
        .map(|row| parse_index_row(path, &table.headers, &layout, row.number, &row.cells))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IndexTable { layout, records })
}

/// Read the industry table, renamed and projected to four fields.
pub fn load_industry_table(path: &Path) -> Result<Vec<IndustryRecord>, LoadError> {
    let table = read_table(path)?;
    let layout = IndustryLayout::resolve(path, &table.headers)?;

    table
        .rows
        .iter()
        .map(|raw| {
            let (row_no, row) = (raw.number, &raw.cells);
            Ok(IndustryRecord {
                code: parse_code(path, &table.headers, layout.code, row_no, row)?,
                year: parse_year(path, &table.headers, layout.year, row_no, row)?,
                industry_code: row[layout.industry_code].to_text(),
                industry_name: row[layout.industry_name].to_text(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Row coercion
// ---------------------------------------------------------------------------

fn invalid(
    path: &Path,
    headers: &[String],
    col: usize,
    row_no: usize,
    cell: &CellValue,
    reason: impl ToString,
) -> LoadError {
    LoadError::InvalidValue {
        path: path.to_path_buf(),
        row: row_no,
        column: headers[col].clone(),
        value: cell.to_field(),
        reason: reason.to_string(),
    }
}

fn parse_code(
    path: &Path,
    headers: &[String],
    col: usize,
    row_no: usize,
    row: &[CellValue],
) -> Result<StockCode, LoadError> {
    StockCode::from_cell(&row[col]).map_err(|e| invalid(path, headers, col, row_no, &row[col], e))
}

fn parse_year(
    path: &Path,
    headers: &[String],
    col: usize,
    row_no: usize,
    row: &[CellValue],
) -> Result<i32, LoadError> {
    let cell = &row[col];
    let bad = |reason: &str| invalid(path, headers, col, row_no, cell, reason);
    match cell.to_i64() {
        Ok(Some(y)) => i32::try_from(y).map_err(|_| bad("year out of range")),
        Ok(None) => Err(bad("year is empty")),
        Err(reason) => Err(bad(reason)),
    }
}

fn parse_index_row(
    path: &Path,
    headers: &[String],
    layout: &IndexLayout,
    row_no: usize,
    row: &[CellValue],
) -> Result<IndexRecord, LoadError> {
    let mut record = IndexRecord {
        code: parse_code(path, headers, layout.code, row_no, row)?,
        name: row[layout.name].to_text().unwrap_or_default(),
        year: parse_year(path, headers, layout.year, row_no, row)?,
        index: None,
        technology: None,
        application: None,
        total_words: None,
        ai_words: None,
        big_data_words: None,
        cloud_words: None,
        extras: BTreeMap::new(),
    };

    for &(metric, col) in &layout.metrics {
        let cell = &row[col];
        let bad = |reason: &'static str| invalid(path, headers, col, row_no, cell, reason);
        match metric {
            Metric::TransformationIndex => record.index = cell.to_f64().map_err(bad)?,
            Metric::TechnologyDimension => record.technology = cell.to_f64().map_err(bad)?,
            Metric::ApplicationDimension => record.application = cell.to_f64().map_err(bad)?,
            Metric::TotalWords => record.total_words = cell.to_i64().map_err(bad)?,
            Metric::AiWords => record.ai_words = cell.to_i64().map_err(bad)?,
            Metric::BigDataWords => record.big_data_words = cell.to_i64().map_err(bad)?,
            Metric::CloudWords => record.cloud_words = cell.to_i64().map_err(bad)?,
        }
    }

    for (header, col) in &layout.extras {
        record.extras.insert(header.clone(), row[*col].clone());
    }

    Ok(record)
}

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

/// Rectangular cell grid with normalized headers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// A non-blank data row and its 1-based position among the data rows of
/// the source, blank rows included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<CellValue>,
}

impl RawTable {
    /// Normalize headers, name blank ones `Unnamed:N`,
    /// pad short rows with nulls and drop rows that are entirely blank.
    fn new(raw_headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let headers: Vec<String> = raw_headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = normalize_header(h);
                if h.is_empty() {
                    format!("Unnamed:{i}")
                } else {
                    h
                }
            })
            .collect();

        let width = headers.len();
        let rows = rows
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|c| !c.is_null()))
            .map(|(i, mut cells)| {
                cells.resize(width, CellValue::Null);
                RawRow {
                    number: i + 1,
                    cells,
                }
            })
            .collect();

        RawTable { headers, rows }
    }
}

/// Read a source table. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first worksheet, header in row 1
/// * `.csv`     – header row, comma separated
/// * `.parquet` – flat primitive columns
/// * `.json`    – `[{ "股票代码": 1, "年份": 2000, ... }, ...]`
pub fn read_table(path: &Path) -> Result<RawTable, LoadError> {
    if !path.is_file() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path),
        "csv" => read_csv(path),
        "parquet" | "pq" => read_parquet(path),
        "json" => read_json(path),
        other => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path) -> Result<RawTable, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::unreadable(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::unreadable(path, "workbook has no worksheets"))?
        .map_err(|e| LoadError::unreadable(path, e))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let body = rows
        .map(|row| row.iter().map(excel_to_cell).collect())
        .collect();

    Ok(RawTable::new(headers, body))
}

fn excel_to_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.trim().to_string()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::unreadable(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| LoadError::unreadable(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| LoadError::unreadable(path, format!("CSV row {}: {e}", row_no + 1)))?;
        rows.push(record.iter().map(CellValue::from_field).collect());
    }

    Ok(RawTable::new(headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON: an array of flat objects.
fn read_json(path: &Path) -> Result<RawTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::unreadable(path, e))?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|e| LoadError::unreadable(path, e))?;

    let records = root
        .as_array()
        .ok_or_else(|| LoadError::unreadable(path, "expected top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| {
            LoadError::unreadable(path, format!("row {} is not a JSON object", i + 1))
        })?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable::new(headers, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

fn read_parquet(path: &Path) -> Result<RawTable, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::unreadable(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| LoadError::unreadable(path, e))?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(|e| LoadError::unreadable(path, e))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|e| LoadError::unreadable(path, e))?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| arrow_to_cell(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawTable::new(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_to_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => match i64::try_from(col.as_primitive::<UInt64Type>().value(row)) {
            Ok(v) => CellValue::Integer(v),
            Err(_) => CellValue::Float(col.as_primitive::<UInt64Type>().value(row) as f64),
        },
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => {
            log::debug!("Unsupported parquet column type {other:?}; reading as null");
            CellValue::Null
        }
    }
}
