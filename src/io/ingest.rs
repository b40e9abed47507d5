//! CSV ingest of uploaded sales history.
//!
//! This module turns an uploaded CSV into `SalesRecord`s. It deliberately does
//! very little:
//! - header names are matched case-insensitively (BOM stripped)
//! - rows with a missing or falsy required cell are dropped and counted
//! - a malformed file yields an empty or partial record set, never a rejection
//!
//! Date and quantity interpretation happen in `features`.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::SalesRecord;
use crate::error::AppError;

pub const COL_SALES_DATE: &str = "sales_date";
pub const COL_PRODUCT: &str = "product_description";
pub const COL_QUANTITY: &str = "quantity_sold";

const REQUIRED_COLUMNS: [&str; 3] = [COL_SALES_DATE, COL_PRODUCT, COL_QUANTITY];

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: surviving records + row diagnostics.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    pub records: Vec<SalesRecord>,
    pub row_errors: Vec<RowError>,
    /// Required columns absent from the header row.
    pub missing_columns: Vec<String>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }

    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.records.len()
    }
}

/// Read the selected file (if any) and hand the filtered records to `handoff`.
///
/// No selection is a silent no-op. Only failing to open the chosen file is an
/// error; anything wrong with its contents is reported through the diagnostics
/// in `IngestedData`.
pub fn process_file<F>(path: Option<&Path>, handoff: F) -> Result<(), AppError>
where
    F: FnOnce(IngestedData),
{
    let Some(path) = path else {
        debug!("process requested with no file selected");
        return Ok(());
    };

    let data = load_sales_csv(path)?;
    handoff(data);
    Ok(())
}

/// Open and ingest a CSV file.
pub fn load_sales_csv(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let data = ingest_reader(file);
    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        rows_used = data.rows_used(),
        "ingested sales csv"
    );
    Ok(data)
}

/// Ingest CSV text from any reader.
pub fn ingest_reader<R: Read>(reader: R) -> IngestedData {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut data = IngestedData::default();

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("failed to read CSV headers: {e}");
            data.row_errors.push(RowError {
                line: 1,
                message: format!("Failed to read CSV headers: {e}"),
            });
            return data;
        }
    };

    let header_map = build_header_map(&headers);
    data.missing_columns = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !header_map.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !data.missing_columns.is_empty() {
        warn!(missing = ?data.missing_columns, "CSV is missing required columns; every row will be dropped");
    }

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;
        data.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                data.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => data.records.push(row),
            Err(message) => data.row_errors.push(RowError { line, message }),
        }
    }

    if data.records.is_empty() && data.rows_read > 0 {
        warn!(rows_read = data.rows_read, "no rows survived the required-field filter");
    }

    data
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<SalesRecord, String> {
    Ok(SalesRecord {
        sales_date: get_required(record, header_map, COL_SALES_DATE)?.to_string(),
        product_description: get_required(record, header_map, COL_PRODUCT)?.to_string(),
        quantity_sold: get_required(record, header_map, COL_QUANTITY)?.to_string(),
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !is_falsy(s))
        .ok_or_else(|| format!("Missing or empty value: `{name}`"))
}

/// Whether a cell counts as absent once numeric/boolean coercion is applied.
///
/// Numeric cells equal to zero are falsy, so a `quantity_sold` of `0` drops the
/// row here rather than becoming a zero training target. The literal spellings
/// `undefined`, `null` and `NaN` are what spreadsheet and script exports write for
/// a missing value, so they are treated as missing too.
pub fn is_falsy(cell: &str) -> bool {
    let cell = cell.trim();
    if cell.is_empty() {
        return true;
    }
    if ["false", "null", "undefined", "nan"]
        .iter()
        .any(|v| cell.eq_ignore_ascii_case(v))
    {
        return true;
    }
    matches!(cell.parse::<f64>(), Ok(v) if v == 0.0)
}
