use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use thiserror::Error;

use crate::data::Dataset;

/// Errors produced while turning an uploaded byte stream into a [`Dataset`].
///
/// The loader sniffs the format up front and runs exactly one targeted
/// parse, so a corrupt spreadsheet is reported as a spreadsheet error
/// instead of being masked as a CSV failure (or the other way around).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("file is neither valid CSV nor a spreadsheet: {0}")]
    UnparseableFile(String),
    #[error("file contains no data rows")]
    Empty,
    #[error("{0}")]
    Shape(String),
}

/// Caller-declared format, usually taken from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatHint {
    Csv,
    Spreadsheet,
    Unknown,
}

impl FormatHint {
    pub fn from_path(path: &Path) -> FormatHint {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") | Some("tsv") => FormatHint::Csv,
            Some("xlsx") | Some("xls") | Some("xlsm") | Some("xlsb") | Some("ods") => {
                FormatHint::Spreadsheet
            }
            _ => FormatHint::Unknown,
        }
    }
}

// XLSX and ODS are ZIP containers; legacy XLS is an OLE2 compound file.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

fn has_spreadsheet_magic(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC)
}

/// Load a dataset from a file path, sniffing the format from the leading
/// bytes with the extension as a fallback hint.
pub fn load_path(path: &Path) -> Result<Dataset, LoadError> {
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes, FormatHint::from_path(path))
}

/// Load a dataset from raw uploaded bytes.
///
/// Magic bytes win over the hint: a `.csv` that starts with a ZIP header is
/// parsed as a spreadsheet. A declared spreadsheet without a container
/// signature is unparseable rather than silently retried as CSV.
pub fn load_bytes(bytes: &[u8], hint: FormatHint) -> Result<Dataset, LoadError> {
    if bytes.is_empty() {
        return Err(LoadError::Empty);
    }
    if has_spreadsheet_magic(bytes) {
        return load_spreadsheet(bytes);
    }
    if hint == FormatHint::Spreadsheet {
        return Err(LoadError::UnparseableFile(
            "declared as a spreadsheet but carries no ZIP or OLE2 signature".into(),
        ));
    }
    let text = std::str::from_utf8(bytes).map_err(|_| {
        LoadError::UnparseableFile("not valid UTF-8 text and no spreadsheet signature".into())
    })?;
    load_csv(text)
}

fn load_csv(text: &str) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() {
        return Err(LoadError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    Dataset::from_rows(headers, rows).map_err(|e| LoadError::Shape(e.to_string()))
}

fn load_spreadsheet(bytes: &[u8]) -> Result<Dataset, LoadError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(LoadError::Empty)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut row_iter = range.rows();
    let headers: Vec<String> = match row_iter.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Err(LoadError::Empty),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty);
    }

    let mut rows = Vec::new();
    for row in row_iter {
        rows.push(row.iter().map(cell_to_string).collect());
    }
    if rows.is_empty() {
        return Err(LoadError::Empty);
    }

    Dataset::from_rows(headers, rows).map_err(|e| LoadError::Shape(e.to_string()))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnType, Value};

    #[test]
    fn test_load_csv() {
        let csv = "region,sales\nnorth,10\nsouth,20\n";
        let ds = load_bytes(csv.as_bytes(), FormatHint::Csv).unwrap();
        assert_eq!(ds.column_names(), vec!["region", "sales"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column("sales").unwrap().column_type, ColumnType::Numeric);
    }

    #[test]
    fn test_load_csv_without_hint() {
        let csv = "a,b\n1,2\n";
        let ds = load_bytes(csv.as_bytes(), FormatHint::Unknown).unwrap();
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let err = load_bytes(b"a,b\n", FormatHint::Csv).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn test_ragged_csv_is_csv_error() {
        let err = load_bytes(b"a,b\n1,2,3\n", FormatHint::Csv).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)));
    }

    #[test]
    fn test_binary_garbage_is_unparseable() {
        let bytes = [0xFFu8, 0xFE, 0x00, 0x01, 0x99, 0xAB];
        let err = load_bytes(&bytes, FormatHint::Unknown).unwrap_err();
        assert!(matches!(err, LoadError::UnparseableFile(_)));
    }

    #[test]
    fn test_declared_spreadsheet_without_signature_is_unparseable() {
        let err = load_bytes(b"just some text", FormatHint::Spreadsheet).unwrap_err();
        assert!(matches!(err, LoadError::UnparseableFile(_)));
    }

    #[test]
    fn test_zip_magic_routes_to_spreadsheet_parser() {
        // ZIP signature but not an actual workbook: must be reported as a
        // spreadsheet failure, never retried as CSV.
        let mut bytes = Vec::from(*b"PK\x03\x04");
        bytes.extend_from_slice(&[0u8; 32]);
        let err = load_bytes(&bytes, FormatHint::Csv).unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet(_)));
    }

    #[test]
    fn test_load_xlsx_workbook() {
        let ds = load_path(Path::new("tests/data/inventory.xlsx")).unwrap();
        assert_eq!(ds.column_names(), vec!["region", "sales", "units"]);
        assert_eq!(ds.row_count(), 3);
        assert_eq!(ds.column("sales").unwrap().column_type, ColumnType::Numeric);
        assert_eq!(ds.column("region").unwrap().column_type, ColumnType::Text);
        // Whole floats render without a trailing fraction, others keep it.
        assert_eq!(ds.column("sales").unwrap().values[0], Value::Number(10.0));
        assert_eq!(ds.column("sales").unwrap().values[1], Value::Number(20.5));
    }

    #[test]
    fn test_load_xlsx_ignores_extension_hint() {
        // Magic bytes decide: the ZIP signature wins even with a CSV hint.
        let bytes = std::fs::read("tests/data/inventory.xlsx").unwrap();
        let ds = load_bytes(&bytes, FormatHint::Csv).unwrap();
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn test_empty_input() {
        let err = load_bytes(b"", FormatHint::Unknown).unwrap_err();
        assert!(matches!(err, LoadError::Empty));
    }

    #[test]
    fn test_hint_from_path() {
        assert_eq!(
            FormatHint::from_path(Path::new("data.XLSX")),
            FormatHint::Spreadsheet
        );
        assert_eq!(FormatHint::from_path(Path::new("data.csv")), FormatHint::Csv);
        assert_eq!(
            FormatHint::from_path(Path::new("data.bin")),
            FormatHint::Unknown
        );
    }
}
