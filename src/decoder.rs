use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{DecodeError, RejectReason, Result, RosterError};
use crate::models::{CellValue, RawRow};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// A selected file that passed the upload checks and decoded cleanly.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub kind: FileKind,
    pub size: u64,
    pub checksum: String,
    pub rows: Vec<RawRow>,
}

// ---------------------------------------------------------------------------
// Upload checks
// ---------------------------------------------------------------------------

/// Gate a file on extension, then size, before any bytes are decoded.
pub fn accept(path: &Path, size: u64, limit: u64) -> Result<FileKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let kind = FileKind::from_extension(&ext).ok_or_else(|| {
        RosterError::FileRejected(RejectReason::InvalidType {
            extension: ext.to_ascii_lowercase(),
        })
    })?;
    if size > limit {
        return Err(RosterError::FileRejected(RejectReason::TooLarge { size, limit }));
    }
    Ok(kind)
}

pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check, read and decode a file from disk.
pub fn read_upload(path: &Path, limit: u64) -> Result<Upload> {
    let size = std::fs::metadata(path)?.len();
    let kind = accept(path, size, limit)?;
    let bytes = std::fs::read(path)?;
    let rows = decode(&bytes, kind)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    tracing::info!(file = %file_name, rows = rows.len(), "decoded upload");
    Ok(Upload {
        file_name,
        kind,
        size,
        checksum: compute_checksum(&bytes),
        rows,
    })
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode the first sheet into rows keyed by the header row. Fully blank rows
/// are skipped; a sheet with no data rows is an error.
pub fn decode(bytes: &[u8], kind: FileKind) -> Result<Vec<RawRow>> {
    let rows = match kind {
        FileKind::Csv => decode_csv(bytes)?,
        FileKind::Xlsx | FileKind::Xls => decode_workbook(bytes)?,
    };
    if rows.is_empty() {
        return Err(DecodeError::EmptySheet.into());
    }
    Ok(rows)
}

fn unreadable(e: impl std::fmt::Display) -> DecodeError {
    DecodeError::Unreadable(e.to_string())
}

fn build_row(headers: &[String], cells: Vec<CellValue>) -> RawRow {
    let mut row = RawRow::new();
    for (i, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        let value = cells.get(i).cloned().unwrap_or(CellValue::Blank);
        row.insert(header, value);
    }
    row
}

fn text_cell(raw: &str) -> CellValue {
    if raw.trim().is_empty() {
        CellValue::Blank
    } else {
        CellValue::Text(raw.to_string())
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = rdr.records();

    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header
        .map_err(unreadable)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(unreadable)?;
        let row = build_row(&headers, record.iter().map(text_cell).collect());
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn decode_workbook(bytes: &[u8]) -> Result<Vec<RawRow>> {
    use calamine::Reader;

    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor).map_err(unreadable)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DecodeError::NoSheet)?
        .map_err(unreadable)?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header.iter().map(|c| workbook_cell(c).as_text()).collect();

    let mut rows = Vec::new();
    for cells in sheet_rows {
        let row = build_row(&headers, cells.iter().map(workbook_cell).collect());
        if !row.is_blank() {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(not(feature = "xlsx"))]
fn decode_workbook(_bytes: &[u8]) -> Result<Vec<RawRow>> {
    Err(DecodeError::Unreadable("Excel support is not enabled in this build".to_string()).into())
}

#[cfg(feature = "xlsx")]
fn workbook_cell(cell: &calamine::Data) -> CellValue {
    use calamine::Data;
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Blank,
        Data::String(s) => text_cell(s),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => CellValue::Text(date),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
    }
}

pub fn excel_serial_to_date(serial: f64) -> Option<String> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = base.checked_add_signed(chrono::Duration::days(serial as i64))?;
    Some(date.format("%Y-%m-%d").to_string())
}
