//! CSV decoding into a raw, untyped table.
//!
//! Handles encoding detection and delimiter selection. No knowledge of the
//! sales schema lives here; see [`crate::validation`] for that.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};

/// Delimiter used by the dashboard's upload format.
pub const DEFAULT_DELIMITER: char = ';';

/// One data row with the file line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<String>,
}

/// Parsed CSV: headers, string cells and decode metadata.
///
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

impl RawTable {
    /// Position of a header (first match, case-sensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All values of one column, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.cells[idx].as_str()))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First `limit` rows as header → value objects.
    pub fn preview(&self, limit: usize) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                self.headers
                    .iter()
                    .zip(&row.cells)
                    .map(|(h, v)| (h.clone(), Value::String(v.clone())))
                    .collect()
            })
            .collect()
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding label.
///
/// A leading byte-order mark is dropped so it cannot leak into the first header.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let mut decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match String::from_utf8(bytes.to_vec()) {
            Ok(s) => s,
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        // encoding_rs maps the latin-1 labels onto windows-1252, a superset
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => {
                let (text, _, had_errors) = enc.decode(bytes);
                if had_errors {
                    return Err(CsvError::Encoding(format!(
                        "content is not valid {}",
                        enc.name()
                    )));
                }
                text.into_owned()
            }
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    if decoded.starts_with('\u{feff}') {
        decoded.remove(0);
    }
    Ok(decoded)
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = DEFAULT_DELIMITER;
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Cells and headers are kept verbatim, surrounding spaces included.
/// Blank rows are skipped, short rows padded with empty cells and
/// surplus cells dropped. A header-only input yields zero rows.
///
/// # Example
/// ```ignore
/// use kpiboard::parser::parse_str;
///
/// let table = parse_str("Region;Sales\nNorth;10", ';', "utf-8")?;
/// assert_eq!(table.headers, vec!["Region", "Sales"]);
/// assert_eq!(table.rows[0].cells, vec!["North", "10"]);
/// ```
pub fn parse_str(content: &str, delimiter: char, encoding: impl Into<String>) -> CsvResult<RawTable> {
    if !delimiter.is_ascii() {
        return Err(CsvError::Parse {
            line: 1,
            message: format!("delimiter '{}' is not a single-byte character", delimiter),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| to_parse_error(&e, 1))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::EmptyFile);
    }

    let mut lines = LineTracker::new(content.as_bytes());
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| to_parse_error(&e, 0))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let line = record
            .position()
            .map(|p| lines.line_at(p.byte() as usize))
            .unwrap_or(0);
        let cells = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect();

        rows.push(RawRow { line, cells });
    }

    Ok(RawTable {
        headers,
        rows,
        encoding: encoding.into(),
        delimiter,
    })
}

/// Parse CSV bytes: detect the encoding, then split with `delimiter`,
/// or with a detected delimiter when `None`.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> CsvResult<RawTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_str(&content, delimiter, encoding)
}

/// Parse a CSV file from disk. See [`parse_bytes`].
pub fn parse_file<P: AsRef<Path>>(path: P, delimiter: Option<char>) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}

/// Maps record byte offsets to 1-based file lines.
///
/// The csv reader skips blank lines without counting them and reports a
/// record's position from where it started looking, so terminators at the
/// offset are stepped over before counting. Offsets must be non-decreasing.
struct LineTracker<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineTracker<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, byte: usize) -> usize {
        let mut start = byte.clamp(self.offset, self.bytes.len());
        while start < self.bytes.len() && matches!(self.bytes[start], b'\r' | b'\n') {
            start += 1;
        }
        self.line += self.bytes[self.offset..start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.offset = start;
        self.line
    }
}

fn to_parse_error(err: &csv::Error, fallback_line: usize) -> CsvError {
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(fallback_line);
    CsvError::Parse {
        line,
        message: err.to_string(),
    }
}
