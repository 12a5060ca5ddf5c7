//! CSV reading and writing with encoding and delimiter auto-detection.
//!
//! Headerless tables are what the grouper writes and the combiner reads;
//! headed tables feed the XBRL assembler. Workbooks live in [`workbook`].

pub mod workbook;

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::error::{TableError, TableResult};
use crate::models::{Row, Table};

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub table: Table,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "iso-8859-15" | "latin-9" | "latin9" => "iso-8859-15".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        // Latin-1 is read as its windows-1252 superset (WHATWG label mapping)
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        "iso-8859-15" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        // UTF-8, ASCII and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
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

/// Read a file and decode it with the detected encoding.
pub fn read_text_auto<P: AsRef<Path>>(path: P) -> TableResult<String> {
    let bytes = std::fs::read(path.as_ref())?;
    let encoding = detect_encoding(&bytes);
    Ok(decode_content(&bytes, &encoding))
}

/// Parse headerless CSV. Every row must have the same number of fields;
/// an input without rows is [`TableError::Empty`].
pub fn parse_headerless(content: &str, delimiter: char) -> TableResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter_byte(delimiter)?)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().collect::<Row>());
    }

    if rows.is_empty() {
        return Err(TableError::Empty);
    }
    Ok(Table::headerless(rows))
}

/// Parse CSV whose first line holds column names. Short rows are allowed and
/// read as empty cells.
pub fn parse_headed(content: &str, delimiter: char) -> TableResult<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter_byte(delimiter)?)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(TableError::Empty);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let row = record?.iter().collect::<Row>();
        if !row.is_blank() {
            rows.push(row);
        }
    }

    Ok(Table::with_headers(headers, rows))
}

/// Parse headed CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> TableResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_headed(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Read a headerless, comma-separated CSV file.
pub fn read_headerless_csv<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let content = read_text_auto(path)?;
    parse_headerless(&content, ',')
}

/// Read a headed CSV file with auto-detection.
pub fn read_headed_csv<P: AsRef<Path>>(path: P) -> TableResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Render a table as comma-separated text; the header line is written only
/// when the table has one.
pub fn to_csv_string(table: &Table) -> TableResult<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    if let Some(ref headers) = table.headers {
        writer.write_record(headers)?;
    }
    for row in &table.rows {
        writer.write_record(&row.cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TableError::Encoding(e.to_string()))
}

/// Write a table as CSV to `path`.
pub fn write_csv<P: AsRef<Path>>(path: P, table: &Table) -> TableResult<()> {
    std::fs::write(path, to_csv_string(table)?)?;
    Ok(())
}

fn delimiter_byte(delimiter: char) -> TableResult<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| TableError::Parse {
            line: 0,
            message: format!("Unsupported delimiter '{}'", delimiter),
        })
}
