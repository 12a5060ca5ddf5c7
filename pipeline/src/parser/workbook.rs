//! XLSX reading (calamine) and writing (rust_xlsxwriter).
//!
//! Cells are read as strings. Column positions are absolute: a sheet whose
//! used range starts at column C still yields the value of column C at
//! index 2.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::{TableError, TableResult};
use crate::models::{Row, Table};

/// Longest sheet name a spreadsheet application accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// A sheet to be written: a name and sparse `(row, col, text)` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetLayout {
    pub name: String,
    pub cells: Vec<(u32, u16, String)>,
}

impl SheetLayout {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn put(&mut self, row: u32, col: u16, value: impl Into<String>) {
        self.cells.push((row, col, value.into()));
    }

    /// Text at a position, if written.
    pub fn get(&self, row: u32, col: u16) -> Option<&str> {
        self.cells
            .iter()
            .rev()
            .find(|(r, c, _)| *r == row && *c == col)
            .map(|(_, _, v)| v.as_str())
    }
}

/// Render a cell the way it is shown in the sheet: whole floats without
/// a fractional part, empty cells as `""`.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Convert a range to headerless rows, skipping the first `skip_rows`
/// sheet rows and rows that are entirely blank.
pub fn range_to_rows(range: &Range<Data>, skip_rows: usize) -> Vec<Row> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    range
        .rows()
        .enumerate()
        .filter(|(i, _)| start_row as usize + i >= skip_rows)
        .map(|(_, cells)| {
            let mut row = vec![String::new(); start_col as usize];
            row.extend(cells.iter().map(cell_to_string));
            Row::new(row)
        })
        .filter(|row| !row.is_blank())
        .collect()
}

/// Read a named sheet as a headerless table.
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet: &str, skip_rows: usize) -> TableResult<Table> {
    let mut workbook = open_workbook_auto(path.as_ref())?;

    if !workbook.sheet_names().iter().any(|s| s == sheet) {
        return Err(TableError::SheetNotFound(sheet.to_string()));
    }
    let range = workbook.worksheet_range(sheet)?;

    Ok(Table::headerless(range_to_rows(&range, skip_rows)))
}

/// Read the first sheet, using its first row as column names.
pub fn read_first_sheet_headed<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| TableError::SheetNotFound("<first sheet>".to_string()))??;

    let mut rows = range_to_rows(&range, 0).into_iter();
    let header = rows.next().ok_or(TableError::Empty)?;
    let headers = header.cells.into_iter().map(|h| h.trim().to_string()).collect();

    Ok(Table::with_headers(headers, rows.collect()))
}

/// Write a table to a single-sheet workbook. Numeric-looking cells are
/// stored as numbers.
pub fn write_table<P: AsRef<Path>>(path: P, sheet_name: &str, table: &Table) -> TableResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let mut row_offset = 0u32;
    if let Some(ref headers) = table.headers {
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string(0, col_num(col)?, header)?;
        }
        row_offset = 1;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let row_num = row_offset + i as u32;
        for (col, value) in row.cells.iter().enumerate() {
            write_cell(worksheet, row_num, col_num(col)?, value)?;
        }
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

/// Write several sheets to one workbook, in order.
pub fn write_sheets<P: AsRef<Path>>(path: P, sheets: &[SheetLayout]) -> TableResult<()> {
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (row, col, value) in &sheet.cells {
            write_cell(worksheet, *row, *col, value)?;
        }
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> TableResult<()> {
    if value.is_empty() {
        return Ok(());
    }
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => {
            worksheet.write_number(row, col, number)?;
        }
        _ => {
            worksheet.write_string(row, col, value)?;
        }
    }
    Ok(())
}

fn col_num(col: usize) -> TableResult<u16> {
    u16::try_from(col).map_err(|_| TableError::Workbook(format!("Column {} out of range", col)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(607317.0)), "607317");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("bd-t:A".into())), "bd-t:A");
    }

    #[test]
    fn test_range_keeps_absolute_columns() {
        // Used range starting at B2
        let mut range = Range::new((1, 1), (3, 2));
        range.set_value((1, 1), Data::String("header".into()));
        range.set_value((2, 1), Data::String("x".into()));
        range.set_value((2, 2), Data::Int(7));
        range.set_value((3, 2), Data::Int(8));

        let rows = range_to_rows(&range, 2);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cell(0), "");
        assert_eq!(rows[0].cell(1), "x");
        assert_eq!(rows[0].cell(2), "7");
        assert_eq!(rows[1].cell(2), "8");
    }

    #[test]
    fn test_layout_get_returns_last_write() {
        let mut sheet = SheetLayout::new("s");
        sheet.put(0, 4, "a");
        sheet.put(0, 4, "b");
        assert_eq!(sheet.get(0, 4), Some("b"));
        assert_eq!(sheet.get(1, 4), None);
    }

    #[test]
    fn test_write_and_read_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut sheet = SheetLayout::new("Processed");
        sheet.put(0, 0, "ignored header");
        sheet.put(1, 2, "607317");
        sheet.put(1, 10, "b");
        write_sheets(&path, &[sheet]).unwrap();

        let table = read_sheet(&path, "Processed", 1).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].cell(2), "607317");
        assert_eq!(table.rows[0].cell(10), "b");

        let missing = read_sheet(&path, "Other", 1);
        assert!(matches!(missing, Err(TableError::SheetNotFound(s)) if s == "Other"));
    }
}
