//! Spreadsheet helpers: text/JSON → grid → XLSX, and XLSX → CSV.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::Value;
use std::io::Cursor;
use tracing::debug;

static RE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());
static RE_FIELD_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t,]+").unwrap());

/// Name of the single worksheet written by [`write_xlsx`].
pub const SHEET_NAME: &str = "Sheet1";

#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error(transparent)]
    Write(#[from] XlsxError),
    #[error(transparent)]
    Read(#[from] calamine::Error),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("CSV output is not UTF-8")]
    Utf8,
}

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl Cell {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            Value::String(s) => Cell::Text(s.clone()),
            nested => Cell::Text(nested.to_string()),
        }
    }
}

pub type Grid = Vec<Vec<Cell>>;

/// Interpret `input` as a grid.
///
/// A JSON array yields one row per element: arrays give their elements,
/// objects their values in key order, scalars a single cell. Anything else
/// (including invalid JSON) is read as delimited text: one row per
/// non-empty line, cells split on runs of tabs or commas.
pub fn parse_grid(input: &str) -> Grid {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Array(items)) => items.iter().map(json_row).collect(),
        _ => delimited_rows(input),
    }
}

fn json_row(item: &Value) -> Vec<Cell> {
    match item {
        Value::Array(cells) => cells.iter().map(Cell::from_json).collect(),
        Value::Object(map) => map.values().map(Cell::from_json).collect(),
        scalar => vec![Cell::from_json(scalar)],
    }
}

fn delimited_rows(input: &str) -> Grid {
    RE_LINE
        .split(input)
        .filter(|line| !line.is_empty())
        .map(|line| {
            RE_FIELD_SEP
                .split(line)
                .map(|field| Cell::Text(field.to_string()))
                .collect()
        })
        .collect()
}

/// Write `grid` as a single-sheet workbook.
pub fn write_xlsx(grid: &Grid) -> Result<Vec<u8>, SheetError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (r, row) in grid.iter().enumerate() {
        let r = u32::try_from(r).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (c, cell) in row.iter().enumerate() {
            let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Cell::Empty => {}
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!("XLSX written: {} rows, {} bytes", grid.len(), bytes.len());
    Ok(bytes)
}

/// Render the first worksheet of a workbook as CSV.
pub fn first_sheet_csv(bytes: &[u8]) -> Result<String, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook.worksheet_range(&name)?;
    debug!("Reading sheet '{}' ({:?})", name, range.get_size());

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    for row in range.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }
    let out = writer
        .into_inner()
        .map_err(|e| SheetError::Csv(e.into_error().into()))?;
    String::from_utf8(out).map_err(|_| SheetError::Utf8)
}

/// Number of worksheets in a workbook.
pub fn sheet_count(bytes: &[u8]) -> Result<usize, SheetError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    Ok(workbook.sheet_names().len())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_arrays() {
        let grid = parse_grid(r#"[["a", 1], [true, null]]"#);
        assert_eq!(
            grid,
            vec![
                vec![Cell::Text("a".into()), Cell::Number(1.0)],
                vec![Cell::Bool(true), Cell::Empty],
            ]
        );
    }

    #[test]
    fn array_of_objects_keeps_key_order() {
        let grid = parse_grid(r#"[{"z": "last?", "a": 2}]"#);
        assert_eq!(grid[0], vec![Cell::Text("last?".into()), Cell::Number(2.0)]);
    }

    #[test]
    fn empty_array_is_empty_sheet() {
        assert!(parse_grid("[]").is_empty());
    }

    #[test]
    fn non_array_json_falls_back_to_lines() {
        let grid = parse_grid("{\"a\":1}");
        assert_eq!(grid, vec![vec![Cell::Text("{\"a\":1}".into())]]);
    }

    #[test]
    fn delimited_text() {
        let grid = parse_grid("a,b\tc\r\n\n  \nd,,e\n");
        let texts: Vec<Vec<String>> = grid
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| match c {
                        Cell::Text(s) => s.clone(),
                        other => panic!("unexpected {other:?}"),
                    })
                    .collect()
            })
            .collect();
        assert_eq!(texts, vec![vec!["a", "b", "c"], vec!["  "], vec!["d", "e"]]);
    }

    #[test]
    fn xlsx_reads_back_as_csv() {
        let grid = parse_grid(r#"[["name", "qty"], ["bolt, hex", 12], ["nut", 3.5]]"#);
        let bytes = write_xlsx(&grid).unwrap();
        assert!(bytes.starts_with(b"PK"));
        let csv = first_sheet_csv(&bytes).unwrap();
        assert_eq!(csv, "name,qty\n\"bolt, hex\",12\nnut,3.5\n");
    }

    #[test]
    fn empty_grid_writes_valid_workbook() {
        let bytes = write_xlsx(&Vec::new()).unwrap();
        assert_eq!(first_sheet_csv(&bytes).unwrap(), "");
        assert_eq!(sheet_count(&bytes).unwrap(), 1);
    }

    #[test]
    fn garbage_is_not_a_workbook() {
        assert!(first_sheet_csv(b"nope").is_err());
    }
}
