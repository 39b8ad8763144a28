//! Spreadsheet access. The first worksheet of an `.xlsx` file is loaded into a
//! [`Table`]; everything downstream works on typed records parsed from it.

pub mod records;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use std::path::Path;

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Cell {
    /// Trimmed text, `None` for empty or whitespace-only cells.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Cell::Empty => return None,
            Cell::Text(s) => s.trim().to_string(),
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn as_id(&self) -> Result<Option<i64>, String> {
        match self {
            Cell::Int(i) => Ok(Some(*i)),
            Cell::Float(f) if f.fract() == 0.0 => Ok(Some(*f as i64)),
            Cell::Empty => Ok(None),
            other => match other.as_text() {
                None => Ok(None),
                Some(text) => text
                    .parse::<i64>()
                    .map(Some)
                    .or_else(|_| match text.parse::<f64>() {
                        Ok(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                        _ => Err(format!("'{text}' is not a whole number")),
                    }),
            },
        }
    }

    pub fn as_bool(&self) -> Result<Option<bool>, String> {
        match self {
            Cell::Bool(b) => Ok(Some(*b)),
            Cell::Int(0) => Ok(Some(false)),
            Cell::Int(1) => Ok(Some(true)),
            Cell::Float(f) if *f == 0.0 => Ok(Some(false)),
            Cell::Float(f) if *f == 1.0 => Ok(Some(true)),
            other => match other.as_text() {
                None => Ok(None),
                Some(text) => match text.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" => Ok(Some(true)),
                    "false" | "no" | "n" | "0" => Ok(Some(false)),
                    _ => Err(format!("'{text}' is not a boolean")),
                },
            },
        }
    }

    /// Native dates and strings of 10+ characters become `YYYY-MM-DD`;
    /// anything else is passed through as text.
    pub fn as_date_text(&self) -> Option<String> {
        match self {
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Text(s) if s.trim().chars().count() >= 10 => {
                Some(s.trim().chars().take(10).collect())
            }
            other => other.as_text(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) => Cell::Float(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(datetime) => Cell::Date(datetime.date()),
                None => Cell::Float(dt.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl From<Option<i64>> for Cell {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Cell::Empty, Cell::Int)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

static EMPTY: Cell = Cell::Empty;

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Fails with every missing column name at once.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), SyncError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| self.column(name).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Dataset(format!(
                "missing required columns: {}",
                missing.join(", ")
            )))
        }
    }

    /// Cell by row index and column name. Absent columns and short rows read as empty.
    pub fn cell(&self, row: usize, name: &str) -> &Cell {
        self.column(name)
            .and_then(|col| self.rows.get(row)?.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn row_is_blank(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |cells| cells.iter().all(Cell::is_empty))
    }

    /// Overwrite column `name`, appending it if absent. `values` are
    /// `(row index, cell)` pairs; rows without a value are left empty.
    pub fn set_column(&mut self, name: &str, values: impl IntoIterator<Item = (usize, Cell)>) {
        let col = match self.column(name) {
            Some(col) => col,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        for row in &mut self.rows {
            if row.len() <= col {
                row.resize(col + 1, Cell::Empty);
            }
            row[col] = Cell::Empty;
        }
        for (idx, cell) in values {
            if let Some(row) = self.rows.get_mut(idx) {
                row[col] = cell;
            }
        }
    }
}

pub fn read_table(path: &Path) -> Result<Table, SyncError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SyncError::Dataset(format!("cannot open {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SyncError::Dataset(format!("{} has no worksheets", path.display())))?
        .map_err(|e| SyncError::Dataset(format!("cannot read {}: {e}", path.display())))?;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|cells| {
            cells
                .iter()
                .map(|c| Cell::from(c).as_text().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows.map(|cells| cells.iter().map(Cell::from).collect()).collect();

    Ok(Table { headers, rows })
}

fn xlsx_error(path: &Path) -> impl Fn(XlsxError) -> SyncError + '_ {
    move |e| SyncError::Dataset(format!("cannot write {}: {e}", path.display()))
}

fn excel_date(date: &NaiveDate) -> Result<ExcelDateTime, XlsxError> {
    let year = u16::try_from(date.year())
        .map_err(|_| XlsxError::DateTimeRangeError(date.to_string()))?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8)
}

/// Rewrite `path` with the full table contents. Date cells stay dates.
pub fn write_table(path: &Path, table: &Table) -> Result<(), SyncError> {
    let err = xlsx_error(path);
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, header).map_err(&err)?;
    }
    for (idx, cells) in table.rows.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row, col, s).map_err(&err)?;
                }
                Cell::Int(i) => {
                    sheet.write_number(row, col, *i as f64).map_err(&err)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(row, col, *f).map_err(&err)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row, col, *b).map_err(&err)?;
                }
                Cell::Date(d) => {
                    let date = excel_date(d).map_err(&err)?;
                    sheet
                        .write_datetime_with_format(row, col, &date, &date_format)
                        .map_err(&err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(&err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_blank_is_none() {
        assert_eq!(Cell::Text("  jdoe ".into()).as_text().as_deref(), Some("jdoe"));
        assert_eq!(Cell::Text("   ".into()).as_text(), None);
        assert_eq!(Cell::Float(12.0).as_text().as_deref(), Some("12"));
    }

    #[test]
    fn ids_from_numbers_and_text() {
        assert_eq!(Cell::Float(3.0).as_id(), Ok(Some(3)));
        assert_eq!(Cell::Int(4).as_id(), Ok(Some(4)));
        assert_eq!(Cell::Text(" 5 ".into()).as_id(), Ok(Some(5)));
        assert_eq!(Cell::Text("6.0".into()).as_id(), Ok(Some(6)));
        assert_eq!(Cell::Empty.as_id(), Ok(None));
        assert!(Cell::Text("abc".into()).as_id().is_err());
        assert!(Cell::Float(2.5).as_id().is_err());
    }

    #[test]
    fn booleans() {
        assert_eq!(Cell::Bool(true).as_bool(), Ok(Some(true)));
        assert_eq!(Cell::Text("FALSE".into()).as_bool(), Ok(Some(false)));
        assert_eq!(Cell::Int(1).as_bool(), Ok(Some(true)));
        assert_eq!(Cell::Empty.as_bool(), Ok(None));
        assert!(Cell::Text("maybe".into()).as_bool().is_err());
    }

    #[test]
    fn date_cells() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(Cell::Date(d).as_date_text().as_deref(), Some("2024-01-05"));
        assert_eq!(
            Cell::Text("2024-01-05 00:00:00".into()).as_date_text().as_deref(),
            Some("2024-01-05")
        );
        assert_eq!(Cell::Text("tomorrow".into()).as_date_text().as_deref(), Some("tomorrow"));
    }

    #[test]
    fn missing_columns_listed_together() {
        let table = Table::new(&["login", "email"]);
        let err = table
            .require_columns(&["login", "email", "firstName", "lastName"])
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::Dataset("missing required columns: firstName, lastName".into())
        );
    }

    #[test]
    fn set_column_overwrites_and_appends() {
        let mut table = Table::new(&["subject", "work_package_id"]);
        table.rows.push(vec![Cell::Text("a".into()), Cell::Int(99)]);
        table.rows.push(vec![Cell::Text("b".into())]);

        table.set_column("work_package_id", [(1, Cell::Int(7))]);
        table.set_column("lock_version", [(0, Cell::Int(0)), (1, Cell::Int(3))]);

        assert_eq!(table.headers, vec!["subject", "work_package_id", "lock_version"]);
        assert_eq!(table.cell(0, "work_package_id"), &Cell::Empty);
        assert_eq!(table.cell(1, "work_package_id"), &Cell::Int(7));
        assert_eq!(table.cell(1, "lock_version"), &Cell::Int(3));
        assert_eq!(table.cell(0, "subject"), &Cell::Text("a".into()));
    }

    #[test]
    fn unknown_column_reads_empty() {
        let mut table = Table::new(&["a"]);
        table.rows.push(vec![Cell::Int(1)]);
        assert_eq!(table.cell(0, "b"), &Cell::Empty);
        assert_eq!(table.cell(5, "a"), &Cell::Empty);
    }

    #[test]
    fn xlsx_file_round_trip_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wp.xlsx");

        let mut table = Table::new(&["subject", "project_id", "start_date"]);
        table.rows.push(vec![
            Cell::Text("first".into()),
            Cell::Int(2),
            Cell::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ]);
        table.rows.push(vec![Cell::Text("second".into()), Cell::Int(3), Cell::Empty]);
        write_table(&path, &table).unwrap();

        let read = read_table(&path).unwrap();
        assert_eq!(read.headers, table.headers);
        assert_eq!(read.rows.len(), 2);
        assert_eq!(read.cell(0, "subject").as_text().as_deref(), Some("first"));
        assert_eq!(read.cell(1, "subject").as_text().as_deref(), Some("second"));
        assert_eq!(read.cell(1, "project_id").as_id(), Ok(Some(3)));
        assert_eq!(read.cell(0, "start_date").as_date_text().as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn date_cells_are_written_as_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");
        let due = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();

        let mut table = Table::new(&["due_date"]);
        table.rows.push(vec![Cell::Date(due)]);
        write_table(&path, &table).unwrap();

        let read = read_table(&path).unwrap();
        assert_eq!(read.cell(0, "due_date"), &Cell::Date(due));
    }

    #[test]
    fn unreadable_file_is_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(&dir.path().join("missing.xlsx")).unwrap_err();
        assert!(matches!(err, SyncError::Dataset(_)));
    }
}
