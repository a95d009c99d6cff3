//! Daily spreadsheet storage
//!
//! Every append is a full read-modify-write of the day's workbook. That is
//! O(rows) per append, which caps this design at small daily volumes (a few
//! thousand rows). The rewrite goes through [`atomic_write`] so a crash
//! leaves either the previous or the new workbook on disk.
//!
//! Reading is loss-tolerant: a workbook that cannot be parsed is logged and
//! treated as absent, so the append path stays available at the cost of the
//! unreadable content.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, warn};

use super::error::StoreResult;
use super::layout::StoreLayout;
use crate::types::{FieldSet, Record};
use crate::utils::atomic_write;

const SHEET_NAME: &str = "Sheet1";

/// Spreadsheet number format for literal text
const TEXT_FORMAT: &str = "@";

/// Longest text a cell can hold, in characters
const MAX_CELL_CHARS: usize = 32_767;

/// Outcome of one append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Daily file name the record went into
    pub file: String,
    /// Rows in the file after the append
    pub row_count: usize,
}

/// Reads and writes the daily file
pub struct TabularStore {
    layout: StoreLayout,
    fields: FieldSet,
}

impl TabularStore {
    pub fn new(layout: StoreLayout, fields: FieldSet) -> Self {
        Self { layout, fields }
    }

    pub fn daily_name(&self, date: NaiveDate) -> String {
        self.layout.daily_name(date)
    }

    pub fn daily_path(&self, date: NaiveDate) -> std::path::PathBuf {
        self.layout.daily_path(date)
    }

    /// Append `record` to the daily file for `date`
    ///
    /// The existing rows are projected onto the field set: unknown columns
    /// are dropped and missing ones come back as empty strings.
    pub fn append(&self, date: NaiveDate, record: &Record) -> StoreResult<AppendOutcome> {
        let file = self.daily_name(date);
        let path = self.daily_path(date);

        let mut row = record.project(&self.fields);
        for (name, value) in self.fields.names().iter().zip(row.iter_mut()) {
            fit_cell(name, value);
        }

        let mut rows = self.load(&path);
        rows.push(row);

        let bytes = self.encode(&rows)?;
        atomic_write(&path, &bytes)?;

        debug!(file = %file, rows = rows.len(), "Appended record");

        Ok(AppendOutcome {
            file,
            row_count: rows.len(),
        })
    }

    /// Rows of the workbook at `path`, in field set order
    ///
    /// Missing or unreadable files yield an empty table.
    pub fn load(&self, path: &Path) -> Vec<Vec<String>> {
        if !path.exists() {
            return Vec::new();
        }

        match self.read_rows(path) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Daily file unreadable, starting a fresh table"
                );
                Vec::new()
            }
        }
    }

    fn read_rows(&self, path: &Path) -> Result<Vec<Vec<String>>, calamine::Error> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(calamine::Error::Msg("workbook has no worksheets"))??;

        let mut rows = range.rows();
        let header: Vec<String> = match rows.next() {
            Some(cells) => cells.iter().map(cell_text).collect(),
            None => return Ok(Vec::new()),
        };

        // Column index in the file for each field, by header name
        let columns: Vec<Option<usize>> = self
            .fields
            .names()
            .iter()
            .map(|name| header.iter().position(|h| h == name))
            .collect();

        Ok(rows
            .map(|cells| {
                columns
                    .iter()
                    .map(|col| {
                        col.and_then(|i| cells.get(i))
                            .map(cell_text)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect())
    }

    /// Encode a header row plus `rows` as an xlsx workbook
    ///
    /// Every cell is written as a string. The identifier column also carries
    /// the text number format so spreadsheet apps keep leading zeros.
    fn encode(&self, rows: &[Vec<String>]) -> StoreResult<Vec<u8>> {
        let mut workbook = Workbook::new();
        let text = Format::new().set_num_format(TEXT_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;
        worksheet.set_column_format(0, &text)?;

        for (col, name) in self.fields.names().iter().enumerate() {
            worksheet.write_string(0, col as u16, name.as_str())?;
        }

        for (i, row) in rows.iter().enumerate() {
            let r = (i + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                if col == 0 {
                    worksheet.write_string_with_format(r, 0, value.as_str(), &text)?;
                } else {
                    worksheet.write_string(r, col as u16, value.as_str())?;
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Cut `value` to the cell limit, keeping whole characters
fn fit_cell(field: &str, value: &mut String) {
    if let Some((cut, _)) = value.char_indices().nth(MAX_CELL_CHARS) {
        warn!(
            field = %field,
            chars = value.chars().count(),
            "Value exceeds the cell limit, truncating to {} characters",
            MAX_CELL_CHARS
        );
        value.truncate(cut);
    }
}

/// Text of a cell as stored
///
/// Whole floats from legacy numeric cells are printed without a fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_store() -> (TabularStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path());
        (TabularStore::new(layout, FieldSet::default()), temp_dir)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn record(voucher: &str, box_: &str, site: &str) -> Record {
        Record::new()
            .with("voucher", voucher)
            .with("box", box_)
            .with("site", site)
    }

    #[test]
    fn test_append_counts_rows_in_order() {
        let (store, _temp_dir) = create_test_store();

        let first = store.append(day(), &record("A1", "B", "S")).unwrap();
        let second = store.append(day(), &record("A2", "B2", "S2")).unwrap();

        assert_eq!(first.row_count, 1);
        assert_eq!(second.row_count, 2);
        assert_eq!(second.file, "delivery_requests_20240520.xlsx");

        let rows = store.load(&store.daily_path(day()));
        assert_eq!(
            rows,
            vec![vec!["A1", "B", "S"], vec!["A2", "B2", "S2"]]
        );
    }

    #[test]
    fn test_identifier_keeps_leading_zeros() {
        let (store, _temp_dir) = create_test_store();

        store.append(day(), &record("00012", "", "")).unwrap();
        store.append(day(), &record("0001234567890123456", "", "")).unwrap();

        let rows = store.load(&store.daily_path(day()));
        assert_eq!(rows[0][0], "00012");
        assert_eq!(rows[1][0], "0001234567890123456");
    }

    #[test]
    fn test_identifier_is_a_string_cell() {
        let (store, _temp_dir) = create_test_store();
        store.append(day(), &record("42", "", "")).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(store.daily_path(day())).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();

        assert_eq!(range.get((1, 0)), Some(&Data::String("42".to_string())));
    }

    #[test]
    fn test_absent_fields_written_empty() {
        let (store, _temp_dir) = create_test_store();

        store
            .append(day(), &Record::new().with("voucher", "V"))
            .unwrap();

        let rows = store.load(&store.daily_path(day()));
        assert_eq!(rows, vec![vec!["V", "", ""]]);
    }

    #[test]
    fn test_legacy_columns_are_projected() {
        let temp_dir = TempDir::new().unwrap();
        let layout = StoreLayout::new(temp_dir.path());

        // Written by a deployment with a different column set
        let legacy = TabularStore::new(
            layout.clone(),
            FieldSet::new(["voucher", "driver", "box"]).unwrap(),
        );
        legacy
            .append(
                day(),
                &Record::new()
                    .with("voucher", "L1")
                    .with("driver", "Nikos")
                    .with("box", "B9"),
            )
            .unwrap();

        let store = TabularStore::new(layout, FieldSet::default());
        let outcome = store.append(day(), &record("N1", "B1", "S1")).unwrap();

        assert_eq!(outcome.row_count, 2);
        let rows = store.load(&store.daily_path(day()));
        assert_eq!(rows[0], vec!["L1", "B9", ""]);
        assert_eq!(rows[1], vec!["N1", "B1", "S1"]);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let (store, _temp_dir) = create_test_store();
        let path = store.daily_path(day());
        fs::write(&path, b"definitely not a workbook").unwrap();

        let outcome = store.append(day(), &record("A1", "B", "S")).unwrap();

        assert_eq!(outcome.row_count, 1);
        assert_eq!(store.load(&path), vec![vec!["A1", "B", "S"]]);
    }

    #[test]
    fn test_oversized_value_is_truncated() {
        let (store, _temp_dir) = create_test_store();

        let outcome = store
            .append(day(), &record("A1", "B", &"x".repeat(40_000)))
            .unwrap();
        assert_eq!(outcome.row_count, 1);

        let rows = store.load(&store.daily_path(day()));
        assert_eq!(rows[0][0], "A1");
        assert_eq!(rows[0][2].chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn test_fit_cell_keeps_whole_characters() {
        let mut wide = "é".repeat(MAX_CELL_CHARS + 5);
        fit_cell("site", &mut wide);
        assert_eq!(wide.chars().count(), MAX_CELL_CHARS);

        let mut short = "B4".to_string();
        fit_cell("box", &mut short);
        assert_eq!(short, "B4");
    }

    #[test]
    fn test_cell_text_whole_float() {
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
