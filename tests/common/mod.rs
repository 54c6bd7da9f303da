#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes an `.xlsx` workbook; cells that parse as numbers are stored as
    /// numbers, empty strings are left blank.
    pub fn write_workbook(&self, name: &str, sheets: &[FixtureSheet<'_>]) -> PathBuf {
        let path = self.join(name);
        let mut workbook = Workbook::new();
        for sheet in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(sheet.name).expect("sheet name");
            for (row_idx, row) in sheet.rows.iter().enumerate() {
                for (col_idx, cell) in row.iter().enumerate() {
                    let (row_num, col_num) = (row_idx as u32, col_idx as u16);
                    if cell.is_empty() {
                        continue;
                    }
                    match cell.parse::<f64>() {
                        Ok(number) => worksheet.write_number(row_num, col_num, number),
                        Err(_) => worksheet.write_string(row_num, col_num, *cell),
                    }
                    .expect("write cell");
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }
}

/// One sheet of a fixture workbook: raw rows, header included.
pub struct FixtureSheet<'a> {
    pub name: &'a str,
    pub rows: &'a [&'a [&'a str]],
}

pub fn sheet<'a>(name: &'a str, rows: &'a [&'a [&'a str]]) -> FixtureSheet<'a> {
    FixtureSheet { name, rows }
}

/// Reads every sheet of a report back as text rows, header first.
pub fn read_report(path: &Path) -> Vec<(String, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path).expect("open report");
    let names = workbook.sheet_names();
    names
        .into_iter()
        .map(|name| {
            let range = workbook.worksheet_range(&name).expect("sheet range");
            let rows = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect();
            (name, rows)
        })
        .collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 => format!("{}", *value as i64),
        other => other.to_string(),
    }
}
