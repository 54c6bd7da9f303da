//! Table loaders: every input format is exposed as a [`WorkbookSource`], a
//! list of sheet names plus a way to load one sheet as a [`Table`].

use std::{
    collections::HashMap,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    data::{CellValue, from_excel_serial, parse_naive_datetime},
    error::{DiffError, DiffResult},
    io_utils,
    sheet::Table,
};

pub trait WorkbookSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> &[String];

    /// Loads `sheet`, taking the row `header_row` rows below the top as header.
    fn load(&mut self, sheet: &str, header_row: usize) -> DiffResult<Table>;

    fn contains(&self, sheet: &str) -> bool {
        self.sheet_names().iter().any(|name| name == sheet)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

/// Opens `path` with the loader matching its extension.
pub fn open_workbook(path: &Path, options: &LoadOptions) -> DiffResult<Box<dyn WorkbookSource>> {
    if io_utils::is_delimited_path(path) {
        Ok(Box::new(DelimitedSource::open(path, options)?))
    } else {
        Ok(Box::new(SpreadsheetSource::open(path)?))
    }
}

/// Splits raw rows at the header offset and builds the table.
fn table_from_rows(
    name: &str,
    rows: impl Iterator<Item = Vec<CellValue>>,
    header_row: usize,
) -> Table {
    let mut rows = rows.skip(header_row);
    let headers = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|cell| cell.canonical().into_owned())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    Table::new(name, &headers, rows.collect())
}

/// `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` files, read through calamine.
pub struct SpreadsheetSource {
    path: PathBuf,
    names: Vec<String>,
    workbook: Sheets<BufReader<File>>,
}

impl SpreadsheetSource {
    pub fn open(path: &Path) -> DiffResult<Self> {
        let workbook = open_workbook_auto(path).map_err(|err| DiffError::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let names = workbook.sheet_names();
        debug!("Opened {:?} with {} sheet(s)", path, names.len());
        Ok(Self {
            path: path.to_path_buf(),
            names,
            workbook,
        })
    }
}

impl WorkbookSource for SpreadsheetSource {
    fn sheet_names(&self) -> &[String] {
        &self.names
    }

    fn load(&mut self, sheet: &str, header_row: usize) -> DiffResult<Table> {
        if !self.contains(sheet) {
            return Err(DiffError::SheetNotFound {
                sheet: sheet.to_string(),
            });
        }
        let range = self
            .workbook
            .worksheet_range(sheet)
            .map_err(|err| DiffError::Workbook {
                path: self.path.clone(),
                message: format!("sheet '{sheet}': {err}"),
            })?;
        // The range starts at the first used row; restore the rows above it so
        // the header offset counts from the top of the sheet.
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let leading = std::iter::repeat_with(Vec::new).take(first_row);
        let rows = range
            .rows()
            .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>());
        Ok(table_from_rows(sheet, leading.chain(rows), header_row))
    }
}

pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from_text(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            from_excel_serial(serial)
                .map(CellValue::Date)
                .unwrap_or(CellValue::Number(serial))
        }
        Data::DateTimeIso(s) => parse_naive_datetime(s)
            .map(CellValue::Date)
            .unwrap_or_else(|_| CellValue::from_text(s)),
        Data::DurationIso(s) => CellValue::from_text(s),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// A delimited text file, exposed as a workbook with a single sheet named
/// after the file stem.
pub struct DelimitedSource {
    names: Vec<String>,
    records: Vec<Vec<String>>,
}

impl DelimitedSource {
    pub fn open(path: &Path, options: &LoadOptions) -> DiffResult<Self> {
        let file = File::open(path).map_err(|source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
        let mut reader = io_utils::open_csv_reader(BufReader::new(file), delimiter);
        let mut records = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let failed = |message: String| DiffError::Workbook {
                path: path.to_path_buf(),
                message: format!("line {}: {message}", idx + 1),
            };
            let record = record.map_err(|err| failed(err.to_string()))?;
            let decoded = io_utils::decode_record(&record, options.encoding)
                .map_err(|err| failed(err.to_string()))?;
            records.push(decoded);
        }
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Sheet1".to_string());
        Ok(Self {
            names: vec![name],
            records,
        })
    }
}

impl WorkbookSource for DelimitedSource {
    fn sheet_names(&self) -> &[String] {
        &self.names
    }

    fn load(&mut self, sheet: &str, header_row: usize) -> DiffResult<Table> {
        if !self.contains(sheet) {
            return Err(DiffError::SheetNotFound {
                sheet: sheet.to_string(),
            });
        }
        let rows = self.records.iter().map(|record| {
            record
                .iter()
                .map(|field| CellValue::from_text(field))
                .collect::<Vec<_>>()
        });
        Ok(table_from_rows(sheet, rows, header_row))
    }
}

/// Workbook assembled in memory; tables are already parsed, so the header
/// offset passed to [`WorkbookSource::load`] is ignored.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    names: Vec<String>,
    tables: HashMap<String, Table>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, table: Table) -> Self {
        self.add_sheet(table);
        self
    }

    pub fn add_sheet(&mut self, table: Table) {
        let name = table.name().to_string();
        if !self.tables.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.tables.insert(name, table);
    }
}

impl WorkbookSource for InMemoryWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.names
    }

    fn load(&mut self, sheet: &str, _header_row: usize) -> DiffResult<Table> {
        self.tables
            .get(sheet)
            .cloned()
            .ok_or_else(|| DiffError::SheetNotFound {
                sheet: sheet.to_string(),
            })
    }
}
