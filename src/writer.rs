//! Report writer: serialises tagged output tables into an `.xlsx` workbook,
//! one worksheet per reported sheet, each tag mapped to a solid fill.

use std::{collections::HashSet, fs, path::Path};

use log::{debug, info, warn};
use rust_xlsxwriter::{
    Color, Format, FormatPattern, Workbook, Worksheet, XlsxError, utility::row_col_to_cell,
};

use crate::{
    data::{CellValue, to_excel_serial},
    error::{DiffError, DiffResult},
    io_utils,
    report::placeholder_report,
    sheet::{CellTag, OutputTable},
};

const MAX_SHEET_NAME_CHARS: usize = 31;
const MAX_CELL_CHARS: usize = 32_767;
const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 60;
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
pub const EMPTY_REPORT_SHEET: &str = "Comparison";

/// One worksheet of the report.
#[derive(Debug, Clone, Copy)]
pub struct SheetOutput<'a> {
    pub name: &'a str,
    pub table: &'a OutputTable,
}

pub trait ReportSink {
    fn write(&mut self, path: &Path, sheets: &[SheetOutput<'_>]) -> DiffResult<()>;
}

/// Fill colour per tag; `None` leaves the cell unfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPalette {
    pub added: u32,
    pub removed: u32,
    pub changed: u32,
}

impl Default for TagPalette {
    fn default() -> Self {
        Self {
            added: 0xFF0000,
            removed: 0xD3D3D3,
            changed: 0xADD8E6,
        }
    }
}

impl TagPalette {
    pub fn fill(&self, tag: CellTag) -> Option<u32> {
        match tag {
            CellTag::Unchanged => None,
            CellTag::Added => Some(self.added),
            CellTag::Removed => Some(self.removed),
            CellTag::Changed => Some(self.changed),
        }
    }
}

/// Cell formats for one tag: plain, date-only and date-time variants.
struct TagFormats {
    plain: Format,
    date: Format,
    datetime: Format,
}

impl TagFormats {
    fn new(fill: Option<u32>) -> Self {
        let base = match fill {
            Some(rgb) => Format::new()
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(rgb)),
            None => Format::new(),
        };
        Self {
            date: base.clone().set_num_format(DATE_FORMAT),
            datetime: base.clone().set_num_format(DATETIME_FORMAT),
            plain: base,
        }
    }
}

struct FormatSet {
    header: Format,
    unchanged: TagFormats,
    added: TagFormats,
    removed: TagFormats,
    changed: TagFormats,
}

impl FormatSet {
    fn new(palette: &TagPalette) -> Self {
        Self {
            header: Format::new().set_bold(),
            unchanged: TagFormats::new(palette.fill(CellTag::Unchanged)),
            added: TagFormats::new(palette.fill(CellTag::Added)),
            removed: TagFormats::new(palette.fill(CellTag::Removed)),
            changed: TagFormats::new(palette.fill(CellTag::Changed)),
        }
    }

    fn for_tag(&self, tag: CellTag) -> &TagFormats {
        match tag {
            CellTag::Unchanged => &self.unchanged,
            CellTag::Added => &self.added,
            CellTag::Removed => &self.removed,
            CellTag::Changed => &self.changed,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct XlsxReportWriter {
    palette: TagPalette,
}

impl XlsxReportWriter {
    fn render(&self, sheets: &[SheetOutput<'_>]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let formats = FormatSet::new(&self.palette);

        let fallback;
        let sheets = if sheets.is_empty() {
            fallback = placeholder_report("No differences to report");
            vec![SheetOutput {
                name: EMPTY_REPORT_SHEET,
                table: &fallback,
            }]
        } else {
            sheets.to_vec()
        };

        let mut used_names = HashSet::new();
        for sheet in &sheets {
            let name = sanitize_sheet_name(sheet.name, &mut used_names);
            if name != sheet.name {
                debug!("Renamed output sheet '{}' to '{}'", sheet.name, name);
            }
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&name)?;
            write_table(worksheet, &name, sheet.table, &formats)?;
        }
        workbook.save_to_buffer()
    }
}

fn write_table(
    worksheet: &mut Worksheet,
    sheet: &str,
    table: &OutputTable,
    formats: &FormatSet,
) -> Result<(), XlsxError> {
    let mut widths = table
        .columns()
        .iter()
        .map(|c| c.chars().count())
        .collect::<Vec<_>>();
    for (col, name) in table.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &formats.header)?;
    }
    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col_num = col as u16;
            let tag_formats = formats.for_tag(cell.tag);
            match &cell.value {
                CellValue::Empty => {
                    if cell.tag != CellTag::Unchanged {
                        worksheet.write_blank(row_num, col_num, &tag_formats.plain)?;
                    }
                }
                CellValue::Text(text) => {
                    let text = match truncate_cell_text(text) {
                        Some(cut) => {
                            warn!(
                                "Truncated cell {} in sheet '{}' to {} characters",
                                row_col_to_cell(row_num, col_num),
                                sheet,
                                MAX_CELL_CHARS
                            );
                            cut
                        }
                        None => text.as_str(),
                    };
                    worksheet.write_string_with_format(row_num, col_num, text, &tag_formats.plain)?;
                }
                CellValue::Number(number) => {
                    worksheet.write_number_with_format(row_num, col_num, *number, &tag_formats.plain)?;
                }
                CellValue::Date(stamp) => {
                    let serial = to_excel_serial(stamp);
                    let format = if serial.fract() == 0.0 {
                        &tag_formats.date
                    } else {
                        &tag_formats.datetime
                    };
                    worksheet.write_number_with_format(row_num, col_num, serial, format)?;
                }
            }
            if let Some(width) = widths.get_mut(col) {
                *width = (*width).max(cell.value.to_string().chars().count());
            }
        }
    }
    for (col, width) in widths.iter().enumerate() {
        let width = (*width + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, width as f64)?;
    }
    if !table.columns().is_empty() {
        worksheet.set_freeze_panes(1, 0)?;
    }
    Ok(())
}

/// Returns the longest prefix Excel accepts when `text` exceeds the cell limit.
fn truncate_cell_text(text: &str) -> Option<&str> {
    text.char_indices()
        .nth(MAX_CELL_CHARS)
        .map(|(cut, _)| &text[..cut])
}

impl ReportSink for XlsxReportWriter {
    fn write(&mut self, path: &Path, sheets: &[SheetOutput<'_>]) -> DiffResult<()> {
        let buffer = self.render(sheets).map_err(|err| DiffError::Write {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let staging = io_utils::staging_path(path);
        fs::write(&staging, &buffer).map_err(|source| DiffError::Io {
            path: staging.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&staging, path) {
            let _ = fs::remove_file(&staging);
            return Err(DiffError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        info!("Wrote {} sheet(s) to {:?}", sheets.len().max(1), path);
        Ok(())
    }
}

/// Makes `name` a valid, unique Excel sheet name.
pub fn sanitize_sheet_name(name: &str, used: &mut HashSet<String>) -> String {
    let cleaned = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect::<String>();
    let cleaned = cleaned.trim_matches('\'').trim();
    let base = if cleaned.is_empty() { "Sheet" } else { cleaned };
    let base = base.chars().take(MAX_SHEET_NAME_CHARS).collect::<String>();

    let mut candidate = base.clone();
    let mut counter = 2usize;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({counter})");
        let keep = MAX_SHEET_NAME_CHARS - suffix.chars().count();
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        counter += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}
