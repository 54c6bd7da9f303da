//! Path, encoding and CSV helpers shared by the loaders and the writer.
//!
//! - **Format detection**: `.csv`/`.tsv`/`.txt` inputs are read as single-sheet
//!   workbooks; everything else goes through the spreadsheet reader.
//! - **Delimiters**: extension-based (`.tsv` → tab, otherwise comma) with a
//!   manual override.
//! - **Encoding**: CSV input is decoded via `encoding_rs`, defaulting to UTF-8.
//! - **Output naming**: report paths always carry an `.xlsx` extension.

use std::{
    ffi::OsString,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

pub fn is_delimited_path(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("csv" | "tsv" | "txt"))
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match extension(path).as_deref() {
        Some("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Records may have ragged widths; the table model pads them afterwards.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Appends `.xlsx` unless the path already ends with it.
pub fn ensure_xlsx_extension(path: &Path) -> PathBuf {
    if extension(path).as_deref() == Some("xlsx") {
        return path.to_path_buf();
    }
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".xlsx");
    PathBuf::from(raw)
}

/// Sibling path the writer stages output in before renaming it into place.
pub fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.xlsx".to_string());
    path.with_file_name(format!(".{name}.partial"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xlsx_extension_is_appended_once() {
        assert_eq!(ensure_xlsx_extension(Path::new("out/report")), PathBuf::from("out/report.xlsx"));
        assert_eq!(ensure_xlsx_extension(Path::new("report.XLSX")), PathBuf::from("report.XLSX"));
        assert_eq!(ensure_xlsx_extension(Path::new("report.csv")), PathBuf::from("report.csv.xlsx"));
    }

    #[test]
    fn delimited_inputs_are_detected_by_extension() {
        assert!(is_delimited_path(Path::new("old.CSV")));
        assert!(is_delimited_path(Path::new("old.tsv")));
        assert!(!is_delimited_path(Path::new("old.xlsx")));
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("a.tsv"), Some(b';')), b';');
    }

    #[test]
    fn staging_path_is_hidden_sibling() {
        assert_eq!(staging_path(Path::new("out/report.xlsx")), PathBuf::from("out/.report.xlsx.partial"));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("latin1")).is_ok());
        assert!(resolve_encoding(Some("not-an-encoding")).is_err());
    }
}
