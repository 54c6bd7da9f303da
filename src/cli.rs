use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DuplicateKeyPolicy, MissingKeyPolicy};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Compare two versions of a workbook and highlight the differences",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare two workbooks sheet by sheet and write a highlighted report
    Compare(CompareArgs),
    /// List the sheets of a workbook or show the first rows of one sheet
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Previous version of the workbook (.xlsx, .xlsm, .xls, .ods, .csv, .tsv)
    #[arg(long)]
    pub old: PathBuf,
    /// Current version of the workbook
    #[arg(long)]
    pub new: PathBuf,
    /// Report destination; `.xlsx` is appended when missing
    #[arg(short = 'o', long = "output", required_unless_present = "dry_run")]
    pub output: Option<PathBuf>,
    /// YAML profile with comparison settings; command-line values take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Column whose value identifies a row (defaults to `Test ID`)
    #[arg(short = 'k', long = "key")]
    pub key: Option<String>,
    /// Sheet to leave out of the comparison (repeatable)
    #[arg(long = "exclude-sheet", action = clap::ArgAction::Append)]
    pub exclude_sheets: Vec<String>,
    /// Sheet compared by newly added columns instead of by key
    #[arg(long = "column-diff-sheet")]
    pub column_diff_sheet: Option<String>,
    /// Rows above the header row on every sheet (0 = header on the first row)
    #[arg(long = "header-row")]
    pub header_row: Option<usize>,
    /// Per-sheet header row override of the form `NAME=N` (repeatable)
    #[arg(
        long = "sheet-header-row",
        value_parser = parse_sheet_header_row,
        action = clap::ArgAction::Append
    )]
    pub sheet_header_rows: Vec<(String, usize)>,
    /// How to treat keys that occur on more than one row
    #[arg(long = "duplicate-keys", value_enum)]
    pub duplicate_keys: Option<DuplicateKeyPolicy>,
    /// How to treat sheets that lack the key column
    #[arg(long = "missing-key", value_enum)]
    pub missing_key: Option<MissingKeyPolicy>,
    /// Only rows whose key matches this regular expression are compared (e.g. `^IO`)
    #[arg(long = "key-pattern")]
    pub key_pattern: Option<String>,
    /// Leave rows without any changed cell out of the report
    #[arg(long = "suppress-unchanged")]
    pub suppress_unchanged: bool,
    /// Treat empty cells and zero as equal
    #[arg(long = "blank-equals-zero")]
    pub blank_equals_zero: bool,
    /// Show changed cells as `old ==> new`
    #[arg(long = "show-old-values")]
    pub show_old_values: bool,
    /// Print a per-sheet summary table to stdout
    #[arg(long)]
    pub summary: bool,
    /// Write the per-sheet summary as JSON to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,
    /// Character encoding of delimited inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Delimiter of delimited inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Compare without writing a report
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Workbook to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Sheet to display; lists all sheets when omitted
    #[arg(long)]
    pub sheet: Option<String>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
    /// Rows above the header row
    #[arg(long = "header-row", default_value_t = 0)]
    pub header_row: usize,
    /// Delimiter of delimited inputs
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of delimited inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => match other.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            [] => Err("Delimiter cannot be empty".to_string()),
            _ => Err("Delimiter must be a single ASCII character".to_string()),
        },
    }
}

/// Parses `NAME=N`; the sheet name may itself contain `=`.
pub fn parse_sheet_header_row(value: &str) -> Result<(String, usize), String> {
    let (name, row) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("Expected NAME=N, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Sheet name missing in '{value}'"));
    }
    let row = row
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("Invalid header row in '{value}': {err}"))?;
    Ok((name.to_string(), row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_header_rows_split_on_last_equals() {
        assert_eq!(
            parse_sheet_header_row("History=1"),
            Ok(("History".to_string(), 1))
        );
        assert_eq!(parse_sheet_header_row("a=b=3"), Ok(("a=b".to_string(), 3)));
        assert!(parse_sheet_header_row("History").is_err());
        assert!(parse_sheet_header_row("=2").is_err());
        assert!(parse_sheet_header_row("History=x").is_err());
    }

    #[test]
    fn delimiters_accept_names_and_single_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter(":"), Ok(b':'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn output_is_optional_only_for_dry_runs() {
        let parsed = Cli::try_parse_from([
            "workbook-diff", "compare", "--old", "a.xlsx", "--new", "b.xlsx", "--dry-run",
        ]);
        assert!(parsed.is_ok());
        let missing = Cli::try_parse_from(["workbook-diff", "compare", "--old", "a.xlsx", "--new", "b.xlsx"]);
        assert!(missing.is_err());
    }

    #[test]
    fn policies_parse_in_kebab_case() {
        let cli = Cli::try_parse_from([
            "workbook-diff",
            "compare",
            "--old",
            "a.xlsx",
            "--new",
            "b.xlsx",
            "-o",
            "out",
            "--duplicate-keys",
            "keep-last",
            "--missing-key",
            "positional",
            "--sheet-header-row",
            "History=1",
        ])
        .expect("parse");
        let Commands::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.duplicate_keys, Some(DuplicateKeyPolicy::KeepLast));
        assert_eq!(args.missing_key, Some(MissingKeyPolicy::Positional));
        assert_eq!(args.sheet_header_rows, vec![("History".to_string(), 1)]);
    }
}
