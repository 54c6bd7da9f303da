//! Run summary: per-sheet counts printed as a text table or saved as JSON.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    compare::{Comparison, SheetOutcome, SheetState},
    report::SheetStats,
    table::TextTable,
};

#[derive(Debug, Clone, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub outcome: SheetOutcome,
    pub state: SheetState,
    #[serde(flatten)]
    pub stats: SheetStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub old: PathBuf,
    pub new: PathBuf,
    pub output: Option<PathBuf>,
    pub key_column: String,
    pub has_differences: bool,
    pub sheets: Vec<SheetSummary>,
}

impl RunSummary {
    pub fn new(
        comparison: &Comparison,
        old: &Path,
        new: &Path,
        output: Option<&Path>,
        key_column: &str,
    ) -> Self {
        let sheets = comparison
            .sheets()
            .iter()
            .map(|sheet| SheetSummary {
                sheet: sheet.name.clone(),
                outcome: sheet.outcome,
                state: sheet.state,
                stats: sheet.stats.clone(),
                message: sheet.message.clone(),
            })
            .collect();
        Self {
            old: old.to_path_buf(),
            new: new.to_path_buf(),
            output: output.map(Path::to_path_buf),
            key_column: key_column.to_string(),
            has_differences: comparison.has_differences(),
            sheets,
        }
    }

    pub fn render(&self) -> String {
        let mut table = TextTable::new([
            "Sheet",
            "Outcome",
            "Added",
            "Removed",
            "Changed",
            "Unchanged",
            "Cells",
            "Skipped",
            "Note",
        ])
        .align_right(2..=7);
        for sheet in &self.sheets {
            let stats = &sheet.stats;
            let note = match (&sheet.message, stats.duplicate_keys.is_empty()) {
                (Some(message), _) => message.clone(),
                (None, false) => format!("duplicate keys: {}", stats.duplicate_keys.join(", ")),
                (None, true) if stats.added_columns > 0 => {
                    format!("{} new column(s)", stats.added_columns)
                }
                (None, true) => String::new(),
            };
            table.push_row(vec![
                sheet.sheet.clone(),
                sheet.outcome.to_string(),
                stats.added_rows.to_string(),
                stats.removed_rows.to_string(),
                stats.changed_rows.to_string(),
                stats.unchanged_rows.to_string(),
                stats.changed_cells.to_string(),
                stats.skipped_rows.to_string(),
                note,
            ]);
        }
        table.to_string()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).context("Serializing run summary")?;
        writer
            .flush()
            .with_context(|| format!("Flushing run summary to {path:?}"))?;
        Ok(())
    }
}
