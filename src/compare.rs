//! Sheet orchestration: walks both workbooks, routes every sheet to the right
//! comparison mode and collects the ordered report.
//!
//! Sheet order is the old workbook's order followed by sheets that only exist
//! in the new workbook, in the new workbook's order. Each sheet moves through
//! `Pending → Loaded → Classified → Written`; a sheet-level failure (missing
//! key column, rejected duplicates) becomes a placeholder report and never
//! stops the other sheets.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    cli::CompareArgs,
    column_diff::column_diff,
    config::{CompareConfig, MissingKeyPolicy},
    error::{DiffError, DiffResult, Side},
    io_utils,
    keys::{KeyIndex, KeyOptions, extract_keys},
    report::{SheetStats, keyed_report, placeholder_report, whole_sheet_report},
    sheet::{CellTag, OutputTable, ReportKind, Table},
    summary::RunSummary,
    workbook::{LoadOptions, WorkbookSource, open_workbook},
    writer::{ReportSink, SheetOutput, XlsxReportWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetOutcome {
    /// Rows aligned on the key column.
    Compared,
    /// Key column missing; rows aligned by position.
    Positional,
    ColumnsAdded,
    /// Column-diff sheet without new columns; nothing is written for it.
    NoNewColumns,
    SheetAdded,
    SheetRemoved,
    Placeholder,
}

impl fmt::Display for SheetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SheetOutcome::Compared => "compared",
            SheetOutcome::Positional => "compared by position",
            SheetOutcome::ColumnsAdded => "columns added",
            SheetOutcome::NoNewColumns => "no new columns",
            SheetOutcome::SheetAdded => "sheet added",
            SheetOutcome::SheetRemoved => "sheet removed",
            SheetOutcome::Placeholder => "not compared",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetState {
    Pending,
    Loaded,
    Classified,
    Written,
}

impl SheetState {
    fn advance(self) -> Self {
        match self {
            SheetState::Pending => SheetState::Loaded,
            SheetState::Loaded => SheetState::Classified,
            SheetState::Classified | SheetState::Written => SheetState::Written,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetReport {
    pub name: String,
    pub outcome: SheetOutcome,
    pub state: SheetState,
    /// `None` when the sheet produces no output worksheet.
    pub output: Option<OutputTable>,
    pub stats: SheetStats,
    /// Reason for a placeholder or a positional fallback.
    pub message: Option<String>,
}

impl SheetReport {
    fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: SheetOutcome::Placeholder,
            state: SheetState::Pending,
            output: None,
            stats: SheetStats::default(),
            message: None,
        }
    }

    fn loaded(mut self) -> Self {
        self.state = self.state.advance();
        self
    }

    fn classified(
        mut self,
        outcome: SheetOutcome,
        output: Option<OutputTable>,
        stats: SheetStats,
    ) -> Self {
        self.outcome = outcome;
        self.output = output;
        self.stats = stats;
        self.state = self.state.advance();
        self
    }
}

/// Ordered per-sheet results of one comparison run.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    sheets: Vec<SheetReport>,
}

impl Comparison {
    pub fn sheets(&self) -> &[SheetReport] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    /// Worksheets to write, in report order.
    pub fn outputs(&self) -> Vec<SheetOutput<'_>> {
        self.sheets
            .iter()
            .filter_map(|sheet| {
                sheet.output.as_ref().map(|table| SheetOutput {
                    name: &sheet.name,
                    table,
                })
            })
            .collect()
    }

    pub fn has_differences(&self) -> bool {
        self.sheets.iter().any(|sheet| sheet.stats.has_differences())
    }

    /// Advances every sheet that produced an output table to `Written`.
    pub fn mark_written(&mut self) {
        for sheet in self.sheets.iter_mut().filter(|s| s.output.is_some()) {
            sheet.state = sheet.state.advance();
        }
    }

    /// Hands the report to `sink` and marks the written sheets.
    pub fn write_to(&mut self, sink: &mut dyn ReportSink, path: &Path) -> DiffResult<()> {
        sink.write(path, &self.outputs())?;
        self.mark_written();
        Ok(())
    }
}

/// Old-workbook sheets first, then sheets only the new workbook has.
fn sheet_order(old: &[String], new: &[String]) -> Vec<String> {
    let mut order = old.to_vec();
    order.extend(new.iter().filter(|name| !old.contains(name)).cloned());
    order
}

pub fn compare_workbooks(
    old: &mut dyn WorkbookSource,
    new: &mut dyn WorkbookSource,
    config: &CompareConfig,
) -> DiffResult<Comparison> {
    let key_options = config.key_options()?;
    let old_names = old.sheet_names().to_vec();
    let new_names = new.sheet_names().to_vec();

    let mut comparison = Comparison::default();
    for name in sheet_order(&old_names, &new_names) {
        if config.is_excluded(&name) {
            debug!("Skipping excluded sheet '{name}'");
            continue;
        }
        let header_row = config.header_row_for(&name);
        let pending = SheetReport::pending(&name);
        let report = match (old_names.contains(&name), new_names.contains(&name)) {
            (true, true) => {
                let old_table = old.load(&name, header_row)?;
                let new_table = new.load(&name, header_row)?;
                let loaded = pending.loaded();
                if config.is_column_diff_sheet(&name) {
                    compare_columns(loaded, &old_table, &new_table)
                } else {
                    compare_rows(loaded, &old_table, &new_table, &key_options, config)?
                }
            }
            (true, false) => {
                let table = old.load(&name, header_row)?;
                let (output, stats) = whole_sheet_report(&table, CellTag::Removed);
                pending
                    .loaded()
                    .classified(SheetOutcome::SheetRemoved, Some(output), stats)
            }
            (false, true) => {
                let table = new.load(&name, header_row)?;
                let (output, stats) = whole_sheet_report(&table, CellTag::Added);
                pending
                    .loaded()
                    .classified(SheetOutcome::SheetAdded, Some(output), stats)
            }
            (false, false) => continue,
        };
        log_outcome(&report);
        comparison.sheets.push(report);
    }
    Ok(comparison)
}

fn compare_columns(report: SheetReport, old: &Table, new: &Table) -> SheetReport {
    match column_diff(old, new) {
        Some(output) => {
            let stats = SheetStats {
                added_columns: output.columns().len(),
                ..SheetStats::default()
            };
            report.classified(SheetOutcome::ColumnsAdded, Some(output), stats)
        }
        None => report.classified(SheetOutcome::NoNewColumns, None, SheetStats::default()),
    }
}

fn compare_rows(
    report: SheetReport,
    old: &Table,
    new: &Table,
    key_options: &KeyOptions,
    config: &CompareConfig,
) -> DiffResult<SheetReport> {
    let options = config.compare_options();
    let indices = extract_keys(old, Side::Old, key_options)
        .and_then(|old_index| Ok((old_index, extract_keys(new, Side::New, key_options)?)));
    match indices {
        Ok((old_index, new_index)) => {
            let (output, stats) =
                keyed_report(old, new, &old_index, &new_index, ReportKind::Keyed, &options);
            Ok(report.classified(SheetOutcome::Compared, Some(output), stats))
        }
        Err(err @ DiffError::MissingKeyColumn { .. })
            if config.missing_key == MissingKeyPolicy::Positional =>
        {
            warn!("{err}; comparing sheet '{}' by row position", report.name);
            let (output, stats) = keyed_report(
                old,
                new,
                &KeyIndex::positional(old),
                &KeyIndex::positional(new),
                ReportKind::Positional,
                &options,
            );
            let mut report = report.classified(SheetOutcome::Positional, Some(output), stats);
            report.message = Some(err.to_string());
            Ok(report)
        }
        Err(err) if err.is_sheet_recoverable() => {
            warn!("{err}; sheet '{}' is reported as not compared", report.name);
            let message = err.to_string();
            let mut report = report.classified(
                SheetOutcome::Placeholder,
                Some(placeholder_report(message.clone())),
                SheetStats::default(),
            );
            report.message = Some(message);
            Ok(report)
        }
        Err(err) => Err(err),
    }
}

fn log_outcome(report: &SheetReport) {
    let stats = &report.stats;
    match report.outcome {
        SheetOutcome::Compared | SheetOutcome::Positional => info!(
            "Sheet '{}' {}: {} added, {} removed, {} changed row(s)",
            report.name, report.outcome, stats.added_rows, stats.removed_rows, stats.changed_rows
        ),
        SheetOutcome::ColumnsAdded => info!(
            "Sheet '{}': {} new column(s)",
            report.name, stats.added_columns
        ),
        SheetOutcome::SheetAdded => info!(
            "Sheet '{}' only in new workbook ({} row(s))",
            report.name, stats.added_rows
        ),
        SheetOutcome::SheetRemoved => info!(
            "Sheet '{}' only in old workbook ({} row(s))",
            report.name, stats.removed_rows
        ),
        SheetOutcome::NoNewColumns | SheetOutcome::Placeholder => {
            info!("Sheet '{}': {}", report.name, report.outcome)
        }
    }
}

/// Loads the optional profile and layers the command-line values on top.
pub fn build_config(args: &CompareArgs) -> Result<CompareConfig> {
    let mut config = match &args.config {
        Some(path) => CompareConfig::load(path)?,
        None => CompareConfig::default(),
    };
    if let Some(key) = &args.key {
        config.key_column = key.clone();
    }
    config.excluded_sheets.extend(args.exclude_sheets.iter().cloned());
    if let Some(sheet) = &args.column_diff_sheet {
        config.column_diff_sheet = Some(sheet.clone());
    }
    if let Some(row) = args.header_row {
        config.default_header_row = row;
    }
    for (sheet, row) in &args.sheet_header_rows {
        config.header_rows.insert(sheet.clone(), *row);
    }
    if let Some(policy) = args.duplicate_keys {
        config.duplicate_keys = policy;
    }
    if let Some(policy) = args.missing_key {
        config.missing_key = policy;
    }
    if let Some(pattern) = &args.key_pattern {
        config.key_pattern = Some(pattern.clone());
    }
    config.suppress_unchanged |= args.suppress_unchanged;
    config.blank_equals_zero |= args.blank_equals_zero;
    config.show_old_values |= args.show_old_values;
    config.key_options()?;
    Ok(config)
}

pub fn execute(args: &CompareArgs) -> Result<()> {
    let config = build_config(args)?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let load_options = LoadOptions {
        delimiter: args.delimiter,
        encoding,
    };
    info!(
        "Comparing {:?} against {:?} on key column '{}'",
        args.old, args.new, config.key_column
    );
    let mut old = open_workbook(&args.old, &load_options)
        .with_context(|| format!("Opening old workbook {:?}", args.old))?;
    let mut new = open_workbook(&args.new, &load_options)
        .with_context(|| format!("Opening new workbook {:?}", args.new))?;
    let mut comparison =
        compare_workbooks(&mut *old, &mut *new, &config).context("Comparing workbooks")?;

    let output: Option<PathBuf> = if args.dry_run {
        info!("Dry run: no report written");
        None
    } else {
        let target = args
            .output
            .as_deref()
            .ok_or_else(|| anyhow!("An output path is required unless --dry-run is set"))?;
        let target = io_utils::ensure_xlsx_extension(target);
        let mut writer = XlsxReportWriter::default();
        comparison
            .write_to(&mut writer, &target)
            .with_context(|| format!("Writing report to {target:?}"))?;
        info!("Comparison report written to {:?}", target);
        Some(target)
    };

    let summary = RunSummary::new(
        &comparison,
        &args.old,
        &args.new,
        output.as_deref(),
        &config.key_column,
    );
    if args.summary {
        print!("{}", summary.render());
    }
    if let Some(path) = &args.summary_json {
        summary
            .write_json(path)
            .with_context(|| format!("Writing summary to {path:?}"))?;
        info!("Summary written to {:?}", path);
    }
    Ok(())
}
