use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::PreviewArgs,
    io_utils,
    sheet::Table,
    table::TextTable,
    workbook::{LoadOptions, WorkbookSource, open_workbook},
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding,
    };
    let mut workbook = open_workbook(&args.input, &options)
        .with_context(|| format!("Opening workbook {:?}", args.input))?;

    let rendered = match &args.sheet {
        Some(sheet) => {
            let table = workbook
                .load(sheet, args.header_row)
                .with_context(|| format!("Loading sheet '{sheet}' from {:?}", args.input))?;
            info!(
                "Displaying {} of {} row(s) from sheet '{}'",
                args.rows.min(table.row_count()),
                table.row_count(),
                sheet
            );
            sheet_preview(&table, args.rows)
        }
        None => {
            let listing = sheet_listing(&mut *workbook, args.header_row)
                .with_context(|| format!("Listing sheets of {:?}", args.input))?;
            info!("{} sheet(s) in {:?}", listing.row_count(), args.input);
            listing
        }
    };
    print!("{rendered}");
    Ok(())
}

fn sheet_preview(table: &Table, limit: usize) -> TextTable {
    let mut text = TextTable::new(table.columns().iter().cloned());
    for row in table.rows().iter().take(limit) {
        text.push_row(row.iter().map(|cell| cell.to_string()).collect());
    }
    text
}

fn sheet_listing(workbook: &mut dyn WorkbookSource, header_row: usize) -> Result<TextTable> {
    let mut listing = TextTable::new(["Sheet", "Columns", "Rows"]).align_right([1, 2]);
    for name in workbook.sheet_names().to_vec() {
        let table = workbook.load(&name, header_row)?;
        listing.push_row(vec![
            name,
            table.columns().len().to_string(),
            table.row_count().to_string(),
        ]);
    }
    Ok(listing)
}
