use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::Table;

/// Sheet name used for every published spreadsheet.
pub const DEFAULT_SHEET: &str = "Sheet1";

/// Writes `table` as the only worksheet of a new document at `path`,
/// replacing whatever was there before.
pub fn write_sheet(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DEFAULT_SHEET)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    // Worksheet tables need case-insensitively unique headers; reports may not have them.
    if !table.columns.is_empty() {
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        let row_end = table.rows.len() as u32;
        worksheet.autofilter(0, 0, row_end, col_end)?;
    }

    workbook.save(path)?;
    Ok(())
}
