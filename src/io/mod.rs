//! Source readers and file writers.
//!
//! Readers turn CSV exports and spreadsheet documents into [`Table`]s; the
//! [`mail`] and [`downloads`] adapters locate and file the report exports the
//! course platform sends out.

pub mod csv_read;
pub mod csv_write;
pub mod downloads;
pub mod excel_read;
pub mod excel_write;
pub mod mail;

use std::path::Path;

use crate::error::Result;
use crate::model::Table;

/// Reads a single table, choosing the reader from the file extension.
/// Spreadsheet documents contribute their first worksheet.
pub fn read_table(path: &Path) -> Result<Table> {
    let is_workbook = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
    if is_workbook {
        excel_read::read_first_sheet(path)
    } else {
        csv_read::read_table(path)
    }
}
