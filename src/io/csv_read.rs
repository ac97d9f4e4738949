use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, instrument};

use crate::error::{ReportError, Result};
use crate::model::Table;

/// Reads a CSV export with a header row.
///
/// Exports are not always rectangular, so records shorter than the header
/// are padded with blanks and longer ones are truncated. A leading UTF-8 byte
/// order mark is stripped from the first header.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(ReportError::MissingInput(path.to_path_buf()));
    }
    read_from(File::open(path)?)
}

/// Reads CSV data from any reader.
pub fn read_from<R: std::io::Read>(reader: R) -> Result<Table> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            if idx == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header.to_string()
            }
        })
        .collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(str::to_string).collect());
    }

    debug!(rows = table.len(), columns = table.columns.len(), "CSV table read");
    Ok(table)
}
