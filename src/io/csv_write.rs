use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::model::Table;

/// Writes `table` as CSV to `path`, overwriting any existing file.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_to(File::create(path)?, table)
}

/// Writes `table` as CSV to any writer.
pub fn write_to<W: std::io::Write>(writer: W, table: &Table) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
