use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::{debug, instrument};

use crate::error::{ReportError, Result};
use crate::model::{NamedTable, SUBMITTED_AT_FORMAT, Table};

/// Reads every worksheet of a spreadsheet document, in workbook order.
///
/// The first row of each sheet is the header. Trailing blank header cells are
/// ignored and rows with no content at all are skipped.
#[instrument(level = "debug", fields(path = %path.display()))]
pub fn read_sheets(path: &Path) -> Result<Vec<NamedTable>> {
    if !path.exists() {
        return Err(ReportError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = read_required_sheet(&mut workbook, &name)?;
        let table = range_to_table(&range);
        debug!(sheet = %name, rows = table.len(), "worksheet read");
        sheets.push(NamedTable { title: name, table });
    }
    Ok(sheets)
}

/// Reads the first worksheet of a spreadsheet document.
pub fn read_first_sheet(path: &Path) -> Result<Table> {
    let mut sheets = read_sheets(path)?;
    if sheets.is_empty() {
        return Ok(Table::default());
    }
    Ok(sheets.swap_remove(0).table)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ReportError::MissingInput(format!("sheet '{name}'").into()))?;
    Ok(range_result?)
}

fn range_to_table(range: &calamine::Range<DataType>) -> Table {
    let mut rows = range.rows();
    let mut columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell_to_string(Some(cell))).collect(),
        None => return Table::default(),
    };
    while columns.last().is_some_and(|column| column.is_empty()) {
        columns.pop();
    }

    let mut table = Table::new(columns);
    let width = table.columns.len();
    for row in rows {
        let cells: Vec<String> = (0..width).map(|idx| cell_to_string(row.get(idx))).collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.push_row(cells);
    }
    table
}

/// Renders a cell the way the CSV exports spell it. Date cells use the
/// `Submitted At` format so timestamps read from either source compare alike.
fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(cell @ (DataType::DateTime(_) | DataType::DateTimeIso(_))) => cell
            .as_datetime()
            .map(|stamp| stamp.format(SUBMITTED_AT_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
