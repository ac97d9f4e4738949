#![allow(dead_code)]

use std::path::Path;

use cohort_reports::model::Table;
use rust_xlsxwriter::Workbook;

/// Writes a workbook holding one worksheet per `(title, table)` pair.
pub fn write_workbook(path: &Path, sheets: &[(&str, &Table)]) {
    let mut workbook = Workbook::new();
    for (title, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*title).expect("sheet named");
        for (col, header) in table.columns.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header)
                .expect("header written");
        }
        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    worksheet
                        .write_string((row_idx + 1) as u32, col as u16, cell)
                        .expect("cell written");
                }
            }
        }
    }
    workbook.save(path).expect("workbook saved");
}

/// Returns the cell of the first row whose `Email` equals `email`.
pub fn cell<'a>(table: &'a Table, email: &str, column: &str) -> &'a str {
    let email_idx = table.column_index("Email").expect("Email column");
    let row = table
        .rows
        .iter()
        .position(|row| row[email_idx] == email)
        .unwrap_or_else(|| panic!("no row for {email}"));
    table.get(row, column).unwrap_or_else(|| panic!("no column {column}"))
}
