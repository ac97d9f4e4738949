use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Column holding the participant key in roster, credential and attendance tables.
pub const EMAIL_COLUMN: &str = "Email";
/// Column holding the participant key in module answer tables.
pub const ANSWER_EMAIL_COLUMN: &str = "email";
/// Timestamp column of module answer tables.
pub const SUBMITTED_AT_COLUMN: &str = "Submitted At";
/// Format of the `Submitted At` column of answer tables.
pub const SUBMITTED_AT_FORMAT: &str = "%m/%d/%Y %H:%M:%S";
/// Column labelling each roster row with its group.
pub const GROUP_COLUMN: &str = "Group";
/// Column holding the number of distinct sessions attended.
pub const ATTENDANCE_COUNT_COLUMN: &str = "Attendance Count";
/// Derived column holding the concatenated narrative answers of a module.
pub const CONCAT_ANSWERS_COLUMN: &str = "concat_answers";

/// A rectangular table of string cells with named columns.
///
/// Blank cells are represented by the empty string, so a row that received no
/// value for a column reads the same as a row whose source cell was empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the provided header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string slices. Mostly useful for fixtures.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(columns.iter().map(|column| column.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|cell| cell.to_string()).collect());
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Appends a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Returns the position of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the cell at `row` in the named column, or `None` when the
    /// column does not exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[index].as_str())
    }

    /// Returns the index of the named column, appending a blank column when
    /// it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Writes a cell, creating the column if needed.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        let index = self.ensure_column(column);
        self.rows[row][index] = value.into();
    }

    /// Returns the named column's values, or `None` when it does not exist.
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Builds an index from the values of `column` to the rows holding them,
    /// preserving row order within each entry.
    pub fn index_by(&self, column: &str) -> Option<HashMap<&str, Vec<usize>>> {
        let index = self.column_index(column)?;
        let mut lookup: HashMap<&str, Vec<usize>> = HashMap::new();
        for (row_idx, row) in self.rows.iter().enumerate() {
            lookup.entry(row[index].as_str()).or_default().push(row_idx);
        }
        Some(lookup)
    }

    /// Returns a table with the same header holding only the rows accepted by
    /// `keep`.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[String]) -> bool) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Rearranges the columns into `order`. Names missing from the table are
    /// ignored and columns missing from `order` are dropped.
    pub fn select_columns(&self, order: &[String]) -> Table {
        let indices: Vec<usize> = order
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        Table {
            columns: indices.iter().map(|&idx| self.columns[idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
                .collect(),
        }
    }

    /// Removes rows that are identical across every column, keeping the
    /// first occurrence.
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
        self.rows.retain(|row| seen.insert(row.clone()));
        before - self.rows.len()
    }

    /// Stable ascending sort by the string value of `column`. A missing
    /// column leaves the table untouched.
    pub fn sort_by_column(&mut self, column: &str) {
        if let Some(index) = self.column_index(column) {
            self.rows.sort_by(|lhs, rhs| lhs[index].cmp(&rhs[index]));
        }
    }
}

/// A table read from a named worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTable {
    pub title: String,
    pub table: Table,
}

/// Answers collected for one survey or quiz module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTable {
    pub name: String,
    pub table: Table,
}

impl ModuleTable {
    /// Derives the module name from a worksheet titled `<prefix> - <Module Name>`.
    pub fn from_sheet(sheet: NamedTable) -> Self {
        let name = match sheet.title.split_once(" - ") {
            Some((_, name)) => name.to_string(),
            None => sheet.title,
        };
        Self {
            name,
            table: sheet.table,
        }
    }
}

/// Attendance submissions for a single session date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSheet {
    pub date: String,
    pub table: Table,
}

impl AttendanceSheet {
    /// Recovers the session date by removing `prefix` from the worksheet title.
    pub fn from_sheet(sheet: NamedTable, prefix: &str) -> Self {
        let date = sheet
            .title
            .strip_prefix(prefix)
            .unwrap_or(&sheet.title)
            .trim()
            .to_string();
        Self {
            date,
            table: sheet.table,
        }
    }
}

/// A named sub-cohort of participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub emails: Vec<String>,
}
