use tracing::{info, instrument, warn};

use super::roster_email_index;
use crate::error::Result;
use crate::model::{ATTENDANCE_COUNT_COLUMN, AttendanceSheet, EMAIL_COLUMN, Table};

/// Adds the attendance count and one `Attendance - <date>` column per
/// attended session.
///
/// The count is the number of distinct dates on which a participant's email
/// appears, so repeated submissions (or duplicated sheets) for one date count
/// once. Sessions a participant missed stay blank.
#[instrument(level = "info", skip_all, fields(participants = roster.len(), sheets = sheets.len()))]
pub fn merge_attendance(roster: &Table, sheets: &[AttendanceSheet], marker: &str) -> Result<Table> {
    let email_idx = roster_email_index(roster)?;
    let mut attended: Vec<Vec<&str>> = vec![Vec::new(); roster.len()];
    let mut dates: Vec<&str> = Vec::new();

    for sheet in sheets {
        if sheet.table.is_empty() {
            continue;
        }
        let Some(lookup) = sheet.table.index_by(EMAIL_COLUMN) else {
            warn!(date = %sheet.date, "attendance sheet has no email column, skipping");
            continue;
        };

        let date = sheet.date.as_str();
        for (row_idx, row) in roster.rows.iter().enumerate() {
            if lookup.contains_key(row[email_idx].as_str()) && !attended[row_idx].contains(&date) {
                attended[row_idx].push(date);
                if !dates.contains(&date) {
                    dates.push(date);
                }
            }
        }
    }

    let mut merged = roster.clone();
    merged.ensure_column(ATTENDANCE_COUNT_COLUMN);
    for date in &dates {
        merged.ensure_column(&attendance_column(date));
    }
    for (row_idx, sessions) in attended.iter().enumerate() {
        merged.set(row_idx, ATTENDANCE_COUNT_COLUMN, sessions.len().to_string());
        for date in sessions {
            merged.set(row_idx, &attendance_column(date), marker);
        }
    }

    info!(sessions = dates.len(), "attendance added");
    Ok(merged)
}

/// Name of the column recording attendance on `date`.
pub fn attendance_column(date: &str) -> String {
    format!("Attendance - {date}")
}
