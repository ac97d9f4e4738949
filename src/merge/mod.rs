//! Record Merger.
//!
//! Every merge is anchored on the roster: rows are looked up by email and
//! attached to the matching participant, unmatched source rows are dropped,
//! and a participant without source rows keeps blank cells. The merged table
//! therefore never has more rows than the roster it started from.

mod attendance;
mod concat;
mod credentials;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument, warn};

use crate::config::ConcatCategory;
use crate::error::{ReportError, Result};
use crate::model::{ANSWER_EMAIL_COLUMN, CONCAT_ANSWERS_COLUMN, EMAIL_COLUMN, ModuleTable, SUBMITTED_AT_COLUMN, Table};

pub use crate::model::SUBMITTED_AT_FORMAT;

pub use attendance::merge_attendance;
pub use concat::{concat_answers, matching_category};
pub use credentials::{CREDENTIAL_STATUS_COLUMN, NOTES_COLUMN, merge_credentials};

/// Parses a `Submitted At` value. Zero padding of the month, day and hour
/// fields is optional.
pub fn parse_submitted_at(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), SUBMITTED_AT_FORMAT).ok()
}

/// Picks the submission to keep among a participant's `candidates` rows.
///
/// A single row is kept as is. With several rows the one holding the latest
/// parsed timestamp wins, later rows winning ties; rows whose timestamp does
/// not parse are ignored. Returns `None` when no candidate has a usable
/// timestamp. Without a `Submitted At` column the last row is kept.
pub fn latest_submission(table: &Table, candidates: &[usize]) -> Option<usize> {
    match candidates {
        [] => None,
        [only] => Some(*only),
        _ => {
            let Some(column) = table.column_index(SUBMITTED_AT_COLUMN) else {
                return candidates.last().copied();
            };
            candidates
                .iter()
                .filter_map(|&row| {
                    parse_submitted_at(&table.rows[row][column]).map(|stamp| (stamp, row))
                })
                .max()
                .map(|(_, row)| row)
        }
    }
}

/// Attaches every module's answers to the roster.
///
/// For each participant and module the latest submission is selected, the
/// module's concatenation rule applied, and every answer column except the
/// email key is written under `<module name>_<column>`. Module columns appear
/// in module order, each in its table's column order.
#[instrument(level = "info", skip_all, fields(participants = roster.len(), modules = modules.len()))]
pub fn merge_module_answers(
    roster: &Table,
    modules: &[ModuleTable],
    categories: &[ConcatCategory],
) -> Result<Table> {
    let email_idx = roster_email_index(roster)?;
    let mut merged = roster.clone();

    for module in modules {
        let Some(lookup) = module.table.index_by(ANSWER_EMAIL_COLUMN) else {
            warn!(module = %module.name, "answer table has no email column, skipping");
            continue;
        };
        let category = matching_category(categories, &module.name);
        let concat_column = format!("{}_{CONCAT_ANSWERS_COLUMN}", module.name);
        let mut answered = 0usize;

        for row_idx in 0..merged.len() {
            let email = merged.rows[row_idx][email_idx].clone();
            let Some(candidates) = lookup.get(email.as_str()) else {
                continue;
            };
            let Some(selected) = latest_submission(&module.table, candidates) else {
                warn!(%email, module = %module.name, "no parseable submission time, skipping answers");
                continue;
            };

            let answers = &module.table.rows[selected];
            for (column, value) in module.table.columns.iter().zip(answers) {
                if column == ANSWER_EMAIL_COLUMN {
                    continue;
                }
                merged.set(row_idx, &format!("{}_{column}", module.name), value.clone());
            }
            if let Some(category) = category {
                let joined = concat_answers(&module.table.columns, answers, &category.fragments);
                merged.set(row_idx, &concat_column, joined);
            }
            answered += 1;
        }
        debug!(module = %module.name, answered, "module answers merged");
    }

    info!(columns = merged.columns.len(), "survey answers added");
    Ok(merged)
}

pub(crate) fn roster_email_index(roster: &Table) -> Result<usize> {
    roster
        .column_index(EMAIL_COLUMN)
        .ok_or_else(|| ReportError::InvalidConfig(format!("roster has no '{EMAIL_COLUMN}' column")))
}
