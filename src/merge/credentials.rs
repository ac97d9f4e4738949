use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{info, instrument, warn};

use crate::model::{EMAIL_COLUMN, Table};

pub const CREDENTIAL_STATUS_COLUMN: &str = "Credential Status";
pub const NOTES_COLUMN: &str = "Notes";

/// Left-joins credential status and notes onto the report by email.
///
/// An empty credential table (or one missing the expected columns) leaves the
/// report unchanged. Only the first credential row of an email is used.
#[instrument(level = "info", skip_all, fields(participants = master.len(), credentials = credentials.len()))]
pub fn merge_credentials(mut master: Table, credentials: &Table) -> Table {
    if credentials.is_empty() {
        return master;
    }
    let (Some(email_idx), Some(status_idx), Some(notes_idx)) = (
        credentials.column_index(EMAIL_COLUMN),
        credentials.column_index(CREDENTIAL_STATUS_COLUMN),
        credentials.column_index(NOTES_COLUMN),
    ) else {
        warn!("credential table lacks Email, Credential Status or Notes, skipping");
        return master;
    };
    let Some(master_email_idx) = master.column_index(EMAIL_COLUMN) else {
        warn!("report has no email column, skipping credentials");
        return master;
    };

    let mut lookup: HashMap<&str, &Vec<String>> = HashMap::new();
    for row in &credentials.rows {
        match lookup.entry(row[email_idx].as_str()) {
            Entry::Occupied(_) => {
                warn!(email = %row[email_idx], "duplicate credential record, keeping the first");
            }
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }
    }

    master.ensure_column(CREDENTIAL_STATUS_COLUMN);
    master.ensure_column(NOTES_COLUMN);
    let mut matched = 0usize;
    for row_idx in 0..master.len() {
        let email = master.rows[row_idx][master_email_idx].clone();
        if let Some(record) = lookup.get(email.as_str()) {
            master.set(row_idx, CREDENTIAL_STATUS_COLUMN, record[status_idx].clone());
            master.set(row_idx, NOTES_COLUMN, record[notes_idx].clone());
            matched += 1;
        }
    }

    info!(matched, "credential status added");
    master
}
