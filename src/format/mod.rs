//! Report Formatter: column pruning, ordering, and the derived eligibility
//! flag applied to the merged table before it is published.

use std::collections::HashSet;

use regex::RegexBuilder;
use tracing::{debug, instrument};

use crate::config::{EligibilityRule, ReportRules};
use crate::error::{ReportError, Result};
use crate::model::{CONCAT_ANSWERS_COLUMN, EMAIL_COLUMN, Table};

/// Marker identifying the acknowledgement column that follows a module's
/// concatenated answers.
const SHARING_MARKER: &str = "Thank";

/// Removes every column whose name matches one of `patterns`, compared
/// case-insensitively anywhere in the name.
pub fn prune_columns(table: &Table, patterns: &[String]) -> Result<Table> {
    let matchers = patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|error| {
                    ReportError::InvalidConfig(format!("invalid column pattern '{pattern}': {error}"))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let keep: Vec<String> = table
        .columns
        .iter()
        .filter(|column| !matchers.iter().any(|matcher| matcher.is_match(column)))
        .cloned()
        .collect();
    debug!(removed = table.columns.len() - keep.len(), "columns pruned");
    Ok(table.select_columns(&keep))
}

/// Computes the published column order.
///
/// The leading columns come first, then every concatenated-answers column
/// followed by its module's acknowledgement column, then the feedback
/// columns, then everything else in its current order. Listed names that are
/// not in the table are skipped.
pub fn column_order(table: &Table, leading: &[String], feedback: &[String]) -> Vec<String> {
    let mut order: Vec<String> = Vec::with_capacity(table.columns.len());
    let mut placed: HashSet<String> = HashSet::new();
    let mut place = |name: &str, order: &mut Vec<String>| {
        if table.has_column(name) && placed.insert(name.to_string()) {
            order.push(name.to_string());
        }
    };

    for name in leading {
        place(name.as_str(), &mut order);
    }

    let suffix = format!("_{CONCAT_ANSWERS_COLUMN}");
    for column in &table.columns {
        let Some(pos) = column.find(&suffix) else {
            continue;
        };
        place(column.as_str(), &mut order);
        let sibling_prefix = format!("{}_{SHARING_MARKER}", &column[..pos]);
        if let Some(sibling) = table.columns.iter().find(|name| name.contains(&sibling_prefix)) {
            place(sibling.as_str(), &mut order);
        }
    }

    for name in feedback {
        place(name.as_str(), &mut order);
    }
    for column in &table.columns {
        place(column.as_str(), &mut order);
    }
    order
}

/// Rearranges the table into [`column_order`].
pub fn reorder_columns(table: &Table, rules: &ReportRules) -> Table {
    let order = column_order(table, &rules.leading_columns, &rules.feedback_columns);
    table.select_columns(&order)
}

/// Writes the eligibility flag for participants whose intake answers all
/// match an accepted value; other participants get a blank cell.
pub fn flag_extended_survey(table: &mut Table, rule: &EligibilityRule) {
    let fields: Vec<(Option<usize>, &[String])> = rule
        .fields
        .iter()
        .map(|field| (table.column_index(&field.column), field.accepted.as_slice()))
        .collect();
    let flag_idx = table.ensure_column(&rule.column);

    let mut eligible = 0usize;
    for row in &mut table.rows {
        let matches = !fields.is_empty()
            && fields.iter().all(|(idx, accepted)| {
                idx.is_some_and(|idx| accepted.iter().any(|value| *value == row[idx]))
            });
        row[flag_idx] = if matches {
            eligible += 1;
            rule.flag.clone()
        } else {
            String::new()
        };
    }
    debug!(eligible, "extended survey eligibility flagged");
}

/// Formatting stages applied after the merge: duplicate removal, column
/// pruning, and the eligibility flag when the course uses it.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn prepare(mut table: Table, rules: &ReportRules, extended_survey: bool) -> Result<Table> {
    if extended_survey {
        flag_extended_survey(&mut table, &rules.eligibility);
    }
    let removed = table.dedup_rows();
    debug!(removed, "duplicate rows removed");
    prune_columns(&table, &rules.pruned_columns)
}

/// Final ordering: published column order, then rows sorted by email.
pub fn finish(table: &Table, rules: &ReportRules) -> Table {
    let mut ordered = reorder_columns(table, rules);
    ordered.sort_by_column(EMAIL_COLUMN);
    ordered
}
