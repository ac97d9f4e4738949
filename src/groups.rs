//! Groups and the group-labelled roster.
//!
//! Group membership comes from the per-group exports in the course download
//! folder. The roster is the course progress report restricted to group
//! members, each row labelled with its (title-cased) group name.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::error::{ReportError, Result};
use crate::io::csv_read;
use crate::model::{EMAIL_COLUMN, GROUP_COLUMN, Group, Table};

const GROUP_FILE_PREFIX: &str = "Group";
const PROGRESS_FILE_PREFIX: &str = "Progress Report";
const LAST_NAME_COLUMN: &str = "Last Name";
/// Participant-configuration marker for groups whose exports are generated.
const EXPORT_MARKER: &str = "x";
const DRIVE_URL_PREFIX: &str = "https://drive.google.com/drive/";
const DRIVE_FOLDER_PREFIX: &str = "https://drive.google.com/drive/folders/";

/// A group that receives its own filtered report in a shared folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerTarget {
    pub group: String,
    pub folder: String,
}

/// Groups named in the participant configuration for one course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportingGroups {
    pub export_groups: Vec<String>,
    pub partners: Vec<PartnerTarget>,
}

/// Title-cases `value`: the first letter of every run of letters is
/// upper-cased and the remaining letters lower-cased.
pub fn title_case(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut previous_is_letter = false;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                result.extend(ch.to_lowercase());
            } else {
                result.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(ch);
            previous_is_letter = false;
        }
    }
    result
}

/// Label written to the `Group` column for a group name.
pub fn group_label(name: &str) -> String {
    title_case(&name.to_lowercase())
}

/// Derives a group name from an export file name: the token after the final
/// underscore, without the `.csv` extension.
pub fn group_name_from_file(file_name: &str) -> String {
    let token = file_name.rsplit('_').next().unwrap_or(file_name);
    token.strip_suffix(".csv").unwrap_or(token).to_string()
}

/// Loads every group export (`Group*.csv`) from the download folder.
#[instrument(level = "info", fields(dir = %dir.display()))]
pub fn load_groups(dir: &Path) -> Result<Vec<Group>> {
    let mut groups = Vec::new();
    for path in sorted_files(dir)? {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !file_name.starts_with(GROUP_FILE_PREFIX) {
            continue;
        }

        let table = csv_read::read_table(&path)?;
        let Some(emails) = table.column_values(EMAIL_COLUMN) else {
            warn!(file = file_name, "unknown group export format, skipping");
            continue;
        };
        let group = Group {
            name: group_name_from_file(file_name),
            emails: emails.into_iter().map(str::to_string).collect(),
        };
        debug!(group = %group.name, members = group.emails.len(), "group loaded");
        groups.push(group);
    }
    info!(group_count = groups.len(), "groups created");
    Ok(groups)
}

/// Locates the progress report export for `course` in the download folder.
pub fn find_progress_report(dir: &Path, course: &str) -> Result<PathBuf> {
    let wanted = course.to_lowercase();
    sorted_files(dir)?
        .into_iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(PROGRESS_FILE_PREFIX)
                        && group_name_from_file(name).to_lowercase() == wanted
                })
        })
        .ok_or_else(|| ReportError::ProgressReportNotFound {
            course: course.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// Restricts the progress report to group members and labels each row with
/// its group.
///
/// Groups are visited in order and each group's rows are sorted by last
/// name. A participant listed in several groups keeps the first one, so the
/// roster never holds more rows than the progress report.
pub fn build_roster(progress: &Table, groups: &[Group]) -> Result<Table> {
    let Some(email_idx) = progress.column_index(EMAIL_COLUMN) else {
        return Err(ReportError::InvalidConfig(format!(
            "progress report has no '{EMAIL_COLUMN}' column"
        )));
    };
    let last_name_idx = progress.column_index(LAST_NAME_COLUMN);

    let mut roster = Table::new(progress.columns.clone());
    let group_idx = roster.ensure_column(GROUP_COLUMN);
    let mut assigned: HashSet<String> = HashSet::new();

    for group in groups {
        let members: HashSet<&str> = group.emails.iter().map(String::as_str).collect();
        let mut rows: Vec<&Vec<String>> = progress
            .rows
            .iter()
            .filter(|row| members.contains(row[email_idx].as_str()))
            .collect();
        if let Some(idx) = last_name_idx {
            rows.sort_by(|lhs, rhs| lhs[idx].cmp(&rhs[idx]));
        }

        let label = group_label(&group.name);
        for row in rows {
            let email = &row[email_idx];
            if email.trim().is_empty() {
                warn!(group = %group.name, "roster row without email, skipping");
                continue;
            }
            if !assigned.insert(email.clone()) {
                warn!(%email, group = %group.name, "participant already assigned to a group");
                continue;
            }
            let mut cells = row.clone();
            cells.resize(roster.columns.len(), String::new());
            cells[group_idx] = label.clone();
            roster.rows.push(cells);
        }
    }

    info!(participants = roster.len(), "roster built");
    Ok(roster)
}

/// Reads the participant configuration for `course`.
///
/// The table has a `Group` column and one column per course: `x` (any case)
/// marks a group whose exports must be generated, a drive-folder URL or a
/// folder path containing `/` marks a partner group receiving its own
/// report. Any other value is ignored with a warning.
pub fn reporting_groups(config: &Table, course: &str) -> Result<ReportingGroups> {
    let (Some(group_idx), Some(course_idx)) =
        (config.column_index(GROUP_COLUMN), config.column_index(course))
    else {
        return Err(ReportError::InvalidConfig(format!(
            "participant configuration needs '{GROUP_COLUMN}' and '{course}' columns"
        )));
    };

    let mut groups = ReportingGroups::default();
    for row in &config.rows {
        let group = row[group_idx].trim();
        let value = row[course_idx].trim();
        if group.is_empty() || value.is_empty() {
            continue;
        }
        if value.eq_ignore_ascii_case(EXPORT_MARKER) {
            groups.export_groups.push(group.to_string());
        } else if is_folder_reference(value) {
            groups.partners.push(PartnerTarget {
                group: group.to_string(),
                folder: folder_id(value).to_string(),
            });
        } else {
            warn!(group, %value, course, "unrecognised participant configuration value, skipping");
        }
    }
    Ok(groups)
}

fn is_folder_reference(value: &str) -> bool {
    value.starts_with(DRIVE_URL_PREFIX) || value.contains('/')
}

/// Strips the drive URL prefix from a folder reference.
pub fn folder_id(reference: &str) -> &str {
    reference
        .strip_prefix(DRIVE_FOLDER_PREFIX)
        .unwrap_or(reference)
        .trim_end_matches('/')
}

/// Fails with [`ReportError::GroupNotFound`] unless every partner group is
/// present in the roster.
pub fn ensure_partner_groups(partners: &[PartnerTarget], roster: &Table) -> Result<()> {
    let labels: HashSet<&str> = roster
        .column_values(GROUP_COLUMN)
        .unwrap_or_default()
        .into_iter()
        .collect();
    for partner in partners {
        if !labels.contains(group_label(&partner.group).as_str()) {
            return Err(ReportError::GroupNotFound(partner.group.clone()));
        }
    }
    Ok(())
}

/// Rows of the Master Report belonging to `group`.
pub fn partition(master: &Table, group: &str) -> Table {
    let label = group_label(group);
    match master.column_index(GROUP_COLUMN) {
        Some(idx) => master.filter_rows(|row| row[idx] == label),
        None => Table::new(master.columns.clone()),
    }
}

fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReportError::MissingInput(dir.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}
