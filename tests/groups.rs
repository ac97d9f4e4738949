mod common;

use std::fs;

use cohort_reports::ReportError;
use cohort_reports::groups::{
    PartnerTarget, build_roster, ensure_partner_groups, find_progress_report, folder_id,
    group_label, group_name_from_file, load_groups, partition, reporting_groups, title_case,
};
use cohort_reports::model::{Group, Table};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn labels_are_title_cased_lower_cased_names() {
    assert_eq!(title_case("mun engineering"), "Mun Engineering");
    assert_eq!(title_case("o'neil-smith 2b"), "O'Neil-Smith 2B");
    assert_eq!(group_label("UNIVERSITY OF WATERLOO"), "University Of Waterloo");
    assert_eq!(group_label("McGill"), "Mcgill");
}

#[test]
fn group_names_come_from_the_last_file_name_token() {
    assert_eq!(group_name_from_file("Group_Users_Mun Engineering.csv"), "Mun Engineering");
    assert_eq!(group_name_from_file("Group_Progress Report_Ryerson.csv"), "Ryerson");
    assert_eq!(group_name_from_file("plain"), "plain");
}

fn progress() -> Table {
    Table::from_rows(
        &["First Name", "Last Name", "Email", "% Completed"],
        &[
            &["Cy", "Zed", "c@x.com", "10"],
            &["Ada", "Lovelace", "a@x.com", "100"],
            &["Bo", "Adams", "b@x.com", "50"],
            &["Di", "Noone", "d@x.com", "0"],
        ],
    )
}

fn groups() -> Vec<Group> {
    vec![
        Group {
            name: "alpha team".to_string(),
            emails: vec!["a@x.com".to_string(), "c@x.com".to_string()],
        },
        Group {
            name: "Beta".to_string(),
            emails: vec!["b@x.com".to_string(), "a@x.com".to_string()],
        },
    ]
}

#[test]
fn roster_keeps_group_members_sorted_by_last_name() {
    let roster = build_roster(&progress(), &groups()).expect("roster built");

    assert_eq!(
        roster.columns,
        vec!["First Name", "Last Name", "Email", "% Completed", "Group"]
    );
    assert_eq!(
        roster.column_values("Email").expect("Email column"),
        vec!["a@x.com", "c@x.com", "b@x.com"]
    );
    assert_eq!(
        roster.column_values("Group").expect("Group column"),
        vec!["Alpha Team", "Alpha Team", "Beta"]
    );
}

#[test]
fn roster_requires_an_email_column() {
    let table = Table::from_rows(&["Name"], &[&["Ada"]]);
    assert!(build_roster(&table, &groups()).is_err());
}

#[test]
fn participant_configuration_splits_exports_and_partners() {
    let config = Table::from_rows(
        &["Group", "Fall 2023", "Winter 2024"],
        &[
            &["Alpha Team", "x", ""],
            &["beta", "https://drive.google.com/drive/folders/1AbC/", "x"],
            &["Gamma", "", "shared/gamma"],
        ],
    );

    let fall = reporting_groups(&config, "Fall 2023").expect("groups read");
    assert_eq!(fall.export_groups, vec!["Alpha Team"]);
    assert_eq!(
        fall.partners,
        vec![PartnerTarget {
            group: "beta".to_string(),
            folder: "1AbC".to_string(),
        }]
    );

    let winter = reporting_groups(&config, "Winter 2024").expect("groups read");
    assert_eq!(winter.export_groups, vec!["beta"]);
    assert_eq!(winter.partners[0].folder, "shared/gamma");

    assert!(reporting_groups(&config, "Spring 2025").is_err());
    assert_eq!(folder_id("local/folder"), "local/folder");
}

#[test]
fn only_markers_and_folder_references_are_reporting_groups() {
    let config = Table::from_rows(
        &["Group", "Fall 2023"],
        &[
            &["Acme", "x"],
            &["Beta", "n"],
            &["Gamma", "X"],
            &["Delta", "https://drive.google.com/drive/folders/abc"],
            &["Epsilon", "ask Dana first"],
        ],
    );

    let groups = reporting_groups(&config, "Fall 2023").expect("groups read");

    assert_eq!(groups.export_groups, vec!["Acme", "Gamma"]);
    assert_eq!(
        groups.partners,
        vec![PartnerTarget {
            group: "Delta".to_string(),
            folder: "abc".to_string(),
        }]
    );
}

#[test]
fn unknown_partner_group_is_fatal() {
    let roster = build_roster(&progress(), &groups()).expect("roster built");
    let known = vec![PartnerTarget {
        group: "ALPHA TEAM".to_string(),
        folder: "f".to_string(),
    }];
    assert!(ensure_partner_groups(&known, &roster).is_ok());

    let unknown = vec![PartnerTarget {
        group: "Delta".to_string(),
        folder: "f".to_string(),
    }];
    match ensure_partner_groups(&unknown, &roster) {
        Err(ReportError::GroupNotFound(group)) => assert_eq!(group, "Delta"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn partition_matches_normalised_group_names() {
    let roster = build_roster(&progress(), &groups()).expect("roster built");
    let alpha = partition(&roster, "alpha TEAM");
    assert_eq!(
        alpha.column_values("Email").expect("Email column"),
        vec!["a@x.com", "c@x.com"]
    );
    assert!(partition(&roster, "nobody").is_empty());
}

#[test]
fn group_exports_and_progress_report_are_found_on_disk() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    fs::write(dir.join("Group_Users_Alpha.csv"), "First name,Email\nAda,a@x.com\nCy,c@x.com\n")
        .expect("group written");
    fs::write(dir.join("Group_Users_Broken.csv"), "Name\nAda\n").expect("group written");
    fs::write(dir.join("Progress Report_Old Course.csv"), "Email\n").expect("report written");
    fs::write(dir.join("Progress Report_Fall 2023.csv"), "Email\na@x.com\n")
        .expect("report written");

    let groups = load_groups(dir).expect("groups loaded");
    assert_eq!(
        groups,
        vec![Group {
            name: "Alpha".to_string(),
            emails: vec!["a@x.com".to_string(), "c@x.com".to_string()],
        }]
    );

    let report = find_progress_report(dir, "fall 2023").expect("report found");
    assert_eq!(report, dir.join("Progress Report_Fall 2023.csv"));

    assert!(matches!(
        find_progress_report(dir, "Spring 2030"),
        Err(ReportError::ProgressReportNotFound { .. })
    ));
}
