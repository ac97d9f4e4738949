use std::fs;

use cohort_reports::ReportError;
use cohort_reports::config::{Config, ReportRules};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn course(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "answers_workbook": "answers.xlsx",
        "attendance_workbook": "attendance.xlsx",
        "progress_sheet": "progress.xlsx",
        "master_sheet": "/srv/sheets/master.xlsx",
        "credential_table": "credentials.csv"
    })
}

#[test]
fn defaults_fill_omitted_settings_and_paths_follow_the_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("config.json");
    let document = serde_json::json!({
        "participant_config": "participants.csv",
        "drive_root": "drive",
        "courses": [course("Fall 2023")],
        "report": { "attended_marker": "Y" }
    });
    fs::write(&path, document.to_string()).expect("config written");

    let config = Config::load(&path).expect("config loaded");
    let course = config.select_course(None).expect("single course");

    assert!(course.extended_survey);
    assert_eq!(course.answers_workbook, temp_dir.path().join("answers.xlsx"));
    assert_eq!(course.master_sheet.to_str(), Some("/srv/sheets/master.xlsx"));
    assert_eq!(config.workdir, temp_dir.path().join("."));
    assert_eq!(config.report.attended_marker, "Y");
    assert_eq!(config.report.attendance_sheet_prefix, "TSPS - ");
    assert_eq!(
        config.report.concat_categories,
        ReportRules::default().concat_categories
    );
}

#[test]
fn course_selection_needs_a_name_when_several_are_configured() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("config.json");
    let document = serde_json::json!({
        "participant_config": "participants.csv",
        "drive_root": "drive",
        "courses": [course("Fall 2023"), course("Winter 2024")]
    });
    fs::write(&path, document.to_string()).expect("config written");
    let config = Config::load(&path).expect("config loaded");

    assert!(matches!(config.select_course(None), Err(ReportError::InvalidConfig(_))));
    assert_eq!(
        config.select_course(Some("Winter 2024")).expect("course").name,
        "Winter 2024"
    );
    match config.select_course(Some("Summer")) {
        Err(ReportError::CourseNotFound { name, available }) => {
            assert_eq!(name, "Summer");
            assert_eq!(available, "Fall 2023, Winter 2024");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn invalid_configurations_are_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("config.json");

    assert!(matches!(Config::load(&path), Err(ReportError::MissingInput(_))));

    let document = serde_json::json!({
        "participant_config": "participants.csv",
        "drive_root": "drive",
        "courses": []
    });
    fs::write(&path, document.to_string()).expect("config written");
    assert!(matches!(Config::load(&path), Err(ReportError::InvalidConfig(_))));

    fs::write(&path, "{ not json").expect("config written");
    assert!(matches!(Config::load(&path), Err(ReportError::Json(_))));
}
