use std::fs;

use cohort_reports::ReportError;
use cohort_reports::io::mail::{
    ExportLink, ExportMessage, export_links, extract_link, parse_message, read_messages,
    survey_course,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const SURVEY_EXPORT: &str = "From: Platform <noreply@platform.test>\r\n\
Subject: Your Export is ready: Survey Results For Tech Practice Program\r\n Fall 2023 - Welcome Survey\r\n\
Content-Type: text/plain\r\n\
\r\n\
Hi,\r\n\
Click here to download your export\r\n\
( https://files.platform.test/exports/abc=\r\n123.csv )\r\n\
 to download the file.\r\n";

const USERS_EXPORT: &str = "Subject: Export ready: Users for Tech Practice Program Fall 2023\n\
\n\
Click here\n\
( https://files.platform.test/exports/users?id=3D42 )\n\
 to download\n";

#[test]
fn messages_are_split_into_unfolded_subject_and_body() {
    let message = parse_message(SURVEY_EXPORT);
    assert_eq!(
        message.subject,
        "Your Export is ready: Survey Results For Tech Practice Program Fall 2023 - Welcome Survey"
    );
    assert!(message.body.starts_with("Hi,"));
}

#[test]
fn links_lose_soft_line_breaks() {
    let message = parse_message(SURVEY_EXPORT);
    assert_eq!(
        extract_link(&message.body).as_deref(),
        Some("https://files.platform.test/exports/abc123.csv")
    );
    assert_eq!(
        extract_link(&parse_message(USERS_EXPORT).body).as_deref(),
        Some("https://files.platform.test/exports/users?id=42")
    );
    assert_eq!(extract_link("no link here"), None);
}

#[test]
fn survey_subject_names_the_course() {
    assert_eq!(
        survey_course("Export: Survey Results For Tech Practice Program Fall 2023 - Feedback")
            .as_deref(),
        Some("Tech Practice Program Fall 2023")
    );
    assert_eq!(survey_course("Export: Users for Someone"), None);
}

#[test]
fn links_are_collected_for_the_selected_course() {
    let messages = vec![
        parse_message(SURVEY_EXPORT),
        parse_message(USERS_EXPORT),
        ExportMessage {
            subject: "Export ready: Progress".to_string(),
            body: "nothing to click".to_string(),
        },
    ];

    let links = export_links(&messages, "Tech Practice Program Fall 2023").expect("links");

    assert_eq!(
        links,
        vec![
            ExportLink {
                url: "https://files.platform.test/exports/abc123.csv".to_string(),
                subject: messages[0].subject.clone(),
            },
            ExportLink {
                url: "https://files.platform.test/exports/users?id=42".to_string(),
                subject: messages[1].subject.clone(),
            },
        ]
    );
}

#[test]
fn survey_export_for_another_course_is_fatal() {
    let messages = vec![parse_message(SURVEY_EXPORT)];
    match export_links(&messages, "Other Program Winter 2024") {
        Err(ReportError::CourseMismatch { found, .. }) => {
            assert_eq!(found, "Tech Practice Program Fall 2023")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn only_export_notifications_are_read() {
    let temp_dir = tempdir().expect("temporary directory");
    fs::write(temp_dir.path().join("01.eml"), SURVEY_EXPORT).expect("message written");
    fs::write(temp_dir.path().join("02.eml"), "Subject: Weekly newsletter\n\nhello\n")
        .expect("message written");
    fs::write(temp_dir.path().join("notes.txt"), USERS_EXPORT).expect("file written");

    let messages = read_messages(temp_dir.path()).expect("messages read");

    assert_eq!(messages.len(), 1);
    assert!(messages[0].subject.contains("Survey Results"));
}

#[test]
fn messages_with_invalid_utf8_are_still_read() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut raw = USERS_EXPORT.as_bytes().to_vec();
    raw.extend_from_slice(b"\nSigned: Ren\xe9e\n");
    fs::write(temp_dir.path().join("01.eml"), raw).expect("message written");

    let messages = read_messages(temp_dir.path()).expect("messages read");

    assert_eq!(messages.len(), 1);
    assert!(messages[0].body.contains("Ren\u{fffd}e"));
    assert!(extract_link(&messages[0].body).is_some());
}
