//! Export notifications.
//!
//! The course platform announces finished report exports by email. Saved
//! messages (`.eml`) are scanned for the download link and, for survey
//! exports, checked against the course being processed.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::error::{ReportError, Result};

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Click here.*\r?\n\(\s([\s\S]*?)\s\)\r?\n\s*to download")
        .expect("valid link pattern")
});

static SURVEY_COURSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Survey Results For\s(.*\s.*\d{4})\s-\s.*").expect("valid subject pattern")
});

/// Subject marker shared by every export notification.
const EXPORT_MARKER: &str = "Export";
const SURVEY_MARKER: &str = "Survey Results";

/// A saved notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportMessage {
    pub subject: String,
    pub body: String,
}

/// A report download announced by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLink {
    pub url: String,
    pub subject: String,
}

/// Loads every `.eml` file in `dir` whose subject marks it as an export
/// notification, in file-name order. Invalid UTF-8 is replaced rather than
/// rejected.
#[instrument(level = "info", fields(dir = %dir.display()))]
pub fn read_messages(dir: &Path) -> Result<Vec<ExportMessage>> {
    if !dir.is_dir() {
        return Err(ReportError::MissingInput(dir.to_path_buf()));
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"))
        })
        .collect();
    paths.sort();

    let mut messages = Vec::new();
    for path in paths {
        let bytes = fs::read(&path)?;
        let raw = String::from_utf8_lossy(&bytes);
        let message = parse_message(&raw);
        if message.subject.contains(EXPORT_MARKER) {
            messages.push(message);
        } else {
            debug!(path = %path.display(), "not an export notification");
        }
    }
    Ok(messages)
}

/// Splits a raw RFC 822 message into its (unfolded) subject and body.
pub fn parse_message(raw: &str) -> ExportMessage {
    let (headers, body) = match raw.find("\r\n\r\n") {
        Some(pos) => (&raw[..pos], &raw[pos + 4..]),
        None => match raw.find("\n\n") {
            Some(pos) => (&raw[..pos], &raw[pos + 2..]),
            None => (raw, ""),
        },
    };

    let mut subject: Option<String> = None;
    let mut in_subject = false;
    for line in headers.lines() {
        if line.starts_with([' ', '\t']) {
            if let (true, Some(subject)) = (in_subject, subject.as_mut()) {
                subject.push(' ');
                subject.push_str(line.trim());
            }
            continue;
        }
        in_subject = false;
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("subject") {
                subject = Some(value.trim().to_string());
                in_subject = true;
            }
        }
    }

    ExportMessage {
        subject: subject.unwrap_or_default(),
        body: body.to_string(),
    }
}

/// Extracts the download link from a message body, undoing quoted-printable
/// soft line breaks.
pub fn extract_link(body: &str) -> Option<String> {
    let raw = LINK_PATTERN.captures(body)?.get(1)?.as_str();
    let link = raw
        .replace("=\r\n", "")
        .replace("=\n", "")
        .replace("\r\n", "")
        .replace('\n', "")
        .replace("=3D", "=");
    let link = link.trim().to_string();
    (!link.is_empty()).then_some(link)
}

/// Returns the course named by a `Survey Results For <course> - ...` subject.
pub fn survey_course(subject: &str) -> Option<String> {
    let subject = subject.replace("\r\n", "");
    SURVEY_COURSE_PATTERN
        .captures(&subject)
        .and_then(|captures| captures.get(1))
        .map(|course| course.as_str().to_string())
}

/// Collects the download links of `messages` for `course`.
///
/// A survey export for a different course aborts the run; messages without
/// a recognisable link are skipped.
pub fn export_links(messages: &[ExportMessage], course: &str) -> Result<Vec<ExportLink>> {
    let mut links = Vec::new();
    for message in messages {
        if message.subject.contains(SURVEY_MARKER) {
            match survey_course(&message.subject) {
                Some(found) if found != course => {
                    return Err(ReportError::CourseMismatch {
                        expected: course.to_string(),
                        found,
                    });
                }
                Some(_) => {}
                None => {
                    warn!(subject = %message.subject, "survey export without a course name, skipping");
                    continue;
                }
            }
        }

        match extract_link(&message.body) {
            Some(url) => links.push(ExportLink {
                url,
                subject: message.subject.clone(),
            }),
            None => warn!(subject = %message.subject, "no download link in message, skipping"),
        }
    }
    info!(link_count = links.len(), "export links collected");
    Ok(links)
}
