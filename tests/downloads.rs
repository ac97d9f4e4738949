use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use cohort_reports::Result;
use cohort_reports::io::downloads::{
    CommandOpener, LinkOpener, collect_downloads, report_file_name, snapshot, wait_for_download,
};
use cohort_reports::io::mail::ExportLink;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

const COURSE: &str = "Tech Practice Program Fall 2023";
const POLL: Duration = Duration::from_millis(10);

#[test]
fn downloads_are_named_after_their_subject() {
    assert_eq!(
        report_file_name("Export ready: Users for anything", COURSE).expect("name"),
        "User Report.csv"
    );
    assert_eq!(
        report_file_name(
            "Export ready: progress report for tech practice program fall 2023",
            COURSE
        )
        .expect("name"),
        "Progress Report_Tech Practice Program Fall 2023.csv"
    );
    assert_eq!(
        report_file_name("Export ready: users in group for mun engineering", COURSE)
            .expect("name"),
        "Group_Users In Group_Mun Engineering.csv"
    );
    assert_eq!(
        report_file_name(
            "Export ready: Survey Results for Tech Practice Program Fall 2023 - Feedback",
            COURSE
        )
        .expect("name"),
        "Survey Results_Tech Practice Program Fall 2023 - Feedback.csv"
    );
    assert!(report_file_name("no separator here", COURSE).is_err());
    assert!(report_file_name("Export ready: progress", COURSE).is_err());
}

#[test]
fn finished_download_is_returned() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path();
    fs::write(dir.join("old.csv"), "a").expect("file written");
    let before = snapshot(dir).expect("snapshot");
    fs::write(dir.join("export.csv"), "b").expect("file written");

    let found = wait_for_download(dir, &before, POLL).expect("download found");
    assert_eq!(found, dir.join("export.csv"));
}

#[test]
fn partial_download_is_waited_for() {
    let temp_dir = tempdir().expect("temporary directory");
    let dir = temp_dir.path().to_path_buf();
    let before = snapshot(&dir).expect("snapshot");
    fs::write(dir.join("export.csv.crdownload"), "partial").expect("file written");

    let writer_dir = dir.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        fs::rename(
            writer_dir.join("export.csv.crdownload"),
            writer_dir.join("export.csv"),
        )
        .expect("download completed");
    });

    let found = wait_for_download(&dir, &before, POLL).expect("download found");
    writer.join().expect("writer finished");
    assert_eq!(found, dir.join("export.csv"));
}

/// Stands in for a browser: every opened link drops a file into staging.
struct FakeBrowser<'a> {
    staging: &'a Path,
    opened: Vec<String>,
}

impl LinkOpener for FakeBrowser<'_> {
    fn open(&mut self, url: &str) -> Result<()> {
        self.opened.push(url.to_string());
        let name = format!("download-{}.csv", self.opened.len());
        fs::write(self.staging.join(name), "Email\na@x.com\n")?;
        Ok(())
    }
}

#[test]
fn collected_downloads_are_filed_under_the_course() {
    let temp_dir = tempdir().expect("temporary directory");
    let staging = temp_dir.path().join("staging");
    let destination = temp_dir.path().join("course").join("Downloaded Reports");
    fs::create_dir_all(&staging).expect("staging created");

    let links = vec![
        ExportLink {
            url: "https://files.test/1".to_string(),
            subject: "Export ready: Users for everyone".to_string(),
        },
        ExportLink {
            url: "https://files.test/2".to_string(),
            subject: "not an export subject".to_string(),
        },
        ExportLink {
            url: "https://files.test/3".to_string(),
            subject: "Export ready: group members for alpha".to_string(),
        },
    ];
    let mut browser = FakeBrowser {
        staging: &staging,
        opened: Vec::new(),
    };

    let filed = collect_downloads(&links, &mut browser, &staging, &destination, COURSE, POLL)
        .expect("downloads collected");

    assert_eq!(browser.opened, vec!["https://files.test/1", "https://files.test/3"]);
    assert_eq!(
        filed,
        vec![
            destination.join("User Report.csv"),
            destination.join("Group_Group Members_Alpha.csv"),
        ]
    );
    assert!(filed.iter().all(|path| path.exists()));
    assert!(snapshot(&staging).expect("snapshot").is_empty());
}

#[cfg(unix)]
#[test]
fn exited_openers_are_reaped() {
    let mut opener = CommandOpener::new("true", Vec::new());
    opener.open("https://files.platform.test/a").expect("first link opened");
    opener.open("https://files.platform.test/b").expect("second link opened");

    let mut running = opener.reap();
    for _ in 0..500 {
        if running == 0 {
            break;
        }
        thread::sleep(POLL);
        running = opener.reap();
    }
    assert_eq!(running, 0);
}

#[test]
fn missing_opener_program_is_an_error() {
    let mut opener = CommandOpener::new("cohort-reports-no-such-opener", Vec::new());
    assert!(opener.open("https://files.platform.test/a").is_err());
    assert_eq!(opener.reap(), 0);
}
