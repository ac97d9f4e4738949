//! Report downloads.
//!
//! Export links are opened through a [`LinkOpener`] (typically a signed-in
//! browser) which saves the file into a staging directory. The staging
//! directory is polled until the download completes, and the file is then
//! renamed after its notification subject and moved into the course's
//! download folder.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::error::{ReportError, Result};
use crate::groups::title_case;
use crate::io::mail::ExportLink;

/// Suffixes browsers give to files that are still being written.
pub const IN_PROGRESS_SUFFIXES: &[&str] = &[".crdownload", ".part", ".partial"];

/// Default interval between two polls of the staging directory.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens an export link so that its file gets downloaded.
pub trait LinkOpener {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens links by launching an external program with the URL as its last
/// argument.
///
/// The opener may keep running while the download proceeds, so it is not
/// waited for. Exited processes are reaped on every call to `open` and when
/// the opener is dropped.
#[derive(Debug)]
pub struct CommandOpener {
    program: String,
    args: Vec<String>,
    children: Vec<Child>,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            children: Vec::new(),
        }
    }

    /// Collects the exit status of finished openers and returns how many are
    /// still running.
    pub fn reap(&mut self) -> usize {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "opener exited");
                false
            }
            Ok(None) => true,
            Err(error) => {
                warn!(%error, "cannot query opener status");
                false
            }
        });
        self.children.len()
    }
}

impl LinkOpener for CommandOpener {
    fn open(&mut self, url: &str) -> Result<()> {
        self.reap();
        debug!(program = %self.program, %url, "opening export link");
        let child = Command::new(&self.program).args(&self.args).arg(url).spawn()?;
        self.children.push(child);
        Ok(())
    }
}

impl Drop for CommandOpener {
    fn drop(&mut self) {
        let running = self.reap();
        if running > 0 {
            debug!(running, "openers still running on exit");
        }
    }
}

/// Names of the files currently in `dir`.
pub fn snapshot(dir: &Path) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

fn is_in_progress(name: &str) -> bool {
    IN_PROGRESS_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Blocks until exactly one file absent from `before` shows up in `dir` and
/// carries no in-progress suffix, then returns its path.
///
/// There is no timeout: a download that never completes keeps the loop
/// polling until the operator interrupts the run.
pub fn wait_for_download(dir: &Path, before: &BTreeSet<String>, poll: Duration) -> Result<PathBuf> {
    loop {
        let current = snapshot(dir)?;
        let new: Vec<&String> = current.difference(before).collect();
        if let [name] = new.as_slice() {
            if !is_in_progress(name) {
                return Ok(dir.join(name));
            }
        }
        thread::sleep(poll);
    }
}

/// File name given to a downloaded report, derived from the notification
/// subject (`<...>: <report type> for <report name>`).
///
/// User reports are always `User Report.csv`. Reports named after something
/// other than the course are group exports and get a `Group_` prefix, except
/// survey results.
pub fn report_file_name(subject: &str, course: &str) -> Result<String> {
    let lower = subject.to_lowercase();
    let malformed = || ReportError::MalformedSubject(subject.to_string());

    let description = lower.split(": ").nth(1).ok_or_else(malformed)?;
    let mut parts = description.split(" for ");
    let report_type = title_case(parts.next().unwrap_or_default().trim());
    if report_type == "Users" {
        return Ok("User Report.csv".to_string());
    }

    let report_name = parts.next().ok_or_else(malformed)?;
    let report_name = title_case(report_name.replace("\r\n", "").trim());
    let is_survey = lower.contains("survey results");
    if !course.eq_ignore_ascii_case(&report_name) && !is_survey {
        Ok(format!("Group_{report_type}_{report_name}.csv"))
    } else {
        Ok(format!("{report_type}_{report_name}.csv"))
    }
}

/// Downloads every export link and files it under `destination`.
///
/// Links whose subject cannot be turned into a file name are skipped before
/// being opened.
#[instrument(level = "info", skip(links, opener), fields(staging = %staging.display(), destination = %destination.display()))]
pub fn collect_downloads(
    links: &[ExportLink],
    opener: &mut dyn LinkOpener,
    staging: &Path,
    destination: &Path,
    course: &str,
    poll: Duration,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(staging)?;
    fs::create_dir_all(destination)?;

    let mut filed = Vec::with_capacity(links.len());
    for link in links {
        let file_name = match report_file_name(&link.subject, course) {
            Ok(name) => name,
            Err(error) => {
                warn!(%error, "skipping export");
                continue;
            }
        };

        let before = snapshot(staging)?;
        opener.open(&link.url)?;
        let downloaded = wait_for_download(staging, &before, poll)?;

        let target = destination.join(&file_name);
        fs::rename(&downloaded, &target)?;
        info!(file = %file_name, "report downloaded");
        filed.push(target);
    }
    Ok(filed)
}
