//! Publisher.
//!
//! Reports leave the pipeline through the [`Publisher`] trait: a spreadsheet
//! is always overwritten in full, and a file placed in a shared folder
//! replaces any same-named file already there.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::io::{csv_write, excel_write};
use crate::model::Table;

/// Destination for finished reports.
pub trait Publisher {
    /// Replaces the whole content of the spreadsheet at `target`.
    fn overwrite_sheet(&mut self, target: &Path, table: &Table) -> Result<()>;

    /// Uploads `table` as `file_name` into `folder`, discarding any existing
    /// file with the same name first.
    fn replace_file(&mut self, folder: &str, file_name: &str, table: &Table) -> Result<()>;
}

/// Publishes to the local filesystem, with shared folders resolved beneath a
/// drive root directory.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    drive_root: PathBuf,
}

impl LocalPublisher {
    pub fn new(drive_root: impl Into<PathBuf>) -> Self {
        Self {
            drive_root: drive_root.into(),
        }
    }

    pub fn folder_path(&self, folder: &str) -> PathBuf {
        self.drive_root.join(folder)
    }
}

impl Publisher for LocalPublisher {
    #[instrument(level = "debug", skip(self, table), fields(target = %target.display(), rows = table.len()))]
    fn overwrite_sheet(&mut self, target: &Path, table: &Table) -> Result<()> {
        excel_write::write_sheet(target, table)
    }

    #[instrument(level = "debug", skip(self, table), fields(rows = table.len()))]
    fn replace_file(&mut self, folder: &str, file_name: &str, table: &Table) -> Result<()> {
        let folder = self.folder_path(folder);
        fs::create_dir_all(&folder)?;
        let path = folder.join(file_name);
        if path.exists() {
            debug!(path = %path.display(), "removing previous upload");
            fs::remove_file(&path)?;
        }
        csv_write::write_table(&path, table)
    }
}

/// File name of a group's report.
pub fn group_report_name(group: &str) -> String {
    format!("{group} Progress Report.csv")
}

/// Writes a local CSV copy of a report into the course's report folder.
pub fn write_local_copy(reports_dir: &Path, file_name: &str, table: &Table) -> Result<PathBuf> {
    let path = reports_dir.join(file_name);
    csv_write::write_table(&path, table)?;
    info!(path = %path.display(), rows = table.len(), "report written");
    Ok(path)
}
