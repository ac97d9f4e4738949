use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the different failure cases that can occur while the
/// tool reads its sources, merges participant records, or publishes reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the configuration file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a CSV source or output cannot be processed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the spreadsheet writer implementation.
    #[error("spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the spreadsheet reader implementation.
    #[error("spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::XlsxError),

    /// Raised when the configuration is structurally valid JSON but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised when the requested course is not part of the configured listing.
    #[error("no course named '{name}' found (available: {available})")]
    CourseNotFound { name: String, available: String },

    /// Raised when a partner group has no matching group export.
    #[error("group '{0}' not found in the course roster")]
    GroupNotFound(String),

    /// Raised when the downloads folder holds no progress report for the course.
    #[error("no progress report for course '{course}' in {dir}")]
    ProgressReportNotFound { course: String, dir: PathBuf },

    /// Raised when an export notification belongs to a different course.
    #[error("export for course '{found}' does not belong to course '{expected}'")]
    CourseMismatch { expected: String, found: String },

    /// Raised when no export notification messages are available.
    #[error("no export messages found in {0}")]
    NoExportMessages(PathBuf),

    /// Raised when a notification subject does not follow the export convention.
    #[error("malformed export subject '{0}'")]
    MalformedSubject(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
