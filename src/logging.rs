use tracing_subscriber::EnvFilter;

use crate::error::{ReportError, Result};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level follows the CLI flags:
/// `info` by default, `debug` with `-v`, `trace` with `-vv`, `warn` when quiet.
pub fn init(verbosity: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbosity) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("cohort_reports={level}")))
        .map_err(|error| ReportError::Logging(error.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| ReportError::Logging(error.to_string()))
}
