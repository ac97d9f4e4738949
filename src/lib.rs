//! Core library for the cohort-reports command line application.
//!
//! The library exposes the stages of a reporting run as composable pieces:
//! source readers and writers live under [`io`], the tabular representation
//! in [`model`], the roster-anchored joins in [`merge`], column pruning and
//! ordering in [`format`], group handling in [`groups`], report destinations
//! in [`publish`], and the run orchestration in [`pipeline`].

pub mod config;
pub mod error;
pub mod format;
pub mod groups;
pub mod io;
pub mod logging;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod publish;

pub use error::{ReportError, Result};
