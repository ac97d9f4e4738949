//! Orchestration of a reporting run.
//!
//! A run reads every source, merges and formats the Master Report, and only
//! then publishes. Any error before publishing leaves every output untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, instrument};

use crate::config::{Config, CourseConfig};
use crate::error::{ReportError, Result};
use crate::format;
use crate::groups::{self, PartnerTarget, ReportingGroups};
use crate::io::{self, csv_read, downloads, excel_read, mail};
use crate::merge;
use crate::model::{AttendanceSheet, ModuleTable, Table};
use crate::publish::{self, Publisher};

const PROGRESS_REPORT_FILE: &str = "Master Progress Report.csv";
const MASTER_REPORT_FILE: &str = "Master.csv";

/// Everything a run needs, passed explicitly through the stages.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub config: &'a Config,
    pub course: &'a CourseConfig,
}

impl<'a> RunContext<'a> {
    /// Selects the course to run; see [`Config::select_course`].
    pub fn new(config: &'a Config, course: Option<&str>) -> Result<Self> {
        let course = config.select_course(course)?;
        info!(course = %course.name, "course selected");
        Ok(Self { config, course })
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.course.downloads_dir(&self.config.workdir)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.course.reports_dir(&self.config.workdir)
    }

    /// Creates the course's download and report folders.
    pub fn prepare_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.downloads_dir())?;
        fs::create_dir_all(self.reports_dir())?;
        Ok(())
    }

    /// Reads the participant configuration rows that concern this course.
    pub fn reporting_groups(&self) -> Result<ReportingGroups> {
        let table = io::read_table(&self.config.participant_config)?;
        groups::reporting_groups(&table, &self.course.name)
    }
}

/// Reports produced by a run, ready to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltReports {
    /// Progress report rows of group members, labelled with their group.
    pub roster: Table,
    /// The fully merged and formatted Master Report.
    pub master: Table,
    /// One filtered report per partner group.
    pub group_reports: Vec<(PartnerTarget, Table)>,
}

/// Runs every stage and publishes the results.
#[instrument(level = "info", skip_all, fields(course = %ctx.course.name))]
pub fn run(ctx: &RunContext<'_>, publisher: &mut dyn Publisher) -> Result<BuiltReports> {
    let reports = build_reports(ctx)?;
    publish_reports(ctx, &reports, publisher)?;
    info!("run completed");
    Ok(reports)
}

/// Reads the sources and builds every report without publishing anything.
#[instrument(level = "info", skip_all, fields(course = %ctx.course.name))]
pub fn build_reports(ctx: &RunContext<'_>) -> Result<BuiltReports> {
    let rules = &ctx.config.report;
    let reporting = ctx.reporting_groups()?;
    ctx.prepare_dirs()?;

    info!("creating groups");
    let downloads_dir = ctx.downloads_dir();
    let groups = groups::load_groups(&downloads_dir)?;

    info!("generating progress reports");
    let progress_path = groups::find_progress_report(&downloads_dir, &ctx.course.name)?;
    let progress = csv_read::read_table(&progress_path)?;
    let roster = groups::build_roster(&progress, &groups)?;
    groups::ensure_partner_groups(&reporting.partners, &roster)?;

    info!("adding attendance");
    let attendance = read_attendance(&ctx.course.attendance_workbook, &rules.attendance_sheet_prefix)?;
    let master = merge::merge_attendance(&roster, &attendance, &rules.attended_marker)?;

    info!("adding survey answers");
    let modules = read_modules(&ctx.course.answers_workbook)?;
    let master = merge::merge_module_answers(&master, &modules, &rules.concat_categories)?;

    info!("building partner reports");
    let master = format::prepare(master, rules, ctx.course.extended_survey)?;
    let credentials = io::read_table(&ctx.course.credential_table)?;
    let master = merge::merge_credentials(master, &credentials);
    let master = format::finish(&master, rules);

    let group_reports = reporting
        .partners
        .into_iter()
        .map(|partner| {
            let table = groups::partition(&master, &partner.group);
            (partner, table)
        })
        .collect();

    Ok(BuiltReports {
        roster,
        master,
        group_reports,
    })
}

/// Writes local copies of every report and hands them to `publisher`.
#[instrument(level = "info", skip_all, fields(course = %ctx.course.name))]
pub fn publish_reports(
    ctx: &RunContext<'_>,
    reports: &BuiltReports,
    publisher: &mut dyn Publisher,
) -> Result<()> {
    let reports_dir = ctx.reports_dir();

    publish::write_local_copy(&reports_dir, PROGRESS_REPORT_FILE, &reports.roster)?;
    publisher.overwrite_sheet(&ctx.course.progress_sheet, &reports.roster)?;

    for (partner, table) in &reports.group_reports {
        let file_name = publish::group_report_name(&partner.group);
        publish::write_local_copy(&reports_dir, &file_name, table)?;
        publisher.replace_file(&partner.folder, &file_name, table)?;
    }

    info!("writing to master file");
    publish::write_local_copy(&reports_dir, MASTER_REPORT_FILE, &reports.master)?;
    publisher.overwrite_sheet(&ctx.course.master_sheet, &reports.master)?;
    Ok(())
}

/// Fetches the report exports announced in `messages_dir` into the course's
/// download folder.
///
/// The export groups of the participant configuration are only logged, as a
/// checklist for the operator: exports are requested on the course platform
/// by hand, and this step picks up whatever notifications arrived.
#[instrument(level = "info", skip(ctx, opener), fields(course = %ctx.course.name))]
pub fn collect(
    ctx: &RunContext<'_>,
    messages_dir: &Path,
    staging: &Path,
    opener: &mut dyn downloads::LinkOpener,
    poll: Duration,
) -> Result<Vec<PathBuf>> {
    let reporting = ctx.reporting_groups()?;
    info!(groups = ?reporting.export_groups, "groups requiring exports");
    ctx.prepare_dirs()?;

    let messages = mail::read_messages(messages_dir)?;
    if messages.is_empty() {
        return Err(ReportError::NoExportMessages(messages_dir.to_path_buf()));
    }
    let links = mail::export_links(&messages, &ctx.course.name)?;
    downloads::collect_downloads(
        &links,
        opener,
        staging,
        &ctx.downloads_dir(),
        &ctx.course.name,
        poll,
    )
}

fn read_attendance(path: &Path, prefix: &str) -> Result<Vec<AttendanceSheet>> {
    Ok(excel_read::read_sheets(path)?
        .into_iter()
        .map(|sheet| AttendanceSheet::from_sheet(sheet, prefix))
        .collect())
}

fn read_modules(path: &Path) -> Result<Vec<ModuleTable>> {
    let modules: Vec<ModuleTable> = excel_read::read_sheets(path)?
        .into_iter()
        .map(ModuleTable::from_sheet)
        .collect();
    for module in &modules {
        info!(module = %module.name, "answers retrieved");
    }
    Ok(modules)
}
