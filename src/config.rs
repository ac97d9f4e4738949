//! Run configuration.
//!
//! A single JSON document describes where the tool finds its sources and
//! publishes its reports for every course offering, together with the
//! reporting rules (keyword categories, column order, eligibility) that shape
//! the Master Report. Every rule table has a built-in default so a
//! configuration only needs to override what differs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one sub-directory per course.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,
    /// Table listing reporting groups per course.
    pub participant_config: PathBuf,
    /// Local directory standing in for the shared drive.
    pub drive_root: PathBuf,
    pub courses: Vec<CourseConfig>,
    #[serde(default)]
    pub report: ReportRules,
}

/// Sources and destinations of a single course offering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseConfig {
    pub name: String,
    pub answers_workbook: PathBuf,
    pub attendance_workbook: PathBuf,
    /// Spreadsheet receiving the group-labelled roster.
    pub progress_sheet: PathBuf,
    /// Spreadsheet receiving the final Master Report.
    pub master_sheet: PathBuf,
    pub credential_table: PathBuf,
    /// Whether the extended-survey eligibility flag applies to this offering.
    #[serde(default = "default_true")]
    pub extended_survey: bool,
}

impl CourseConfig {
    pub fn downloads_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.name).join("Downloaded Reports")
    }

    pub fn reports_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.name).join("Reports")
    }
}

/// Rules applied by the Record Merger and the Report Formatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRules {
    pub concat_categories: Vec<ConcatCategory>,
    pub leading_columns: Vec<String>,
    pub feedback_columns: Vec<String>,
    /// Case-insensitive regex fragments naming columns to remove.
    pub pruned_columns: Vec<String>,
    pub eligibility: EligibilityRule,
    pub attendance_sheet_prefix: String,
    pub attended_marker: String,
}

/// A keyword category of the concatenation rule.
///
/// A module whose name contains any of `module_markers` (case-insensitively)
/// gets a `concat_answers` column joining every answer whose header contains
/// one of `fragments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatCategory {
    pub category: String,
    pub module_markers: Vec<String>,
    pub fragments: Vec<String>,
}

/// Enumerated intake answers that make a participant eligible for the
/// extended survey. Every field must match one of its accepted values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRule {
    pub column: String,
    pub flag: String,
    pub fields: Vec<AcceptedAnswers>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedAnswers {
    pub column: String,
    pub accepted: Vec<String>,
}

impl Config {
    /// Loads and validates the configuration stored at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingInput(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Anchors relative paths at `base`, the directory of the configuration
    /// file.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.workdir);
        resolve(&mut self.participant_config);
        resolve(&mut self.drive_root);
        for course in &mut self.courses {
            resolve(&mut course.answers_workbook);
            resolve(&mut course.attendance_workbook);
            resolve(&mut course.progress_sheet);
            resolve(&mut course.master_sheet);
            resolve(&mut course.credential_table);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.courses.is_empty() {
            return Err(ReportError::InvalidConfig("no courses configured".into()));
        }
        if let Some(course) = self.courses.iter().find(|course| course.name.trim().is_empty()) {
            return Err(ReportError::InvalidConfig(format!(
                "course with empty name (answers workbook {})",
                course.answers_workbook.display()
            )));
        }
        for category in &self.report.concat_categories {
            if category.module_markers.is_empty() {
                return Err(ReportError::InvalidConfig(format!(
                    "concat category '{}' has no module markers",
                    category.category
                )));
            }
        }
        Ok(())
    }

    /// Picks the course to process. Without an explicit name the listing must
    /// contain exactly one course.
    pub fn select_course(&self, name: Option<&str>) -> Result<&CourseConfig> {
        let available = || {
            self.courses
                .iter()
                .map(|course| course.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match name {
            Some(name) => self
                .courses
                .iter()
                .find(|course| course.name == name)
                .ok_or_else(|| ReportError::CourseNotFound {
                    name: name.to_string(),
                    available: available(),
                }),
            None if self.courses.len() == 1 => Ok(&self.courses[0]),
            None => Err(ReportError::InvalidConfig(format!(
                "several courses configured, select one with --course ({})",
                available()
            ))),
        }
    }
}

impl Default for ReportRules {
    fn default() -> Self {
        Self {
            concat_categories: default_concat_categories(),
            leading_columns: strings(&[
                "First Name",
                "Last Name",
                "Email",
                "Credential Status",
                "Notes",
                "Last Sign In",
                "Request a micro-credential_Submitted At",
                "Group",
                "Attendance Count",
                "% Completed",
            ]),
            feedback_columns: strings(&[
                "Feedback_Overall how do you rate your experience of participating in the TS program?",
            ]),
            pruned_columns: strings(&["Token", "last_name", "first_name"]),
            eligibility: EligibilityRule::default(),
            attendance_sheet_prefix: "TSPS - ".to_string(),
            attended_marker: "ATTENDED".to_string(),
        }
    }
}

impl Default for EligibilityRule {
    fn default() -> Self {
        const INTAKE: &str = "Before You Begin + Welcome Survey_";
        Self {
            column: "Extended Survey Eligibility".to_string(),
            flag: "Yes".to_string(),
            fields: vec![
                AcceptedAnswers {
                    column: format!("{INTAKE}Which best describes you?  Are you currently..._1"),
                    accepted: strings(&[
                        "Completing a Bachelor's degree",
                        "Completing an apprenticeship or trades qualification",
                        "Completing a College/CEGEP certificate or diploma",
                        "Completing a University certificate or diploma",
                    ]),
                },
                AcceptedAnswers {
                    column: format!("{INTAKE}Which best describes you? Are you currently..._2"),
                    accepted: strings(&[
                        "A Canadian citizen studying at a Canadian post-secondary institution",
                        "A Canadian permanent resident studying at a Canadian post-secondary institution",
                        "An international student studying at a Canadian post-secondary institution",
                    ]),
                },
                AcceptedAnswers {
                    column: format!(
                        "{INTAKE}The Tech Stewardship Practice Program is most effective when it overlays a current experiential or work integrated learning experience. Please let us know what type of experience opportunity(s) you will have this semester:"
                    ),
                    accepted: strings(&[
                        "I will not have a current experiential or work integrated learning experience this semester",
                    ]),
                },
            ],
        }
    }
}

/// Built-in keyword categories, checked in order; the first match wins.
pub fn default_concat_categories() -> Vec<ConcatCategory> {
    vec![
        ConcatCategory {
            category: "share a story".to_string(),
            module_markers: strings(&["share a story"]),
            fragments: strings(&[
                "what kind of story do you want to share this week?",
                "describe the situation",
                "how does",
                "what opportunities",
            ]),
        },
        ConcatCategory {
            category: "advance understanding".to_string(),
            module_markers: strings(&["advance understanding", "deliberate values"]),
            fragments: strings(&["what questions are you currently", "what stood", "how was"]),
        },
        ConcatCategory {
            category: "career management".to_string(),
            module_markers: strings(&["career management"]),
            fragments: strings(&["situation", "new opportunity", "small action"]),
        },
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}
