//! Tab/comma separated bulk import.
//!
//! # Responsibility
//! - Convert pasted spreadsheet rows into main projects and sub-projects.
//! - Report per-row problems as data while importing everything else.
//!
//! # Invariants
//! - Rows are processed strictly in input order in a single pass.
//! - A row whose first field is a bare number opens a new main project;
//!   other rows attach to the most recent main project.
//! - Import never returns `Err`; problems become `ImportIssue`s.
//! - Import only derives `not-started`, `in-progress` and `completed`.

use crate::config::ImportConfig;
use crate::model::period::PeriodNormalizer;
use crate::model::project::{count_projects, Project, ProjectStatus, ProjectValidationError};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::time::Instant;

static MAIN_ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid ordinal regex"));
static COMPLETION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)%?").expect("valid completion regex"));

/// Data columns that follow the name, in order.
const PLANNED_START: usize = 0;
const PLANNED_END: usize = 1;
const ACTUAL_START: usize = 2;
const ACTUAL_END: usize = 3;
const RESPONSIBLE: usize = 4;
const COMPLETION: usize = 5;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Problem category for one import issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportIssueKind {
    /// Input is blank before any row splitting.
    NoData,
    /// Row has too few fields to recover a name.
    InsufficientColumns { found: usize, required: usize },
    /// Completion cell holds a number that is not a valid percentage.
    InvalidCompletion(String),
    /// Row produced a record that breaks model invariants.
    InvalidRecord(ProjectValidationError),
}

impl Display for ImportIssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no data provided"),
            Self::InsufficientColumns { found, required } => write!(
                f,
                "insufficient data ({found} columns, at least {required} required)"
            ),
            Self::InvalidCompletion(value) => {
                write!(f, "invalid completion percentage `{value}`")
            }
            Self::InvalidRecord(err) => write!(f, "{err}"),
        }
    }
}

/// One import problem, tied to a 1-based row when it concerns a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    pub row: Option<usize>,
    pub kind: ImportIssueKind,
}

impl Display for ImportIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {row}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Outcome of one import call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    /// `true` when nothing went wrong or at least one row was imported.
    pub success: bool,
    /// Top-level records; main projects carry their sub-projects inline.
    pub projects: Vec<Project>,
    pub issues: Vec<ImportIssue>,
    /// Non-blank input lines.
    pub total_rows: usize,
    /// Rows that produced a record.
    pub successful_rows: usize,
}

impl ImportResult {
    fn no_data() -> Self {
        Self {
            success: false,
            projects: Vec::new(),
            issues: vec![ImportIssue {
                row: None,
                kind: ImportIssueKind::NoData,
            }],
            total_rows: 0,
            successful_rows: 0,
        }
    }

    /// Human-readable issue lines in input order.
    pub fn error_messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

enum ParsedRow {
    Main(Project),
    Sub(Project),
}

/// Parses `text` with default import settings and normalizer.
pub fn parse_tabular(text: &str) -> ImportResult {
    parse_tabular_with(text, &ImportConfig::default(), &PeriodNormalizer::default())
}

/// Parses `text` into hierarchical project records.
///
/// # Side effects
/// - Emits one `import_parse` logging event with row counts and duration.
pub fn parse_tabular_with(
    text: &str,
    config: &ImportConfig,
    normalizer: &PeriodNormalizer,
) -> ImportResult {
    let started_at = Instant::now();
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    if text.trim().is_empty() {
        warn!("event=import_parse module=import status=error error_code=no_data total_rows=0");
        return ImportResult::no_data();
    }

    let rows: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let mut projects: Vec<Project> = Vec::new();
    let mut issues = Vec::new();
    let mut successful_rows = 0;
    let mut current_main: Option<usize> = None;

    for (index, line) in rows.iter().enumerate() {
        let row = index + 1;
        match parse_row(line, config, normalizer) {
            Ok(None) => {
                debug!("event=import_row module=import status=skipped row={row} reason=blank_name");
            }
            Ok(Some(ParsedRow::Main(mut project))) => {
                project.sort_order = projects.len() as i64 + 1;
                projects.push(project);
                current_main = Some(projects.len() - 1);
                successful_rows += 1;
            }
            Ok(Some(ParsedRow::Sub(mut project))) => {
                match current_main {
                    Some(parent_index) => {
                        let parent = &mut projects[parent_index];
                        project.sort_order = parent.sub_projects.len() as i64 + 1;
                        parent.attach_sub_project(project);
                    }
                    None => {
                        project.sort_order = projects.len() as i64 + 1;
                        projects.push(project);
                    }
                }
                successful_rows += 1;
            }
            Err(kind) => {
                debug!("event=import_row module=import status=error row={row}");
                issues.push(ImportIssue {
                    row: Some(row),
                    kind,
                });
            }
        }
    }

    info!(
        "event=import_parse module=import status=ok total_rows={} successful_rows={} records={} issues={} duration_ms={}",
        rows.len(),
        successful_rows,
        count_projects(&projects),
        issues.len(),
        started_at.elapsed().as_millis()
    );

    ImportResult {
        success: issues.is_empty() || successful_rows > 0,
        projects,
        issues,
        total_rows: rows.len(),
        successful_rows,
    }
}

fn parse_row(
    line: &str,
    config: &ImportConfig,
    normalizer: &PeriodNormalizer,
) -> Result<Option<ParsedRow>, ImportIssueKind> {
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split(',').map(str::trim).collect()
    };

    let required = config.min_columns.max(2);
    if fields.len() < required {
        return Err(ImportIssueKind::InsufficientColumns {
            found: fields.len(),
            required,
        });
    }

    let first = fields[0];
    let second = fields[1];
    let (is_main, name, data_start) = if MAIN_ORDINAL_RE.is_match(first) {
        if second.is_empty() {
            return Ok(None);
        }
        (true, format!("{first}. {second}"), 2)
    } else if !first.is_empty() {
        (false, first.to_string(), 1)
    } else {
        if second.is_empty() {
            return Ok(None);
        }
        (false, second.to_string(), 2)
    };

    let column = |offset: usize| fields.get(data_start + offset).copied().unwrap_or("");
    let completion_percentage = parse_completion(column(COMPLETION))?;
    let responsible = column(RESPONSIBLE);

    let mut project = Project::new(name);
    project.planned_start = Some(normalizer.normalize(column(PLANNED_START)));
    project.planned_end = Some(normalizer.normalize(column(PLANNED_END)));
    project.actual_start = Some(normalizer.normalize(column(ACTUAL_START)));
    project.actual_end = Some(normalizer.normalize(column(ACTUAL_END)));
    project.completion_percentage = completion_percentage;
    project.status = ProjectStatus::from_completion(completion_percentage);
    project.category = config.category_for(responsible);
    project.responsible = if responsible.is_empty() {
        config.unassigned_responsible.clone()
    } else {
        responsible.to_string()
    };
    project.validate().map_err(ImportIssueKind::InvalidRecord)?;

    Ok(Some(if is_main {
        ParsedRow::Main(project)
    } else {
        ParsedRow::Sub(project)
    }))
}

/// First run of digits in `text`, `0` when there is none.
fn parse_completion(text: &str) -> Result<u8, ImportIssueKind> {
    let Some(caps) = COMPLETION_RE.captures(text) else {
        return Ok(0);
    };
    caps[1]
        .parse::<u8>()
        .ok()
        .filter(|value| *value <= 100)
        .ok_or_else(|| ImportIssueKind::InvalidCompletion(text.to_string()))
}
