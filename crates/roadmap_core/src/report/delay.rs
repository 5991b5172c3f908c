//! Quarter delay calculation and delay ranking.
//!
//! # Invariants
//! - Textually equal labels always yield a delay of `0`.
//! - A label without a quarter digit yields `0` ("no information").
//! - Year components are ignored; only quarter digits are compared.

use crate::model::period::quarter_number;
use crate::model::project::{Project, ProjectId, ProjectStatus};
use serde::Serialize;

/// Signed quarter slip between a planned and an actual label.
///
/// Positive means late, negative early, zero on time or unknown.
pub fn calculate_delay(planned: &str, actual: &str) -> i32 {
    if planned == actual {
        return 0;
    }

    let planned_quarter = quarter_number(planned);
    let actual_quarter = quarter_number(actual);
    if planned_quarter == 0 || actual_quarter == 0 {
        return 0;
    }

    i32::from(actual_quarter) - i32::from(planned_quarter)
}

/// Start delay of one project; absent labels count as empty.
pub fn start_delay(project: &Project) -> i32 {
    calculate_delay(
        project.planned_start.as_deref().unwrap_or_default(),
        project.actual_start.as_deref().unwrap_or_default(),
    )
}

/// End delay of one project; absent labels count as empty.
pub fn end_delay(project: &Project) -> i32 {
    calculate_delay(
        project.planned_end.as_deref().unwrap_or_default(),
        project.actual_end.as_deref().unwrap_or_default(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayDirection {
    Late,
    Early,
    OnTime,
}

impl DelayDirection {
    pub fn of(delay: i32) -> Self {
        match delay {
            d if d > 0 => Self::Late,
            d if d < 0 => Self::Early,
            _ => Self::OnTime,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::Early => "early",
            Self::OnTime => "on-time",
        }
    }
}

/// One row of the delay report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDelay {
    pub project_id: ProjectId,
    pub name: String,
    pub planned_start: Option<String>,
    pub actual_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_end: Option<String>,
    pub start_delay: i32,
    pub end_delay: i32,
    pub status: ProjectStatus,
    pub completion_percentage: u8,
}

impl ProjectDelay {
    pub fn from_project(project: &Project) -> Self {
        Self {
            project_id: project.id,
            name: project.name.clone(),
            planned_start: project.planned_start.clone(),
            actual_start: project.actual_start.clone(),
            planned_end: project.planned_end.clone(),
            actual_end: project.actual_end.clone(),
            start_delay: start_delay(project),
            end_delay: end_delay(project),
            status: project.status,
            completion_percentage: project.completion_percentage,
        }
    }

    pub fn direction(&self) -> DelayDirection {
        DelayDirection::of(self.end_delay)
    }
}

/// Ranks main projects that slipped at start or end.
///
/// Sub-projects and projects with both delays at zero are left out; rows
/// are ordered by descending absolute end delay, ties keep input order.
pub fn delay_report(projects: &[Project]) -> Vec<ProjectDelay> {
    let mut rows: Vec<ProjectDelay> = projects
        .iter()
        .filter(|project| !project.is_sub_project)
        .map(ProjectDelay::from_project)
        .filter(|row| row.start_delay != 0 || row.end_delay != 0)
        .collect();
    rows.sort_by_key(|row| std::cmp::Reverse(row.end_delay.abs()));
    rows
}

#[cfg(test)]
mod tests {
    use super::{calculate_delay, DelayDirection};

    #[test]
    fn equal_labels_short_circuit() {
        assert_eq!(calculate_delay("", ""), 0);
        assert_eq!(calculate_delay("later", "later"), 0);
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(DelayDirection::of(2), DelayDirection::Late);
        assert_eq!(DelayDirection::of(-1), DelayDirection::Early);
        assert_eq!(DelayDirection::of(0), DelayDirection::OnTime);
    }
}
