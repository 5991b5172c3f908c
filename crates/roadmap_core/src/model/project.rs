//! Project domain model.
//!
//! # Responsibility
//! - Define the canonical project record shared by import, storage and reports.
//! - Provide the two-level hierarchy helpers (attach, flatten).
//!
//! # Invariants
//! - `id` is stable and never reused for another project.
//! - `is_sub_project` and `parent_id` are set together.
//! - Sub-projects never own sub-projects.
//! - `completion_percentage` stays within `0..=100`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a project record.
pub type ProjectId = Uuid;

/// Lifecycle state of a project.
///
/// Import derives only `NotStarted`, `InProgress` and `Completed` from the
/// completion percentage; `Delayed` and `Continuous` are set by manual edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    NotStarted,
    InProgress,
    Completed,
    Delayed,
    /// Ongoing work without a fixed period range.
    Continuous,
}

impl ProjectStatus {
    /// Status implied by a completion percentage in `0..=100`.
    pub fn from_completion(completion_percentage: u8) -> Self {
        match completion_percentage {
            0 => Self::NotStarted,
            100 => Self::Completed,
            _ => Self::InProgress,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
            Self::Continuous => "continuous",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not-started" => Some(Self::NotStarted),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "delayed" => Some(Self::Delayed),
            "continuous" => Some(Self::Continuous),
            _ => None,
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for [`Project::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    BlankName,
    CompletionOutOfRange(u8),
    /// `is_sub_project` is set but `parent_id` is missing.
    MissingParent,
    /// `parent_id` is set on a main project.
    UnexpectedParent,
    /// A nested record is not a sub-project of its owner.
    InvalidSubProject {
        owner: ProjectId,
        child: ProjectId,
    },
    /// A sub-project carries its own sub-projects.
    NestedSubProjects(ProjectId),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "project name must not be blank"),
            Self::CompletionOutOfRange(value) => {
                write!(f, "completion percentage {value} is outside 0..=100")
            }
            Self::MissingParent => write!(f, "sub-project requires parent_id"),
            Self::UnexpectedParent => write!(f, "main project must not carry parent_id"),
            Self::InvalidSubProject { owner, child } => {
                write!(f, "project {child} is not a sub-project of {owner}")
            }
            Self::NestedSubProjects(id) => {
                write!(f, "sub-project {id} must not own sub-projects")
            }
        }
    }
}

impl Error for ProjectValidationError {}

/// Canonical roadmap project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Period labels; `None` for projects without a fixed range.
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub completion_percentage: u8,
    pub category: String,
    pub responsible: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub is_sub_project: bool,
    #[serde(default)]
    pub parent_id: Option<ProjectId>,
    /// Owned children; only populated on main projects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_projects: Vec<Project>,
    #[serde(default)]
    pub sort_order: i64,
}

impl Project {
    /// Creates a main project with a generated id and empty schedule.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a main project with a caller-provided id.
    pub fn with_id(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            completion_percentage: 0,
            category: String::new(),
            responsible: String::new(),
            status: ProjectStatus::NotStarted,
            is_sub_project: false,
            parent_id: None,
            sub_projects: Vec::new(),
            sort_order: 0,
        }
    }

    /// Turns this record into a sub-project of `parent_id`.
    pub fn into_sub_project_of(mut self, parent_id: ProjectId) -> Self {
        self.is_sub_project = true;
        self.parent_id = Some(parent_id);
        self
    }

    /// Appends `child` as the last sub-project and rewrites its parent link.
    pub fn attach_sub_project(&mut self, child: Project) {
        self.sub_projects.push(child.into_sub_project_of(self.id));
    }

    /// Checks record-level invariants, including owned sub-projects.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        self.validate_fields()?;

        if self.is_sub_project && !self.sub_projects.is_empty() {
            return Err(ProjectValidationError::NestedSubProjects(self.id));
        }

        for child in &self.sub_projects {
            if !child.is_sub_project || child.parent_id != Some(self.id) {
                return Err(ProjectValidationError::InvalidSubProject {
                    owner: self.id,
                    child: child.id,
                });
            }
            if !child.sub_projects.is_empty() {
                return Err(ProjectValidationError::NestedSubProjects(child.id));
            }
            child.validate_fields()?;
        }

        Ok(())
    }

    fn validate_fields(&self) -> Result<(), ProjectValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProjectValidationError::BlankName);
        }
        if self.completion_percentage > 100 {
            return Err(ProjectValidationError::CompletionOutOfRange(
                self.completion_percentage,
            ));
        }
        match (self.is_sub_project, self.parent_id) {
            (true, None) => Err(ProjectValidationError::MissingParent),
            (false, Some(_)) => Err(ProjectValidationError::UnexpectedParent),
            _ => Ok(()),
        }
    }
}

/// Flattens main projects and their sub-projects, parents first.
///
/// Every record appears exactly once; returned sub-projects have empty
/// `sub_projects`, so the output is a flat storage shape.
pub fn flatten_projects(projects: &[Project]) -> Vec<Project> {
    let mut flat = Vec::with_capacity(projects.len());
    for project in projects {
        let mut parent = project.clone();
        let children = std::mem::take(&mut parent.sub_projects);
        flat.push(parent);
        flat.extend(children);
    }
    flat
}

/// Counts every record in a hierarchy.
pub fn count_projects(projects: &[Project]) -> usize {
    projects
        .iter()
        .map(|project| 1 + project.sub_projects.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::{flatten_projects, Project, ProjectStatus, ProjectValidationError};

    #[test]
    fn status_from_completion_covers_bounds() {
        assert_eq!(ProjectStatus::from_completion(0), ProjectStatus::NotStarted);
        assert_eq!(ProjectStatus::from_completion(1), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::from_completion(99), ProjectStatus::InProgress);
        assert_eq!(ProjectStatus::from_completion(100), ProjectStatus::Completed);
    }

    #[test]
    fn status_text_roundtrip() {
        for status in [
            ProjectStatus::NotStarted,
            ProjectStatus::InProgress,
            ProjectStatus::Completed,
            ProjectStatus::Delayed,
            ProjectStatus::Continuous,
        ] {
            assert_eq!(ProjectStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProjectStatus::parse("paused"), None);
    }

    #[test]
    fn attach_sets_parent_link() {
        let mut parent = Project::new("Main");
        parent.attach_sub_project(Project::new("Child"));

        let child = &parent.sub_projects[0];
        assert!(child.is_sub_project);
        assert_eq!(child.parent_id, Some(parent.id));
        parent.validate().unwrap();
    }

    #[test]
    fn validate_rejects_nested_children() {
        let mut parent = Project::new("Main");
        let mut child = Project::new("Child");
        child.sub_projects.push(Project::new("Grandchild"));
        parent.attach_sub_project(child);

        let child_id = parent.sub_projects[0].id;
        assert_eq!(
            parent.validate().unwrap_err(),
            ProjectValidationError::NestedSubProjects(child_id)
        );
    }

    #[test]
    fn flatten_lists_parents_before_children() {
        let mut first = Project::new("First");
        first.attach_sub_project(Project::new("First.a"));
        first.attach_sub_project(Project::new("First.b"));
        let second = Project::new("Second");

        let names: Vec<_> = flatten_projects(&[first, second])
            .into_iter()
            .map(|project| project.name)
            .collect();
        assert_eq!(names, ["First", "First.a", "First.b", "Second"]);
    }
}
