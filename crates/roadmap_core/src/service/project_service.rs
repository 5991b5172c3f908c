//! Project use-case service.
//!
//! # Responsibility
//! - Enforce the two-level hierarchy above the repository layer.
//! - Assemble flat storage rows into main projects with sub-projects.
//! - Run tabular imports and persist what they produce.
//!
//! # Invariants
//! - A sub-project's parent exists and is a main project.
//! - A project that owns sub-projects cannot become a sub-project.
//! - Display names are trimmed and never blank.

use crate::config::RoadmapConfig;
use crate::import::tabular::{parse_tabular_with, ImportResult};
use crate::model::project::{Project, ProjectId, ProjectStatus, ProjectValidationError};
use crate::repo::project_repo::{ProjectPatch, ProjectRepository, RepoError, ReorderScope};
use log::{info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Name is blank after trim.
    InvalidName,
    ProjectNotFound(ProjectId),
    ParentNotFound(ProjectId),
    /// Requested parent is itself a sub-project.
    ParentIsSubProject(ProjectId),
    /// Project owns sub-projects and cannot be nested.
    HasSubProjects(ProjectId),
    /// Project was asked to become its own parent.
    SelfParent(ProjectId),
    Validation(ProjectValidationError),
    Repo(RepoError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "project name must not be blank"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent project not found: {id}"),
            Self::ParentIsSubProject(id) => {
                write!(f, "parent project {id} is a sub-project")
            }
            Self::HasSubProjects(id) => {
                write!(f, "project {id} owns sub-projects and cannot be nested")
            }
            Self::SelfParent(id) => write!(f, "project {id} cannot be its own parent"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ProjectNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Form input for a new project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub planned_start: Option<String>,
    pub planned_end: Option<String>,
    pub actual_start: Option<String>,
    pub actual_end: Option<String>,
    pub completion_percentage: u8,
    pub category: String,
    pub responsible: String,
    /// Derived from completion when `None`.
    pub status: Option<ProjectStatus>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_project(self) -> Result<Project, ProjectServiceError> {
        let name = normalize_name(&self.name)?;
        let mut project = Project::new(name);
        project.planned_start = self.planned_start;
        project.planned_end = self.planned_end;
        project.actual_start = self.actual_start;
        project.actual_end = self.actual_end;
        project.completion_percentage = self.completion_percentage;
        project.category = self.category;
        project.responsible = self.responsible;
        project.status = self
            .status
            .unwrap_or_else(|| ProjectStatus::from_completion(self.completion_percentage));
        Ok(project)
    }
}

/// Project service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads every project as main projects with sub-projects attached.
    pub fn load_roadmap(&self) -> Result<Vec<Project>, ProjectServiceError> {
        Ok(assemble_hierarchy(self.repo.list_projects()?))
    }

    /// Loads one record; main projects come back with their sub-projects.
    pub fn get_project(&self, id: ProjectId) -> Result<Project, ProjectServiceError> {
        let mut project = self
            .repo
            .get_project(id)?
            .ok_or(ProjectServiceError::ProjectNotFound(id))?;
        if !project.is_sub_project {
            project.sub_projects = self.repo.list_sub_projects(id)?;
        }
        Ok(project)
    }

    pub fn create_main_project(&self, draft: ProjectDraft) -> Result<Project, ProjectServiceError> {
        let project = draft.into_project()?;
        Ok(self.repo.create_project(&project)?)
    }

    pub fn create_sub_project(
        &self,
        parent_id: ProjectId,
        draft: ProjectDraft,
    ) -> Result<Project, ProjectServiceError> {
        self.ensure_main_parent(parent_id)?;
        let project = draft.into_project()?.into_sub_project_of(parent_id);
        Ok(self.repo.create_project(&project)?)
    }

    /// Applies a partial update, checking hierarchy moves first.
    pub fn update_project(
        &self,
        id: ProjectId,
        mut patch: ProjectPatch,
    ) -> Result<Project, ProjectServiceError> {
        if let Some(name) = patch.name.as_deref() {
            patch.name = Some(normalize_name(name)?);
        }

        if let Some(Some(parent_id)) = patch.parent_id {
            if parent_id == id {
                return Err(ProjectServiceError::SelfParent(id));
            }
            self.ensure_main_parent(parent_id)?;
            if !self.repo.list_sub_projects(id)?.is_empty() {
                return Err(ProjectServiceError::HasSubProjects(id));
            }
        }

        Ok(self.repo.update_project(id, &patch)?)
    }

    /// Deletes a project; sub-projects of a main project go with it.
    pub fn delete_project(&self, id: ProjectId) -> Result<usize, ProjectServiceError> {
        let removed = self.repo.delete_project(id)?;
        info!("event=project_delete module=service status=ok removed={removed}");
        Ok(removed)
    }

    pub fn reorder(
        &self,
        scope: ReorderScope,
        ids: &[ProjectId],
    ) -> Result<(), ProjectServiceError> {
        if let ReorderScope::SubProjectsOf(parent_id) = scope {
            self.ensure_main_parent(parent_id)?;
        }
        Ok(self.repo.reorder_projects(scope, ids)?)
    }

    /// Parses `text` and persists every record it produced.
    ///
    /// Row-level problems stay in the returned `ImportResult`; only
    /// persistence failures are returned as errors.
    pub fn import_text(
        &self,
        text: &str,
        config: &RoadmapConfig,
    ) -> Result<ImportResult, ProjectServiceError> {
        let result = parse_tabular_with(text, &config.import, &config.normalizer);
        if !result.projects.is_empty() {
            self.repo.create_projects(&result.projects)?;
        }
        Ok(result)
    }

    /// Appends already-built top-level records after the existing ones.
    pub fn import_projects(&self, projects: &[Project]) -> Result<usize, ProjectServiceError> {
        Ok(self.repo.create_projects(projects)?)
    }

    /// Replaces the stored roadmap with `projects`, keeping their ids.
    ///
    /// Records are checked before anything is deleted; on failure the
    /// stored roadmap is left unchanged.
    pub fn restore_projects(&self, projects: &[Project]) -> Result<usize, ProjectServiceError> {
        Ok(self.repo.replace_projects(projects)?)
    }

    fn ensure_main_parent(&self, parent_id: ProjectId) -> Result<(), ProjectServiceError> {
        let parent = self
            .repo
            .get_project(parent_id)?
            .ok_or(ProjectServiceError::ParentNotFound(parent_id))?;
        if parent.is_sub_project {
            return Err(ProjectServiceError::ParentIsSubProject(parent_id));
        }
        Ok(())
    }
}

/// Groups flat rows into main projects with ordered sub-projects.
///
/// Main projects keep their input order. Sub-projects are sorted by
/// `sort_order` (stable). Sub-projects whose parent is missing are dropped.
pub fn assemble_hierarchy(flat: Vec<Project>) -> Vec<Project> {
    let mut main_projects = Vec::new();
    let mut children: HashMap<ProjectId, Vec<Project>> = HashMap::new();

    for project in flat {
        match project.parent_id {
            Some(parent_id) if project.is_sub_project => {
                children.entry(parent_id).or_default().push(project);
            }
            _ => main_projects.push(project),
        }
    }

    for project in &mut main_projects {
        if let Some(mut subs) = children.remove(&project.id) {
            subs.sort_by_key(|sub| sub.sort_order);
            project.sub_projects = subs;
        }
    }

    let orphaned: usize = children.values().map(Vec::len).sum();
    if orphaned > 0 {
        warn!("event=roadmap_assemble module=service status=warn orphaned_sub_projects={orphaned}");
    }

    main_projects
}

fn normalize_name(value: &str) -> Result<String, ProjectServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProjectServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
