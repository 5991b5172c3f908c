//! JSON snapshot of the roadmap hierarchy.
//!
//! # Responsibility
//! - Save, load and clear a single JSON array of main projects.
//!
//! # Invariants
//! - Writes go to a sibling `.tmp` file first and are renamed into place.
//! - A missing snapshot file reads as an empty roadmap.
//! - Loaded records pass `Project::validate()`.

use crate::model::project::{count_projects, Project, ProjectValidationError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufWriter, Write};
use std::path::Path;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Snapshot parsed but holds an invalid record.
    Validation(ProjectValidationError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot io failed: {err}"),
            Self::Json(err) => write!(f, "snapshot is not valid project json: {err}"),
            Self::Validation(err) => write!(f, "snapshot holds an invalid project: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ProjectValidationError> for SnapshotError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Writes `projects` (with inline sub-projects) as pretty JSON.
pub fn save_snapshot(path: impl AsRef<Path>, projects: &[Project]) -> SnapshotResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    let file = std::fs::File::create(&tmp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, projects)?;
    writer.flush()?;
    std::fs::rename(&tmp_path, path)?;

    info!(
        "event=snapshot_save module=store status=ok top_level={} records={}",
        projects.len(),
        count_projects(projects)
    );
    Ok(())
}

/// Reads a snapshot; a missing file yields an empty list.
pub fn load_snapshot(path: impl AsRef<Path>) -> SnapshotResult<Vec<Project>> {
    let path = path.as_ref();
    if !path.exists() {
        info!("event=snapshot_load module=store status=ok records=0 reason=missing");
        return Ok(Vec::new());
    }

    let data = std::fs::read_to_string(path)?;
    let projects: Vec<Project> = serde_json::from_str(&data)?;
    for project in &projects {
        project.validate()?;
    }

    info!(
        "event=snapshot_load module=store status=ok top_level={} records={}",
        projects.len(),
        count_projects(&projects)
    );
    Ok(projects)
}

/// Removes the snapshot; a missing file is not an error.
pub fn clear_snapshot(path: impl AsRef<Path>) -> SnapshotResult<()> {
    match std::fs::remove_file(path.as_ref()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
