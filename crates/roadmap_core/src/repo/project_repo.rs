//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, bulk insert and sibling reordering over `projects`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Project::validate()` before SQL mutations.
//! - Sibling scopes are "all main projects" or "sub-projects of one parent".
//! - Listing is deterministic: `sort_order ASC, created_at ASC, rowid ASC`.
//! - Deleting a main project deletes its sub-projects.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::project::{Project, ProjectId, ProjectStatus, ProjectValidationError};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    planned_start,
    planned_end,
    actual_start,
    actual_end,
    completion_percentage,
    category,
    responsible,
    status,
    is_sub_project,
    parent_id,
    sort_order
FROM projects";

const PROJECT_ORDER_SQL: &str = "ORDER BY sort_order ASC, created_at ASC, rowid ASC";

const REQUIRED_COLUMNS: [&str; 15] = [
    "id",
    "name",
    "planned_start",
    "planned_end",
    "actual_start",
    "actual_end",
    "completion_percentage",
    "category",
    "responsible",
    "status",
    "is_sub_project",
    "parent_id",
    "sort_order",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for project persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ProjectValidationError),
    Db(DbError),
    NotFound(ProjectId),
    /// Reorder list contains a project outside the requested scope.
    NotInScope(ProjectId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::NotInScope(id) => write!(f, "project {id} is outside the reorder scope"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "project repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "project repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProjectValidationError> for RepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Sibling group whose `sort_order` values form one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    MainProjects,
    SubProjectsOf(ProjectId),
}

impl ReorderScope {
    pub fn of(project: &Project) -> Self {
        match project.parent_id {
            Some(parent_id) if project.is_sub_project => Self::SubProjectsOf(parent_id),
            _ => Self::MainProjects,
        }
    }

    fn parent_id(self) -> Option<ProjectId> {
        match self {
            Self::MainProjects => None,
            Self::SubProjectsOf(parent_id) => Some(parent_id),
        }
    }
}

/// Partial update; `None` leaves a field unchanged.
///
/// Optional period fields use `Some(None)` to clear the stored label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub planned_start: Option<Option<String>>,
    pub planned_end: Option<Option<String>>,
    pub actual_start: Option<Option<String>>,
    pub actual_end: Option<Option<String>>,
    pub completion_percentage: Option<u8>,
    pub category: Option<String>,
    pub responsible: Option<String>,
    pub status: Option<ProjectStatus>,
    /// `Some(Some(id))` moves under `id`, `Some(None)` promotes to main.
    pub parent_id: Option<Option<ProjectId>>,
    pub sort_order: Option<i64>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies set fields onto `project`.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(value) = &self.planned_start {
            project.planned_start = value.clone();
        }
        if let Some(value) = &self.planned_end {
            project.planned_end = value.clone();
        }
        if let Some(value) = &self.actual_start {
            project.actual_start = value.clone();
        }
        if let Some(value) = &self.actual_end {
            project.actual_end = value.clone();
        }
        if let Some(value) = self.completion_percentage {
            project.completion_percentage = value;
        }
        if let Some(value) = &self.category {
            project.category = value.clone();
        }
        if let Some(value) = &self.responsible {
            project.responsible = value.clone();
        }
        if let Some(value) = self.status {
            project.status = value;
        }
        if let Some(parent_id) = self.parent_id {
            project.parent_id = parent_id;
            project.is_sub_project = parent_id.is_some();
        }
        if let Some(value) = self.sort_order {
            project.sort_order = value;
        }
    }
}

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Lists every stored record, flat, in display order.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Loads one record without its sub-projects.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists the sub-projects of one parent in display order.
    fn list_sub_projects(&self, parent_id: ProjectId) -> RepoResult<Vec<Project>>;
    /// Inserts one record (plus inline sub-projects) at the end of its scope.
    fn create_project(&self, project: &Project) -> RepoResult<Project>;
    /// Inserts many top-level records after the existing main projects.
    fn create_projects(&self, projects: &[Project]) -> RepoResult<usize>;
    /// Deletes every stored record, then inserts `projects` as given.
    fn replace_projects(&self, projects: &[Project]) -> RepoResult<usize>;
    /// Applies a partial update and returns the stored record.
    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Project>;
    /// Deletes one record and its sub-projects; returns removed row count.
    fn delete_project(&self, id: ProjectId) -> RepoResult<usize>;
    /// Rewrites `sort_order` to `1..=n` following `ids`.
    fn reorder_projects(&self, scope: ReorderScope, ids: &[ProjectId]) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_project_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} {PROJECT_ORDER_SQL};"))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        load_project(self.conn, id)
    }

    fn list_sub_projects(&self, parent_id: ProjectId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} WHERE parent_id = ?1 {PROJECT_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([parent_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn create_project(&self, project: &Project) -> RepoResult<Project> {
        project.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_sort_order(&tx, ReorderScope::of(project))?;
        insert_row(&tx, project, sort_order)?;
        for (index, child) in project.sub_projects.iter().enumerate() {
            insert_row(&tx, child, index as i64 + 1)?;
        }
        tx.commit()?;

        load_required_project(self.conn, project.id)
    }

    fn create_projects(&self, projects: &[Project]) -> RepoResult<usize> {
        for project in projects {
            project.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let base_order = next_sort_order(&tx, ReorderScope::MainProjects)? - 1;
        let mut inserted = 0;
        for project in projects {
            insert_row(&tx, project, base_order + project.sort_order)?;
            inserted += 1;
            for child in &project.sub_projects {
                insert_row(&tx, child, child.sort_order)?;
                inserted += 1;
            }
        }
        tx.commit()?;

        info!(
            "event=project_bulk_insert module=repo status=ok top_level={} inserted={}",
            projects.len(),
            inserted
        );
        Ok(inserted)
    }

    fn replace_projects(&self, projects: &[Project]) -> RepoResult<usize> {
        for project in projects {
            project.validate()?;
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM projects;", [])?;
        let mut inserted = 0;
        for project in projects {
            insert_row(&tx, project, project.sort_order)?;
            inserted += 1;
            for child in &project.sub_projects {
                insert_row(&tx, child, child.sort_order)?;
                inserted += 1;
            }
        }
        tx.commit()?;

        info!(
            "event=project_replace module=repo status=ok removed={} inserted={}",
            removed, inserted
        );
        Ok(inserted)
    }

    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> RepoResult<Project> {
        let mut project = load_project(self.conn, id)?.ok_or(RepoError::NotFound(id))?;
        let previous_scope = ReorderScope::of(&project);
        patch.apply_to(&mut project);
        project.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let scope = ReorderScope::of(&project);
        if scope != previous_scope && patch.sort_order.is_none() {
            project.sort_order = next_sort_order(&tx, scope)?;
        }

        let changed = tx.execute(
            "UPDATE projects
             SET
                name = ?2,
                planned_start = ?3,
                planned_end = ?4,
                actual_start = ?5,
                actual_end = ?6,
                completion_percentage = ?7,
                category = ?8,
                responsible = ?9,
                status = ?10,
                is_sub_project = ?11,
                parent_id = ?12,
                sort_order = ?13,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                project.name.as_str(),
                project.planned_start.as_deref(),
                project.planned_end.as_deref(),
                project.actual_start.as_deref(),
                project.actual_end.as_deref(),
                project.completion_percentage,
                project.category.as_str(),
                project.responsible.as_str(),
                project.status.as_str(),
                bool_to_int(project.is_sub_project),
                project.parent_id.map(|value| value.to_string()),
                project.sort_order,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        Ok(project)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let children = tx.execute("DELETE FROM projects WHERE parent_id = ?1;", [id.to_string()])?;
        let changed = tx.execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;

        Ok(changed + children)
    }

    fn reorder_projects(&self, scope: ReorderScope, ids: &[ProjectId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for id in ids {
            let parent: Option<Option<String>> = tx
                .query_row(
                    "SELECT parent_id FROM projects WHERE id = ?1;",
                    [id.to_string()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(parent) = parent else {
                return Err(RepoError::NotFound(*id));
            };
            let parent = parent
                .map(|value| parse_uuid(&value, "projects.parent_id"))
                .transpose()?;
            if parent != scope.parent_id() {
                return Err(RepoError::NotInScope(*id));
            }
        }

        for (index, id) in ids.iter().enumerate() {
            tx.execute(
                "UPDATE projects
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1;",
                params![id.to_string(), index as i64 + 1],
            )?;
        }
        tx.commit()?;

        Ok(())
    }
}

fn insert_row(conn: &Connection, project: &Project, sort_order: i64) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO projects (
            id,
            name,
            planned_start,
            planned_end,
            actual_start,
            actual_end,
            completion_percentage,
            category,
            responsible,
            status,
            is_sub_project,
            parent_id,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
        params![
            project.id.to_string(),
            project.name.as_str(),
            project.planned_start.as_deref(),
            project.planned_end.as_deref(),
            project.actual_start.as_deref(),
            project.actual_end.as_deref(),
            project.completion_percentage,
            project.category.as_str(),
            project.responsible.as_str(),
            project.status.as_str(),
            bool_to_int(project.is_sub_project),
            project.parent_id.map(|value| value.to_string()),
            sort_order,
        ],
    )?;
    Ok(())
}

fn load_project(conn: &Connection, id: ProjectId) -> RepoResult<Option<Project>> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

fn load_required_project(conn: &Connection, id: ProjectId) -> RepoResult<Project> {
    load_project(conn, id)?.ok_or(RepoError::NotFound(id))
}

/// `max(sort_order) + 1` within `scope`, starting at 1.
fn next_sort_order(conn: &Connection, scope: ReorderScope) -> RepoResult<i64> {
    let next = match scope {
        ReorderScope::MainProjects => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + 1
             FROM projects
             WHERE parent_id IS NULL;",
            [],
            |row| row.get(0),
        )?,
        ReorderScope::SubProjectsOf(parent_id) => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + 1
             FROM projects
             WHERE parent_id = ?1;",
            [parent_id.to_string()],
            |row| row.get(0),
        )?,
    };
    Ok(next)
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "projects.id")?;

    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "projects.parent_id"))
        .transpose()?;

    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in projects.status"))
    })?;

    let completion: i64 = row.get("completion_percentage")?;
    let completion_percentage = u8::try_from(completion)
        .ok()
        .filter(|value| *value <= 100)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid completion `{completion}` in projects.completion_percentage"
            ))
        })?;

    let is_sub_project = match row.get::<_, i64>("is_sub_project")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_sub_project value `{other}` in projects.is_sub_project"
            )));
        }
    };

    let project = Project {
        id,
        name: row.get("name")?,
        planned_start: row.get("planned_start")?,
        planned_end: row.get("planned_end")?,
        actual_start: row.get("actual_start")?,
        actual_end: row.get("actual_end")?,
        completion_percentage,
        category: row.get("category")?,
        responsible: row.get("responsible")?,
        status,
        is_sub_project,
        parent_id,
        sub_projects: Vec::new(),
        sort_order: row.get("sort_order")?,
    };
    project.validate()?;
    Ok(project)
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_project_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "projects")? {
        return Err(RepoError::MissingRequiredTable("projects"));
    }
    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "projects", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "projects",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
