//! Core domain logic for the project roadmap tracker.
//! This crate is the single source of truth for roadmap invariants.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{CategoryRule, ConfigError, ImportConfig, RoadmapConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::tabular::{
    parse_tabular, parse_tabular_with, ImportIssue, ImportIssueKind, ImportResult,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::period::{
    quarter_number, PeriodDescriptor, PeriodKey, PeriodNormalizer, PeriodRegistry,
    PeriodRegistryError, PeriodSpan,
};
pub use model::phase::{phase_for, ProjectPhase, PROJECT_PHASES};
pub use model::project::{
    count_projects, flatten_projects, Project, ProjectId, ProjectStatus, ProjectValidationError,
};
pub use report::delay::{calculate_delay, delay_report, DelayDirection, ProjectDelay};
pub use report::summary::SummaryStats;
pub use repo::project_repo::{
    ProjectPatch, ProjectRepository, RepoError, RepoResult, ReorderScope,
    SqliteProjectRepository,
};
pub use service::project_service::{
    assemble_hierarchy, ProjectDraft, ProjectService, ProjectServiceError,
};
pub use store::snapshot::{clear_snapshot, load_snapshot, save_snapshot, SnapshotError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
