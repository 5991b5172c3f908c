//! Roadmap command-line entry point.
//!
//! # Responsibility
//! - Wire config, logging and the SQLite store into `roadmap_core` services.
//! - Render roadmap, delay and summary views as text or JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use roadmap_core::{
    clear_snapshot, count_projects, default_log_level, delay_report, init_logging,
    load_snapshot, open_db, phase_for, save_snapshot, ImportResult, PeriodRegistry, Project,
    ProjectRepository, ProjectService, ReorderScope, RoadmapConfig, SqliteProjectRepository,
    SummaryStats,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "roadmap")]
#[command(about = "Project roadmap tracker", version)]
struct Cli {
    /// SQLite database file.
    #[arg(long, global = true, default_value = "roadmap.sqlite3")]
    db: PathBuf,
    /// TOML config; built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory for rolling log files; logging is off when omitted.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import tab or comma separated rows from a file.
    Import {
        file: PathBuf,
        /// Parse and report without writing to the database.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show main projects with their sub-projects.
    List {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show main projects whose start or end slipped.
    Delays {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show aggregate delay and completion figures.
    Summary {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete a project and its sub-projects.
    Delete { id: Uuid },
    /// Rewrite sibling order; without --parent the main projects are reordered.
    Reorder {
        #[arg(long)]
        parent: Option<Uuid>,
        #[arg(required = true)]
        ids: Vec<Uuid>,
    },
    /// Write the roadmap to a JSON snapshot.
    Export { file: PathBuf },
    /// Replace the roadmap with a JSON snapshot, then remove the snapshot file.
    Restore {
        file: PathBuf,
        /// Leave the snapshot file in place.
        #[arg(long, default_value_t = false)]
        keep: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, absolute(log_dir)?).context("failed to initialize logging")?;
    }

    let config = match &cli.config {
        Some(path) => RoadmapConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => RoadmapConfig::default(),
    };
    let registry = config
        .period_registry()
        .context("config describes an invalid period list")?;

    if let Commands::Import {
        file,
        dry_run: true,
        json,
    } = &cli.command
    {
        let text = read_input(file)?;
        let result = roadmap_core::parse_tabular_with(&text, &config.import, &config.normalizer);
        return print_import(&result, true, *json);
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let repo = SqliteProjectRepository::try_new(&conn)?;
    let service = ProjectService::new(repo);

    match cli.command {
        Commands::Import { file, json, .. } => {
            let text = read_input(&file)?;
            let result = service.import_text(&text, &config)?;
            print_import(&result, false, json)?;
        }
        Commands::List { json } => {
            let roadmap = service.load_roadmap()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&roadmap)?);
            } else {
                print_roadmap(&roadmap, &registry);
            }
        }
        Commands::Delays { json } => {
            let rows = delay_report(&service.load_roadmap()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("no delayed projects");
            } else {
                for row in rows {
                    println!(
                        "{:<40} start {:+} end {:+} ({}) {}%",
                        row.name,
                        row.start_delay,
                        row.end_delay,
                        row.direction().as_str(),
                        row.completion_percentage
                    );
                }
            }
        }
        Commands::Summary { json } => {
            let stats = SummaryStats::from_projects(&service.load_roadmap()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("total projects:     {}", stats.total);
                println!("delayed:            {} ({}%)", stats.delayed, stats.delayed_ratio);
                println!(
                    "on time or early:   {} ({}%)",
                    stats.on_time + stats.early,
                    stats.on_time_ratio
                );
                println!("average completion: {}%", stats.average_completion);
                println!("max end delay:      {} quarter(s)", stats.max_end_delay);
            }
        }
        Commands::Delete { id } => {
            let removed = service.delete_project(id)?;
            println!("deleted {removed} record(s)");
        }
        Commands::Reorder { parent, ids } => {
            let scope = match parent {
                Some(parent_id) => ReorderScope::SubProjectsOf(parent_id),
                None => ReorderScope::MainProjects,
            };
            service.reorder(scope, &ids)?;
            println!("reordered {} record(s)", ids.len());
        }
        Commands::Export { file } => {
            let roadmap = service.load_roadmap()?;
            save_snapshot(&file, &roadmap)
                .with_context(|| format!("failed to write snapshot `{}`", file.display()))?;
            println!("exported {} record(s)", count_projects(&roadmap));
        }
        Commands::Restore { file, keep } => {
            let inserted = restore_snapshot(&service, &file, keep)?;
            println!("restored {inserted} record(s)");
        }
    }

    info!("event=cli_command module=cli status=ok");
    Ok(())
}

// Snapshot file is removed only after the database write committed.
fn restore_snapshot<R: ProjectRepository>(
    service: &ProjectService<R>,
    file: &Path,
    keep: bool,
) -> Result<usize> {
    let projects = load_snapshot(file)
        .with_context(|| format!("failed to read snapshot `{}`", file.display()))?;
    let inserted = service
        .restore_projects(&projects)
        .context("failed to restore snapshot")?;
    if !keep {
        clear_snapshot(file)?;
    }
    Ok(inserted)
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file `{}`", path.display()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| anyhow!("cannot resolve log dir: {err}"))?;
    Ok(cwd.join(path))
}

fn print_import(result: &ImportResult, dry_run: bool, json: bool) -> Result<()> {
    if json {
        let payload = json!({
            "success": result.success,
            "dry_run": dry_run,
            "total_rows": result.total_rows,
            "successful_rows": result.successful_rows,
            "records": count_projects(&result.projects),
            "issues": result.error_messages(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let verb = if dry_run { "parsed" } else { "imported" };
        println!(
            "{verb} {} of {} row(s), {} record(s)",
            result.successful_rows,
            result.total_rows,
            count_projects(&result.projects)
        );
        for message in result.error_messages() {
            println!("  {message}");
        }
    }

    import_status(result)
}

fn import_status(result: &ImportResult) -> Result<()> {
    if result.success {
        Ok(())
    } else {
        Err(anyhow!("import failed"))
    }
}

fn print_roadmap(roadmap: &[Project], registry: &PeriodRegistry) {
    if roadmap.is_empty() {
        println!("roadmap is empty");
        return;
    }
    for project in roadmap {
        print_project_line(project, registry, "");
        for sub in &project.sub_projects {
            print_project_line(sub, registry, "    ");
        }
    }
}

fn print_project_line(project: &Project, registry: &PeriodRegistry, indent: &str) {
    let planned_start = project.planned_start.as_deref().unwrap_or_default();
    let planned_end = project.planned_end.as_deref().unwrap_or_default();
    let span = match registry.span(planned_start, planned_end) {
        Some(span) => format!(
            "{}..{} ({} period(s))",
            registry.periods()[span.start].label,
            registry.periods()[span.end].label,
            span.period_count()
        ),
        None => "unscheduled".to_string(),
    };
    println!(
        "{indent}{} [{}] {}% {} | {} | {}",
        project.name,
        project.status,
        project.completion_percentage,
        phase_for(project.completion_percentage).id,
        span,
        project.id
    );
}
