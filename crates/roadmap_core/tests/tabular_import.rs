use roadmap_core::{
    parse_tabular, parse_tabular_with, ImportConfig, ImportIssue, ImportIssueKind,
    PeriodNormalizer, Project, ProjectStatus,
};
use std::collections::HashSet;
use uuid::Uuid;

const MAIN_ROW: &str = "16\tOsmanlı Mobil";
const SUB_ROW: &str =
    "\tOsmanlı Şifre faz2\t\tQ1-Q2-Q3-Q4\t2024\tQ3\tMerve Nur Öztürk\t80%";

fn without_ids(projects: &[Project]) -> Vec<Project> {
    projects
        .iter()
        .map(|project| {
            let mut project = project.clone();
            project.id = Uuid::nil();
            project.parent_id = project.parent_id.map(|_| Uuid::nil());
            project.sub_projects = without_ids(&project.sub_projects);
            project
        })
        .collect()
}

#[test]
fn numbered_row_becomes_main_project_with_default_periods() {
    let result = parse_tabular(MAIN_ROW);

    assert!(result.success);
    assert!(result.issues.is_empty());
    assert_eq!(result.total_rows, 1);
    assert_eq!(result.successful_rows, 1);
    assert_eq!(result.projects.len(), 1);

    let project = &result.projects[0];
    assert_eq!(project.name, "16. Osmanlı Mobil");
    assert!(!project.is_sub_project);
    assert_eq!(project.parent_id, None);
    for period in [
        &project.planned_start,
        &project.planned_end,
        &project.actual_start,
        &project.actual_end,
    ] {
        assert_eq!(period.as_deref(), Some("2024"));
    }
    assert_eq!(project.completion_percentage, 0);
    assert_eq!(project.status, ProjectStatus::NotStarted);
    assert_eq!(project.responsible, "Belirlenmemiş");
    assert_eq!(project.category, "Genel");
    assert_eq!(project.sort_order, 1);
}

#[test]
fn unnumbered_row_attaches_to_previous_main_project() {
    let result = parse_tabular(&format!("{MAIN_ROW}\n{SUB_ROW}"));

    assert!(result.success);
    assert_eq!(result.total_rows, 2);
    assert_eq!(result.successful_rows, 2);
    assert_eq!(result.projects.len(), 1);

    let main = &result.projects[0];
    assert_eq!(main.sub_projects.len(), 1);

    let sub = &main.sub_projects[0];
    assert_eq!(sub.name, "Osmanlı Şifre faz2");
    assert!(sub.is_sub_project);
    assert_eq!(sub.parent_id, Some(main.id));
    assert_eq!(sub.planned_start.as_deref(), Some("2024"));
    assert_eq!(sub.planned_end.as_deref(), Some("Q1-2025"));
    assert_eq!(sub.actual_start.as_deref(), Some("2024"));
    assert_eq!(sub.actual_end.as_deref(), Some("Q3-2025"));
    assert_eq!(sub.responsible, "Merve Nur Öztürk");
    assert_eq!(sub.completion_percentage, 80);
    assert_eq!(sub.status, ProjectStatus::InProgress);
    assert_eq!(sub.category, "Sistem Geliştirme");
    assert_eq!(sub.sort_order, 1);
    main.validate().unwrap();
}

#[test]
fn leading_sub_row_becomes_standalone_record() {
    let result = parse_tabular(&format!("{SUB_ROW}\n{MAIN_ROW}\n{SUB_ROW}"));

    assert_eq!(result.projects.len(), 2);
    let standalone = &result.projects[0];
    assert_eq!(standalone.name, "Osmanlı Şifre faz2");
    assert!(!standalone.is_sub_project);
    assert_eq!(standalone.parent_id, None);
    assert!(standalone.sub_projects.is_empty());

    assert_eq!(result.projects[1].name, "16. Osmanlı Mobil");
    assert_eq!(result.projects[1].sub_projects.len(), 1);
    assert_eq!(result.successful_rows, 3);
}

#[test]
fn blank_input_reports_no_data() {
    for text in ["", "   ", "\n\n", " \t \r\n  \n"] {
        let result = parse_tabular(text);
        assert!(!result.success);
        assert!(result.projects.is_empty());
        assert_eq!(result.total_rows, 0);
        assert_eq!(result.successful_rows, 0);
        assert_eq!(
            result.issues,
            vec![ImportIssue {
                row: None,
                kind: ImportIssueKind::NoData,
            }]
        );
        assert_eq!(result.error_messages(), ["no data provided"]);
    }
}

#[test]
fn reparsing_yields_same_shape_with_fresh_ids() {
    let text = format!("1\tPlatform\tQ1\tQ2\tQ1\tQ3\tDilruba\t50%\n{SUB_ROW}\n{MAIN_ROW}\n\tTail\tQ2");
    let first = parse_tabular(&text);
    let second = parse_tabular(&text);

    assert_eq!(without_ids(&first.projects), without_ids(&second.projects));
    assert_eq!(first.total_rows, second.total_rows);
    assert_eq!(first.successful_rows, second.successful_rows);
    assert_eq!(first.issues, second.issues);

    let mut ids = HashSet::new();
    for result in [&first, &second] {
        for project in &result.projects {
            assert!(ids.insert(project.id));
            for sub in &project.sub_projects {
                assert!(ids.insert(sub.id));
            }
        }
    }
    assert_eq!(ids.len(), 8);
}

#[test]
fn short_rows_are_reported_and_skipped() {
    let result = parse_tabular(&format!("{MAIN_ROW}\nlonely\n{SUB_ROW}"));

    assert!(result.success);
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.successful_rows, 2);
    assert_eq!(
        result.issues,
        vec![ImportIssue {
            row: Some(2),
            kind: ImportIssueKind::InsufficientColumns {
                found: 1,
                required: 2,
            },
        }]
    );
    assert_eq!(
        result.error_messages(),
        ["row 2: insufficient data (1 columns, at least 2 required)"]
    );
    assert_eq!(result.projects[0].sub_projects.len(), 1);
}

#[test]
fn rows_without_a_name_are_skipped_silently() {
    let result = parse_tabular("7\t\n\t\tQ1\n3\tNamed");

    assert!(result.success);
    assert!(result.issues.is_empty());
    assert_eq!(result.total_rows, 3);
    assert_eq!(result.successful_rows, 1);
    assert_eq!(result.projects[0].name, "3. Named");
    assert!(result.successful_rows <= result.total_rows);
}

#[test]
fn all_rows_failing_is_unsuccessful() {
    let result = parse_tabular("alpha\nbeta");

    assert!(!result.success);
    assert!(result.projects.is_empty());
    assert_eq!(result.total_rows, 2);
    assert_eq!(result.successful_rows, 0);
    let rows: Vec<Option<usize>> = result.issues.iter().map(|issue| issue.row).collect();
    assert_eq!(rows, [Some(1), Some(2)]);
}

#[test]
fn errored_rows_are_not_counted_as_successful() {
    let text = "1\tA\nx\n2\tB\ty\n\tSub\t\t\t\t\tnobody\t150%\n3\tC";
    let result = parse_tabular(text);

    assert!(result.success);
    assert_eq!(result.total_rows, 5);
    assert_eq!(result.successful_rows, 3);
    assert_eq!(result.issues.len(), 2);
    assert!(result.successful_rows + result.issues.len() <= result.total_rows);
    assert_eq!(
        result.issues[1].kind,
        ImportIssueKind::InvalidCompletion("150%".to_string())
    );
    assert_eq!(result.issues[1].row, Some(4));
}

#[test]
fn comma_separated_rows_are_accepted() {
    let result = parse_tabular("3, Billing ,Q1,Q2,Q1,Q3,Dilruba K.,50");

    let project = &result.projects[0];
    assert_eq!(project.name, "3. Billing");
    assert_eq!(project.planned_start.as_deref(), Some("Q1-2025"));
    assert_eq!(project.planned_end.as_deref(), Some("Q2-2025"));
    assert_eq!(project.actual_start.as_deref(), Some("Q1-2025"));
    assert_eq!(project.actual_end.as_deref(), Some("Q3-2025"));
    assert_eq!(project.responsible, "Dilruba K.");
    assert_eq!(project.category, "Platform");
    assert_eq!(project.completion_percentage, 50);
    assert_eq!(project.status, ProjectStatus::InProgress);
}

#[test]
fn tabs_take_precedence_over_commas() {
    let result = parse_tabular("4\tBilling, invoices\tQ1\tQ1\tQ1\tQ1\tÜrün Geliştirme\t100");

    let project = &result.projects[0];
    assert_eq!(project.name, "4. Billing, invoices");
    assert_eq!(project.category, "Ürün Geliştirme");
    assert_eq!(project.status, ProjectStatus::Completed);
}

#[test]
fn line_endings_and_blank_lines_are_ignored_for_numbering() {
    let result = parse_tabular("1\tA\r\n\r\n2\tB\r\n\r\nbad\r\n");

    assert_eq!(result.total_rows, 3);
    assert_eq!(result.projects.len(), 2);
    assert_eq!(result.projects[1].name, "2. B");
    assert_eq!(result.issues[0].row, Some(3));
}

#[test]
fn sort_orders_follow_input_order() {
    let result = parse_tabular("1\tA\n\tA.1\n\tA.2\n2\tB\n\tB.1");

    let orders: Vec<i64> = result.projects.iter().map(|p| p.sort_order).collect();
    assert_eq!(orders, [1, 2]);
    let sub_orders: Vec<i64> = result.projects[0]
        .sub_projects
        .iter()
        .map(|p| p.sort_order)
        .collect();
    assert_eq!(sub_orders, [1, 2]);
    assert_eq!(result.projects[1].sub_projects[0].sort_order, 1);
}

#[test]
fn custom_settings_drive_categories_and_columns() {
    let mut config = ImportConfig::default();
    config.min_columns = 3;
    config.unassigned_responsible = "TBD".to_string();
    config.default_category = "Other".to_string();
    let normalizer = PeriodNormalizer {
        quarter_year: 2026,
        year_bucket: "2025".to_string(),
    };

    let result = parse_tabular_with("5\tOps\tQ2\n6\tShort", &config, &normalizer);

    let project = &result.projects[0];
    assert_eq!(project.planned_start.as_deref(), Some("Q2-2026"));
    assert_eq!(project.planned_end.as_deref(), Some("2025"));
    assert_eq!(project.responsible, "TBD");
    assert_eq!(project.category, "Other");
    assert_eq!(
        result.issues[0].kind,
        ImportIssueKind::InsufficientColumns {
            found: 2,
            required: 3,
        }
    );
}

#[test]
fn leading_byte_order_mark_is_ignored() {
    let result = parse_tabular("\u{feff}1\tA\tQ2\n\tSub\tQ3");

    assert!(result.success);
    assert_eq!(result.projects.len(), 1);
    let main = &result.projects[0];
    assert_eq!(main.name, "1. A");
    assert!(!main.is_sub_project);
    assert_eq!(main.planned_start.as_deref(), Some("Q2-2025"));
    assert_eq!(main.sub_projects.len(), 1);

    let only_mark = parse_tabular("\u{feff}");
    assert_eq!(only_mark.issues[0].kind, ImportIssueKind::NoData);
}
