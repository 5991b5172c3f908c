use roadmap_core::{
    delay_report, parse_tabular, phase_for, DelayDirection, Project, SummaryStats,
    PROJECT_PHASES,
};

fn scheduled(name: &str, planned_end: &str, actual_end: &str, completion: u8) -> Project {
    let mut project = Project::new(name);
    project.planned_start = Some("Q1-2025".to_string());
    project.actual_start = Some("Q1-2025".to_string());
    project.planned_end = Some(planned_end.to_string());
    project.actual_end = Some(actual_end.to_string());
    project.completion_percentage = completion;
    project
}

#[test]
fn delay_report_ranks_main_projects_by_end_slip() {
    let mut slight = scheduled("Slight", "Q2-2025", "Q3-2025", 50);
    slight.attach_sub_project(scheduled("Hidden", "Q1-2025", "Q4-2025", 10));
    let projects = vec![
        scheduled("On time", "Q2-2025", "Q2-2025", 100),
        slight,
        scheduled("Early", "Q4-2025", "Q2-2025", 100),
        scheduled("Late", "Q1-2025", "Q4-2025", 30),
        scheduled("Also slight", "Q3-2025", "Q4-2025", 60),
    ];

    let rows = delay_report(&projects);

    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, ["Late", "Early", "Slight", "Also slight"]);
    assert_eq!(rows[0].end_delay, 3);
    assert_eq!(rows[0].direction(), DelayDirection::Late);
    assert_eq!(rows[1].end_delay, -2);
    assert_eq!(rows[1].direction(), DelayDirection::Early);
}

#[test]
fn delay_report_keeps_start_only_slips() {
    let mut project = scheduled("Started late", "Q3-2025", "Q3-2025", 20);
    project.actual_start = Some("Q2-2025".to_string());

    let rows = delay_report(&[project]);

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].start_delay, 1);
    assert_eq!(rows[0].end_delay, 0);
    assert_eq!(rows[0].direction(), DelayDirection::OnTime);
}

#[test]
fn delay_report_skips_sub_projects_passed_flat() {
    let main = scheduled("Main", "Q1-2025", "Q1-2025", 0);
    let sub = scheduled("Sub", "Q1-2025", "Q3-2025", 0).into_sub_project_of(main.id);

    assert!(delay_report(&[main, sub]).is_empty());
}

#[test]
fn summary_counts_main_projects_only() {
    let mut late = scheduled("Late", "Q1-2025", "Q3-2025", 40);
    late.attach_sub_project(scheduled("Sub", "Q1-2025", "Q4-2025", 0));
    let projects = vec![
        late,
        scheduled("On time", "Q2-2025", "Q2-2025", 100),
        scheduled("Early", "Q4-2025", "Q3-2025", 90),
    ];

    let stats = SummaryStats::from_projects(&projects);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.delayed, 1);
    assert_eq!(stats.on_time, 1);
    assert_eq!(stats.early, 1);
    assert_eq!(stats.delayed_ratio, 33);
    assert_eq!(stats.on_time_ratio, 67);
    assert_eq!(stats.average_completion, 77);
    assert_eq!(stats.max_end_delay, 2);
}

#[test]
fn summary_of_empty_roadmap_is_zeroed() {
    assert_eq!(SummaryStats::from_projects(&[]), SummaryStats::default());
}

#[test]
fn summary_over_imported_rows_uses_quarter_delays() {
    let result = parse_tabular("1\tA\tQ1\tQ2\tQ1\tQ4\tx\t50%\n2\tB\tQ1\tQ2\tQ1\tQ2\ty\t100%");

    let stats = SummaryStats::from_projects(&result.projects);

    assert_eq!(stats.delayed, 1);
    assert_eq!(stats.max_end_delay, 2);
    assert_eq!(stats.average_completion, 75);
}

#[test]
fn phase_boundaries_follow_completion() {
    let expected = [
        (0, "planning"),
        (15, "planning"),
        (16, "design"),
        (30, "design"),
        (31, "development"),
        (75, "development"),
        (76, "testing"),
        (90, "testing"),
        (91, "delivery"),
        (100, "delivery"),
    ];
    for (completion, phase_id) in expected {
        assert_eq!(phase_for(completion).id, phase_id, "completion {completion}");
    }
    assert_eq!(phase_for(200).id, "planning");
}

#[test]
fn phases_cover_every_percentage_once() {
    for completion in 0..=100u8 {
        let matching = PROJECT_PHASES
            .iter()
            .filter(|phase| phase.contains(completion))
            .count();
        assert_eq!(matching, 1, "completion {completion}");
    }
}
