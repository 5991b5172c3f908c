use roadmap_core::{parse_tabular_with, ConfigError, RoadmapConfig};
use std::io::Write;

#[test]
fn load_reads_overrides_and_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[normalizer]
quarter_year = 2026

[import]
default_category = "Diğer"

[[import.category_rules]]
needle = "ops"
category = "Operasyon"
"#
    )
    .unwrap();

    let config = RoadmapConfig::load(file.path()).unwrap();

    assert_eq!(config.normalizer.quarter_year, 2026);
    assert_eq!(config.normalizer.year_bucket, "2024");
    assert_eq!(config.import.min_columns, 2);
    assert_eq!(config.import.category_rules.len(), 1);
    assert_eq!(config.period_registry().unwrap().len(), 5);

    let result = parse_tabular_with(
        "1\tDeploy\tQ2\t\t\t\tOps Team\t10\n2\tOther\tQ1\t\t\t\tMerve\t0",
        &config.import,
        &config.normalizer,
    );
    assert_eq!(result.projects[0].planned_start.as_deref(), Some("Q2-2026"));
    assert_eq!(result.projects[0].category, "Operasyon");
    assert_eq!(result.projects[1].category, "Diğer");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let err = RoadmapConfig::load(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = RoadmapConfig::from_toml_str("[import\nmin_columns = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = RoadmapConfig::from_toml_str("[import]\nmin_columns = \"two\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
