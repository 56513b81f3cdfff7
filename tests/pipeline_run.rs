use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use euro_soccer_eda::config::AnalysisConfig;
use euro_soccer_eda::dataset;
use euro_soccer_eda::error::PipelineError;
use euro_soccer_eda::export::{ExportFormat, export_report};
use euro_soccer_eda::merge::JoinPolicy;
use euro_soccer_eda::pipeline::{self, AnalysisReport};
use euro_soccer_eda::report::{correlation_table, render_text};

fn fixture_db() -> Connection {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("mini_soccer.sql");
    let sql = fs::read_to_string(path).expect("fixture file should be readable");
    let conn = Connection::open_in_memory().expect("in-memory sqlite");
    conn.execute_batch(&sql).expect("fixture sql should load");
    conn
}

fn default_run() -> AnalysisReport {
    let cfg = AnalysisConfig {
        show_tui: false,
        ..AnalysisConfig::default()
    };
    pipeline::run(&fixture_db(), &cfg).expect("pipeline should run on fixture")
}

#[test]
fn stage_sizes_follow_the_fixture() {
    let report = default_run();
    assert_eq!(report.match_count, 45);
    assert_eq!(report.long_row_count, 90);
    // Team 99 has a match but no team row; it stays in the raw aggregate.
    assert_eq!(report.team_years.len(), 33);
    assert!(report.team_years.iter().any(|ty| ty.team_api_id == 99));
    assert_eq!(report.filtered_team_years.len(), 20);
    assert!(
        report
            .filtered_team_years
            .iter()
            .all(|ty| (1..=4).contains(&ty.team_api_id) && ty.year > 2009)
    );
}

#[test]
fn improvement_ranking_puts_the_climber_first() {
    let report = default_run();
    let names: Vec<&str> = report
        .improvement
        .iter()
        .map(|t| t.team_name.as_str())
        .collect();
    assert_eq!(names.first(), Some(&"Alpha FC"));
    assert_eq!(names.last(), Some(&"Beta United"));
    assert!((report.improvement[0].fit.slope - 0.766_666_7).abs() < 1e-6);
    assert!(
        report
            .improvement
            .windows(2)
            .all(|w| w[0].fit.slope >= w[1].fit.slope)
    );
    assert_eq!(report.top_improvers().len(), 4);

    assert_eq!(report.improvement_histogram.len(), 50);
    let counted: usize = report.improvement_histogram.iter().map(|b| b.count).sum();
    assert_eq!(counted, 4);

    assert_eq!(report.top_series.len(), 3);
    assert_eq!(report.top_series[0].team_name, "Alpha FC");
    let years: Vec<i32> = report.top_series[0].points.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2010, 2011, 2012, 2013, 2014]);
}

#[test]
fn penalty_ranking_uses_cleaned_joined_snapshots() {
    let report = default_run();
    let top: Vec<(&str, f64)> = report
        .penalties
        .iter()
        .map(|p| (p.player_name.as_str(), p.penalties))
        .collect();
    assert_eq!(
        top,
        vec![
            ("Mario Balotelli", 96.0),
            ("Rickie Lambert", 96.0),
            ("Xavi Hernandez", 95.0),
            ("Rickie Lambert", 94.0),
        ]
    );
}

#[test]
fn distinct_players_keeps_one_row_each() {
    let cfg = AnalysisConfig {
        distinct_players: true,
        show_tui: false,
        ..AnalysisConfig::default()
    };
    let report = pipeline::run(&fixture_db(), &cfg).unwrap();
    let names: Vec<&str> = report
        .penalties
        .iter()
        .map(|p| p.player_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Mario Balotelli", "Rickie Lambert", "Xavi Hernandez"]
    );
}

#[test]
fn attribute_analysis_covers_merged_profiles() {
    let report = default_run();
    assert_eq!(report.merge.team_years_in, 20);
    assert_eq!(report.merge.unmatched_team_years, 0);
    assert_eq!(report.merge.multi_snapshot_team_years, 1);
    assert_eq!(report.merge.rows_out, 20);

    assert_eq!(report.correlations.variables.len(), 9);
    for row in &report.correlations.values {
        for r in row.iter().flatten() {
            assert!((-1.0..=1.0).contains(r));
        }
    }

    assert_eq!(report.associations.len(), 3);
    for a in &report.associations {
        assert!((-1.0..=1.0).contains(&a.kendall.tau));
        assert!((0.0..=1.0).contains(&a.kendall.p_value));
        assert_eq!(a.kendall.n, 20);
    }
    assert!(
        report
            .associations
            .windows(2)
            .all(|w| w[0].kendall.tau >= w[1].kendall.tau)
    );
}

#[test]
fn expand_join_keeps_every_snapshot() {
    let cfg = AnalysisConfig {
        join_policy: JoinPolicy::Expand,
        show_tui: false,
        ..AnalysisConfig::default()
    };
    let report = pipeline::run(&fixture_db(), &cfg).unwrap();
    assert_eq!(report.merge.rows_out, 21);
    assert_eq!(report.profiles.len(), 21);
}

#[test]
fn text_report_names_each_question() {
    let report = default_run();
    let text = render_text(&report);
    assert!(text.contains("Q1: most improved teams"));
    assert!(text.contains("Alpha FC"));
    assert!(text.contains("Q2: players with the highest penalty rating"));
    assert!(text.contains("Q3: team attributes vs points per game"));
    assert!(text.contains("dropped columns: buildUpPlayDribbling"));

    let table = correlation_table(&report);
    assert_eq!(table.lines().count(), 10);
    assert!(table.contains("defencePressure"));
}

#[test]
fn exports_json_and_workbook() {
    let report = default_run();
    let dir = std::env::temp_dir().join(format!("euro_soccer_eda_export_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();

    let json_path = dir.join("report.json");
    let summary = export_report(&json_path, &report).unwrap();
    assert_eq!(summary.format, ExportFormat::Json);
    assert_eq!(summary.rows, 20);
    let raw = fs::read_to_string(&json_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["match_count"], 45);

    let xlsx_path = dir.join("report.xlsx");
    let summary = export_report(&xlsx_path, &report).unwrap();
    assert_eq!(summary.format, ExportFormat::Workbook);
    assert_eq!(summary.sheets, 5);
    assert!(fs::metadata(&xlsx_path).unwrap().len() > 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_database_is_source_unavailable() {
    let err = dataset::open_db(std::path::Path::new("/nonexistent/soccer.sqlite")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::SourceUnavailable { .. })
    ));
}

#[test]
fn missing_source_table_fails_the_run() {
    let conn = fixture_db();
    conn.execute_batch(r#"DROP TABLE "Player_Attributes";"#)
        .unwrap();
    assert!(pipeline::run(&conn, &AnalysisConfig::default()).is_err());
}
