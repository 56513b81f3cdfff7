use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::pipeline::AnalysisReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Workbook,
}

/// For json, `rows` counts filtered team-years and `sheets` is zero.
#[derive(Debug)]
pub struct ExportSummary {
    pub format: ExportFormat,
    pub sheets: usize,
    pub rows: usize,
}

enum Value {
    Text(String),
    Number(f64),
    Empty,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map(Value::Number).unwrap_or(Value::Empty)
    }
}

/// `.json` dumps the whole report; any other extension gets an xlsx workbook.
pub fn export_report(path: &Path, report: &AnalysisReport) -> Result<ExportSummary> {
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let json = serde_json::to_string_pretty(report).context("serialize analysis report")?;
        fs::write(path, json).with_context(|| format!("write report json {}", path.display()))?;
        return Ok(ExportSummary {
            format: ExportFormat::Json,
            sheets: 0,
            rows: report.filtered_team_years.len(),
        });
    }

    let sheets = build_sheets(report);
    let mut workbook = Workbook::new();
    let mut rows = 0usize;
    for (name, sheet_rows) in &sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, sheet_rows)?;
        rows += sheet_rows.len().saturating_sub(1);
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportSummary {
        format: ExportFormat::Workbook,
        sheets: sheets.len(),
        rows,
    })
}

fn build_sheets(report: &AnalysisReport) -> Vec<(&'static str, Vec<Vec<Value>>)> {
    let mut team_years = vec![header(&[
        "Team ID",
        "Year",
        "Total Goals",
        "Games",
        "Total Points",
        "Points per Game",
    ])];
    for ty in &report.filtered_team_years {
        team_years.push(vec![
            (ty.team_api_id as f64).into(),
            (ty.year as f64).into(),
            (ty.total_goals as f64).into(),
            (ty.num_of_games as f64).into(),
            (ty.total_points as f64).into(),
            ty.points_per_game.into(),
        ]);
    }

    let mut improvement = vec![header(&["Rank", "Team", "Slope", "Intercept", "r", "Years"])];
    for (idx, t) in report.improvement.iter().enumerate() {
        improvement.push(vec![
            ((idx + 1) as f64).into(),
            t.team_name.clone().into(),
            t.fit.slope.into(),
            t.fit.intercept.into(),
            t.fit.r.into(),
            (t.years as f64).into(),
        ]);
    }

    let mut penalties = vec![header(&["Rank", "Player", "Penalties", "Snapshot"])];
    for (idx, p) in report.penalties.iter().enumerate() {
        penalties.push(vec![
            ((idx + 1) as f64).into(),
            p.player_name.clone().into(),
            p.penalties.into(),
            p.date.to_string().into(),
        ]);
    }

    let m = &report.correlations;
    let mut correlation = vec![
        std::iter::once(Value::Empty)
            .chain(m.variables.iter().map(|v| Value::from(v.name())))
            .collect::<Vec<Value>>(),
    ];
    for (i, v) in m.variables.iter().enumerate() {
        let mut row: Vec<Value> = vec![v.name().into()];
        row.extend(m.values[i].iter().map(|r| Value::from(*r)));
        correlation.push(row);
    }

    let mut kendall = vec![header(&["Rank", "Attribute", "Tau", "P-Value", "N"])];
    for (idx, a) in report.associations.iter().enumerate() {
        kendall.push(vec![
            ((idx + 1) as f64).into(),
            a.attribute.column().into(),
            a.kendall.tau.into(),
            a.kendall.p_value.into(),
            (a.kendall.n as f64).into(),
        ]);
    }

    vec![
        ("TeamYears", team_years),
        ("Improvement", improvement),
        ("Penalties", penalties),
        ("Correlation", correlation),
        ("Kendall", kendall),
    ]
}

fn header(names: &[&str]) -> Vec<Value> {
    names.iter().map(|n| Value::from(*n)).collect()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Value>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match value {
                Value::Text(s) => worksheet.write_string(r, c, s),
                Value::Number(v) => worksheet.write_number(r, c, *v),
                Value::Empty => continue,
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
