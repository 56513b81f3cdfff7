use std::fmt::Write as _;

use crate::analysis::Variable;
use crate::cleaning::CleaningReport;
use crate::pipeline::AnalysisReport;

pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    render_cleaning(&mut out, &report.cleaning);

    let _ = writeln!(out, "\nMatches");
    let _ = writeln!(
        out,
        "  {} matches -> {} team rows -> {} team-years ({} after filter: year > {}, years > {})",
        report.match_count,
        report.long_row_count,
        report.team_years.len(),
        report.filtered_team_years.len(),
        report.config.filter.cutoff_year,
        report.config.filter.min_years
    );

    let _ = writeln!(out, "\nQ1: most improved teams (slope of points per game by year)");
    for (idx, team) in report.top_improvers().iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<32} slope={:+.4} r={:+.3} years={}",
            idx + 1,
            team.team_name,
            team.fit.slope,
            team.fit.r,
            team.years
        );
    }

    let _ = writeln!(out, "\nQ2: players with the highest penalty rating");
    for (idx, p) in report.penalties.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {:>2}. {:<32} {:>5.1}  ({})",
            idx + 1,
            p.player_name,
            p.penalties,
            p.date
        );
    }

    let _ = writeln!(out, "\nQ3: team attributes vs points per game");
    let _ = writeln!(
        out,
        "  merged {} team-years into {} profiles ({} without snapshot, {} with several; join {:?})",
        report.merge.team_years_in,
        report.merge.rows_out,
        report.merge.unmatched_team_years,
        report.merge.multi_snapshot_team_years,
        report.config.join_policy
    );
    let _ = writeln!(out, "  Pearson r with points per game:");
    for (attr, r) in report.correlations.outcome_column() {
        let _ = writeln!(out, "    {:<24} {:+.4}", attr.column(), r);
    }
    let _ = writeln!(out, "  Kendall tau-b (ranked):");
    for (idx, a) in report.associations.iter().enumerate() {
        let _ = writeln!(
            out,
            "    {}. {:<24} tau={:+.4} p={:.3e} n={} ({:?})",
            idx + 1,
            a.attribute.column(),
            a.kendall.tau,
            a.kendall.p_value,
            a.kendall.n,
            a.kendall.method
        );
    }
    out
}

fn render_cleaning(out: &mut String, cleaning: &CleaningReport) {
    let _ = writeln!(out, "Cleaning");
    for t in &cleaning.tables {
        let _ = writeln!(
            out,
            "  {:<18} rows {:>7} -> {:<7} cols {:>3} -> {:<3} duplicates {}",
            t.table, t.rows_before, t.rows_after, t.columns_before, t.columns_after, t.duplicates
        );
        if !t.dropped_columns.is_empty() {
            let _ = writeln!(out, "    dropped columns: {}", t.dropped_columns.join(", "));
        }
        if t.incomplete_rows > 0 {
            let _ = writeln!(
                out,
                "    dropped {} incomplete rows ({:.2}%)",
                t.incomplete_rows,
                t.incomplete_fraction * 100.0
            );
        }
        if t.duplicates_removed > 0 {
            let _ = writeln!(out, "    removed {} duplicate rows", t.duplicates_removed);
        }
    }
}

pub fn correlation_table(report: &AnalysisReport) -> String {
    let m = &report.correlations;
    let mut out = String::new();
    let _ = write!(out, "{:<24}", "");
    for v in &m.variables {
        let _ = write!(out, " {:>7}", short_name(*v));
    }
    out.push('\n');
    for (i, v) in m.variables.iter().enumerate() {
        let _ = write!(out, "{:<24}", v.name());
        for value in &m.values[i] {
            match value {
                Some(r) => {
                    let _ = write!(out, " {:>+7.3}", r);
                }
                None => {
                    let _ = write!(out, " {:>7}", "n/a");
                }
            }
        }
        out.push('\n');
    }
    out
}

fn short_name(v: Variable) -> String {
    let mut out = String::new();
    let mut boundary = true;
    for c in v.name().chars() {
        if c == '_' {
            boundary = true;
            continue;
        }
        if boundary || c.is_ascii_uppercase() {
            out.push(c.to_ascii_uppercase());
        }
        boundary = false;
    }
    out
}
