use std::collections::HashMap;

use serde::Serialize;

use crate::aggregate::TeamYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterConfig {
    /// Keep years strictly after this one.
    pub cutoff_year: i32,
    /// Keep teams with strictly more qualifying years than this.
    pub min_years: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff_year: 2009,
            min_years: 4,
        }
    }
}

pub fn filter_team_years(rows: &[TeamYear], cfg: FilterConfig) -> Vec<TeamYear> {
    let recent: Vec<&TeamYear> = rows.iter().filter(|r| r.year > cfg.cutoff_year).collect();

    let mut years_per_team: HashMap<i64, usize> = HashMap::new();
    for row in &recent {
        *years_per_team.entry(row.team_api_id).or_default() += 1;
    }

    let out: Vec<TeamYear> = recent
        .into_iter()
        .filter(|r| years_per_team.get(&r.team_api_id).copied().unwrap_or(0) > cfg.min_years)
        .cloned()
        .collect();
    log::info!(
        "filter (year > {}, years > {}): {} -> {} team-years",
        cfg.cutoff_year,
        cfg.min_years,
        rows.len(),
        out.len()
    );
    out
}
