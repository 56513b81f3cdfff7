use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use crate::aggregate::{TeamYear, aggregate_team_years};
use crate::analysis::{
    self, AttributeAssociation, CorrelationMatrix, PenaltyEntry, TeamDirectory, TeamImprovement,
    TeamSeries,
};
use crate::cleaning::{CleanTables, CleaningReport, clean_tables};
use crate::config::AnalysisConfig;
use crate::dataset::{self, RawTables};
use crate::filter::filter_team_years;
use crate::merge::{MergeSummary, TeamSeasonProfile, merge_attributes};
use crate::records;
use crate::stats::HistogramBin;
use crate::transform::to_long_format;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub cleaning: CleaningReport,
    pub match_count: usize,
    pub long_row_count: usize,
    pub team_years: Vec<TeamYear>,
    pub filtered_team_years: Vec<TeamYear>,
    pub improvement: Vec<TeamImprovement>,
    pub improvement_histogram: Vec<HistogramBin>,
    pub top_series: Vec<TeamSeries>,
    pub penalties: Vec<PenaltyEntry>,
    pub merge: MergeSummary,
    pub profiles: Vec<TeamSeasonProfile>,
    pub correlations: CorrelationMatrix,
    pub associations: Vec<AttributeAssociation>,
}

impl AnalysisReport {
    pub fn top_improvers(&self) -> &[TeamImprovement] {
        let n = self.config.top_teams.min(self.improvement.len());
        &self.improvement[..n]
    }
}

pub fn run(conn: &Connection, cfg: &AnalysisConfig) -> Result<AnalysisReport> {
    let raw = dataset::load_raw_tables(conn).context("load source tables")?;
    run_on_tables(&raw, cfg)
}

/// Stages 2..7 over already-loaded tables. Each stage reads the previous
/// stage's output only.
pub fn run_on_tables(raw: &RawTables, cfg: &AnalysisConfig) -> Result<AnalysisReport> {
    let (clean, cleaning) = clean_tables(raw, &cfg.cleaning()).context("clean source tables")?;
    let CleanTables {
        matches,
        teams,
        team_attributes,
        players,
        player_attributes,
    } = &clean;

    let matches = records::matches_from_table(matches).context("decode matches")?;
    let teams = records::teams_from_table(teams).context("decode teams")?;
    let snapshots =
        records::team_attributes_from_table(team_attributes).context("decode team attributes")?;
    let player_rows =
        records::players_from_tables(player_attributes, players).context("decode players")?;
    let directory = TeamDirectory::from_records(&teams);

    let long_rows = to_long_format(&matches);
    let all_team_years = aggregate_team_years(&long_rows);

    let named: Vec<TeamYear> = all_team_years
        .iter()
        .filter(|ty| directory.contains(ty.team_api_id))
        .cloned()
        .collect();
    if named.len() < all_team_years.len() {
        log::warn!(
            "{} team-years reference teams missing from the team table",
            all_team_years.len() - named.len()
        );
    }
    let filtered = filter_team_years(&named, cfg.filter);

    let improvement =
        analysis::improvement_ranking(&filtered, &directory).context("rank team improvement")?;
    let improvement_histogram = analysis::improvement_histogram(&improvement, cfg.histogram_bins)?;
    let plot_n = cfg.plot_teams.min(improvement.len());
    let top_series = analysis::team_series(&filtered, &improvement[..plot_n]);

    let penalties = analysis::most_penalized(&player_rows, cfg.top_players, cfg.distinct_players);

    let (profiles, merge) = merge_attributes(&filtered, &snapshots, cfg.join_policy);
    let correlations = analysis::correlation_matrix(&profiles);
    let associations = analysis::attribute_associations(&profiles, &cfg.kendall_attributes)
        .context("attribute/outcome association")?;

    log::info!(
        "analysis complete: {} teams ranked, {} merged profiles",
        improvement.len(),
        profiles.len()
    );

    Ok(AnalysisReport {
        config: cfg.clone(),
        cleaning,
        match_count: matches.len(),
        long_row_count: long_rows.len(),
        team_years: all_team_years,
        filtered_team_years: filtered,
        improvement,
        improvement_histogram,
        top_series,
        penalties,
        merge,
        profiles,
        correlations,
        associations,
    })
}
