use anyhow::{Context, Result};
use serde::Serialize;

use crate::dataset::RawTables;
use crate::table::Table;

/// Threshold above which a team attribute column is considered unusable.
pub const SPARSE_COLUMN_THRESHOLD: f64 = 0.66;

/// Numeric skill columns of `player_attributes`; a null in any of them drops the row.
pub const PLAYER_SKILL_COLUMNS: &[&str] = &[
    "overall_rating",
    "potential",
    "crossing",
    "finishing",
    "heading_accuracy",
    "short_passing",
    "volleys",
    "dribbling",
    "curve",
    "free_kick_accuracy",
    "long_passing",
    "ball_control",
    "acceleration",
    "sprint_speed",
    "agility",
    "reactions",
    "balance",
    "shot_power",
    "jumping",
    "stamina",
    "strength",
    "long_shots",
    "aggression",
    "interceptions",
    "positioning",
    "vision",
    "penalties",
    "marking",
    "standing_tackle",
    "sliding_tackle",
    "gk_diving",
    "gk_handling",
    "gk_kicking",
    "gk_positioning",
    "gk_reflexes",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MissingPolicy {
    Keep,
    DropColumns(Vec<String>),
    DropColumnsAbove(f64),
    DropIncompleteRows(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePolicy {
    pub missing: MissingPolicy,
    pub dedup: bool,
}

impl TablePolicy {
    pub fn keep() -> Self {
        Self {
            missing: MissingPolicy::Keep,
            dedup: false,
        }
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningConfig {
    pub matches: TablePolicy,
    pub teams: TablePolicy,
    pub team_attributes: TablePolicy,
    pub players: TablePolicy,
    pub player_attributes: TablePolicy,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            matches: TablePolicy::keep(),
            teams: TablePolicy {
                missing: MissingPolicy::DropColumns(vec!["team_fifa_api_id".to_string()]),
                dedup: false,
            },
            team_attributes: TablePolicy {
                missing: MissingPolicy::DropColumnsAbove(SPARSE_COLUMN_THRESHOLD),
                dedup: false,
            },
            players: TablePolicy::keep(),
            player_attributes: TablePolicy {
                missing: MissingPolicy::DropIncompleteRows(
                    PLAYER_SKILL_COLUMNS.iter().map(|c| c.to_string()).collect(),
                ),
                dedup: false,
            },
        }
    }
}

impl CleaningConfig {
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        for policy in [
            &mut self.matches,
            &mut self.teams,
            &mut self.team_attributes,
            &mut self.players,
            &mut self.player_attributes,
        ] {
            policy.dedup = dedup;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCleaningReport {
    pub table: String,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub duplicates: usize,
    pub duplicates_removed: usize,
    pub null_counts: Vec<(String, usize)>,
    pub dropped_columns: Vec<String>,
    pub incomplete_rows: usize,
    pub incomplete_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub tables: Vec<TableCleaningReport>,
}

impl CleaningReport {
    pub fn table(&self, name: &str) -> Option<&TableCleaningReport> {
        self.tables.iter().find(|t| t.table == name)
    }
}

#[derive(Debug, Clone)]
pub struct CleanTables {
    pub matches: Table,
    pub teams: Table,
    pub team_attributes: Table,
    pub players: Table,
    pub player_attributes: Table,
}

pub fn clean_tables(raw: &RawTables, cfg: &CleaningConfig) -> Result<(CleanTables, CleaningReport)> {
    let (matches, r_matches) = clean_table(&raw.matches, &cfg.matches)?;
    let (teams, r_teams) = clean_table(&raw.teams, &cfg.teams)?;
    let (team_attributes, r_team_attributes) =
        clean_table(&raw.team_attributes, &cfg.team_attributes)?;
    let (players, r_players) = clean_table(&raw.players, &cfg.players)?;
    let (player_attributes, r_player_attributes) =
        clean_table(&raw.player_attributes, &cfg.player_attributes)?;

    Ok((
        CleanTables {
            matches,
            teams,
            team_attributes,
            players,
            player_attributes,
        },
        CleaningReport {
            tables: vec![
                r_matches,
                r_teams,
                r_team_attributes,
                r_players,
                r_player_attributes,
            ],
        },
    ))
}

pub fn clean_table(table: &Table, policy: &TablePolicy) -> Result<(Table, TableCleaningReport)> {
    let duplicates = table.duplicate_count();
    if duplicates > 0 {
        log::warn!("table {}: {duplicates} exact-duplicate rows", table.name);
    }
    let null_counts = table.null_counts();

    let deduped;
    let base = if policy.dedup && duplicates > 0 {
        deduped = table.dedup();
        &deduped
    } else {
        table
    };
    let duplicates_removed = table.len() - base.len();

    let mut dropped_columns = Vec::new();
    let mut incomplete_rows = 0usize;
    let cleaned = match &policy.missing {
        MissingPolicy::Keep => base.clone(),
        MissingPolicy::DropColumns(names) => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            dropped_columns.extend(names.iter().map(|n| n.to_string()));
            base.drop_columns(&names)
                .with_context(|| format!("drop columns from {}", table.name))?
        }
        MissingPolicy::DropColumnsAbove(threshold) => {
            let sparse = sparse_columns(base, *threshold);
            let names: Vec<&str> = sparse.iter().map(String::as_str).collect();
            dropped_columns.extend(sparse.iter().cloned());
            base.drop_columns(&names)
                .with_context(|| format!("drop sparse columns from {}", table.name))?
        }
        MissingPolicy::DropIncompleteRows(columns) => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            incomplete_rows = base
                .incomplete_row_count(&columns)
                .with_context(|| format!("count incomplete rows of {}", table.name))?;
            base.drop_incomplete_rows(&columns)
                .with_context(|| format!("drop incomplete rows of {}", table.name))?
        }
    };

    let incomplete_fraction = if base.is_empty() {
        0.0
    } else {
        incomplete_rows as f64 / base.len() as f64
    };
    if !dropped_columns.is_empty() {
        log::info!("table {}: dropped columns {:?}", table.name, dropped_columns);
    }
    if incomplete_rows > 0 {
        log::warn!(
            "table {}: dropped {incomplete_rows} rows with missing values ({:.2}%)",
            table.name,
            incomplete_fraction * 100.0
        );
    }

    let report = TableCleaningReport {
        table: table.name.clone(),
        rows_before: table.len(),
        rows_after: cleaned.len(),
        columns_before: table.width(),
        columns_after: cleaned.width(),
        duplicates,
        duplicates_removed,
        null_counts,
        dropped_columns,
        incomplete_rows,
        incomplete_fraction,
    };
    Ok((cleaned, report))
}

/// Columns whose null fraction strictly exceeds `threshold`.
pub fn sparse_columns(table: &Table, threshold: f64) -> Vec<String> {
    if table.is_empty() {
        return Vec::new();
    }
    let n = table.len() as f64;
    table
        .null_counts()
        .into_iter()
        .filter(|(_, nulls)| *nulls as f64 / n > threshold)
        .map(|(name, _)| name)
        .collect()
}
