use std::collections::HashMap;

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::table::{Table, TableReader};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub id: i64,
    pub match_api_id: i64,
    pub country_id: i64,
    pub league_id: i64,
    pub season: String,
    pub stage: i64,
    pub date: NaiveDate,
    pub home_team_api_id: i64,
    pub away_team_api_id: i64,
    pub home_team_goal: u32,
    pub away_team_goal: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRecord {
    pub team_api_id: i64,
    pub team_long_name: String,
    pub team_short_name: Option<String>,
}

/// The quantitative team style ratings. Class labels are carried separately
/// and never enter the numeric analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StyleAttribute {
    BuildUpPlaySpeed,
    BuildUpPlayPassing,
    ChanceCreationPassing,
    ChanceCreationCrossing,
    ChanceCreationShooting,
    DefencePressure,
    DefenceAggression,
    DefenceTeamWidth,
}

impl StyleAttribute {
    pub const ALL: [StyleAttribute; 8] = [
        StyleAttribute::BuildUpPlaySpeed,
        StyleAttribute::BuildUpPlayPassing,
        StyleAttribute::ChanceCreationPassing,
        StyleAttribute::ChanceCreationCrossing,
        StyleAttribute::ChanceCreationShooting,
        StyleAttribute::DefencePressure,
        StyleAttribute::DefenceAggression,
        StyleAttribute::DefenceTeamWidth,
    ];

    pub fn column(self) -> &'static str {
        match self {
            StyleAttribute::BuildUpPlaySpeed => "buildUpPlaySpeed",
            StyleAttribute::BuildUpPlayPassing => "buildUpPlayPassing",
            StyleAttribute::ChanceCreationPassing => "chanceCreationPassing",
            StyleAttribute::ChanceCreationCrossing => "chanceCreationCrossing",
            StyleAttribute::ChanceCreationShooting => "chanceCreationShooting",
            StyleAttribute::DefencePressure => "defencePressure",
            StyleAttribute::DefenceAggression => "defenceAggression",
            StyleAttribute::DefenceTeamWidth => "defenceTeamWidth",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StyleAttribute::BuildUpPlaySpeed => "Build-up speed",
            StyleAttribute::BuildUpPlayPassing => "Build-up passing",
            StyleAttribute::ChanceCreationPassing => "Chance creation passing",
            StyleAttribute::ChanceCreationCrossing => "Chance creation crossing",
            StyleAttribute::ChanceCreationShooting => "Chance creation shooting",
            StyleAttribute::DefencePressure => "Defence pressure",
            StyleAttribute::DefenceAggression => "Defence aggression",
            StyleAttribute::DefenceTeamWidth => "Defence team width",
        }
    }

    /// Accepts the source column name or the variant name, case-insensitive.
    pub fn from_column(raw: &str) -> Option<StyleAttribute> {
        let needle = raw.trim().replace(['_', '-', ' '], "").to_ascii_lowercase();
        StyleAttribute::ALL
            .into_iter()
            .find(|a| a.column().to_ascii_lowercase() == needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StyleRatings {
    pub values: [Option<f64>; 8],
}

impl StyleRatings {
    pub fn get(&self, attr: StyleAttribute) -> Option<f64> {
        self.values[attr as usize]
    }

    pub fn set(&mut self, attr: StyleAttribute, value: Option<f64>) {
        self.values[attr as usize] = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAttributeSnapshot {
    pub id: i64,
    pub team_api_id: i64,
    pub date: NaiveDate,
    pub ratings: StyleRatings,
    pub classes: Vec<(String, String)>,
}

impl TeamAttributeSnapshot {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRecord {
    pub player_api_id: i64,
    pub player_fifa_api_id: i64,
    pub player_name: String,
    pub date: NaiveDate,
    pub overall_rating: Option<f64>,
    pub penalties: f64,
}

pub fn parse_source_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn date_at(reader: &TableReader<'_>, row_no: usize, row: &[crate::table::Cell], column: &str) -> Result<NaiveDate> {
    let raw = reader.text(row_no, row, column)?;
    parse_source_date(&raw)
        .ok_or_else(|| reader.bad_value(row_no, column, format!("unparseable date {raw:?}")))
}

fn goals_at(reader: &TableReader<'_>, row_no: usize, row: &[crate::table::Cell], column: &str) -> Result<u32> {
    let goals = reader.i64(row_no, row, column)?;
    u32::try_from(goals).map_err(|_| reader.bad_value(row_no, column, format!("negative goal count {goals}")))
}

pub fn matches_from_table(table: &Table) -> Result<Vec<MatchRecord>> {
    let reader = table.reader();
    reader.require_columns(&[
        "id",
        "match_api_id",
        "country_id",
        "league_id",
        "season",
        "stage",
        "date",
        "home_team_api_id",
        "away_team_api_id",
        "home_team_goal",
        "away_team_goal",
    ])?;

    let mut out = Vec::with_capacity(table.len());
    for (row_no, row) in reader.rows() {
        out.push(MatchRecord {
            id: reader.i64(row_no, row, "id")?,
            match_api_id: reader.i64(row_no, row, "match_api_id")?,
            country_id: reader.i64(row_no, row, "country_id")?,
            league_id: reader.i64(row_no, row, "league_id")?,
            season: reader.text(row_no, row, "season")?,
            stage: reader.i64(row_no, row, "stage")?,
            date: date_at(&reader, row_no, row, "date")?,
            home_team_api_id: reader.i64(row_no, row, "home_team_api_id")?,
            away_team_api_id: reader.i64(row_no, row, "away_team_api_id")?,
            home_team_goal: goals_at(&reader, row_no, row, "home_team_goal")?,
            away_team_goal: goals_at(&reader, row_no, row, "away_team_goal")?,
        });
    }
    Ok(out)
}

pub fn teams_from_table(table: &Table) -> Result<Vec<TeamRecord>> {
    let reader = table.reader();
    reader.require_columns(&["team_api_id", "team_long_name"])?;
    let has_short = table.has_column("team_short_name");

    let mut out = Vec::with_capacity(table.len());
    for (row_no, row) in reader.rows() {
        out.push(TeamRecord {
            team_api_id: reader.i64(row_no, row, "team_api_id")?,
            team_long_name: reader.text(row_no, row, "team_long_name")?,
            team_short_name: if has_short {
                reader.opt_text(row, "team_short_name")?
            } else {
                None
            },
        });
    }
    Ok(out)
}

/// A rating column that is absent (dropped by the cleaner) leaves that rating
/// `None` for every row.
pub fn team_attributes_from_table(table: &Table) -> Result<Vec<TeamAttributeSnapshot>> {
    let reader = table.reader();
    reader.require_columns(&["id", "team_api_id", "date"])?;
    let present: Vec<StyleAttribute> = StyleAttribute::ALL
        .into_iter()
        .filter(|a| table.has_column(a.column()))
        .collect();
    let class_columns: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|c| c.ends_with("Class"))
        .collect();

    let mut out = Vec::with_capacity(table.len());
    for (row_no, row) in reader.rows() {
        let mut ratings = StyleRatings::default();
        for attr in &present {
            ratings.set(*attr, reader.opt_f64(row_no, row, attr.column())?);
        }
        let mut classes = Vec::with_capacity(class_columns.len());
        for column in &class_columns {
            if let Some(label) = reader.opt_text(row, column)? {
                classes.push((column.to_string(), label));
            }
        }
        out.push(TeamAttributeSnapshot {
            id: reader.i64(row_no, row, "id")?,
            team_api_id: reader.i64(row_no, row, "team_api_id")?,
            date: date_at(&reader, row_no, row, "date")?,
            ratings,
            classes,
        });
    }
    Ok(out)
}

/// Inner join of player attribute snapshots with player identity on
/// (`player_api_id`, `player_fifa_api_id`).
pub fn players_from_tables(player_attributes: &Table, players: &Table) -> Result<Vec<PlayerRecord>> {
    let ident = players.reader();
    ident.require_columns(&["player_api_id", "player_fifa_api_id", "player_name"])?;
    let mut names: HashMap<(i64, i64), String> = HashMap::with_capacity(players.len());
    for (row_no, row) in ident.rows() {
        let key = (
            ident.i64(row_no, row, "player_api_id")?,
            ident.i64(row_no, row, "player_fifa_api_id")?,
        );
        names.insert(key, ident.text(row_no, row, "player_name")?);
    }

    let attrs = player_attributes.reader();
    attrs.require_columns(&["player_api_id", "player_fifa_api_id", "date", "penalties"])?;
    let has_overall = player_attributes.has_column("overall_rating");

    let mut out = Vec::with_capacity(player_attributes.len());
    for (row_no, row) in attrs.rows() {
        let key = (
            attrs.i64(row_no, row, "player_api_id")?,
            attrs.i64(row_no, row, "player_fifa_api_id")?,
        );
        let Some(name) = names.get(&key) else {
            continue;
        };
        let Some(penalties) = attrs.opt_f64(row_no, row, "penalties")? else {
            continue;
        };
        out.push(PlayerRecord {
            player_api_id: key.0,
            player_fifa_api_id: key.1,
            player_name: name.clone(),
            date: date_at(&attrs, row_no, row, "date")?,
            overall_rating: if has_overall {
                attrs.opt_f64(row_no, row, "overall_rating")?
            } else {
                None
            },
            penalties,
        });
    }
    Ok(out)
}
