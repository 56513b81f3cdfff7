use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::aggregate::TeamYear;
use crate::merge::TeamSeasonProfile;
use crate::records::{PlayerRecord, StyleAttribute, TeamRecord};
use crate::stats::{self, HistogramBin, KendallTau, LinearFit};

#[derive(Debug, Clone, Default)]
pub struct TeamDirectory {
    names: HashMap<i64, String>,
}

impl TeamDirectory {
    pub fn from_records(teams: &[TeamRecord]) -> Self {
        Self {
            names: teams
                .iter()
                .map(|t| (t.team_api_id, t.team_long_name.clone()))
                .collect(),
        }
    }

    pub fn contains(&self, team_api_id: i64) -> bool {
        self.names.contains_key(&team_api_id)
    }

    pub fn name(&self, team_api_id: i64) -> String {
        self.names
            .get(&team_api_id)
            .cloned()
            .unwrap_or_else(|| format!("team {team_api_id}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamImprovement {
    pub team_api_id: i64,
    pub team_name: String,
    pub years: usize,
    pub fit: LinearFit,
}

impl TeamImprovement {
    pub fn slope(&self) -> f64 {
        self.fit.slope
    }
}

/// Per-team OLS slope of points-per-game over year, best improvers first.
/// Ties on slope fall back to team name so the order is stable.
pub fn improvement_ranking(
    team_years: &[TeamYear],
    teams: &TeamDirectory,
) -> Result<Vec<TeamImprovement>> {
    let mut series: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for ty in team_years {
        let entry = series.entry(ty.team_api_id).or_default();
        entry.0.push(ty.year as f64);
        entry.1.push(ty.points_per_game);
    }

    let mut out = Vec::with_capacity(series.len());
    for (team_api_id, (years, ppg)) in series {
        let team_name = teams.name(team_api_id);
        let fit = stats::linear_regression(&years, &ppg)
            .with_context(|| format!("improvement slope for {team_name}"))?;
        out.push(TeamImprovement {
            team_api_id,
            team_name,
            years: years.len(),
            fit,
        });
    }
    out.sort_by(|a, b| {
        b.fit
            .slope
            .partial_cmp(&a.fit.slope)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.team_name.cmp(&b.team_name))
    });
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub year: i32,
    pub points_per_game: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeries {
    pub team_api_id: i64,
    pub team_name: String,
    pub points: Vec<SeriesPoint>,
}

pub fn team_series(team_years: &[TeamYear], ranked: &[TeamImprovement]) -> Vec<TeamSeries> {
    ranked
        .iter()
        .map(|team| {
            let mut points: Vec<SeriesPoint> = team_years
                .iter()
                .filter(|ty| ty.team_api_id == team.team_api_id)
                .map(|ty| SeriesPoint {
                    year: ty.year,
                    points_per_game: ty.points_per_game,
                })
                .collect();
            points.sort_by_key(|p| p.year);
            TeamSeries {
                team_api_id: team.team_api_id,
                team_name: team.team_name.clone(),
                points,
            }
        })
        .collect()
}

pub fn improvement_histogram(ranked: &[TeamImprovement], bins: usize) -> Result<Vec<HistogramBin>> {
    let slopes: Vec<f64> = ranked.iter().map(TeamImprovement::slope).collect();
    stats::histogram(&slopes, bins).context("improvement histogram")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PenaltyEntry {
    pub player_api_id: i64,
    pub player_name: String,
    pub penalties: f64,
    pub date: chrono::NaiveDate,
}

/// Top `limit` player snapshots by penalty rating. With `distinct_players`
/// each player contributes only their best snapshot.
pub fn most_penalized(players: &[PlayerRecord], limit: usize, distinct_players: bool) -> Vec<PenaltyEntry> {
    let mut rows: Vec<&PlayerRecord> = players.iter().collect();
    rows.sort_by(|a, b| {
        b.penalties
            .partial_cmp(&a.penalties)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.player_name.cmp(&b.player_name))
            .then_with(|| b.date.cmp(&a.date))
    });
    if distinct_players {
        let mut seen = std::collections::HashSet::new();
        rows.retain(|p| seen.insert(p.player_api_id));
    }
    rows.into_iter()
        .take(limit)
        .map(|p| PenaltyEntry {
            player_api_id: p.player_api_id,
            player_name: p.player_name.clone(),
            penalties: p.penalties,
            date: p.date,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Variable {
    PointsPerGame,
    Attribute(StyleAttribute),
}

impl Variable {
    pub fn all() -> Vec<Variable> {
        std::iter::once(Variable::PointsPerGame)
            .chain(StyleAttribute::ALL.into_iter().map(Variable::Attribute))
            .collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            Variable::PointsPerGame => "points_per_game",
            Variable::Attribute(a) => a.column(),
        }
    }

    fn values(self, rows: &[TeamSeasonProfile]) -> Vec<Option<f64>> {
        rows.iter()
            .map(|r| match self {
                Variable::PointsPerGame => Some(r.points_per_game),
                Variable::Attribute(a) => r.ratings.get(a),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub variables: Vec<Variable>,
    /// Row-major; `None` where a pair has fewer than two complete
    /// observations or a constant side, the diagonal included.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.variables.iter().position(|v| *v == a)?;
        let j = self.variables.iter().position(|v| *v == b)?;
        self.values[i][j]
    }

    /// Correlation of each attribute with points-per-game, strongest positive first.
    pub fn outcome_column(&self) -> Vec<(StyleAttribute, f64)> {
        let mut out: Vec<(StyleAttribute, f64)> = self
            .variables
            .iter()
            .filter_map(|v| match v {
                Variable::Attribute(a) => Some((*a, self.get(Variable::PointsPerGame, *v)?)),
                Variable::PointsPerGame => None,
            })
            .collect();
        out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        out
    }
}

pub fn correlation_matrix(rows: &[TeamSeasonProfile]) -> CorrelationMatrix {
    let variables = Variable::all();
    let columns: Vec<Vec<Option<f64>>> = variables.iter().map(|v| v.values(rows)).collect();
    let k = variables.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = stats::pearson_pairwise(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix { variables, values }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeAssociation {
    pub attribute: StyleAttribute,
    pub kendall: KendallTau,
}

/// Kendall's tau of each attribute against points-per-game over complete
/// pairs, strongest positive association first.
pub fn attribute_associations(
    rows: &[TeamSeasonProfile],
    attributes: &[StyleAttribute],
) -> Result<Vec<AttributeAssociation>> {
    let mut out = Vec::with_capacity(attributes.len());
    for attr in attributes {
        let (ppg, values): (Vec<f64>, Vec<f64>) = rows
            .iter()
            .filter_map(|r| Some((r.points_per_game, r.ratings.get(*attr)?)))
            .unzip();
        let kendall = stats::kendall_tau(&ppg, &values)
            .with_context(|| format!("kendall tau for {}", attr.column()))?;
        out.push(AttributeAssociation {
            attribute: *attr,
            kendall,
        });
    }
    out.sort_by(|a, b| {
        b.kendall
            .tau
            .partial_cmp(&a.kendall.tau)
            .unwrap_or(Ordering::Equal)
    });
    Ok(out)
}
