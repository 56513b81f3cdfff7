use std::collections::BTreeMap;

use serde::Serialize;

use crate::transform::TeamMatchRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamYear {
    pub team_api_id: i64,
    pub year: i32,
    pub total_goals: u32,
    pub num_of_games: u32,
    pub total_points: u32,
    pub points_per_game: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    goals: u32,
    games: u32,
    points: u32,
}

/// Group by (team, year). Groups only exist for rows that were seen, so
/// `num_of_games` is never zero. Output is ordered by (team, year).
pub fn aggregate_team_years(rows: &[TeamMatchRow]) -> Vec<TeamYear> {
    let mut groups: BTreeMap<(i64, i32), Acc> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry((row.team_api_id, row.year)).or_default();
        acc.goals += row.goals;
        acc.games += 1;
        acc.points += row.points;
    }

    let out: Vec<TeamYear> = groups
        .into_iter()
        .map(|((team_api_id, year), acc)| TeamYear {
            team_api_id,
            year,
            total_goals: acc.goals,
            num_of_games: acc.games,
            total_points: acc.points,
            points_per_game: acc.points as f64 / acc.games as f64,
        })
        .collect();
    log::info!("aggregated {} team rows into {} team-years", rows.len(), out.len());
    out
}
