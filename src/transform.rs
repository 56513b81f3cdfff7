use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::records::MatchRecord;

pub const WIN_POINTS: u32 = 3;
pub const DRAW_POINTS: u32 = 1;
pub const LOSS_POINTS: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamMatchRow {
    pub team_api_id: i64,
    pub match_api_id: i64,
    pub side: Side,
    pub date: NaiveDate,
    pub year: i32,
    pub goals: u32,
    pub points: u32,
}

pub fn points_for(goals_for: u32, goals_against: u32) -> u32 {
    if goals_for > goals_against {
        WIN_POINTS
    } else if goals_for == goals_against {
        DRAW_POINTS
    } else {
        LOSS_POINTS
    }
}

pub fn match_points(m: &MatchRecord) -> (u32, u32) {
    (
        points_for(m.home_team_goal, m.away_team_goal),
        points_for(m.away_team_goal, m.home_team_goal),
    )
}

/// All home rows first, then all away rows, so the output is exactly twice
/// the input length and row `i` / `i + n` come from the same match.
pub fn to_long_format(matches: &[MatchRecord]) -> Vec<TeamMatchRow> {
    let mut out = Vec::with_capacity(matches.len() * 2);
    for m in matches {
        let (home_points, _) = match_points(m);
        out.push(TeamMatchRow {
            team_api_id: m.home_team_api_id,
            match_api_id: m.match_api_id,
            side: Side::Home,
            date: m.date,
            year: m.date.year(),
            goals: m.home_team_goal,
            points: home_points,
        });
    }
    for m in matches {
        let (_, away_points) = match_points(m);
        out.push(TeamMatchRow {
            team_api_id: m.away_team_api_id,
            match_api_id: m.match_api_id,
            side: Side::Away,
            date: m.date,
            year: m.date.year(),
            goals: m.away_team_goal,
            points: away_points,
        });
    }
    log::info!(
        "long format: {} matches -> {} team rows",
        matches.len(),
        out.len()
    );
    out
}
