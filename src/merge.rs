use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::TeamYear;
use crate::error::PipelineError;
use crate::records::{StyleRatings, TeamAttributeSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum JoinPolicy {
    /// One row per team-year: the snapshot with the latest date wins, then the
    /// larger snapshot id.
    #[default]
    LatestSnapshot,
    /// One row per matching snapshot (plain inner-join cardinality).
    Expand,
}

impl FromStr for JoinPolicy {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest_snapshot" | "most_recent" => Ok(JoinPolicy::LatestSnapshot),
            "expand" | "cross" | "all" => Ok(JoinPolicy::Expand),
            other => Err(PipelineError::Config(format!(
                "unknown join policy {other:?} (expected latest|expand)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonProfile {
    pub team_api_id: i64,
    pub year: i32,
    pub points_per_game: f64,
    pub snapshot_id: i64,
    pub snapshot_date: NaiveDate,
    pub ratings: StyleRatings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeSummary {
    pub team_years_in: usize,
    pub unmatched_team_years: usize,
    pub multi_snapshot_team_years: usize,
    pub rows_out: usize,
}

pub fn merge_attributes(
    team_years: &[TeamYear],
    snapshots: &[TeamAttributeSnapshot],
    policy: JoinPolicy,
) -> (Vec<TeamSeasonProfile>, MergeSummary) {
    let mut by_key: HashMap<(i64, i32), Vec<&TeamAttributeSnapshot>> = HashMap::new();
    for snap in snapshots {
        by_key
            .entry((snap.team_api_id, snap.year()))
            .or_default()
            .push(snap);
    }
    for group in by_key.values_mut() {
        group.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    }

    let mut out = Vec::new();
    let mut unmatched = 0usize;
    let mut multi = 0usize;
    for ty in team_years {
        let Some(group) = by_key.get(&(ty.team_api_id, ty.year)) else {
            unmatched += 1;
            continue;
        };
        if group.len() > 1 {
            multi += 1;
        }
        let chosen: Vec<&TeamAttributeSnapshot> = match policy {
            JoinPolicy::LatestSnapshot => group.last().copied().into_iter().collect(),
            JoinPolicy::Expand => group.clone(),
        };
        for snap in chosen {
            out.push(TeamSeasonProfile {
                team_api_id: ty.team_api_id,
                year: ty.year,
                points_per_game: ty.points_per_game,
                snapshot_id: snap.id,
                snapshot_date: snap.date,
                ratings: snap.ratings,
            });
        }
    }

    if unmatched > 0 {
        log::warn!("{unmatched} team-years have no attribute snapshot and were dropped");
    }
    if multi > 0 {
        log::warn!("{multi} team-years match several snapshots (policy {policy:?})");
    }
    let summary = MergeSummary {
        team_years_in: team_years.len(),
        unmatched_team_years: unmatched,
        multi_snapshot_team_years: multi,
        rows_out: out.len(),
    };
    (out, summary)
}
