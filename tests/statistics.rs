use chrono::NaiveDate;

use euro_soccer_eda::aggregate::TeamYear;
use euro_soccer_eda::analysis::{
    TeamDirectory, Variable, correlation_matrix, improvement_ranking, most_penalized,
};
use euro_soccer_eda::error::PipelineError;
use euro_soccer_eda::merge::{JoinPolicy, TeamSeasonProfile, merge_attributes};
use euro_soccer_eda::records::{PlayerRecord, StyleAttribute, StyleRatings, TeamAttributeSnapshot, TeamRecord};
use euro_soccer_eda::stats::{
    PValueMethod, histogram, kendall_tau, linear_regression, pearson, pearson_pairwise,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn is_degenerate(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Degenerate(_))
    )
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn team_year(team: i64, year: i32, ppg: f64) -> TeamYear {
    TeamYear {
        team_api_id: team,
        year,
        total_goals: 0,
        num_of_games: 10,
        total_points: (ppg * 10.0).round() as u32,
        points_per_game: ppg,
    }
}

fn snapshot(id: i64, team: i64, day: &str, pressure: f64) -> TeamAttributeSnapshot {
    let mut ratings = StyleRatings::default();
    ratings.set(StyleAttribute::DefencePressure, Some(pressure));
    TeamAttributeSnapshot {
        id,
        team_api_id: team,
        date: date(day),
        ratings,
        classes: Vec::new(),
    }
}

#[test]
fn regression_recovers_a_perfect_line() {
    let x = [2010.0, 2011.0, 2012.0, 2013.0, 2014.0];
    let y: Vec<f64> = x.iter().map(|v| 0.25 * (v - 2010.0) + 1.0).collect();
    let fit = linear_regression(&x, &y).unwrap();
    assert!(close(fit.slope, 0.25));
    assert!(close(fit.r, 1.0));
    assert!(close(fit.intercept + fit.slope * 2012.0, 1.5));
    assert_eq!(fit.n, 5);
}

#[test]
fn regression_rejects_degenerate_input() {
    assert!(is_degenerate(&linear_regression(&[2010.0], &[1.0]).unwrap_err()));
    assert!(is_degenerate(
        &linear_regression(&[2010.0, 2010.0], &[1.0, 2.0]).unwrap_err()
    ));
}

#[test]
fn pearson_is_signed_unit_on_lines() {
    let x = [1.0, 2.0, 3.0, 4.0];
    assert!(close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
    assert!(close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
    assert!(is_degenerate(&pearson(&x, &[3.0; 4]).unwrap_err()));

    let a = [Some(1.0), None, Some(3.0), Some(5.0)];
    let b = [Some(2.0), Some(9.0), None, Some(10.0)];
    assert!(close(pearson_pairwise(&a, &b).unwrap(), 1.0));
    assert_eq!(pearson_pairwise(&[Some(1.0), None], &[Some(1.0), Some(2.0)]), None);
}

#[test]
fn kendall_exact_without_ties() {
    let k = kendall_tau(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    assert!(close(k.tau, 1.0));
    assert_eq!(k.method, PValueMethod::Exact);
    assert!(close(k.p_value, 2.0 / 120.0));

    let k = kendall_tau(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).unwrap();
    assert_eq!((k.concordant, k.discordant), (5, 1));
    assert!(close(k.tau, 4.0 / 6.0));
    assert!(close(k.p_value, 1.0 / 3.0));

    let k = kendall_tau(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
    assert!(close(k.tau, -1.0));
}

#[test]
fn kendall_tau_b_with_ties_uses_normal_approximation() {
    let k = kendall_tau(&[1.0, 2.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 3.0]).unwrap();
    assert_eq!((k.concordant, k.discordant), (4, 0));
    assert!(close(k.tau, 0.8));
    assert_eq!(k.method, PValueMethod::Asymptotic);
    assert!((k.p_value - 0.125_971_163).abs() < 1e-6);
}

#[test]
fn kendall_rejects_constant_or_tiny_samples() {
    assert!(is_degenerate(&kendall_tau(&[1.0], &[2.0]).unwrap_err()));
    assert!(is_degenerate(
        &kendall_tau(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err()
    ));
}

#[test]
fn histogram_counts_every_value_once() {
    let values = [-0.2, -0.1, 0.0, 0.05, 0.1, 0.3];
    let bins = histogram(&values, 5).unwrap();
    assert_eq!(bins.len(), 5);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
    assert!(close(bins[0].start, -0.2));
    assert!(close(bins[4].end, 0.3));
    assert_eq!(bins[4].count, 1);

    let flat = histogram(&[0.4, 0.4], 3).unwrap();
    assert_eq!(flat.iter().map(|b| b.count).sum::<usize>(), 2);
    assert!(histogram(&[], 3).is_err());
}

#[test]
fn improvement_slopes_rank_descending() {
    let teams = TeamDirectory::from_records(&[
        TeamRecord {
            team_api_id: 1,
            team_long_name: "Riser".into(),
            team_short_name: None,
        },
        TeamRecord {
            team_api_id: 2,
            team_long_name: "Faller".into(),
            team_short_name: None,
        },
    ]);
    let mut rows = Vec::new();
    for (i, year) in (2010..=2014).enumerate() {
        rows.push(team_year(1, year, 1.0 + 0.2 * i as f64));
        rows.push(team_year(2, year, 2.0 - 0.1 * i as f64));
    }
    let ranked = improvement_ranking(&rows, &teams).unwrap();
    assert_eq!(ranked[0].team_name, "Riser");
    assert!(close(ranked[0].fit.slope, 0.2));
    assert!(close(ranked[1].fit.slope, -0.1));
    assert_eq!(teams.name(77), "team 77");
}

#[test]
fn merge_policies_differ_only_on_multi_snapshot_years() {
    let years = vec![
        team_year(1, 2012, 1.5),
        team_year(1, 2013, 1.8),
        team_year(2, 2013, 1.1),
    ];
    let snaps = vec![
        snapshot(10, 1, "2012-02-22", 40.0),
        snapshot(11, 1, "2012-09-10", 55.0),
        snapshot(12, 1, "2013-09-20", 60.0),
    ];

    let (latest, summary) = merge_attributes(&years, &snaps, JoinPolicy::LatestSnapshot);
    assert_eq!(latest.len(), 2);
    assert_eq!(summary.unmatched_team_years, 1);
    assert_eq!(summary.multi_snapshot_team_years, 1);
    let y2012 = latest.iter().find(|p| p.year == 2012).unwrap();
    assert_eq!(y2012.snapshot_id, 11);
    assert_eq!(y2012.ratings.get(StyleAttribute::DefencePressure), Some(55.0));

    let (expanded, summary) = merge_attributes(&years, &snaps, JoinPolicy::Expand);
    assert_eq!(expanded.len(), 3);
    assert_eq!(summary.rows_out, 3);
    assert!(expanded.iter().all(|p| p.team_api_id == 1));
}

#[test]
fn same_day_snapshots_fall_back_to_larger_id() {
    let years = vec![team_year(3, 2011, 1.0)];
    let snaps = vec![
        snapshot(21, 3, "2011-02-22", 70.0),
        snapshot(20, 3, "2011-02-22", 30.0),
    ];
    let (rows, _) = merge_attributes(&years, &snaps, JoinPolicy::LatestSnapshot);
    assert_eq!(rows[0].snapshot_id, 21);
}

#[test]
fn join_policy_parses_names() {
    assert_eq!("latest".parse::<JoinPolicy>().unwrap(), JoinPolicy::LatestSnapshot);
    assert_eq!(" Expand ".parse::<JoinPolicy>().unwrap(), JoinPolicy::Expand);
    assert!("newest-ish".parse::<JoinPolicy>().is_err());
}

#[test]
fn penalty_ranking_breaks_ties_by_name() {
    let player = |id: i64, name: &str, day: &str, penalties: f64| PlayerRecord {
        player_api_id: id,
        player_fifa_api_id: id + 1000,
        player_name: name.to_string(),
        date: date(day),
        overall_rating: Some(80.0),
        penalties,
    };
    let rows = vec![
        player(1, "Zed", "2014-01-01", 92.0),
        player(2, "Abe", "2014-01-01", 92.0),
        player(1, "Zed", "2015-01-01", 95.0),
    ];
    let top = most_penalized(&rows, 2, false);
    assert_eq!(top[0].player_name, "Zed");
    assert_eq!(top[1].player_name, "Abe");

    let all = most_penalized(&rows, 10, true);
    assert_eq!(all.len(), 2);
}

#[test]
fn constant_attribute_has_no_self_correlation() {
    let profiles: Vec<TeamSeasonProfile> = (0..4)
        .map(|i| {
            let mut ratings = StyleRatings::default();
            ratings.set(StyleAttribute::DefencePressure, Some(40.0 + 5.0 * i as f64));
            ratings.set(StyleAttribute::DefenceTeamWidth, Some(50.0));
            TeamSeasonProfile {
                team_api_id: 1,
                year: 2010 + i,
                points_per_game: 1.0 + 0.3 * i as f64,
                snapshot_id: i as i64,
                snapshot_date: date("2010-09-22"),
                ratings,
            }
        })
        .collect();
    let m = correlation_matrix(&profiles);
    let ppg = Variable::PointsPerGame;
    let pressure = Variable::Attribute(StyleAttribute::DefencePressure);
    let width = Variable::Attribute(StyleAttribute::DefenceTeamWidth);

    assert!((m.get(ppg, ppg).unwrap() - 1.0).abs() < 1e-9);
    assert!((m.get(ppg, pressure).unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(m.get(width, width), None);
    assert_eq!(m.get(ppg, width), None);
    // No observations at all for the other attributes.
    let speed = Variable::Attribute(StyleAttribute::BuildUpPlaySpeed);
    assert_eq!(m.get(speed, speed), None);
}
