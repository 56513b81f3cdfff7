use chrono::{Datelike, NaiveDate};

use euro_soccer_eda::aggregate::{TeamYear, aggregate_team_years};
use euro_soccer_eda::filter::{FilterConfig, filter_team_years};
use euro_soccer_eda::records::MatchRecord;
use euro_soccer_eda::transform::{Side, match_points, to_long_format};

fn game(id: i64, date: &str, home: i64, away: i64, hg: u32, ag: u32) -> MatchRecord {
    MatchRecord {
        id,
        match_api_id: 1000 + id,
        country_id: 1,
        league_id: 1,
        season: "2009/2010".to_string(),
        stage: 1,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        home_team_api_id: home,
        away_team_api_id: away,
        home_team_goal: hg,
        away_team_goal: ag,
    }
}

fn team_year(team: i64, year: i32) -> TeamYear {
    TeamYear {
        team_api_id: team,
        year,
        total_goals: 10,
        num_of_games: 5,
        total_points: 7,
        points_per_game: 1.4,
    }
}

#[test]
fn win_and_draw_award_points() {
    let matches = vec![
        game(1, "2010-08-14", 10, 20, 2, 1),
        game(2, "2010-08-15", 30, 40, 1, 1),
    ];
    let rows = to_long_format(&matches);
    assert_eq!(rows.len(), 4);

    let points: Vec<(i64, u32)> = rows.iter().map(|r| (r.team_api_id, r.points)).collect();
    assert_eq!(points, vec![(10, 3), (30, 1), (20, 0), (40, 1)]);
    assert!(rows[..2].iter().all(|r| r.side == Side::Home));
    assert!(rows[2..].iter().all(|r| r.side == Side::Away));
    assert_eq!(rows[0].match_api_id, rows[2].match_api_id);
}

#[test]
fn every_match_hands_out_two_or_three_points() {
    let matches: Vec<MatchRecord> = (0..30)
        .map(|i| game(i, "2012-03-01", i % 7, 100 + i % 5, (i % 4) as u32, (i % 3) as u32))
        .collect();
    for m in &matches {
        let (h, a) = match_points(m);
        let total = h + a;
        assert!(total == 2 || total == 3, "match {} gave {total}", m.id);
        if m.home_team_goal == m.away_team_goal {
            assert_eq!((h, a), (1, 1));
        } else if m.home_team_goal > m.away_team_goal {
            assert_eq!((h, a), (3, 0), "match {}", m.id);
        } else {
            assert_eq!((h, a), (0, 3), "match {}", m.id);
        }
    }
}

#[test]
fn aggregation_keeps_goal_and_game_totals() {
    let matches = vec![
        game(1, "2010-08-14", 10, 20, 2, 1),
        game(2, "2010-12-20", 20, 10, 0, 0),
        game(3, "2011-01-02", 10, 20, 4, 3),
        game(4, "2011-05-09", 30, 10, 2, 0),
    ];
    let rows = to_long_format(&matches);
    let years = aggregate_team_years(&rows);

    let goals_in: u32 = matches
        .iter()
        .map(|m| m.home_team_goal + m.away_team_goal)
        .sum();
    let goals_out: u32 = years.iter().map(|ty| ty.total_goals).sum();
    assert_eq!(goals_in, goals_out);
    let games_out: u32 = years.iter().map(|ty| ty.num_of_games).sum();
    assert_eq!(games_out as usize, rows.len());

    for ty in &years {
        assert!(ty.num_of_games > 0);
        let expected = ty.total_points as f64 / ty.num_of_games as f64;
        assert!((ty.points_per_game - expected).abs() < 1e-12);
    }

    let ten_2010 = years
        .iter()
        .find(|ty| ty.team_api_id == 10 && ty.year == 2010)
        .unwrap();
    assert_eq!(
        (ten_2010.total_goals, ten_2010.num_of_games, ten_2010.total_points),
        (2, 2, 4)
    );
    let ten_2011 = years
        .iter()
        .find(|ty| ty.team_api_id == 10 && ty.year == 2011)
        .unwrap();
    assert_eq!(ten_2011.total_points, 3);
    assert!((ten_2011.points_per_game - 1.5).abs() < 1e-12);
}

#[test]
fn each_team_year_matches_its_source_games() {
    let matches: Vec<MatchRecord> = (0..40)
        .map(|i| {
            let day = format!("{}-{:02}-15", 2009 + i % 4, 1 + i % 12);
            let home = 1 + i % 5;
            let away = 1 + (i + 2) % 5;
            game(i, &day, home, away, (i % 4) as u32, ((i + 1) % 3) as u32)
        })
        .collect();
    let years = aggregate_team_years(&to_long_format(&matches));

    for ty in &years {
        let mut goals = 0;
        let mut games = 0;
        let mut points = 0;
        for m in matches.iter().filter(|m| m.date.year() == ty.year) {
            let (h, a) = match_points(m);
            if m.home_team_api_id == ty.team_api_id {
                goals += m.home_team_goal;
                games += 1;
                points += h;
            }
            if m.away_team_api_id == ty.team_api_id {
                goals += m.away_team_goal;
                games += 1;
                points += a;
            }
        }
        assert_eq!(
            (ty.total_goals, ty.num_of_games, ty.total_points),
            (goals, games, points),
            "team {} in {}",
            ty.team_api_id,
            ty.year
        );
    }
}

#[test]
fn calendar_year_splits_a_season() {
    let matches = vec![
        game(1, "2010-12-28", 1, 2, 1, 0),
        game(2, "2011-01-03", 1, 2, 1, 0),
    ];
    let years = aggregate_team_years(&to_long_format(&matches));
    let team_one: Vec<i32> = years
        .iter()
        .filter(|ty| ty.team_api_id == 1)
        .map(|ty| ty.year)
        .collect();
    assert_eq!(team_one, vec![2010, 2011]);
}

#[test]
fn filter_needs_more_than_min_years_after_cutoff() {
    let mut rows = Vec::new();
    for year in 2008..=2014 {
        rows.push(team_year(1, year));
    }
    for year in 2010..=2013 {
        rows.push(team_year(2, year));
    }
    rows.push(team_year(3, 2009));

    let kept = filter_team_years(&rows, FilterConfig::default());
    assert!(kept.iter().all(|ty| ty.team_api_id == 1 && ty.year > 2009));
    let years: Vec<i32> = kept.iter().map(|ty| ty.year).collect();
    assert_eq!(years, vec![2010, 2011, 2012, 2013, 2014]);

    let again = filter_team_years(&kept, FilterConfig::default());
    assert_eq!(again, kept);
}

#[test]
fn filter_thresholds_are_configurable() {
    let rows: Vec<TeamYear> = (2010..=2013).map(|y| team_year(2, y)).collect();
    let cfg = FilterConfig {
        cutoff_year: 2009,
        min_years: 3,
    };
    assert_eq!(filter_team_years(&rows, cfg).len(), 4);
    let cfg = FilterConfig {
        cutoff_year: 2010,
        min_years: 3,
    };
    assert!(filter_team_years(&rows, cfg).is_empty());
}
