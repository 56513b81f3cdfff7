//! Plot data for the terminal viewer: the improvement histogram, the
//! points-per-game line chart of the top improvers and the penalty bar chart.

use crate::analysis::{PenaltyEntry, TeamSeries};
use crate::stats::HistogramBin;

#[derive(Debug, Clone, PartialEq)]
pub struct BarSpec {
    pub label: String,
    pub value: u64,
    pub text: String,
}

pub fn histogram_bars(bins: &[HistogramBin]) -> Vec<BarSpec> {
    bins.iter()
        .map(|b| BarSpec {
            label: format!("{:+.2}", b.start),
            value: b.count as u64,
            text: b.count.to_string(),
        })
        .collect()
}

/// Penalty ratings sit in a narrow band near the top of the 0-100 scale, so
/// bars are drawn above a baseline just under the smallest shown value.
/// Returns the baseline and the bars (value scaled by 10 to keep a decimal).
pub fn penalty_bars(entries: &[PenaltyEntry]) -> (f64, Vec<BarSpec>) {
    let Some(min) = entries
        .iter()
        .map(|e| e.penalties)
        .min_by(|a, b| a.total_cmp(b))
    else {
        return (0.0, Vec::new());
    };
    let baseline = (min - 1.0).floor().max(0.0);
    let bars = entries
        .iter()
        .map(|e| BarSpec {
            label: e.player_name.clone(),
            value: ((e.penalties - baseline) * 10.0).round().max(0.0) as u64,
            text: format!("{:.0}", e.penalties),
        })
        .collect();
    (baseline, bars)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    pub series: Vec<(String, Vec<(f64, f64)>)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

pub fn line_plot(series: &[TeamSeries]) -> LinePlot {
    let data: Vec<(String, Vec<(f64, f64)>)> = series
        .iter()
        .map(|s| {
            (
                s.team_name.clone(),
                s.points
                    .iter()
                    .map(|p| (p.year as f64, p.points_per_game))
                    .collect(),
            )
        })
        .collect();

    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for (px, py) in data.iter().flat_map(|(_, pts)| pts.iter()) {
        x[0] = x[0].min(*px);
        x[1] = x[1].max(*px);
        y[0] = y[0].min(*py);
        y[1] = y[1].max(*py);
    }
    if !x[0].is_finite() {
        x = [0.0, 1.0];
        y = [0.0, 3.0];
    }
    if x[0] == x[1] {
        x[1] += 1.0;
    }
    LinePlot {
        series: data,
        x_bounds: x,
        y_bounds: [(y[0] - 0.1).max(0.0), (y[1] + 0.1).min(3.0)],
    }
}
