use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use serde::Serialize;

use crate::cleaning::CleaningConfig;
use crate::dataset::DEFAULT_DB_FILE;
use crate::error::PipelineError;
use crate::filter::FilterConfig;
use crate::merge::JoinPolicy;
use crate::records::StyleAttribute;

pub const DEFAULT_TOP_TEAMS: usize = 5;
pub const DEFAULT_TOP_PLAYERS: usize = 25;
pub const DEFAULT_PLOT_TEAMS: usize = 3;
pub const DEFAULT_HIST_BINS: usize = 50;
pub const DEFAULT_KENDALL_ATTRIBUTES: [StyleAttribute; 3] = [
    StyleAttribute::DefencePressure,
    StyleAttribute::DefenceAggression,
    StyleAttribute::ChanceCreationShooting,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    pub db_path: PathBuf,
    pub filter: FilterConfig,
    pub top_teams: usize,
    pub top_players: usize,
    pub plot_teams: usize,
    pub histogram_bins: usize,
    pub join_policy: JoinPolicy,
    pub kendall_attributes: Vec<StyleAttribute>,
    pub distinct_players: bool,
    pub dedup: bool,
    pub export_path: Option<PathBuf>,
    pub show_tui: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            filter: FilterConfig::default(),
            top_teams: DEFAULT_TOP_TEAMS,
            top_players: DEFAULT_TOP_PLAYERS,
            plot_teams: DEFAULT_PLOT_TEAMS,
            histogram_bins: DEFAULT_HIST_BINS,
            join_policy: JoinPolicy::default(),
            kendall_attributes: DEFAULT_KENDALL_ATTRIBUTES.to_vec(),
            distinct_players: false,
            dedup: false,
            export_path: None,
            show_tui: true,
        }
    }
}

impl AnalysisConfig {
    /// Process arguments override `APP_*` environment variables, which
    /// override the defaults of the reference run.
    pub fn from_env_and_args() -> Result<Self> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    pub fn from_sources(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |flag: &str, key: &str| arg_value(args, flag).or_else(|| non_empty(env(key)));
        let mut cfg = Self::default();

        if let Some(path) = lookup("--db", "APP_SOCCER_DB") {
            cfg.db_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("--cutoff-year", "APP_CUTOFF_YEAR") {
            cfg.filter.cutoff_year = parse_num("cutoff year", &raw)?;
        }
        if let Some(raw) = lookup("--min-years", "APP_MIN_YEARS") {
            cfg.filter.min_years = parse_num("min years", &raw)?;
        }
        if let Some(raw) = lookup("--top-teams", "APP_TOP_TEAMS") {
            cfg.top_teams = parse_num("top teams", &raw)?;
        }
        if let Some(raw) = lookup("--top-players", "APP_TOP_PLAYERS") {
            cfg.top_players = parse_num("top players", &raw)?;
        }
        if let Some(raw) = lookup("--plot-teams", "APP_PLOT_TEAMS") {
            cfg.plot_teams = parse_num("plot teams", &raw)?;
        }
        if let Some(raw) = lookup("--bins", "APP_HIST_BINS") {
            cfg.histogram_bins = parse_num("histogram bins", &raw)?;
            if cfg.histogram_bins == 0 {
                return Err(PipelineError::Config("histogram bins must be positive".into()).into());
            }
        }
        if let Some(raw) = lookup("--join", "APP_JOIN_POLICY") {
            cfg.join_policy = raw.parse::<JoinPolicy>()?;
        }
        if let Some(raw) = lookup("--kendall", "APP_KENDALL_ATTRS") {
            cfg.kendall_attributes = parse_attributes(&raw)?;
        }
        if let Some(raw) = lookup("--export", "APP_EXPORT") {
            cfg.export_path = Some(PathBuf::from(raw));
        }

        cfg.distinct_players =
            has_flag(args, "--distinct-players") || env_flag(env("APP_DISTINCT_PLAYERS"));
        cfg.dedup = has_flag(args, "--dedup") || env_flag(env("APP_DEDUP"));
        cfg.show_tui = !(has_flag(args, "--no-tui") || env_flag(env("APP_NO_TUI")));
        Ok(cfg)
    }

    pub fn cleaning(&self) -> CleaningConfig {
        CleaningConfig::default().with_dedup(self.dedup)
    }
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_flag(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_num<T: FromStr>(what: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| PipelineError::Config(format!("{what}: not a valid number {raw:?}")).into())
}

fn parse_attributes(raw: &str) -> Result<Vec<StyleAttribute>> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']).filter(|p| !p.trim().is_empty()) {
        let attr = StyleAttribute::from_column(part)
            .ok_or_else(|| PipelineError::Config(format!("unknown team attribute {part:?}")))?;
        if !out.contains(&attr) {
            out.push(attr);
        }
    }
    if out.is_empty() {
        return Err(PipelineError::Config("no kendall attributes given".into()).into());
    }
    Ok(out)
}
