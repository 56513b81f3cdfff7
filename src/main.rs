use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, GraphType, Paragraph,
    Tabs,
};

use euro_soccer_eda::charts::{self, BarSpec};
use euro_soccer_eda::config::AnalysisConfig;
use euro_soccer_eda::export::ExportFormat;
use euro_soccer_eda::pipeline::{self, AnalysisReport};
use euro_soccer_eda::{dataset, export, report};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Histogram,
    Improvers,
    Penalties,
    Correlation,
}

impl View {
    const ALL: [View; 4] = [
        View::Histogram,
        View::Improvers,
        View::Penalties,
        View::Correlation,
    ];

    fn title(self) -> &'static str {
        match self {
            View::Histogram => "1 Improvement",
            View::Improvers => "2 Top teams",
            View::Penalties => "3 Penalties",
            View::Correlation => "4 Correlation",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    fn step(self, forward: bool) -> View {
        let n = Self::ALL.len();
        let idx = if forward {
            (self.index() + 1) % n
        } else {
            (self.index() + n - 1) % n
        };
        Self::ALL[idx]
    }
}

struct App<'a> {
    report: &'a AnalysisReport,
    view: View,
    scroll: u16,
    help_overlay: bool,
    should_quit: bool,
}

impl<'a> App<'a> {
    fn new(report: &'a AnalysisReport) -> Self {
        Self {
            report,
            view: View::Histogram,
            scroll: 0,
            help_overlay: false,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.help_overlay {
                    self.help_overlay = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Char('1') => self.select(View::Histogram),
            KeyCode::Char('2') => self.select(View::Improvers),
            KeyCode::Char('3') => self.select(View::Penalties),
            KeyCode::Char('4') => self.select(View::Correlation),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.select(self.view.step(true))
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.select(self.view.step(false))
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            _ => {}
        }
    }

    fn select(&mut self, view: View) {
        self.view = view;
        self.scroll = 0;
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = AnalysisConfig::from_env_and_args()?;
    let conn = dataset::open_db(&cfg.db_path)?;
    let analysis = pipeline::run(&conn, &cfg)?;
    println!("{}", report::render_text(&analysis));

    if let Some(path) = &cfg.export_path {
        let summary = export::export_report(path, &analysis)?;
        match summary.format {
            ExportFormat::Json => println!(
                "Exported report json ({} team-years) to {}",
                summary.rows,
                path.display()
            ),
            ExportFormat::Workbook => println!(
                "Exported {} rows across {} sheets to {}",
                summary.rows,
                summary.sheets,
                path.display()
            ),
        }
    }

    if cfg.show_tui {
        show_viewer(&analysis).context("chart viewer")?;
    }
    Ok(())
}

fn show_viewer(analysis: &AnalysisReport) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(analysis);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let tabs = Tabs::new(View::ALL.iter().map(|v| v.title()).collect::<Vec<_>>())
        .block(
            Block::default()
                .title("European Soccer EDA")
                .borders(Borders::ALL),
        )
        .select(app.view.index())
        .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow));
    frame.render_widget(tabs, chunks[0]);

    match app.view {
        View::Histogram => render_histogram(frame, chunks[1], app.report),
        View::Improvers => render_improvers(frame, chunks[1], app.report),
        View::Penalties => render_penalties(frame, chunks[1], app),
        View::Correlation => render_correlation(frame, chunks[1], app),
    }

    let footer = Paragraph::new("1-4/Tab views  j/k scroll  ? help  q quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn to_bars(specs: &[BarSpec], style: Style) -> Vec<Bar<'_>> {
    specs
        .iter()
        .map(|s| {
            Bar::default()
                .value(s.value)
                .label(Line::from(s.label.as_str()))
                .text_value(s.text.clone())
                .style(style)
        })
        .collect()
}

fn render_histogram(frame: &mut Frame, area: Rect, analysis: &AnalysisReport) {
    let specs = charts::histogram_bars(&analysis.improvement_histogram);
    let bars = to_bars(&specs, Style::default().fg(Color::Cyan));
    let title = format!(
        "Points-per-game slope across {} teams",
        analysis.improvement.len()
    );
    let width = (area.width.saturating_sub(2) / specs.len().max(1) as u16).clamp(1, 6);
    let chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars))
        .bar_width(width)
        .bar_gap(0);
    frame.render_widget(chart, area);
}

fn render_improvers(frame: &mut Frame, area: Rect, analysis: &AnalysisReport) {
    let plot = charts::line_plot(&analysis.top_series);
    let datasets = plot
        .series
        .iter()
        .enumerate()
        .map(|(idx, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[idx % SERIES_COLORS.len()]))
                .data(points)
        })
        .collect::<Vec<_>>();

    let [x0, x1] = plot.x_bounds;
    let [y0, y1] = plot.y_bounds;
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title("Points per game of the most improved teams")
                .borders(Borders::ALL),
        )
        .x_axis(
            Axis::default()
                .title("Year")
                .bounds(plot.x_bounds)
                .labels(vec![
                    Span::raw(format!("{x0:.0}")),
                    Span::raw(format!("{:.0}", (x0 + x1) / 2.0)),
                    Span::raw(format!("{x1:.0}")),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("PPG")
                .bounds(plot.y_bounds)
                .labels(vec![
                    Span::raw(format!("{y0:.2}")),
                    Span::raw(format!("{:.2}", (y0 + y1) / 2.0)),
                    Span::raw(format!("{y1:.2}")),
                ]),
        );
    frame.render_widget(chart, area);
}

fn render_penalties(frame: &mut Frame, area: Rect, app: &App) {
    let (baseline, specs) = charts::penalty_bars(&app.report.penalties);
    let bars = to_bars(&specs, Style::default().fg(Color::Green));
    let title = format!("Highest penalty ratings (bars start at {baseline:.0})");
    let visible = area.height.saturating_sub(2) as usize;
    let start = scroll_offset(bars.len(), visible, app.scroll as usize);
    let chart = BarChart::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .data(BarGroup::default().bars(&bars[start..]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0);
    frame.render_widget(chart, area);
}

fn scroll_offset(total: usize, visible: usize, requested: usize) -> usize {
    requested.min(total.saturating_sub(visible))
}

fn render_correlation(frame: &mut Frame, area: Rect, app: &App) {
    let mut text = report::correlation_table(app.report);
    text.push_str("\nKendall tau-b against points per game\n");
    for a in &app.report.associations {
        text.push_str(&format!(
            "  {:<24} tau={:+.4} p={:.3e}\n",
            a.attribute.column(),
            a.kendall.tau,
            a.kendall.p_value
        ));
    }
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Pearson correlation of attributes and points per game")
                .borders(Borders::ALL),
        )
        .scroll((app.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "European Soccer EDA - Help",
        "",
        "  1            Improvement histogram",
        "  2            Most improved teams",
        "  3            Penalty ratings",
        "  4            Correlation matrix",
        "  Tab / l / h  Next / previous view",
        "  j/k or ↑/↓   Scroll",
        "  ?            Toggle help",
        "  q / Esc      Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
